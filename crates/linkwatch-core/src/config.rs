//! 애플리케이션 설정 구조체.
//!
//! 틱 주기, 지연/처리량 프로브, 시계열 저장 경로 등 런타임 설정을 정의한다.
//! [`crate::config_manager::ConfigManager`]를 통해 JSON 파일에서 로드하고,
//! CLI 인자가 파일 값을 덮어쓴다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 스케줄러 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 지연 프로브 설정
    #[serde(default)]
    pub latency: LatencyConfig,
    /// 처리량 프로브 설정
    #[serde(default)]
    pub throughput: ThroughputConfig,
    /// 시계열 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 스케줄러 설정
// ============================================================

/// 스케줄러 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 틱 간격 (밀리초) — 고정 지연
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

// ============================================================
// 지연 프로브 설정
// ============================================================

/// 지연 프로브 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyConfig {
    /// 대상 호스트
    #[serde(default = "default_ping_host")]
    pub host: String,
    /// 틱당 프로브 횟수
    #[serde(default = "default_ping_count")]
    pub count: u32,
    /// ping 실행 파일
    #[serde(default = "default_ping_program")]
    pub program: String,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            host: default_ping_host(),
            count: default_ping_count(),
            program: default_ping_program(),
        }
    }
}

// ============================================================
// 처리량 프로브 설정
// ============================================================

/// 처리량 측정 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThroughputBackend {
    /// `speedtest-cli --json` 실행
    #[default]
    SpeedtestCli,
    /// HTTP 다운로드/업로드 직접 측정
    Http,
}

/// 처리량 프로브 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputConfig {
    /// 측정 시도 사이 최소 간격 (초)
    #[serde(default = "default_throughput_interval_secs")]
    pub interval_secs: u64,
    /// 측정 방식
    #[serde(default)]
    pub backend: ThroughputBackend,
    /// speedtest-cli 설정
    #[serde(default)]
    pub speedtest: SpeedtestCliConfig,
    /// HTTP 측정 설정
    #[serde(default)]
    pub http: HttpThroughputConfig,
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_throughput_interval_secs(),
            backend: ThroughputBackend::default(),
            speedtest: SpeedtestCliConfig::default(),
            http: HttpThroughputConfig::default(),
        }
    }
}

/// speedtest-cli 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedtestCliConfig {
    /// 실행 파일
    #[serde(default = "default_speedtest_program")]
    pub program: String,
    /// 인자 (JSON 출력이어야 함)
    #[serde(default = "default_speedtest_args")]
    pub args: Vec<String>,
}

impl Default for SpeedtestCliConfig {
    fn default() -> Self {
        Self {
            program: default_speedtest_program(),
            args: default_speedtest_args(),
        }
    }
}

/// HTTP 처리량 측정 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpThroughputConfig {
    /// 다운로드 URL — `{bytes}` 자리에 요청 바이트 수가 들어감
    #[serde(default = "default_download_url")]
    pub download_url: String,
    /// 업로드 URL (POST)
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// 다운로드 크기 (바이트)
    #[serde(default = "default_download_bytes")]
    pub download_bytes: u64,
    /// 업로드 크기 (바이트)
    #[serde(default = "default_upload_bytes")]
    pub upload_bytes: u64,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_http_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpThroughputConfig {
    fn default() -> Self {
        Self {
            download_url: default_download_url(),
            upload_url: default_upload_url(),
            download_bytes: default_download_bytes(),
            upload_bytes: default_upload_bytes(),
            request_timeout_secs: default_http_timeout_secs(),
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 시계열 저장소 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 시계열 파일 경로 — 확장자로 형식 결정 (`.parquet`, `.db`/`.sqlite`)
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            latency: LatencyConfig::default(),
            throughput: ThroughputConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// 틱 간격
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.tick_interval_ms)
    }

    /// 처리량 측정 간격
    pub fn throughput_interval(&self) -> Duration {
        Duration::from_secs(self.throughput.interval_secs)
    }

    /// HTTP 처리량 요청 타임아웃
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.throughput.http.request_timeout_secs)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.monitor.tick_interval_ms == 0 {
            return Err(invalid("monitor.tick_interval_ms", "0보다 커야 합니다"));
        }
        if self.latency.count == 0 {
            return Err(invalid("latency.count", "1 이상이어야 합니다"));
        }
        let host = self.latency.host.as_str();
        if host.is_empty() || host.starts_with('-') || host.chars().any(char::is_whitespace) {
            return Err(invalid(
                "latency.host",
                "비어 있거나 '-'로 시작하거나 공백을 포함할 수 없습니다",
            ));
        }
        if self.latency.program.trim().is_empty() {
            return Err(invalid("latency.program", "비어 있을 수 없습니다"));
        }
        if self.storage.log_file.as_os_str().is_empty() {
            return Err(invalid("storage.log_file", "비어 있을 수 없습니다"));
        }
        match self.throughput.backend {
            ThroughputBackend::SpeedtestCli => {
                if self.throughput.speedtest.program.trim().is_empty() {
                    return Err(invalid("throughput.speedtest.program", "비어 있을 수 없습니다"));
                }
            }
            ThroughputBackend::Http => {
                let http = &self.throughput.http;
                if http.download_bytes == 0 || http.upload_bytes == 0 {
                    return Err(invalid("throughput.http", "전송 크기는 0보다 커야 합니다"));
                }
                if http.request_timeout_secs == 0 {
                    return Err(invalid(
                        "throughput.http.request_timeout_secs",
                        "0보다 커야 합니다",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_ping_host() -> String {
    "8.8.8.8".to_string()
}
fn default_ping_count() -> u32 {
    3
}
fn default_ping_program() -> String {
    "ping".to_string()
}
fn default_throughput_interval_secs() -> u64 {
    300 // 5분
}
fn default_speedtest_program() -> String {
    "speedtest-cli".to_string()
}
fn default_speedtest_args() -> Vec<String> {
    vec!["--json".to_string()]
}
fn default_download_url() -> String {
    "https://speed.cloudflare.com/__down?bytes={bytes}".to_string()
}
fn default_upload_url() -> String {
    "https://speed.cloudflare.com/__up".to_string()
}
fn default_download_bytes() -> u64 {
    25_000_000
}
fn default_upload_bytes() -> u64 {
    10_000_000
}
fn default_http_timeout_secs() -> u64 {
    60
}
fn default_log_file() -> PathBuf {
    PathBuf::from("internet_stats.parquet")
}
