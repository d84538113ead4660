//! # linkwatch
//!
//! 인터넷 연결 모니터 바이너리 진입점.
//! 설정 로드, 어댑터 조립, 스케줄러 실행, 종료 시 마지막 플러시.

use anyhow::{Context, Result};
use clap::Parser;
use linkwatch_app::lifecycle::{LifecycleManager, SignalOutcome};
use linkwatch_app::reporter::ConsoleReporter;
use linkwatch_app::scheduler::{Scheduler, SchedulerConfig};
use linkwatch_app::wiring::{build_latency_probe, build_throughput_probe};
use linkwatch_core::clock::SystemClock;
use linkwatch_core::config::AppConfig;
use linkwatch_core::config_manager::ConfigManager;
use linkwatch_storage::{open_backend, MetricsStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 인터넷 연결 모니터
///
/// 매초 지연/지터/패킷 손실을, 주기적으로 대역폭을 측정해 시계열로 기록한다.
#[derive(Parser, Debug)]
#[command(name = "linkwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (JSON, 없으면 기본값으로 생성)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 시계열 파일 경로 (.parquet, .db/.sqlite)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 대역폭 측정 간격 (초)
    #[arg(long)]
    interval: Option<u64>,

    /// ping 대상 호스트
    #[arg(long)]
    host: Option<String>,

    /// 틱당 ping 횟수
    #[arg(long)]
    count: Option<u32>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

impl Args {
    /// CLI 인자로 파일 설정 덮어쓰기
    fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(path) = &self.log_file {
            config.storage.log_file = path.clone();
        }
        if let Some(secs) = self.interval {
            config.throughput.interval_secs = secs;
        }
        if let Some(host) = &self.host {
            config.latency.host = host.clone();
        }
        if let Some(count) = self.count {
            config.latency.count = count;
        }
        config
    }
}

/// 설정 파일 열기 (CLI 인자 또는 플랫폼별 기본 경로)
fn open_config(path: Option<PathBuf>) -> Result<ConfigManager> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    info!("설정 파일: {}", manager.config_path().display());
    Ok(manager)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG가 있으면 우선
    let log_filter = format!(
        "linkwatch={},linkwatch_app={},linkwatch_core={},linkwatch_monitor={},linkwatch_storage={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config_manager = open_config(args.config.clone())?;
    let config = args.apply_overrides(config_manager.get());
    config.validate().context("설정 검증 실패")?;

    let backend = open_backend(&config.storage.log_file)
        .with_context(|| format!("저장소 열기 실패: {}", config.storage.log_file.display()))?;
    let store = MetricsStore::open(backend).context("기존 시계열 로드 실패")?;

    let throughput_probe = build_throughput_probe(&config).context("처리량 프로브 생성 실패")?;
    let latency_probe = build_latency_probe(&config);

    let mut scheduler = Scheduler::new(
        SchedulerConfig::from_app_config(&config),
        Arc::new(SystemClock),
        throughput_probe,
        latency_probe,
        store,
        Box::new(ConsoleReporter::stdout()),
    );

    let lifecycle = Arc::new(LifecycleManager::new());
    let mut signal_task = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move { lifecycle.wait_for_signal().await })
    };

    let result = tokio::select! {
        result = scheduler.run(lifecycle.subscribe()) => result,
        // 추가된 샘플은 이미 모두 영속화되어 있다
        Ok(SignalOutcome::ForceQuit) = &mut signal_task => {
            warn!("강제 종료: 진행 중인 틱은 기록되지 않음");
            std::process::exit(130);
        }
    };
    signal_task.abort();
    result.context("시계열 영속화 실패로 모니터링 중단")?;

    println!("\nMonitoring stopped by user");
    info!(
        "총 {}행 저장: {}",
        scheduler.store().len(),
        scheduler.store().location()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_file_values() {
        let args = Args::parse_from([
            "linkwatch",
            "--log-file",
            "stats.db",
            "--interval",
            "60",
            "--host",
            "1.1.1.1",
            "--count",
            "5",
        ]);
        let config = args.apply_overrides(AppConfig::default_config());

        assert_eq!(config.storage.log_file, PathBuf::from("stats.db"));
        assert_eq!(config.throughput.interval_secs, 60);
        assert_eq!(config.latency.host, "1.1.1.1");
        assert_eq!(config.latency.count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let args = Args::parse_from(["linkwatch"]);
        assert_eq!(args.log_level, "info");

        let config = args.apply_overrides(AppConfig::default_config());
        assert_eq!(config, AppConfig::default_config());
    }

    #[test]
    fn zero_count_fails_validation() {
        let args = Args::parse_from(["linkwatch", "--count", "0"]);
        let config = args.apply_overrides(AppConfig::default_config());
        assert!(config.validate().is_err());
    }
}
