//! speedtest-cli 처리량 프로브.
//!
//! `ThroughputProbe` 포트 구현. `speedtest-cli --json`을 실행하고
//! 출력의 `download`/`upload` 값(bit/s)을 Mbps로 변환한다.
//!
//! speedtest-cli 미설치 시 매 시도가 `Spawn` 실패로 기록된다
//! (`pip install speedtest-cli` 또는 배포판 패키지 필요).

use async_trait::async_trait;
use linkwatch_core::config::SpeedtestCliConfig;
use linkwatch_core::error::ProbeError;
use linkwatch_core::models::sample::Throughput;
use linkwatch_core::ports::probe::ThroughputProbe;
use serde::Deserialize;
use tracing::{debug, info};

use crate::process::run_captured;

/// speedtest-cli JSON 보고서 중 필요한 필드
#[derive(Debug, Deserialize)]
struct SpeedtestReport {
    /// 다운로드 (bit/s)
    download: f64,
    /// 업로드 (bit/s)
    upload: f64,
}

/// speedtest-cli 프로브 — `ThroughputProbe` 포트 구현
#[derive(Debug, Clone)]
pub struct SpeedtestCliProbe {
    program: String,
    args: Vec<String>,
}

impl SpeedtestCliProbe {
    /// 실행 파일과 인자로 생성
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &SpeedtestCliConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl Default for SpeedtestCliProbe {
    fn default() -> Self {
        Self::from_config(&SpeedtestCliConfig::default())
    }
}

#[async_trait]
impl ThroughputProbe for SpeedtestCliProbe {
    async fn measure_throughput(&self) -> Result<Throughput, ProbeError> {
        debug!("speedtest-cli 측정 시작");
        let stdout = run_captured(&self.program, &self.args).await?;
        let throughput = parse_report(&stdout)?;
        info!(
            "처리량 측정: 다운로드 {:.2} Mbps, 업로드 {:.2} Mbps",
            throughput.download_mbps, throughput.upload_mbps
        );
        Ok(throughput)
    }
}

/// speedtest-cli JSON 출력 해석
pub fn parse_report(stdout: &str) -> Result<Throughput, ProbeError> {
    let report: SpeedtestReport = serde_json::from_str(stdout.trim())
        .map_err(|e| ProbeError::InvalidOutput(format!("speedtest JSON 파싱 실패: {e}")))?;

    for (name, value) in [("download", report.download), ("upload", report.upload)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ProbeError::InvalidOutput(format!(
                "speedtest {name} 값이 올바르지 않음: {value}"
            )));
        }
    }

    Ok(Throughput::from_bits_per_second(
        report.download,
        report.upload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const REPORT: &str = r#"{"download": 93842117.5, "upload": 11873350.2, "ping": 14.1,
        "server": {"name": "Seoul", "country": "KR"}, "timestamp": "2024-05-01T00:00:00Z",
        "bytes_sent": 15204352, "bytes_received": 117590108}"#;

    #[test]
    fn parses_bits_per_second_to_mbps() {
        let t = parse_report(REPORT).unwrap();
        assert!((t.download_mbps - 93.8421175).abs() < 1e-9);
        assert!((t.upload_mbps - 11.8733502).abs() < 1e-9);
    }

    #[test]
    fn garbage_output_is_invalid() {
        assert_matches!(
            parse_report("Retrieving speedtest.net configuration..."),
            Err(ProbeError::InvalidOutput(_))
        );
    }

    #[test]
    fn missing_upload_is_invalid() {
        assert_matches!(
            parse_report(r#"{"download": 1000000}"#),
            Err(ProbeError::InvalidOutput(_))
        );
    }

    #[test]
    fn negative_value_is_invalid() {
        assert_matches!(
            parse_report(r#"{"download": -1, "upload": 5}"#),
            Err(ProbeError::InvalidOutput(_))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_configured_program() {
        let probe = SpeedtestCliProbe::new(
            "echo",
            vec![r#"{"download": 50000000, "upload": 10000000}"#.to_string()],
        );
        let t = probe.measure_throughput().await.unwrap();
        assert_eq!(t.download_mbps, 50.0);
        assert_eq!(t.upload_mbps, 10.0);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let probe = SpeedtestCliProbe::new("linkwatch-missing-speedtest", vec![]);
        assert_matches!(
            probe.measure_throughput().await,
            Err(ProbeError::Spawn { .. })
        );
    }
}
