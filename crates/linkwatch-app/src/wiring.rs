//! 설정 → 어댑터 조립.

use linkwatch_core::config::{AppConfig, ThroughputBackend};
use linkwatch_core::error::ProbeError;
use linkwatch_core::ports::probe::{LatencyProbe, ThroughputProbe};
use linkwatch_monitor::http_throughput::HttpThroughputProbe;
use linkwatch_monitor::ping::SystemPingProbe;
use linkwatch_monitor::speedtest::SpeedtestCliProbe;
use std::sync::Arc;
use tracing::info;

/// 설정된 방식의 처리량 프로브 생성
pub fn build_throughput_probe(config: &AppConfig) -> Result<Arc<dyn ThroughputProbe>, ProbeError> {
    let throughput = &config.throughput;
    let probe: Arc<dyn ThroughputProbe> = match throughput.backend {
        ThroughputBackend::SpeedtestCli => {
            info!("처리량 측정: {}", throughput.speedtest.program);
            Arc::new(SpeedtestCliProbe::from_config(&throughput.speedtest))
        }
        ThroughputBackend::Http => {
            info!("처리량 측정: HTTP ({})", throughput.http.upload_url);
            Arc::new(HttpThroughputProbe::new(
                &throughput.http,
                config.http_timeout(),
            )?)
        }
    };
    Ok(probe)
}

/// 시스템 ping 프로브 생성
pub fn build_latency_probe(config: &AppConfig) -> Arc<dyn LatencyProbe> {
    Arc::new(SystemPingProbe::new(config.latency.program.clone()))
}
