//! 측정 프로브 포트.
//!
//! 구현: `linkwatch-monitor` crate (시스템 ping, speedtest-cli, HTTP 전송)

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::models::latency::PingOutput;
use crate::models::sample::Throughput;

/// 처리량(대역폭) 프로브
#[async_trait]
pub trait ThroughputProbe: Send + Sync {
    /// 다운로드/업로드 처리량 측정 (Mbps)
    ///
    /// 실제 네트워크 전송 동안 블로킹될 수 있다.
    async fn measure_throughput(&self) -> Result<Throughput, ProbeError>;
}

/// 지연 프로브
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// `host`에 `count`회 왕복 프로브를 보내고 원시 출력 반환
    async fn measure_latency(&self, host: &str, count: u32) -> Result<PingOutput, ProbeError>;
}
