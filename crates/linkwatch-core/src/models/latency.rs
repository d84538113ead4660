//! 지연 프로브 모델.
//!
//! ping 원시 출력과, 파서가 계산한 지연 통계.

use serde::{Deserialize, Serialize};

use crate::latency::PingPlatform;

/// 전체 손실 시 패킷 손실률
pub const FULL_PACKET_LOSS: f64 = 100.0;

/// ping 프로세스의 원시 출력
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingOutput {
    /// 출력을 만든 플랫폼 (줄 형식 결정)
    pub platform: PingPlatform,
    /// 요청한 프로브 횟수
    pub requested: u32,
    /// 표준 출력 텍스트
    pub stdout: String,
}

/// 한 번의 지연 측정 배치에서 계산한 통계
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// 평균 왕복 지연 (ms)
    pub ping_ms: Option<f64>,
    /// 왕복 지연 표준편차 (ms)
    pub jitter_ms: Option<f64>,
    /// 패킷 손실률 (0 ~ 100)
    pub packet_loss: f64,
}

impl LatencyStats {
    /// 측정 불가 (프로브 실패 또는 응답 0개)
    pub fn unreachable() -> Self {
        Self {
            ping_ms: None,
            jitter_ms: None,
            packet_loss: FULL_PACKET_LOSS,
        }
    }
}
