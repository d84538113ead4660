//! 시계열 샘플 모델.
//!
//! 틱마다 한 행씩 쌓이는 연결 상태 기록. 선택 지표는 센티널 숫자 대신 `Option`으로 표현한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::latency::LatencyStats;

/// 영속 저장소 컬럼 이름 (순서 고정)
pub const SAMPLE_COLUMNS: [&str; 6] = [
    "timestamp",
    "download_speed",
    "upload_speed",
    "ping",
    "packet_loss",
    "jitter",
];

/// bit/s → Mbps 변환 제수
pub const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// 처리량 측정 결과 (Mbps)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Throughput {
    /// 다운로드 속도 (Mbps)
    pub download_mbps: f64,
    /// 업로드 속도 (Mbps)
    pub upload_mbps: f64,
}

impl Throughput {
    /// 원시 bit/s 값을 Mbps로 변환
    pub fn from_bits_per_second(download_bps: f64, upload_bps: f64) -> Self {
        Self {
            download_mbps: download_bps / BITS_PER_MEGABIT,
            upload_mbps: upload_bps / BITS_PER_MEGABIT,
        }
    }
}

/// 시계열 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 샘플 생성 시각
    pub timestamp: DateTime<Utc>,
    /// 다운로드 속도 (Mbps) — 이번 틱에 처리량 프로브가 성공했을 때만 존재
    pub download_speed: Option<f64>,
    /// 업로드 속도 (Mbps) — download_speed와 항상 쌍으로 존재
    pub upload_speed: Option<f64>,
    /// 평균 왕복 지연 (ms)
    pub ping: Option<f64>,
    /// 왕복 지연 표준편차 (ms), ping이 없으면 없음
    pub jitter: Option<f64>,
    /// 패킷 손실률 (0 ~ 100)
    pub packet_loss: f64,
}

impl Sample {
    /// 두 프로브 결과로 샘플 조립
    ///
    /// 지연 측정이 실패했으면(`None`) 패킷 손실 100%로 기록한다.
    pub fn new(
        timestamp: DateTime<Utc>,
        throughput: Option<Throughput>,
        latency: Option<LatencyStats>,
    ) -> Self {
        let latency = latency.unwrap_or_else(LatencyStats::unreachable);
        Self {
            timestamp,
            download_speed: throughput.map(|t| t.download_mbps),
            upload_speed: throughput.map(|t| t.upload_mbps),
            ping: latency.ping_ms,
            jitter: latency.jitter_ms,
            packet_loss: latency.packet_loss,
        }
    }

    /// 처리량 측정값 (다운로드/업로드 둘 다 있을 때만)
    pub fn throughput(&self) -> Option<Throughput> {
        match (self.download_speed, self.upload_speed) {
            (Some(download_mbps), Some(upload_mbps)) => Some(Throughput {
                download_mbps,
                upload_mbps,
            }),
            _ => None,
        }
    }
}
