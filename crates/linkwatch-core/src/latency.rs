//! 지연 파서.
//!
//! 플랫폼별 ping 명령 인자 구성과, 원시 ping 출력에서 왕복 시간을 뽑아
//! 평균/지터/패킷 손실을 계산한다.
//!
//! 지원하는 줄 형식:
//! - Unix 계열: `64 bytes from 8.8.8.8: icmp_seq=1 ttl=117 time=10.3 ms`
//! - Windows 계열: `Reply from 8.8.8.8: bytes=32 time=10ms TTL=117`

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProbeError;
use crate::models::latency::{LatencyStats, PingOutput, FULL_PACKET_LOSS};

/// 응답 시간 토큰 앞의 표식
const TIME_MARKER: &str = "time=";

/// ping 명령 플랫폼 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PingPlatform {
    /// `ping -n <count> <host>`, 시간 토큰은 `ms`로 끝남
    Windows,
    /// `ping -c <count> <host>`, 시간 토큰은 공백으로 끝남
    Unix,
}

impl PingPlatform {
    /// 현재 빌드 대상 플랫폼
    pub fn current() -> Self {
        if cfg!(windows) {
            PingPlatform::Windows
        } else {
            PingPlatform::Unix
        }
    }

    /// 프로브 횟수 플래그
    pub fn count_flag(self) -> &'static str {
        match self {
            PingPlatform::Windows => "-n",
            PingPlatform::Unix => "-c",
        }
    }

    /// `ping` 프로그램 이름 뒤에 붙일 인자 목록
    pub fn command_args(self, host: &str, count: u32) -> Vec<String> {
        vec![
            self.count_flag().to_string(),
            count.to_string(),
            host.to_string(),
        ]
    }

    /// 시간 값 뒤에 오는 종결 토큰
    fn time_terminator(self) -> &'static str {
        match self {
            PingPlatform::Windows => "ms",
            PingPlatform::Unix => " ",
        }
    }

    /// 한 줄에서 왕복 시간(ms) 추출
    ///
    /// `time=` 표식이 없거나 숫자가 아니면 `None`.
    pub fn extract_time(self, line: &str) -> Option<f64> {
        let (_, rest) = line.split_once(TIME_MARKER)?;
        let token = rest
            .split_once(self.time_terminator())
            .map_or(rest, |(value, _)| value);
        token
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
    }
}

/// 원시 ping 출력을 지연 통계로 변환
///
/// 파싱할 수 없는 줄은 버리고 나머지를 계속 처리한다.
/// 유효한 응답 시간이 하나도 없으면 [`ProbeError::NoReplies`].
pub fn parse_ping_output(output: &PingOutput) -> Result<LatencyStats, ProbeError> {
    let times = extract_round_trip_times(output.platform, &output.stdout);
    summarize(&times, output.requested)
}

/// `time=`이 포함된 줄에서 왕복 시간 목록 추출
pub fn extract_round_trip_times(platform: PingPlatform, stdout: &str) -> Vec<f64> {
    stdout
        .lines()
        .filter(|line| line.contains(TIME_MARKER))
        .filter_map(|line| {
            let parsed = platform.extract_time(line);
            if parsed.is_none() {
                debug!("응답 시간 파싱 실패, 줄 무시: {line}");
            }
            parsed
        })
        .collect()
}

/// 왕복 시간 목록으로 평균/지터/손실률 계산
///
/// 손실률은 실제로 받은 줄 수가 아니라 요청한 횟수를 분모로 한다.
pub fn summarize(times: &[f64], requested: u32) -> Result<LatencyStats, ProbeError> {
    if requested == 0 {
        return Err(ProbeError::InvalidOutput(
            "요청 횟수가 0인 지연 측정".to_string(),
        ));
    }
    if times.is_empty() {
        return Err(ProbeError::NoReplies { requested });
    }

    let n = times.len() as f64;
    let mean = times.iter().sum::<f64>() / n;
    let jitter = if times.len() >= 2 {
        let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };
    let packet_loss = (FULL_PACKET_LOSS * (1.0 - n / f64::from(requested)))
        .clamp(0.0, FULL_PACKET_LOSS);

    Ok(LatencyStats {
        ping_ms: Some(mean),
        jitter_ms: Some(jitter),
        packet_loss,
    })
}
