//! 시스템 ping 프로브.
//!
//! `LatencyProbe` 포트 구현. 플랫폼 기본 ping 명령을 실행해 원시 출력을 반환한다.
//! 출력 해석은 `linkwatch_core::latency`가 담당한다.

use async_trait::async_trait;
use linkwatch_core::error::ProbeError;
use linkwatch_core::latency::PingPlatform;
use linkwatch_core::models::latency::PingOutput;
use linkwatch_core::ports::probe::LatencyProbe;
use tracing::debug;

use crate::process::run_captured;

/// 시스템 ping 프로브 — `LatencyProbe` 포트 구현
#[derive(Debug, Clone)]
pub struct SystemPingProbe {
    program: String,
    platform: PingPlatform,
}

impl SystemPingProbe {
    /// 현재 플랫폼용 프로브 생성
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            platform: PingPlatform::current(),
        }
    }

    /// 인자 형식/출력 형식 플랫폼 지정
    pub fn with_platform(mut self, platform: PingPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// 사용 중인 플랫폼
    pub fn platform(&self) -> PingPlatform {
        self.platform
    }
}

impl Default for SystemPingProbe {
    fn default() -> Self {
        Self::new("ping")
    }
}

#[async_trait]
impl LatencyProbe for SystemPingProbe {
    async fn measure_latency(&self, host: &str, count: u32) -> Result<PingOutput, ProbeError> {
        let args = self.platform.command_args(host, count);
        let stdout = run_captured(&self.program, &args).await?;

        debug!("ping 완료: {host} × {count}, 출력 {}줄", stdout.lines().count());

        Ok(PingOutput {
            platform: self.platform,
            requested: count,
            stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_uses_ping_program() {
        let probe = SystemPingProbe::default();
        assert_eq!(probe.program, "ping");
        assert_eq!(probe.platform(), PingPlatform::current());
    }

    /// `echo`로 ping을 대신해 인자 구성을 확인
    #[cfg(unix)]
    #[tokio::test]
    async fn passes_platform_arguments() {
        let probe = SystemPingProbe::new("echo").with_platform(PingPlatform::Unix);
        let out = probe.measure_latency("8.8.8.8", 4).await.unwrap();
        assert_eq!(out.stdout.trim(), "-c 4 8.8.8.8");
        assert_eq!(out.requested, 4);
        assert_eq!(out.platform, PingPlatform::Unix);
    }

    // echo는 `-n`을 자기 옵션으로 먹으므로 인자 구성만 확인
    #[test]
    fn windows_platform_uses_n_flag() {
        let probe = SystemPingProbe::default().with_platform(PingPlatform::Windows);
        assert_eq!(probe.platform(), PingPlatform::Windows);
        assert_eq!(
            probe.platform().command_args("1.1.1.1", 2),
            vec!["-n", "2", "1.1.1.1"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreachable_host_exit_code_is_failure() {
        let probe = SystemPingProbe::new("false");
        let result = probe.measure_latency("203.0.113.1", 3).await;
        assert_matches!(result, Err(ProbeError::NonZeroExit { .. }));
    }

    #[tokio::test]
    async fn missing_ping_binary_is_spawn_failure() {
        let probe = SystemPingProbe::new("linkwatch-missing-ping");
        let result = probe.measure_latency("8.8.8.8", 3).await;
        assert_matches!(result, Err(ProbeError::Spawn { .. }));
    }
}
