//! 라이프사이클 관리.
//!
//! 종료 시그널 핸들링. 스케줄러는 틱 사이에서 종료 수신기를 확인한다.
//! 첫 시그널은 정상 종료(진행 중인 틱 완료 후 플러시), 두 번째 시그널은 즉시 종료 요청이다.

use std::io;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// 시그널 대기 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// 종료 신호 발송 후 시그널을 한 번 더 받음 (진행 중인 측정을 기다리지 않는다)
    ForceQuit,
    /// 시그널 수신 불가 (기본 시그널 동작 유지)
    Unavailable,
}

/// 종료 시그널 수신기
///
/// Unix: SIGINT, SIGTERM. 그 외: Ctrl+C.
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigint: Signal,
    #[cfg(unix)]
    sigterm: Signal,
}

impl ShutdownSignals {
    /// 핸들러 등록 (등록 이후 기본 시그널 동작 대신 이 수신기로 전달된다)
    pub fn register() -> io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                sigint: signal(SignalKind::interrupt())?,
                sigterm: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// 다음 시그널 대기 후 이름 반환
    pub async fn recv(&mut self) -> io::Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.sigint.recv() => Ok("SIGINT"),
                _ = self.sigterm.recv() => Ok("SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok("Ctrl+C")
        }
    }
}

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// OS 시그널 대기
    ///
    /// 핸들러 등록에 실패하면 기본 시그널 동작(즉시 종료)이 유지된다.
    pub async fn wait_for_signal(&self) -> SignalOutcome {
        match ShutdownSignals::register() {
            Ok(signals) => self.escalate(signals).await,
            Err(e) => {
                error!("시그널 핸들러 등록 실패: {e}");
                SignalOutcome::Unavailable
            }
        }
    }

    /// 첫 시그널에 종료 신호 발송, 두 번째 시그널에 [`SignalOutcome::ForceQuit`] 반환
    pub async fn escalate(&self, mut signals: ShutdownSignals) -> SignalOutcome {
        match signals.recv().await {
            Ok(name) => info!("{name} 수신"),
            Err(e) => {
                error!("시그널 수신 실패: {e}");
                return SignalOutcome::Unavailable;
            }
        }
        self.shutdown();

        match signals.recv().await {
            Ok(name) => {
                warn!("{name} 재수신, 진행 중인 틱을 기다리지 않고 종료");
                SignalOutcome::ForceQuit
            }
            Err(e) => {
                error!("시그널 수신 실패: {e}");
                SignalOutcome::Unavailable
            }
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
