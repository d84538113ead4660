//! 샘플링 스케줄러.
//!
//! 틱마다 지연 프로브를 실행하고, 처리량 프로브는 설정 간격마다 한 번만 시도한다.
//! 결과를 샘플로 묶어 저장소에 추가(즉시 영속화)한 뒤 리포터에 넘긴다.
//! 틱은 겹치지 않으며, 종료 신호는 틱 사이에서만 확인한다.

use linkwatch_core::cadence::ThroughputGate;
use linkwatch_core::clock::Clock;
use linkwatch_core::config::AppConfig;
use linkwatch_core::error::CoreError;
use linkwatch_core::latency::parse_ping_output;
use linkwatch_core::models::latency::LatencyStats;
use linkwatch_core::models::sample::{Sample, Throughput};
use linkwatch_core::ports::probe::{LatencyProbe, ThroughputProbe};
use linkwatch_storage::MetricsStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::reporter::{ReportView, Reporter};

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 틱 간격 (고정 지연)
    pub tick_interval: Duration,
    /// 처리량 측정 시도 최소 간격
    pub throughput_interval: Duration,
    /// ping 대상 호스트
    pub ping_host: String,
    /// 틱당 ping 횟수
    pub ping_count: u32,
}

impl SchedulerConfig {
    /// 앱 설정에서 생성
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            throughput_interval: config.throughput_interval(),
            ping_host: config.latency.host.clone(),
            ping_count: config.latency.count,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default_config())
    }
}

/// 샘플링 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    throughput_probe: Arc<dyn ThroughputProbe>,
    latency_probe: Arc<dyn LatencyProbe>,
    store: MetricsStore,
    reporter: Box<dyn Reporter>,
    gate: ThroughputGate,
}

impl Scheduler {
    /// 새 스케줄러 생성
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        throughput_probe: Arc<dyn ThroughputProbe>,
        latency_probe: Arc<dyn LatencyProbe>,
        store: MetricsStore,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        let gate = ThroughputGate::new(config.throughput_interval);
        Self {
            config,
            clock,
            throughput_probe,
            latency_probe,
            store,
            reporter,
            gate,
        }
    }

    /// 시계열 저장소
    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    /// 틱 한 번 실행 후 추가된 샘플 반환
    ///
    /// 프로브 실패는 흡수되고, 영속화 실패만 에러로 반환된다.
    pub async fn tick(&mut self) -> Result<&Sample, CoreError> {
        let timestamp = self.clock.timestamp();
        let throughput = self.measure_throughput().await;
        let latency = self.measure_latency().await;

        self.store.append(Sample::new(timestamp, throughput, latency))?;
        self.report();

        self.store
            .latest()
            .ok_or_else(|| CoreError::Internal("추가 직후 시계열이 비어 있음".to_string()))
    }

    /// 종료 신호까지 틱 반복, 종료 후 마지막 플러시
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), CoreError> {
        info!(
            "스케줄러 시작: 틱={}ms, 처리량={}s, 대상={} ×{}, 저장소={}",
            self.config.tick_interval.as_millis(),
            self.config.throughput_interval.as_secs(),
            self.config.ping_host,
            self.config.ping_count,
            self.store.location(),
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.tick().await?;

            tokio::select! {
                _ = tokio::time::sleep(self.config.tick_interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("스케줄러 종료");
        self.store.flush()
    }

    /// 게이트를 통과하면 처리량 측정 (성공/실패 모두 쿨다운 시작)
    async fn measure_throughput(&mut self) -> Option<Throughput> {
        if !self.gate.try_acquire(self.clock.instant()) {
            return None;
        }

        match self.throughput_probe.measure_throughput().await {
            Ok(throughput) => Some(throughput),
            Err(e) => {
                warn!("처리량 측정 실패: {e}");
                None
            }
        }
    }

    /// 지연 측정 + 파싱 (실패 시 None → 패킷 손실 100%)
    async fn measure_latency(&self) -> Option<LatencyStats> {
        let result = self
            .latency_probe
            .measure_latency(&self.config.ping_host, self.config.ping_count)
            .await
            .and_then(|output| parse_ping_output(&output));

        match result {
            Ok(stats) => {
                debug!(
                    "지연: ping={:?}ms, jitter={:?}ms, 손실={:.1}%",
                    stats.ping_ms, stats.jitter_ms, stats.packet_loss
                );
                Some(stats)
            }
            Err(e) => {
                warn!("지연 측정 실패 ({}): {e}", self.config.ping_host);
                None
            }
        }
    }

    /// 리포터 출력 (실패는 로그만)
    fn report(&mut self) {
        let Some(view) = ReportView::from_store(&self.store) else {
            return;
        };
        if let Err(e) = self.reporter.report(&view) {
            warn!("리포터 출력 실패: {e}");
        }
    }
}
