//! 시계 포트.
//!
//! 스케줄러는 단조 시각(쿨다운 계산)과 벽시계 시각(샘플 타임스탬프)을 이 trait로 얻는다.
//! 테스트는 [`ManualClock`]으로 시간을 직접 진행시킨다.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 시각 공급자
pub trait Clock: Send + Sync {
    /// 단조 시각
    fn instant(&self) -> Instant;

    /// 벽시계 시각
    fn timestamp(&self) -> DateTime<Utc>;
}

/// 운영용 시스템 시계
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 수동으로 진행시키는 시계 (테스트용)
#[derive(Debug)]
pub struct ManualClock {
    base_instant: Instant,
    base_timestamp: DateTime<Utc>,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// 현재 시각에서 시작하는 수동 시계
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// 지정한 벽시계 시각에서 시작
    pub fn starting_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            base_instant: Instant::now(),
            base_timestamp: timestamp,
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// 시간 진행
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }

    /// 시작 후 경과 시간
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        self.base_instant + self.elapsed()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        let elapsed =
            chrono::Duration::from_std(self.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        self.base_timestamp + elapsed
    }
}
