//! 처리량 프로브 주기 제한.
//!
//! 비싼 처리량 측정은 설정한 간격마다 한 번만 시도한다.
//! 성공 여부와 관계없이 시도 시각이 갱신되므로 실패한 시도도 쿨다운을 지킨다.

use std::time::{Duration, Instant};

/// 처리량 프로브 게이트
#[derive(Debug, Clone)]
pub struct ThroughputGate {
    /// 시도 사이 최소 간격
    interval: Duration,
    /// 마지막 시도 시각 (단조 시계)
    last_attempt: Option<Instant>,
}

impl ThroughputGate {
    /// 새 게이트 생성 — 첫 확인은 항상 통과
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: None,
        }
    }

    /// 마지막 시도 시각
    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    /// `now` 시점에 시도 가능한지 (상태 변경 없음)
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// 시도 가능하면 시도 시각을 `now`로 기록하고 true 반환
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.last_attempt = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_check_is_always_due() {
        let mut gate = ThroughputGate::new(Duration::from_secs(300));
        assert!(gate.try_acquire(Instant::now()));
    }

    #[test]
    fn blocks_until_interval_elapsed() {
        let start = Instant::now();
        let mut gate = ThroughputGate::new(Duration::from_secs(300));
        assert!(gate.try_acquire(start));
        assert!(!gate.try_acquire(start + Duration::from_secs(1)));
        assert!(!gate.try_acquire(start + Duration::from_secs(299)));
        // 경계값: 정확히 간격만큼 지나면 통과
        assert!(gate.try_acquire(start + Duration::from_secs(300)));
        assert_eq!(gate.last_attempt(), Some(start + Duration::from_secs(300)));
    }

    #[test]
    fn rejected_check_does_not_move_last_attempt() {
        let start = Instant::now();
        let mut gate = ThroughputGate::new(Duration::from_secs(10));
        gate.try_acquire(start);
        gate.try_acquire(start + Duration::from_secs(5));
        assert_eq!(gate.last_attempt(), Some(start));
        assert!(gate.is_due(start + Duration::from_secs(10)));
    }

    #[test]
    fn three_intervals_allow_three_attempts() {
        let start = Instant::now();
        let mut gate = ThroughputGate::new(Duration::from_secs(300));
        let attempts = (0..900u64)
            .filter(|s| gate.try_acquire(start + Duration::from_secs(*s)))
            .count();
        assert_eq!(attempts, 3);
    }
}
