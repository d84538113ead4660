//! 메모리 시계열 + 동기 영속화.
//!
//! 스케줄러가 단독 소유한다. 매 추가 직후 전체 시계열을 백엔드에 영속화하므로
//! 프로세스가 어느 틱에서 죽더라도 마지막으로 추가된 샘플까지 남는다.

use chrono::SubsecRound;
use linkwatch_core::error::CoreError;
use linkwatch_core::models::sample::{Sample, Throughput};
use linkwatch_core::ports::storage::SeriesBackend;
use tracing::{info, warn};

/// 영속 저장 정밀도 (소수점 아래 자릿수, 마이크로초)
const TIMESTAMP_PRECISION: u16 = 6;

/// 추가 전용 시계열 저장소
pub struct MetricsStore {
    series: Vec<Sample>,
    backend: Box<dyn SeriesBackend>,
}

impl MetricsStore {
    /// 백엔드에서 기존 시계열을 읽어 저장소 생성
    pub fn open(backend: Box<dyn SeriesBackend>) -> Result<Self, CoreError> {
        let series = backend.load()?;
        info!(
            "시계열 로드: {}행 ({})",
            series.len(),
            backend.location()
        );
        Ok(Self { series, backend })
    }

    /// 샘플 추가 후 즉시 영속화
    ///
    /// 타임스탬프는 저장 정밀도로 자르고, 직전 샘플보다 이르면 직전 값으로 맞춘다.
    /// 영속화에 실패하면 샘플은 메모리에서도 빠진다.
    pub fn append(&mut self, mut sample: Sample) -> Result<&Sample, CoreError> {
        sample.timestamp = sample.timestamp.trunc_subsecs(TIMESTAMP_PRECISION);

        if let Some(last) = self.series.last() {
            if sample.timestamp < last.timestamp {
                warn!(
                    "벽시계 역행 감지: {} < {}, 직전 시각으로 보정",
                    sample.timestamp, last.timestamp
                );
                sample.timestamp = last.timestamp;
            }
        }

        self.series.push(sample);
        if let Err(e) = self.backend.persist(&self.series) {
            self.series.pop();
            return Err(e);
        }

        let index = self.series.len() - 1;
        Ok(&self.series[index])
    }

    /// 전체 시계열 재영속화 (종료 경로)
    pub fn flush(&mut self) -> Result<(), CoreError> {
        self.backend.persist(&self.series)?;
        info!(
            "시계열 플러시 완료: {}행 → {}",
            self.series.len(),
            self.backend.location()
        );
        Ok(())
    }

    /// 샘플 수
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// 비어 있는지
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// 가장 최근 샘플
    pub fn latest(&self) -> Option<&Sample> {
        self.series.last()
    }

    /// 전체 시계열 (오래된 순)
    pub fn samples(&self) -> &[Sample] {
        &self.series
    }

    /// 처리량이 기록된 가장 최근 샘플
    pub fn latest_throughput(&self) -> Option<(&Sample, Throughput)> {
        self.series
            .iter()
            .rev()
            .find_map(|s| s.throughput().map(|t| (s, t)))
    }

    /// 백엔드 위치 (로그용)
    pub fn location(&self) -> String {
        self.backend.location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteSeriesStore;
    use assert_matches::assert_matches;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_714_521_600 + secs, 0).unwrap()
    }

    fn ping_only(timestamp: DateTime<Utc>) -> Sample {
        Sample {
            timestamp,
            download_speed: None,
            upload_speed: None,
            ping: Some(12.0),
            jitter: Some(1.0),
            packet_loss: 0.0,
        }
    }

    /// 실패 스위치가 있는 백엔드
    struct FlakyBackend {
        fail: Arc<AtomicBool>,
    }

    impl SeriesBackend for FlakyBackend {
        fn load(&self) -> Result<Vec<Sample>, CoreError> {
            Ok(Vec::new())
        }

        fn persist(&mut self, _series: &[Sample]) -> Result<(), CoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Storage("디스크 가득 참".to_string()));
            }
            Ok(())
        }

        fn location(&self) -> String {
            "flaky".to_string()
        }
    }

    fn memory_store() -> MetricsStore {
        MetricsStore::open(Box::new(SqliteSeriesStore::open_in_memory().unwrap())).unwrap()
    }

    #[test]
    fn append_grows_series() {
        let mut store = memory_store();
        assert!(store.is_empty());

        for i in 0..3 {
            store.append(ping_only(at(i))).unwrap();
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.latest().unwrap().timestamp, at(2));
    }

    #[test]
    fn timestamp_never_decreases() {
        let mut store = memory_store();
        store.append(ping_only(at(10))).unwrap();
        let appended = store.append(ping_only(at(5))).unwrap();
        assert_eq!(appended.timestamp, at(10));

        let stamps: Vec<_> = store.samples().iter().map(|s| s.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn timestamp_truncated_to_microseconds() {
        let mut store = memory_store();
        let t = at(0) + Duration::nanoseconds(1_234_567);
        let appended = store.append(ping_only(t)).unwrap();
        assert_eq!(appended.timestamp, at(0) + Duration::microseconds(1_234));
    }

    #[test]
    fn latest_throughput_skips_ping_only_samples() {
        let mut store = memory_store();
        assert!(store.latest_throughput().is_none());

        let throughput = Throughput {
            download_mbps: 95.0,
            upload_mbps: 20.0,
        };
        store
            .append(Sample::new(at(0), Some(throughput), None))
            .unwrap();
        store.append(ping_only(at(1))).unwrap();
        store.append(ping_only(at(2))).unwrap();

        let (sample, found) = store.latest_throughput().unwrap();
        assert_eq!(sample.timestamp, at(0));
        assert_eq!(found, throughput);
    }

    #[test]
    fn persist_failure_is_returned_and_rolled_back() {
        let fail = Arc::new(AtomicBool::new(false));
        let backend = FlakyBackend { fail: fail.clone() };
        let mut store = MetricsStore::open(Box::new(backend)).unwrap();

        store.append(ping_only(at(0))).unwrap();
        fail.store(true, Ordering::SeqCst);

        assert_matches!(store.append(ping_only(at(1))), Err(CoreError::Storage(_)));
        assert_eq!(store.len(), 1);
        assert_matches!(store.flush(), Err(CoreError::Storage(_)));
    }

    #[test]
    fn open_loads_existing_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.parquet");

        {
            let mut store = MetricsStore::open(crate::open_backend(&path).unwrap()).unwrap();
            store.append(ping_only(at(0))).unwrap();
            store.append(ping_only(at(1))).unwrap();
        }

        let store = MetricsStore::open(crate::open_backend(&path).unwrap()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.latest().unwrap().timestamp, at(1));
    }
}
