//! 시계열 영속 저장소 포트.
//!
//! 구현: `linkwatch-storage` crate (Parquet 파일, SQLite)

use crate::error::CoreError;
use crate::models::sample::Sample;

/// 시계열 영속 백엔드
///
/// 메모리 시계열의 전체 내용을 내구성 있게 보관한다.
/// 호출은 스케줄러 스레드 하나에서만 일어난다.
pub trait SeriesBackend: Send {
    /// 저장된 시계열 전체 로드 (저장소가 없으면 빈 목록)
    fn load(&self) -> Result<Vec<Sample>, CoreError>;

    /// 저장소 내용을 `series`와 동일하게 만든다
    ///
    /// 중간에 중단되어도 이전 내용 또는 새 내용 중 하나만 남아야 한다.
    fn persist(&mut self, series: &[Sample]) -> Result<(), CoreError>;

    /// 로그용 저장소 위치
    fn location(&self) -> String;
}
