//! # linkwatch-storage
//!
//! 시계열 저장소 어댑터.
//! 메모리 시계열과 내구성 있는 백엔드(Parquet 파일 또는 SQLite)를 관리한다.
//!
//! ## 모듈
//! - `metrics_store`: 메모리 시계열 + 추가 시 동기 영속화
//! - `parquet_file`: Parquet 파일 백엔드 (기본, 원자적 전체 덮어쓰기)
//! - `sqlite`: SQLite 백엔드 (트랜잭션 단위 꼬리 추가)
//! - `migration`: SQLite 스키마 마이그레이션

pub mod metrics_store;
pub mod migration;
pub mod parquet_file;
pub mod sqlite;

use linkwatch_core::error::CoreError;
use linkwatch_core::ports::storage::SeriesBackend;
use std::path::Path;

pub use metrics_store::MetricsStore;
pub use parquet_file::ParquetSeriesFile;
pub use sqlite::SqliteSeriesStore;

/// 저장 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    /// Parquet 컬럼형 파일
    Parquet,
    /// SQLite 데이터베이스
    Sqlite,
}

impl StorageFormat {
    /// 확장자로 형식 선택 (알 수 없으면 Parquet)
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("db") | Some("sqlite") | Some("sqlite3") => Self::Sqlite,
            _ => Self::Parquet,
        }
    }
}

/// 경로에 맞는 백엔드 열기
pub fn open_backend(path: &Path) -> Result<Box<dyn SeriesBackend>, CoreError> {
    match StorageFormat::from_path(path) {
        StorageFormat::Parquet => Ok(Box::new(ParquetSeriesFile::new(path))),
        StorageFormat::Sqlite => Ok(Box::new(SqliteSeriesStore::open(path)?)),
    }
}
