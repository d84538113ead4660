//! SQLite 시계열 백엔드.
//!
//! `SeriesBackend` 포트 구현. 메모리 시계열이 저장된 행보다 길어진 만큼만
//! 하나의 트랜잭션으로 추가한다. 커밋 전에 죽으면 이전 상태가 유지된다.

use chrono::{DateTime, SecondsFormat, Utc};
use linkwatch_core::error::CoreError;
use linkwatch_core::models::sample::Sample;
use linkwatch_core::ports::storage::SeriesBackend;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::migration;

/// SQLite 시계열 저장소 — `SeriesBackend` 포트 구현
pub struct SqliteSeriesStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteSeriesStore {
    /// 파일 기반 저장소 열기 (없으면 생성)
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        // 커밋마다 디스크 동기화
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=FULL;
            ",
        )
        .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// 인메모리 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self { conn, path: None })
    }

    /// 저장된 행 수
    pub fn row_count(&self) -> Result<usize, CoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))
            .map_err(|e| CoreError::Storage(format!("행 수 조회 실패: {e}")))?;
        Ok(count as usize)
    }
}

/// 저장용 타임스탬프 문자열 (RFC3339, 마이크로초)
fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CoreError::Storage(format!("타임스탬프 파싱 실패 ({raw}): {e}")))
}

impl SeriesBackend for SqliteSeriesStore {
    fn load(&self) -> Result<Vec<Sample>, CoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT timestamp, download_speed, upload_speed, ping, packet_loss, jitter
                 FROM samples ORDER BY id",
            )
            .map_err(|e| CoreError::Storage(format!("조회 준비 실패: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ))
            })
            .map_err(|e| CoreError::Storage(format!("샘플 조회 실패: {e}")))?;

        let mut series = Vec::new();
        for row in rows {
            let (timestamp, download_speed, upload_speed, ping, packet_loss, jitter) =
                row.map_err(|e| CoreError::Storage(format!("행 읽기 실패: {e}")))?;
            series.push(Sample {
                timestamp: decode_timestamp(&timestamp)?,
                download_speed,
                upload_speed,
                ping,
                jitter,
                packet_loss,
            });
        }

        Ok(series)
    }

    fn persist(&mut self, series: &[Sample]) -> Result<(), CoreError> {
        let stored = self.row_count()?;
        if stored > series.len() {
            return Err(CoreError::Storage(format!(
                "저장소가 메모리 시계열보다 김 (저장 {stored}행, 메모리 {}행)",
                series.len()
            )));
        }

        let tail = &series[stored..];
        if tail.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| CoreError::Storage(format!("트랜잭션 시작 실패: {e}")))?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO samples
                     (timestamp, download_speed, upload_speed, ping, packet_loss, jitter)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| CoreError::Storage(format!("삽입 준비 실패: {e}")))?;

            for sample in tail {
                stmt.execute(params![
                    encode_timestamp(&sample.timestamp),
                    sample.download_speed,
                    sample.upload_speed,
                    sample.ping,
                    sample.packet_loss,
                    sample.jitter,
                ])
                .map_err(|e| CoreError::Storage(format!("샘플 삽입 실패: {e}")))?;
            }
        }
        tx.commit()
            .map_err(|e| CoreError::Storage(format!("커밋 실패: {e}")))?;

        debug!("SQLite 영속화: {}행 추가 (총 {}행)", tail.len(), series.len());
        Ok(())
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}
