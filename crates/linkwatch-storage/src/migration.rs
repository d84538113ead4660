//! 스키마 마이그레이션.
//!
//! 버전 기반 SQLite 스키마 관리.

use rusqlite::Connection;
use tracing::{debug, info};

/// 현재 스키마 버전
const CURRENT_VERSION: u32 = 2;

/// 스키마 마이그레이션 실행
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_version(conn)?;
    debug!("현재 스키마 버전: {current}, 목표: {CURRENT_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// 현재 스키마 버전 조회
pub fn get_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    let result: Result<u32, _> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );
    result.or(Ok(0))
}

/// V1: samples 테이블 생성
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V1 실행: samples 테이블");

    conn.execute_batch(
        "
        -- 틱당 한 행 (컬럼 순서는 Parquet 파일과 동일)
        CREATE TABLE IF NOT EXISTS samples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            download_speed REAL,
            upload_speed REAL,
            ping REAL,
            packet_loss REAL NOT NULL,
            jitter REAL
        );

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;

    info!("마이그레이션 V1 완료");
    Ok(())
}

/// V2: 시각 조회 인덱스
fn migrate_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V2 실행: samples.timestamp 인덱스");

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_samples_timestamp ON samples(timestamp);

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;

    info!("마이그레이션 V2 완료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_creates_samples_table() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='samples'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_samples_timestamp'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap(); // 두 번 실행해도 에러 없음

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(get_version(&conn).unwrap(), 2);
    }

    #[test]
    fn upgrade_from_v1_adds_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), 1);

        run_migrations(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), 2);
    }
}
