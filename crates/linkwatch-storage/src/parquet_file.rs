//! Parquet 파일 백엔드.
//!
//! `SeriesBackend` 포트 구현. 매 영속화마다 전체 시계열을 임시 파일에 쓰고
//! fsync 후 원래 경로로 rename한다. 중간에 죽어도 이전 파일 또는 새 파일 중
//! 하나가 온전히 남는다.

use arrow::array::{ArrayRef, AsArray, Float64Array, RecordBatch, TimestampMicrosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef, TimeUnit, TimestampMicrosecondType};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use linkwatch_core::error::CoreError;
use linkwatch_core::models::latency::FULL_PACKET_LOSS;
use linkwatch_core::models::sample::{Sample, SAMPLE_COLUMNS};
use linkwatch_core::ports::storage::SeriesBackend;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// 타임스탬프 컬럼 타임존
const UTC_TZ: &str = "UTC";

/// Parquet 시계열 파일 — `SeriesBackend` 포트 구현
#[derive(Debug, Clone)]
pub struct ParquetSeriesFile {
    path: PathBuf,
}

impl ParquetSeriesFile {
    /// 파일 경로로 생성 (파일은 첫 영속화 때 만들어진다)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 대상 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 쓰기용 임시 파일 경로 (같은 디렉토리)
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// 고정 컬럼 스키마
pub fn series_schema() -> SchemaRef {
    let [ts, down, up, ping, loss, jitter] = SAMPLE_COLUMNS;
    Arc::new(Schema::new(vec![
        Field::new(
            ts,
            DataType::Timestamp(TimeUnit::Microsecond, Some(UTC_TZ.into())),
            false,
        ),
        Field::new(down, DataType::Float64, true),
        Field::new(up, DataType::Float64, true),
        Field::new(ping, DataType::Float64, true),
        Field::new(loss, DataType::Float64, false),
        Field::new(jitter, DataType::Float64, true),
    ]))
}

/// 시계열 → RecordBatch
fn to_record_batch(series: &[Sample]) -> Result<RecordBatch, CoreError> {
    let timestamps: Vec<i64> = series.iter().map(|s| s.timestamp.timestamp_micros()).collect();
    let float_column = |f: fn(&Sample) -> Option<f64>| -> ArrayRef {
        Arc::new(series.iter().map(f).collect::<Float64Array>())
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone(UTC_TZ)),
        float_column(|s| s.download_speed),
        float_column(|s| s.upload_speed),
        float_column(|s| s.ping),
        float_column(|s| Some(s.packet_loss)),
        float_column(|s| s.jitter),
    ];

    RecordBatch::try_new(series_schema(), columns)
        .map_err(|e| CoreError::Storage(format!("RecordBatch 생성 실패: {e}")))
}

/// 숫자형 컬럼을 Float64로 읽기 (컬럼이 없으면 전부 None)
fn float_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>, CoreError> {
    let Some(column) = batch.column_by_name(name) else {
        return Ok(vec![None; batch.num_rows()]);
    };

    let casted = cast(column, &DataType::Float64)
        .map_err(|e| CoreError::Storage(format!("{name} 컬럼 변환 실패: {e}")))?;
    let values = casted
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| CoreError::Storage(format!("{name} 컬럼이 숫자형이 아님")))?;

    Ok(values.iter().collect())
}

/// 타임스탬프 컬럼 읽기 (단위 무관, 마이크로초로 변환)
///
/// 타임존이 있는 컬럼은 UTC 시각으로, 타임존이 없는 컬럼은 로컬 벽시계 시각으로 읽는다.
/// 타임존 이름은 해석하지 않는다 (값은 이미 UTC 기준).
fn timestamp_values(batch: &RecordBatch) -> Result<Vec<DateTime<Utc>>, CoreError> {
    let name = SAMPLE_COLUMNS[0];
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| CoreError::Storage(format!("{name} 컬럼 없음")))?;

    let zoneless = match column.data_type() {
        DataType::Timestamp(_, tz) => tz.is_none(),
        other => {
            return Err(CoreError::Storage(format!(
                "{name} 컬럼이 타임스탬프가 아님: {other}"
            )))
        }
    };

    let casted = cast(column, &DataType::Timestamp(TimeUnit::Microsecond, None))
        .map_err(|e| CoreError::Storage(format!("{name} 컬럼 변환 실패: {e}")))?;
    let values = casted
        .as_primitive_opt::<TimestampMicrosecondType>()
        .ok_or_else(|| CoreError::Storage(format!("{name} 컬럼이 타임스탬프가 아님")))?;

    values
        .iter()
        .enumerate()
        .map(|(row, micros)| {
            micros
                .and_then(DateTime::from_timestamp_micros)
                .map(|at| if zoneless { local_wall_clock(at.naive_utc()) } else { at })
                .ok_or_else(|| CoreError::Storage(format!("{row}행 타임스탬프가 비었거나 범위 밖")))
        })
        .collect()
}

/// 로컬 벽시계 시각 → UTC (DST 공백 구간은 UTC로 간주)
fn local_wall_clock(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// 배치를 Parquet 형식으로 쓰고 파일 핸들 반환
fn write_batch(
    file: File,
    batch: &RecordBatch,
    props: WriterProperties,
) -> parquet::errors::Result<File> {
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    if batch.num_rows() > 0 {
        writer.write(batch)?;
    }
    writer.into_inner()
}

/// RecordBatch → 샘플
fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Sample>, CoreError> {
    let [_, down, up, ping, loss, jitter] = SAMPLE_COLUMNS;
    let timestamps = timestamp_values(batch)?;
    let downloads = float_values(batch, down)?;
    let uploads = float_values(batch, up)?;
    let pings = float_values(batch, ping)?;
    let losses = float_values(batch, loss)?;
    let jitters = float_values(batch, jitter)?;

    let samples = timestamps
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| Sample {
            timestamp,
            download_speed: downloads[i],
            upload_speed: uploads[i],
            ping: pings[i],
            jitter: jitters[i],
            // 손실률이 비어 있으면 측정 실패로 간주
            packet_loss: losses[i].unwrap_or(FULL_PACKET_LOSS),
        })
        .collect();

    Ok(samples)
}

/// rename 결과가 디스크에 남도록 상위 디렉토리 fsync
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<(), CoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

/// Windows는 디렉토리 핸들 fsync를 지원하지 않는다
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

impl SeriesBackend for ParquetSeriesFile {
    fn load(&self) -> Result<Vec<Sample>, CoreError> {
        if !self.path.exists() {
            debug!("Parquet 파일 없음, 빈 시계열로 시작: {}", self.path.display());
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .and_then(|b| b.build())
            .map_err(|e| {
                CoreError::Storage(format!("Parquet 읽기 실패 ({}): {e}", self.path.display()))
            })?;

        let mut series = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| CoreError::Storage(format!("Parquet 배치 읽기 실패: {e}")))?;
            series.extend(from_record_batch(&batch)?);
        }

        Ok(series)
    }

    fn persist(&mut self, series: &[Sample]) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let batch = to_record_batch(series)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let temp_path = self.temp_path();
        let file = File::create(&temp_path)?;
        let file = match write_batch(file, &batch, props) {
            Ok(file) => file,
            Err(e) => {
                if let Err(rm) = fs::remove_file(&temp_path) {
                    warn!("임시 파일 삭제 실패 ({}): {rm}", temp_path.display());
                }
                return Err(CoreError::Storage(format!("Parquet 쓰기 실패: {e}")));
            }
        };
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        sync_parent_dir(&self.path)?;
        debug!("Parquet 영속화: {}행 → {}", series.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
