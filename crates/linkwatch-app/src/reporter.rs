//! 최신 샘플 콘솔 출력.
//!
//! 화면을 지우고 가장 최근 샘플을 사람이 읽는 형식으로 보여준다.
//! 줄 구성은 [`ReportView::render_lines`]에 모여 있어 터미널 없이 검증된다.

use chrono::{DateTime, Local, TimeZone, Utc};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use linkwatch_core::models::sample::{Sample, Throughput};
use linkwatch_storage::MetricsStore;
use std::fmt::Display;
use std::io::{self, Stdout, Write};

/// 출력 한 번에 필요한 정보
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    /// 시계열 전체 샘플 수
    pub total: usize,
    /// 가장 최근 샘플
    pub latest: Sample,
    /// 마지막으로 성공한 처리량 측정 (시각, 값)
    pub last_throughput: Option<(DateTime<Utc>, Throughput)>,
}

impl ReportView {
    /// 저장소 상태로 생성 (비어 있으면 None)
    pub fn from_store(store: &MetricsStore) -> Option<Self> {
        let latest = store.latest()?.clone();
        let last_throughput = store
            .latest_throughput()
            .map(|(sample, throughput)| (sample.timestamp, throughput));

        Some(Self {
            total: store.len(),
            latest,
            last_throughput,
        })
    }

    /// 로컬 시간대로 출력 줄 구성
    pub fn render_lines(&self) -> Vec<String> {
        self.render_lines_in(&Local)
    }

    /// 지정 시간대로 출력 줄 구성
    pub fn render_lines_in<Tz>(&self, tz: &Tz) -> Vec<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let latest = &self.latest;
        let mut lines = vec![
            format!(
                "=== Latest Internet Connection Stats (Total Logs: {}) ===",
                self.total
            ),
            format!(
                "Timestamp: {}",
                latest.timestamp.with_timezone(tz).format("%Y-%m-%d %H:%M:%S")
            ),
        ];

        match latest.throughput() {
            Some(t) => {
                lines.push(format!("Download Speed: {:.2} Mbps", t.download_mbps));
                lines.push(format!("Upload Speed: {:.2} Mbps", t.upload_mbps));
            }
            None => match &self.last_throughput {
                Some((at, t)) => lines.push(format!(
                    "Speed test pending... (last: {:.2} / {:.2} Mbps at {})",
                    t.download_mbps,
                    t.upload_mbps,
                    at.with_timezone(tz).format("%H:%M:%S")
                )),
                None => lines.push("Speed test pending...".to_string()),
            },
        }

        match (latest.ping, latest.jitter) {
            (Some(ping), jitter) => {
                lines.push(format!("Ping: {ping:.2} ms"));
                lines.push(format!("Jitter: {:.2} ms", jitter.unwrap_or(0.0)));
                lines.push(format!("Packet Loss: {:.2}%", latest.packet_loss));
            }
            (None, _) => lines.push(format!(
                "Ping measurement failed (Packet Loss: {:.2}%)",
                latest.packet_loss
            )),
        }

        lines
    }
}

/// 최신 샘플 출력 대상
pub trait Reporter: Send {
    /// 한 틱의 결과 출력
    fn report(&mut self, view: &ReportView) -> io::Result<()>;
}

/// 터미널 출력 — `Reporter` 구현
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
    clear_screen: bool,
}

impl ConsoleReporter<Stdout> {
    /// 표준 출력, 매번 화면 지움
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    /// 임의 출력 대상으로 생성
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    /// 출력 대상 반환
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn report(&mut self, view: &ReportView) -> io::Result<()> {
        if self.clear_screen {
            execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        for line in view.render_lines() {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }
}
