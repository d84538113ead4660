//! # linkwatch-monitor
//!
//! 측정 프로브 어댑터.
//! 외부 측정 수단(시스템 ping, speedtest-cli, HTTP 전송)을
//! `linkwatch-core` 프로브 포트 뒤로 감싼다.
//!
//! ## 모듈
//! - `ping`: 시스템 ping 프로세스 (`LatencyProbe` 구현)
//! - `speedtest`: speedtest-cli JSON 출력 (`ThroughputProbe` 구현)
//! - `http_throughput`: HTTP 다운로드/업로드 시간 측정 (`ThroughputProbe` 구현)

pub mod http_throughput;
pub mod ping;
pub mod speedtest;

mod process;
