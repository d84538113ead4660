//! # linkwatch-app
//!
//! linkwatch 바이너리의 오케스트레이션 계층.
//! 샘플링 스케줄러, 콘솔 리포터, 라이프사이클, 어댑터 조립.

pub mod lifecycle;
pub mod reporter;
pub mod scheduler;
pub mod wiring;
