//! # linkwatch-core
//!
//! linkwatch 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 시계열 샘플, 처리량/지연 결과 (serde Serialize/Deserialize)
//! - [`ports`] — 프로브/저장소 포트 인터페이스
//! - [`latency`] — 플랫폼별 ping 인자 구성과 원시 출력 파서
//! - [`cadence`] — 처리량 프로브 주기 제한
//! - [`clock`] — 단조/벽시계 시각 포트
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체
//! - [`config_manager`] — 설정 파일 관리 (로드/저장)

pub mod cadence;
pub mod clock;
pub mod config;
pub mod config_manager;
pub mod error;
pub mod latency;
pub mod models;
pub mod ports;
