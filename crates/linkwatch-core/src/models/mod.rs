//! linkwatch 도메인 모델.
//!
//! 시계열 한 행([`sample::Sample`])과 프로브 결과 타입을 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod latency;
pub mod sample;
