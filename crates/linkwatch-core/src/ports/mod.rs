//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `linkwatch-monitor`, `linkwatch-storage`가 이 trait들을 구현하며,
//! `linkwatch-app`에서 와이어링한다.
//!
//! 프로브 포트는 `async_trait`로 object safety를 보장하고,
//! 저장소 포트는 스케줄러 스레드에서만 호출되는 동기 trait이다.

pub mod probe;
pub mod storage;
