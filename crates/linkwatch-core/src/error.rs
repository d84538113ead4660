//! linkwatch 핵심 에러 타입.
//!
//! - [`CoreError`]: 설정, 저장소 등 치명적일 수 있는 에러. 어댑터 crate는 이 타입으로 매핑한다.
//! - [`ProbeError`]: 측정 프로브 실패. 스케줄러가 틱 안에서 흡수하며 절대 루프를 멈추지 않는다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 영속 저장소 에러 (쓰기 불가, 손상된 파일, 스키마 불일치)
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 프로브 실패 종류.
///
/// 처리량/지연 프로브 경계에서 반환되며, 스케줄러는 종류에 따라
/// 해당 틱의 필드를 비워 두거나 패킷 손실 100%로 기록한다.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// 외부 프로세스 실행 실패
    #[error("프로세스 실행 실패 ({command}): {source}")]
    Spawn {
        /// 실행하려던 명령
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// 외부 프로세스가 0이 아닌 코드로 종료
    #[error("프로세스 비정상 종료 ({command}, code={code:?}): {stderr}")]
    NonZeroExit {
        /// 실행한 명령
        command: String,
        /// 종료 코드 (시그널 종료 시 None)
        code: Option<i32>,
        /// 표준 에러 출력
        stderr: String,
    },

    /// 네트워크 전송 실패 (연결, 상태 코드, 본문 읽기)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 프로브 출력 해석 실패
    #[error("잘못된 프로브 출력: {0}")]
    InvalidOutput(String),

    /// 응답 시간을 하나도 얻지 못함
    #[error("응답 없음: 요청 {requested}회 중 유효한 응답 0회")]
    NoReplies {
        /// 요청한 프로브 횟수
        requested: u32,
    },
}
