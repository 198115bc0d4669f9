//! 릴레이 시스템의 에러 타입.
//!
//! 이 모듈은 릴레이 시스템 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 릴레이 에러.
#[derive(Debug, Error)]
pub enum RelayError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 채널 에러 (링크 전송 실패)
    #[error("채널 에러: {0}")]
    Channel(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 데이터 소스 에러
    #[error("데이터 소스 에러: {0}")]
    Source(String),

    /// 프로토콜 버전 불일치
    #[error("프로토콜 버전 불일치: 기대 {expected}, 수신 {actual}")]
    VersionMismatch { expected: u16, actual: u16 },

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 릴레이 작업을 위한 Result 타입.
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// 치명적인 에러인지 확인합니다.
    ///
    /// 치명적인 에러는 재시작 없이 복구할 수 없습니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::Config(_) | RelayError::VersionMismatch { .. } | RelayError::Internal(_)
        )
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::Config(err.to_string())
    }
}
