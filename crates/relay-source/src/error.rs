//! 데이터 소스 에러 타입.

use thiserror::Error;

/// 데이터 소스 관련 에러.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// API 에러 (HTTP 상태 코드)
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 데이터 없음
    #[error("No data: {0}")]
    NoData(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 데이터 소스 작업 Result 타입.
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 폴링 스케줄러 자체는 재시도하지 않으므로, 이 분류는
    /// 재시도를 원하는 호출자의 `request()` 구현에서 사용합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::NetworkError(_) | SourceError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_connect() {
            SourceError::NetworkError(err.to_string())
        } else if err.is_decode() {
            SourceError::ParseError(err.to_string())
        } else {
            SourceError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::ParseError(err.to_string())
    }
}
