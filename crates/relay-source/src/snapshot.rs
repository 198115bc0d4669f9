//! 기본 스냅샷 API 클라이언트.
//!
//! 실시간 피드와 별개로, 배치 계산된 최신 시세 스냅샷을 REST로
//! 가져옵니다. 모든 심볼을 한 번에 반환하며 값은 널이 아닙니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use relay_core::config::SnapshotConfig;

use crate::error::{SourceError, SourceResult};

/// 기본 스냅샷 제공자.
#[async_trait]
pub trait SnapshotApi: Send + Sync {
    /// 모든 심볼의 최신 배치 시세를 가져옵니다.
    async fn latest_prices(&self) -> SourceResult<HashMap<String, Decimal>>;
}

/// REST 기반 스냅샷 클라이언트.
pub struct RestSnapshotClient {
    http: reqwest::Client,
    base_url: String,
    endpoint: String,
}

impl RestSnapshotClient {
    /// 설정에서 클라이언트를 생성합니다.
    pub fn new(config: &SnapshotConfig) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(SourceError::from)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoint: config.endpoint.clone(),
        })
    }

    /// GET 요청을 보내고 JSON 응답을 역직렬화합니다.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SourceResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "스냅샷 요청");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl SnapshotApi for RestSnapshotClient {
    async fn latest_prices(&self) -> SourceResult<HashMap<String, Decimal>> {
        self.get_json(&self.endpoint).await
    }
}
