//! 실시간 시세/잔고 피드 트레이트 및 REST 구현.
//!
//! 허브는 이 트레이트들을 통해서만 외부 피드에 접근합니다.
//! 시세 피드는 패밀리당 하나씩 꽂히며, 잔고 피드는 키 단위로
//! 조회됩니다.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use relay_core::types::{BalanceKey, BalanceSet, PriceMap};

use crate::error::{SourceError, SourceResult};

/// 한 패밀리의 실시간 시세 피드.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// 이 피드가 커버하는 심볼들의 최신 시세 배치를 가져옵니다.
    ///
    /// 값이 `None`인 심볼은 "알려져 있으나 현재 가격 없음"입니다.
    async fn fetch_prices(&self) -> SourceResult<PriceMap>;
}

/// 키 단위 잔고 피드.
#[async_trait]
pub trait BalanceFeed: Send + Sync {
    /// 한 잔고 키의 자산별 잔고를 가져옵니다.
    async fn fetch_balances(&self, key: &BalanceKey) -> SourceResult<BalanceSet>;
}

/// GET 요청을 보내고 JSON 응답을 역직렬화합니다.
async fn get_json<T: DeserializeOwned>(http: &reqwest::Client, url: &str) -> SourceResult<T> {
    debug!(url = %url, "피드 요청");

    let response = http.get(url).send().await?;
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

/// REST 기반 시세 피드.
pub struct RestPriceFeed {
    http: reqwest::Client,
    url: String,
}

impl RestPriceFeed {
    /// 피드 URL과 타임아웃으로 피드를 생성합니다.
    pub fn new(url: impl Into<String>, timeout: Duration) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::from)?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PriceFeed for RestPriceFeed {
    async fn fetch_prices(&self) -> SourceResult<PriceMap> {
        get_json(&self.http, &self.url).await
    }
}

/// REST 기반 잔고 피드.
pub struct RestBalanceFeed {
    http: reqwest::Client,
    base_url: String,
}

impl RestBalanceFeed {
    /// 기본 URL과 타임아웃으로 피드를 생성합니다.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::from)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BalanceFeed for RestBalanceFeed {
    async fn fetch_balances(&self, key: &BalanceKey) -> SourceResult<BalanceSet> {
        let url = format!(
            "{}/balances/{}/{}",
            self.base_url, key.address, key.protocol
        );
        get_json(&self.http, &url).await
    }
}
