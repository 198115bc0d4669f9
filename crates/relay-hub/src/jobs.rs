//! 허브의 폴링 작업.
//!
//! 시세 브로드캐스트와 잔고 사이클은 순차 폴링 스케줄러 위에서
//! 돕니다. 스케줄러의 실패 정책에 따라 한 작업이 실패하면 그
//! 작업만 조용히 멈추고, 포트 입장에서는 해당 갱신이 더 오지
//! 않을 뿐입니다.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use relay_core::protocol::{BalanceUpdate, ServerFrame};
use relay_core::types::{BalanceKey, BalanceSet, FeedFamily, PriceMap};
use relay_source::error::SourceResult;
use relay_source::feeds::{BalanceFeed, PriceFeed};
use relay_source::scheduler::PollJob;

use crate::service::SharedInterests;

/// 한 패밀리의 시세를 폴링해 브로드캐스트하는 작업.
pub struct PriceBroadcastJob {
    feed: Arc<dyn PriceFeed>,
    family: FeedFamily,
    updates: broadcast::Sender<ServerFrame>,
    name: String,
}

impl PriceBroadcastJob {
    /// 새 시세 브로드캐스트 작업을 생성합니다.
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        family: FeedFamily,
        updates: broadcast::Sender<ServerFrame>,
    ) -> Self {
        Self {
            feed,
            family,
            updates,
            name: format!("{}_price", family),
        }
    }
}

#[async_trait]
impl PollJob for PriceBroadcastJob {
    type Output = PriceMap;

    fn name(&self) -> &str {
        &self.name
    }

    async fn request(&mut self) -> SourceResult<PriceMap> {
        self.feed.fetch_prices().await
    }

    fn apply(&mut self, batch: PriceMap) {
        let frame = ServerFrame::price(self.family, batch);
        // 구독 포트가 아직 없으면 무시한다
        if self.updates.send(frame).is_err() {
            debug!(family = %self.family, "수신 포트 없음, 시세 브로드캐스트 생략");
        }
    }
}

/// 모든 포트 관심의 합집합을 순회 조회하는 잔고 사이클 작업.
pub struct BalanceCycleJob {
    feed: Arc<dyn BalanceFeed>,
    interests: SharedInterests,
    updates: broadcast::Sender<ServerFrame>,
}

impl BalanceCycleJob {
    /// 새 잔고 사이클 작업을 생성합니다.
    pub fn new(
        feed: Arc<dyn BalanceFeed>,
        interests: SharedInterests,
        updates: broadcast::Sender<ServerFrame>,
    ) -> Self {
        Self {
            feed,
            interests,
            updates,
        }
    }
}

#[async_trait]
impl PollJob for BalanceCycleJob {
    type Output = Vec<(BalanceKey, BalanceSet)>;

    fn name(&self) -> &str {
        "balance_cycle"
    }

    async fn request(&mut self) -> SourceResult<Self::Output> {
        // 사이클 시작 시점의 합집합 스냅샷을 순차 조회한다
        let keys = self.interests.union();
        let mut results = Vec::with_capacity(keys.len());

        for key in keys {
            let balances = self.feed.fetch_balances(&key).await?;
            results.push((key, balances));
        }

        Ok(results)
    }

    fn apply(&mut self, output: Self::Output) {
        debug!(keys = output.len(), "잔고 사이클 브로드캐스트");
        for (key, balances) in output {
            let frame = ServerFrame::Balance(BalanceUpdate::new(key, balances));
            if self.updates.send(frame).is_err() {
                debug!("수신 포트 없음, 잔고 브로드캐스트 생략");
            }
        }
    }
}
