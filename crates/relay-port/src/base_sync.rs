//! 기본 스냅샷 동기화.
//!
//! 배치 계산된 스냅샷 API를 주기적으로 폴링해 시세 스토어의
//! 기본 계층을 채웁니다. 허브 유무와 무관하게 모든 모드에서
//! 동작합니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use relay_source::error::SourceResult;
use relay_source::scheduler::{spawn_poll, PollHandle, PollJob};
use relay_source::snapshot::SnapshotApi;

use crate::price_book::SharedPriceBook;

/// 기본 스냅샷 폴링 작업.
pub struct BaseSnapshotJob {
    api: Arc<dyn SnapshotApi>,
    book: SharedPriceBook,
}

#[async_trait]
impl PollJob for BaseSnapshotJob {
    type Output = HashMap<String, Decimal>;

    fn name(&self) -> &str {
        "base_snapshot"
    }

    async fn request(&mut self) -> SourceResult<Self::Output> {
        self.api.latest_prices().await
    }

    fn apply(&mut self, output: Self::Output) {
        debug!(symbols = output.len(), "기본 스냅샷 갱신");
        self.book.set_base(output);
    }
}

/// 기본 스냅샷 폴링을 시작합니다.
///
/// 첫 스냅샷은 즉시 가져오고, 이후 `every` 간격으로 반복합니다.
pub fn start_base_sync(
    api: Arc<dyn SnapshotApi>,
    book: SharedPriceBook,
    every: Duration,
) -> PollHandle {
    info!(interval_secs = every.as_secs(), "기본 스냅샷 동기화 시작");
    spawn_poll(BaseSnapshotJob { api, book }, every)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_book::create_price_book;
    use relay_core::types::{FeedPartition, ProtocolId};
    use relay_source::error::SourceError;
    use rust_decimal_macros::dec;

    struct FakeSnapshotApi {
        fail: bool,
    }

    #[async_trait]
    impl SnapshotApi for FakeSnapshotApi {
        async fn latest_prices(&self) -> SourceResult<HashMap<String, Decimal>> {
            if self.fail {
                return Err(SourceError::NetworkError("simulated".to_string()));
            }
            Ok(HashMap::from([("BTC".to_string(), dec!(67000))]))
        }
    }

    #[tokio::test]
    async fn test_first_snapshot_lands_immediately() {
        let book = create_price_book(FeedPartition::default());
        let handle = start_base_sync(
            Arc::new(FakeSnapshotApi { fail: false }),
            book.clone(),
            Duration::from_secs(3600),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;

        // 오버레이가 준비 전이므로 기본 스냅샷 값이 보인다
        assert_eq!(
            book.read(&ProtocolId::new("UNISWAP"), "BTC"),
            Some(dec!(67000))
        );

        handle.stop();
        handle.join().await;
    }

    #[tokio::test]
    async fn test_snapshot_failure_halts_quietly() {
        let book = create_price_book(FeedPartition::default());
        let handle = start_base_sync(
            Arc::new(FakeSnapshotApi { fail: true }),
            book.clone(),
            Duration::from_millis(1),
        );

        // 실패한 루프는 스스로 종료되고 스토어는 비어 있다
        handle.join().await;
        assert_eq!(book.base_len(), 0);
    }
}
