//! 성능 저하 모드의 포트 로컬 잔고 폴링.
//!
//! 공유 허브를 만들 수 없는 환경에서는 소비자마다 자기 관심
//! 목록만 직접 폴링합니다. 오버레이 패밀리는 절대 준비 상태가
//! 되지 않으므로 시세 읽기는 기본 스냅샷에 머뭅니다. 이 계층은
//! 에러 상태를 밖으로 드러내지 않습니다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use relay_core::types::{BalanceKey, BalanceSet};
use relay_source::error::SourceResult;
use relay_source::feeds::BalanceFeed;
use relay_source::scheduler::{spawn_poll, PollHandle, PollJob};

use crate::balance_book::SharedBalanceBook;

/// 포트 로컬 잔고 폴링 작업.
///
/// 매 사이클 스토어의 현재 관심 목록을 읽어 그 키들만 조회합니다.
pub struct LocalBalanceJob {
    feed: Arc<dyn BalanceFeed>,
    book: SharedBalanceBook,
}

#[async_trait]
impl PollJob for LocalBalanceJob {
    type Output = Vec<(BalanceKey, BalanceSet)>;

    fn name(&self) -> &str {
        "local_balance"
    }

    async fn request(&mut self) -> SourceResult<Self::Output> {
        let keys = self.book.interest();
        let mut results = Vec::with_capacity(keys.len());

        for key in keys {
            let balances = self.feed.fetch_balances(&key).await?;
            results.push((key, balances));
        }

        Ok(results)
    }

    fn apply(&mut self, output: Self::Output) {
        debug!(keys = output.len(), "로컬 잔고 갱신");
        self.book.merge_balances(output);
    }
}

/// 포트 로컬 잔고 폴링을 시작합니다.
pub fn start_local_balance_service(
    feed: Arc<dyn BalanceFeed>,
    book: SharedBalanceBook,
    every: Duration,
) -> PollHandle {
    info!(
        interval_ms = every.as_millis() as u64,
        "공유 허브 없음, 포트 로컬 잔고 폴링 시작"
    );
    spawn_poll(LocalBalanceJob { feed, book }, every)
}
