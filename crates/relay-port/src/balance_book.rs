//! 잔고 관심 목록 + 잔고 캐시 스토어.
//!
//! 관심 목록은 항상 통째로 교체되고(병합 아님), 잔고 캐시는
//! 비파괴적으로 병합됩니다(키 단위 last-write-wins, 무관한 키
//! 유지). 요청 생명주기 상태(pending 등)는 들고 있지 않습니다.
//! 전송 시점 판단은 전적으로 포트의 몫입니다.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use relay_core::types::{BalanceKey, BalanceSet};

#[derive(Debug, Default)]
struct BalanceBookState {
    /// 이 소비자가 선언한 관심 목록
    interest: Vec<BalanceKey>,
    /// cache_key() -> 최신 잔고
    balances: HashMap<String, BalanceSet>,
}

/// 공유 잔고 스토어.
#[derive(Debug, Default)]
pub struct BalanceBook {
    inner: RwLock<BalanceBookState>,
}

/// 공유 잔고 스토어 타입.
pub type SharedBalanceBook = Arc<BalanceBook>;

/// 새 공유 잔고 스토어를 생성합니다.
pub fn create_balance_book() -> SharedBalanceBook {
    Arc::new(BalanceBook::new())
}

impl BalanceBook {
    /// 빈 스토어를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 관심 목록을 통째로 교체합니다.
    pub fn set_interest(&self, keys: Vec<BalanceKey>) {
        let mut inner = self.inner.write().unwrap();
        inner.interest = keys;
    }

    /// 현재 관심 목록을 반환합니다.
    pub fn interest(&self) -> Vec<BalanceKey> {
        self.inner.read().unwrap().interest.clone()
    }

    /// 한 키의 잔고를 기록합니다 (기존 다른 키는 유지).
    pub fn record_balance(&self, key: &BalanceKey, balances: BalanceSet) {
        let mut inner = self.inner.write().unwrap();
        inner.balances.insert(key.cache_key(), balances);
    }

    /// 여러 키의 잔고를 병합합니다.
    ///
    /// 키 단위 last-write-wins이며 포함되지 않은 키는 건드리지
    /// 않습니다.
    pub fn merge_balances<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (BalanceKey, BalanceSet)>,
    {
        let mut inner = self.inner.write().unwrap();
        for (key, balances) in entries {
            inner.balances.insert(key.cache_key(), balances);
        }
    }

    /// 한 키의 최신 잔고를 반환합니다.
    pub fn balance_of(&self, key: &BalanceKey) -> Option<BalanceSet> {
        self.inner.read().unwrap().balances.get(&key.cache_key()).cloned()
    }

    /// 캐시된 키 수를 반환합니다.
    pub fn cached_len(&self) -> usize {
        self.inner.read().unwrap().balances.len()
    }
}
