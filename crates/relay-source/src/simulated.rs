//! 시뮬레이션 피드.
//!
//! 외부 엔드포인트 없이 허브와 데모 데몬을 구동하기 위한
//! 인프로세스 피드입니다. 시세는 랜덤 워크를 따르고 잔고는
//! 호출마다 조금씩 증가합니다.

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use relay_core::types::{BalanceKey, BalanceSet, PriceMap};

use crate::error::SourceResult;
use crate::feeds::{BalanceFeed, PriceFeed};

/// 시뮬레이션 피드 설정.
#[derive(Debug, Clone)]
pub struct SimulatedFeedConfig {
    /// 생성할 심볼 목록
    pub symbols: Vec<String>,
    /// 시작 가격
    pub start_price: Decimal,
    /// 1/N 확률로 가격 없음(null)을 내보냄 (0이면 항상 가격 있음)
    pub drop_ratio: u32,
}

impl Default for SimulatedFeedConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC".to_string(), "ETH".to_string(), "SOL".to_string()],
            start_price: Decimal::from(100),
            drop_ratio: 10,
        }
    }
}

/// 랜덤 워크 시세 피드.
pub struct SimulatedPriceFeed {
    config: SimulatedFeedConfig,
    prices: Mutex<HashMap<String, Decimal>>,
}

impl SimulatedPriceFeed {
    /// 새 시뮬레이션 시세 피드를 생성합니다.
    pub fn new(config: SimulatedFeedConfig) -> Self {
        let prices = config
            .symbols
            .iter()
            .map(|s| (s.clone(), config.start_price))
            .collect();

        Self {
            config,
            prices: Mutex::new(prices),
        }
    }
}

impl Default for SimulatedPriceFeed {
    fn default() -> Self {
        Self::new(SimulatedFeedConfig::default())
    }
}

#[async_trait]
impl PriceFeed for SimulatedPriceFeed {
    async fn fetch_prices(&self) -> SourceResult<PriceMap> {
        let mut rng = rand::thread_rng();
        let mut prices = self.prices.lock().unwrap();

        let mut batch = PriceMap::new();
        for (symbol, price) in prices.iter_mut() {
            // 직전 가격에서 최대 +-0.5% 이동
            let bps: i64 = rng.gen_range(-50..=50);
            *price += *price * Decimal::from(bps) / Decimal::from(10_000);

            let dropped =
                self.config.drop_ratio > 0 && rng.gen_ratio(1, self.config.drop_ratio);
            batch.insert(symbol.clone(), if dropped { None } else { Some(*price) });
        }

        Ok(batch)
    }
}

/// 호출마다 잔고가 조금씩 변하는 잔고 피드.
pub struct SimulatedBalanceFeed {
    assets: Vec<String>,
    calls: AtomicU64,
}

impl SimulatedBalanceFeed {
    /// 자산 목록으로 잔고 피드를 생성합니다.
    pub fn new(assets: Vec<String>) -> Self {
        Self {
            assets,
            calls: AtomicU64::new(0),
        }
    }
}

impl Default for SimulatedBalanceFeed {
    fn default() -> Self {
        Self::new(vec!["USDC".to_string(), "ETH".to_string()])
    }
}

#[async_trait]
impl BalanceFeed for SimulatedBalanceFeed {
    async fn fetch_balances(&self, key: &BalanceKey) -> SourceResult<BalanceSet> {
        let tick = self.calls.fetch_add(1, Ordering::Relaxed);

        // 키마다 다른 기준값에서 호출 횟수만큼 증가
        let seed = key
            .cache_key()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_add(b as u64));

        let balances = self
            .assets
            .iter()
            .enumerate()
            .map(|(i, asset)| {
                let amount = Decimal::from(1_000 + seed % 100 + i as u64) + Decimal::from(tick);
                (asset.clone(), amount)
            })
            .collect();

        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_price_feed_covers_all_symbols() {
        let feed = SimulatedPriceFeed::default();
        let batch = feed.fetch_prices().await.unwrap();

        assert_eq!(batch.len(), 3);
        assert!(batch.contains_key("BTC"));
    }

    #[tokio::test]
    async fn test_price_walk_moves() {
        let config = SimulatedFeedConfig {
            symbols: vec!["BTC".to_string()],
            drop_ratio: 0,
            ..Default::default()
        };
        let feed = SimulatedPriceFeed::new(config);

        // drop_ratio 0이면 항상 가격이 있다
        let mut seen = Vec::new();
        for _ in 0..20 {
            let batch = feed.fetch_prices().await.unwrap();
            seen.push(batch["BTC"].unwrap());
        }

        // 20번 내내 같은 값에 머무를 확률은 무시할 수준
        assert!(seen.iter().any(|p| *p != seen[0]));
    }

    #[tokio::test]
    async fn test_balance_feed_distinct_keys() {
        let feed = SimulatedBalanceFeed::default();
        let a = feed
            .fetch_balances(&BalanceKey::new("0xaaaa", "UNISWAP"))
            .await
            .unwrap();
        let b = feed
            .fetch_balances(&BalanceKey::new("0xbbbb", "PERP"))
            .await
            .unwrap();

        assert_eq!(a.len(), 2);
        assert!(a.contains_key("USDC"));
        assert_ne!(a, b);
    }
}
