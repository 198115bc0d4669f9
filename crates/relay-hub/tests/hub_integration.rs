//! 릴레이 허브 통합 테스트
//!
//! 시뮬레이션 피드 위에서 허브와 포트를 실제로 연결해 팬아웃,
//! 관심 선언, 가시성 게이트, 단일 인스턴스 보장을 검증합니다.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use relay_core::config::RelayConfig;
use relay_core::link::HubConnector;
use relay_core::types::{BalanceKey, FeedPartition, PriceMap, ProtocolId};
use relay_hub::{start_relay_hub, SharedRelay, SharedRelayCell};
use relay_port::{create_balance_book, create_price_book, RelayPort};
use relay_source::error::SourceResult;
use relay_source::feeds::PriceFeed;
use relay_source::simulated::{SimulatedBalanceFeed, SimulatedFeedConfig, SimulatedPriceFeed};

/// 폴링 주기를 테스트용으로 줄인 설정.
///
/// 잔고 사이클 주기는 일부러 길게 두어, 잔고 도착이 주기 폴링이
/// 아니라 즉시 조회 경로임을 구분할 수 있게 합니다.
fn fast_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.hub.primary_interval_ms = 10;
    config.hub.secondary_interval_ms = 10;
    config.hub.balance_interval_ms = 5_000;
    config
}

/// null 엔트리 없는 시뮬레이션 시세 피드.
fn steady_price_feed() -> Arc<SimulatedPriceFeed> {
    let config = SimulatedFeedConfig {
        drop_ratio: 0,
        ..SimulatedFeedConfig::default()
    };
    Arc::new(SimulatedPriceFeed::new(config))
}

/// 조건이 참이 될 때까지 최대 1초 재시도합니다.
async fn wait_for<F: Fn() -> bool>(cond: F, what: &str) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

#[tokio::test]
async fn test_price_fanout_reaches_all_ports() {
    let config = fast_config();
    let handle = start_relay_hub(
        &config,
        steady_price_feed(),
        Some(steady_price_feed()),
        Arc::new(SimulatedBalanceFeed::default()),
    );

    let partition = FeedPartition::new(["PERP"]);
    let book_a = create_price_book(partition.clone());
    let book_b = create_price_book(partition);
    let _port_a = RelayPort::attach(&handle, book_a.clone(), create_balance_book())
        .expect("port A should attach");
    let _port_b = RelayPort::attach(&handle, book_b.clone(), create_balance_book())
        .expect("port B should attach");

    assert_eq!(handle.subscriber_count(), 2);

    // 기본 패밀리 시세가 두 포트 모두에 도달한다
    let spot = ProtocolId::new("SPOT");
    wait_for(|| book_a.read(&spot, "BTC").is_some(), "port A primary price").await;
    wait_for(|| book_b.read(&spot, "BTC").is_some(), "port B primary price").await;

    // 보조 프로토콜 읽기는 보조 패밀리 오버레이를 거친다
    let perp = ProtocolId::new("PERP");
    wait_for(|| book_a.read(&perp, "ETH").is_some(), "port A secondary price").await;

    handle.shutdown();
}

#[tokio::test]
async fn test_track_balances_immediate_fetch_and_fanout() {
    let config = fast_config();
    let handle = start_relay_hub(
        &config,
        steady_price_feed(),
        None,
        Arc::new(SimulatedBalanceFeed::default()),
    );

    let balances_a = create_balance_book();
    let balances_b = create_balance_book();
    let port_a = RelayPort::attach(
        &handle,
        create_price_book(FeedPartition::default()),
        balances_a.clone(),
    )
    .expect("port A should attach");
    let _port_b = RelayPort::attach(
        &handle,
        create_price_book(FeedPartition::default()),
        balances_b.clone(),
    )
    .expect("port B should attach");

    let key = BalanceKey::new("0xabc", "UNISWAP");
    let sent = port_a
        .track_balances(vec![key.clone()])
        .await
        .expect("declare should succeed");
    assert!(sent);

    // 잔고 사이클 주기(5초)보다 훨씬 먼저 도달해야 한다 (즉시 조회 경로)
    wait_for(|| balances_a.balance_of(&key).is_some(), "port A balance").await;
    wait_for(|| balances_b.balance_of(&key).is_some(), "port B balance").await;

    // 동일 선언 재전송은 포트에서 걸러진다
    let resent = port_a
        .track_balances(vec![key.clone()])
        .await
        .expect("declare should succeed");
    assert!(!resent);

    handle.shutdown();
}

/// 호출마다 가격이 1씩 커지는 결정적 시세 피드.
struct SteppingPriceFeed {
    tick: AtomicU64,
}

#[async_trait]
impl PriceFeed for SteppingPriceFeed {
    async fn fetch_prices(&self) -> SourceResult<PriceMap> {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst) + 1;
        let mut batch = PriceMap::new();
        batch.insert("BTC".to_string(), Some(Decimal::from(tick)));
        Ok(batch)
    }
}

#[tokio::test]
async fn test_hidden_port_drops_updates_until_next_broadcast() {
    let config = fast_config();
    let handle = start_relay_hub(
        &config,
        Arc::new(SteppingPriceFeed {
            tick: AtomicU64::new(0),
        }),
        None,
        Arc::new(SimulatedBalanceFeed::default()),
    );

    let book = create_price_book(FeedPartition::default());
    let port = RelayPort::attach(&handle, book.clone(), create_balance_book())
        .expect("port should attach");

    let spot = ProtocolId::new("SPOT");
    wait_for(|| book.read(&spot, "BTC").is_some(), "first price").await;

    // 숨김 전환 직후 처리 중이던 프레임이 정리될 시간을 준다
    port.set_foreground(false);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let frozen = book.read(&spot, "BTC").expect("price should be present");

    // 숨김 동안 여러 배치가 지나가도 스토어는 변하지 않는다
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(book.read(&spot, "BTC"), Some(frozen));

    // 복귀 후 다음 브로드캐스트가 자연히 재동기화한다
    port.set_foreground(true);
    wait_for(|| book.read(&spot, "BTC") != Some(frozen), "resync after refocus").await;

    handle.shutdown();
}

#[tokio::test]
async fn test_shared_cell_yields_one_hub() {
    let config = fast_config();
    let cell = SharedRelayCell::new();
    let inits = AtomicUsize::new(0);

    let make = |cfg: &RelayConfig| {
        SharedRelay::spawn(
            cfg,
            steady_price_feed(),
            None,
            Arc::new(SimulatedBalanceFeed::default()),
        )
    };

    let first = cell
        .obtain(|| {
            inits.fetch_add(1, Ordering::SeqCst);
            make(&config)
        })
        .expect("hub should start inside a runtime");
    let second = cell
        .obtain(|| {
            inits.fetch_add(1, Ordering::SeqCst);
            make(&config)
        })
        .expect("cell should return the shared handle");

    // 초기화는 단 한 번
    assert_eq!(inits.load(Ordering::SeqCst), 1);

    // 두 핸들이 같은 허브를 가리킨다
    let _port_a = RelayPort::attach(
        &first,
        create_price_book(FeedPartition::default()),
        create_balance_book(),
    )
    .expect("port should attach");
    let _port_b = RelayPort::attach(
        &second,
        create_price_book(FeedPartition::default()),
        create_balance_book(),
    )
    .expect("port should attach");
    assert_eq!(first.subscriber_count(), 2);
    assert_eq!(second.subscriber_count(), 2);

    first.shutdown();
}

#[tokio::test]
async fn test_shutdown_rejects_new_ports() {
    let config = fast_config();
    let handle = start_relay_hub(
        &config,
        steady_price_feed(),
        None,
        Arc::new(SimulatedBalanceFeed::default()),
    );
    assert!(handle.is_available());

    handle.shutdown();
    assert!(!handle.is_available());

    // 종료된 허브에는 새 포트가 붙지 못한다
    let attached = RelayPort::attach(
        &handle,
        create_price_book(FeedPartition::default()),
        create_balance_book(),
    );
    assert!(attached.is_none());
}
