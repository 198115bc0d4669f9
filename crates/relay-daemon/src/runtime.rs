//! 데몬 구성 루트.
//!
//! 설정에 따라 REST 또는 시뮬레이션 피드를 만들고, 공유 허브와
//! 대시보드 포트 하나를 연결합니다. 허브를 띄울 수 없으면 포트
//! 로컬 잔고 폴링으로 내려갑니다. 기본 스냅샷 동기화는 모드와
//! 무관하게 항상 돕니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use relay_core::config::RelayConfig;
use relay_core::types::BalanceKey;
use relay_hub::{HubHandle, SharedRelay, SharedRelayCell};
use relay_port::{
    create_balance_book, create_price_book, start_base_sync, start_local_balance_service,
    RelayPort, SharedBalanceBook, SharedPriceBook,
};
use relay_source::feeds::{BalanceFeed, PriceFeed, RestBalanceFeed, RestPriceFeed};
use relay_source::simulated::{SimulatedBalanceFeed, SimulatedPriceFeed};
use relay_source::snapshot::{RestSnapshotClient, SnapshotApi};

use crate::stats::RelayStatus;

/// 상태 로그 주기.
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// 허브에 공급할 피드 묶음.
struct FeedSet {
    primary: Arc<dyn PriceFeed>,
    secondary: Option<Arc<dyn PriceFeed>>,
    balance: Arc<dyn BalanceFeed>,
}

/// 설정의 엔드포인트로 REST 피드 묶음을 만듭니다.
fn build_rest_feeds(config: &RelayConfig) -> anyhow::Result<FeedSet> {
    let timeout = config.feeds.request_timeout();

    let primary: Arc<dyn PriceFeed> = Arc::new(
        RestPriceFeed::new(config.feeds.primary_url.clone(), timeout)
            .context("기본 시세 피드 생성 실패")?,
    );

    let secondary: Option<Arc<dyn PriceFeed>> = match &config.feeds.secondary_url {
        Some(url) => Some(Arc::new(
            RestPriceFeed::new(url.clone(), timeout).context("보조 시세 피드 생성 실패")?,
        )),
        None => None,
    };

    let balance: Arc<dyn BalanceFeed> = Arc::new(
        RestBalanceFeed::new(config.feeds.balance_url.clone(), timeout)
            .context("잔고 피드 생성 실패")?,
    );

    Ok(FeedSet {
        primary,
        secondary,
        balance,
    })
}

/// 외부 연결 없이 도는 시뮬레이션 피드 묶음을 만듭니다.
fn build_simulated_feeds() -> FeedSet {
    FeedSet {
        primary: Arc::new(SimulatedPriceFeed::default()),
        secondary: Some(Arc::new(SimulatedPriceFeed::default())),
        balance: Arc::new(SimulatedBalanceFeed::default()),
    }
}

/// "address:protocol" 쉼표 구분 목록을 잔고 키로 파싱합니다.
fn parse_track_list(raw: &str) -> anyhow::Result<Vec<BalanceKey>> {
    let mut keys = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (address, protocol) = entry
            .split_once(':')
            .with_context(|| format!("잘못된 관심 키 형식: {}", entry))?;
        keys.push(BalanceKey::new(address, protocol));
    }
    Ok(keys)
}

/// 현재 런타임 상태를 수집합니다.
fn collect_status(
    hub: Option<&HubHandle>,
    price_book: &SharedPriceBook,
    balance_book: &SharedBalanceBook,
) -> RelayStatus {
    RelayStatus {
        shared: hub.is_some(),
        subscribers: hub.map(|h| h.subscriber_count()).unwrap_or(0),
        base_entries: price_book.base_len(),
        cached_balances: balance_book.cached_len(),
        tracked_keys: balance_book.interest().len(),
    }
}

/// 데몬 모드 본체.
///
/// ctrl-c를 받을 때까지 주기적으로 상태를 기록합니다.
pub async fn run_daemon(
    config: RelayConfig,
    simulate: bool,
    track: Option<String>,
) -> anyhow::Result<()> {
    let started_at = Utc::now();

    let feeds = if simulate {
        info!("시뮬레이션 피드로 실행");
        build_simulated_feeds()
    } else {
        build_rest_feeds(&config)?
    };

    // 공유 허브는 프로세스당 하나
    let cell = SharedRelayCell::new();
    let hub = cell.obtain(|| {
        SharedRelay::spawn(
            &config,
            feeds.primary.clone(),
            feeds.secondary.clone(),
            feeds.balance.clone(),
        )
    });

    // 대시보드 포트 하나가 쓰는 로컬 스토어
    let price_book = create_price_book(config.partition());
    let balance_book = create_balance_book();

    // 기본 스냅샷 동기화는 허브 유무와 무관하게 항상 돈다
    let snapshot_api: Arc<dyn SnapshotApi> = Arc::new(
        RestSnapshotClient::new(&config.snapshot).context("스냅샷 클라이언트 생성 실패")?,
    );
    let base_handle = start_base_sync(
        snapshot_api,
        price_book.clone(),
        config.snapshot.poll_interval(),
    );

    let port = hub
        .as_ref()
        .and_then(|handle| RelayPort::attach(handle, price_book.clone(), balance_book.clone()));

    // 허브가 없으면 포트 로컬 잔고 폴링으로 내려간다
    let local_handle = if port.is_none() {
        warn!("공유 허브 없음, 로컬 모드로 동작");
        Some(start_local_balance_service(
            feeds.balance.clone(),
            balance_book.clone(),
            config.hub.balance_interval(),
        ))
    } else {
        None
    };

    // 관심 키 선언. 로컬 스토어가 기준이고, 포트가 있으면 허브에도 알린다
    if let Some(raw) = track.as_deref() {
        let keys = parse_track_list(raw)?;
        info!(keys = keys.len(), "잔고 관심 선언");
        balance_book.set_interest(keys.clone());
        if let Some(port) = &port {
            port.track_balances(keys).await?;
        }
    }

    info!("릴레이 데몬 시작 완료");

    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("종료 신호 수신, 데몬 종료 중");
                break;
            }
            _ = status.tick() => {
                collect_status(hub.as_ref(), &price_book, &balance_book).log_summary(started_at);
            }
        }
    }

    base_handle.stop();
    if let Some(handle) = &local_handle {
        handle.stop();
    }
    if let Some(hub) = &hub {
        hub.shutdown();
    }

    base_handle.join().await;
    if let Some(handle) = local_handle {
        handle.join().await;
    }

    info!("릴레이 데몬 종료");
    Ok(())
}

/// 스냅샷 엔드포인트를 한 번 조회해 요약을 출력합니다.
pub async fn run_snapshot(config: RelayConfig) -> anyhow::Result<()> {
    let client =
        RestSnapshotClient::new(&config.snapshot).context("스냅샷 클라이언트 생성 실패")?;
    let prices = client.latest_prices().await.context("스냅샷 조회 실패")?;

    info!(entries = prices.len(), "기본 스냅샷 수신");

    let mut symbols: Vec<_> = prices.keys().cloned().collect();
    symbols.sort();
    for symbol in symbols.iter().take(10) {
        info!(symbol = %symbol, price = %prices[symbol], "스냅샷 엔트리");
    }
    if symbols.len() > 10 {
        info!("외 {}개 생략", symbols.len() - 10);
    }

    Ok(())
}
