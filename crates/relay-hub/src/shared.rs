//! 공유 릴레이 생성과 단일 인스턴스 보장.
//!
//! 허브는 프로세스 안에서 하나만 띄우는 것이 원칙입니다.
//! `SharedRelayCell`이 최초 요청 시 한 번만 생성하고, 이후 요청은
//! 같은 핸들의 복제본을 받습니다. 능력 검사에 실패하면 셀에는
//! `None`이 남고 호출자는 로컬 폴백으로 동작해야 합니다.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

use relay_core::config::RelayConfig;
use relay_source::feeds::{BalanceFeed, PriceFeed};

use crate::service::{start_relay_hub, HubHandle};

/// 공유 릴레이를 띄울 수 있는 환경인지 검사합니다.
///
/// 현재 기준은 실행 중인 tokio 런타임의 존재입니다.
pub fn shared_capability() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

/// 공유 릴레이 팩토리.
pub struct SharedRelay;

impl SharedRelay {
    /// 능력 검사를 통과하면 허브를 시작하고 핸들을 반환합니다.
    ///
    /// 능력이 없으면 아무것도 시작하지 않고 `None`을 반환합니다.
    /// 호출자는 이 경우 로컬 잔고 서비스로 전환해야 합니다.
    pub fn spawn(
        config: &RelayConfig,
        primary_feed: Arc<dyn PriceFeed>,
        secondary_feed: Option<Arc<dyn PriceFeed>>,
        balance_feed: Arc<dyn BalanceFeed>,
    ) -> Option<HubHandle> {
        if !shared_capability() {
            info!("공유 릴레이 능력 없음, 로컬 모드로 동작");
            return None;
        }

        Some(start_relay_hub(
            config,
            primary_feed,
            secondary_feed,
            balance_feed,
        ))
    }
}

/// 단일 인스턴스 셀.
///
/// 조합 루트가 소유하는 값이며, 모듈 정적 변수가 아닙니다.
/// 첫 `obtain` 호출의 초기화 결과가 이후 모든 호출에 공유됩니다.
#[derive(Default)]
pub struct SharedRelayCell {
    cell: OnceCell<Option<HubHandle>>,
}

impl SharedRelayCell {
    /// 빈 셀을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 핸들을 얻습니다. 최초 호출에서만 `init`이 실행됩니다.
    pub fn obtain<F>(&self, init: F) -> Option<HubHandle>
    where
        F: FnOnce() -> Option<HubHandle>,
    {
        let handle = self.cell.get_or_init(init);
        if handle.is_none() {
            debug!("공유 릴레이 없이 동작 중");
        }
        handle.clone()
    }
}
