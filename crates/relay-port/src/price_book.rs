//! 시세 읽기 병합 스토어.
//!
//! 배치 계산된 기본 스냅샷 위에 패밀리별 실시간 오버레이를 얹고,
//! 읽기 시점에 인스트루먼트 단위로 병합합니다. 우선순위는
//! 오버레이(패밀리 준비됨 + 값 있음) -> 기본 스냅샷 -> 없음이며,
//! 한 번의 읽기 패스 안에서 인스트루먼트마다 출처가 달라도
//! 정상입니다.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use relay_core::types::{FeedFamily, FeedPartition, PriceMap, ProtocolId};

/// 한 패밀리의 오버레이 상태.
#[derive(Debug, Default)]
struct OverlayState {
    /// 마지막 배치 (배치 단위로 통째로 교체됨)
    prices: PriceMap,
    /// 준비 플래그. false인 동안은 값이 있어도 신뢰하지 않음
    ready: bool,
}

/// 내부 상태.
#[derive(Debug, Default)]
struct PriceBookState {
    base: HashMap<String, Decimal>,
    primary: OverlayState,
    secondary: OverlayState,
}

impl PriceBookState {
    fn overlay(&self, family: FeedFamily) -> &OverlayState {
        match family {
            FeedFamily::Primary => &self.primary,
            FeedFamily::Secondary => &self.secondary,
        }
    }

    fn overlay_mut(&mut self, family: FeedFamily) -> &mut OverlayState {
        match family {
            FeedFamily::Primary => &mut self.primary,
            FeedFamily::Secondary => &mut self.secondary,
        }
    }
}

/// 기본 스냅샷 + 오버레이 시세 스토어.
///
/// 짧은 비동기 없는 임계 구역만 가지므로 내부적으로 std RwLock을
/// 사용합니다. `SharedPriceBook`으로 공유하세요.
#[derive(Debug)]
pub struct PriceBook {
    partition: FeedPartition,
    inner: RwLock<PriceBookState>,
}

/// 공유 시세 스토어 타입.
pub type SharedPriceBook = Arc<PriceBook>;

/// 새 공유 시세 스토어를 생성합니다.
pub fn create_price_book(partition: FeedPartition) -> SharedPriceBook {
    Arc::new(PriceBook::new(partition))
}

impl PriceBook {
    /// 피드 분할로 스토어를 생성합니다.
    pub fn new(partition: FeedPartition) -> Self {
        Self {
            partition,
            inner: RwLock::new(PriceBookState::default()),
        }
    }

    /// 인스트루먼트 하나의 현재 가격을 읽습니다.
    ///
    /// 소유 프로토콜의 패밀리 오버레이가 준비되어 있고 값이 있으면
    /// 오버레이 값을, 아니면 기본 스냅샷 값을, 둘 다 없으면 `None`을
    /// 반환합니다.
    pub fn read(&self, protocol: &ProtocolId, symbol: &str) -> Option<Decimal> {
        let inner = self.inner.read().unwrap();
        let overlay = inner.overlay(self.partition.family_for(protocol));

        if overlay.ready {
            if let Some(Some(price)) = overlay.prices.get(symbol) {
                return Some(*price);
            }
        }

        inner.base.get(symbol).copied()
    }

    /// 기본 스냅샷을 통째로 교체합니다.
    pub fn set_base(&self, snapshot: HashMap<String, Decimal>) {
        let mut inner = self.inner.write().unwrap();
        inner.base = snapshot;
    }

    /// 한 패밀리의 오버레이를 배치 단위로 통째로 교체합니다.
    ///
    /// 배치는 하나의 쓰기 잠금 아래에서 원자적으로 적용되며,
    /// 부분 적용 상태가 관찰되지 않습니다.
    pub fn apply_overlay(&self, family: FeedFamily, batch: PriceMap) {
        let mut inner = self.inner.write().unwrap();
        inner.overlay_mut(family).prices = batch;
    }

    /// 패밀리 준비 플래그를 설정합니다.
    pub fn set_ready(&self, family: FeedFamily, ready: bool) {
        let mut inner = self.inner.write().unwrap();
        inner.overlay_mut(family).ready = ready;
    }

    /// 패밀리 준비 여부를 반환합니다.
    pub fn is_ready(&self, family: FeedFamily) -> bool {
        self.inner.read().unwrap().overlay(family).ready
    }

    /// 기본 스냅샷에 있는 심볼 수를 반환합니다.
    pub fn base_len(&self) -> usize {
        self.inner.read().unwrap().base.len()
    }
}
