//! 허브와 포트 사이의 와이어 프로토콜.
//!
//! 모든 프레임은 `{"type": ..., "data": ...}` 형태의 타입 지정 봉투로
//! 직렬화됩니다. 프로토콜 버전은 프레임이 아닌 링크 개설 시점에
//! 협상됩니다 ([`crate::link::PortLink::protocol_version`]).

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};
use crate::types::{BalanceKey, BalanceSet, FeedFamily, PriceMap};

/// 현재 와이어 프로토콜 버전.
///
/// 허브가 발급하는 모든 링크에 이 버전이 찍히며, 포트는
/// 버전이 다른 링크를 거부합니다.
pub const PROTOCOL_VERSION: u16 = 1;

/// 한 잔고 키의 갱신 내용.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// 지갑/계정 주소
    pub address: String,
    /// 잔고가 속한 프로토콜
    pub protocol: crate::types::ProtocolId,
    /// 자산별 잔고
    pub balances: BalanceSet,
}

impl BalanceUpdate {
    /// 잔고 키와 잔고 집합으로 갱신을 생성합니다.
    pub fn new(key: BalanceKey, balances: BalanceSet) -> Self {
        Self {
            address: key.address,
            protocol: key.protocol,
            balances,
        }
    }

    /// 이 갱신이 속한 잔고 키를 반환합니다.
    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            address: self.address.clone(),
            protocol: self.protocol.clone(),
        }
    }
}

/// 포트 -> 허브 인바운드 프레임.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    /// 잔고 관심 선언. 항상 전체 교체 목록이며 증분이 아닙니다.
    TrackBalances(Vec<BalanceKey>),
}

impl ClientFrame {
    /// 관심 선언 프레임을 생성합니다.
    pub fn track(keys: Vec<BalanceKey>) -> Self {
        Self::TrackBalances(keys)
    }

    /// 와이어 타입 문자열을 반환합니다.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientFrame::TrackBalances(_) => "track_balances",
        }
    }

    /// JSON 문자열로 직렬화합니다.
    pub fn to_json(&self) -> RelayResult<String> {
        serde_json::to_string(self).map_err(RelayError::from)
    }

    /// JSON 문자열에서 역직렬화합니다.
    pub fn from_json(json: &str) -> RelayResult<Self> {
        serde_json::from_str(json).map_err(RelayError::from)
    }
}

/// 허브 -> 포트 아웃바운드 프레임.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    /// 기본 패밀리 시세 배치
    PrimaryPrice(PriceMap),
    /// 보조 패밀리 시세 배치
    SecondaryPrice(PriceMap),
    /// 한 잔고 키의 갱신
    Balance(BalanceUpdate),
}

impl ServerFrame {
    /// 패밀리에 해당하는 시세 프레임을 생성합니다.
    pub fn price(family: FeedFamily, prices: PriceMap) -> Self {
        match family {
            FeedFamily::Primary => Self::PrimaryPrice(prices),
            FeedFamily::Secondary => Self::SecondaryPrice(prices),
        }
    }

    /// 와이어 타입 문자열을 반환합니다.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerFrame::PrimaryPrice(_) => "primary_price",
            ServerFrame::SecondaryPrice(_) => "secondary_price",
            ServerFrame::Balance(_) => "balance",
        }
    }

    /// JSON 문자열로 직렬화합니다.
    pub fn to_json(&self) -> RelayResult<String> {
        serde_json::to_string(self).map_err(RelayError::from)
    }

    /// JSON 문자열에서 역직렬화합니다.
    pub fn from_json(json: &str) -> RelayResult<Self> {
        serde_json::from_str(json).map_err(RelayError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_price_frame_wire_shape() {
        let mut prices = PriceMap::new();
        prices.insert("BTC".to_string(), Some(dec!(67000.5)));
        prices.insert("XYZ".to_string(), None);

        let value = serde_json::to_value(ServerFrame::PrimaryPrice(prices)).unwrap();

        assert_eq!(value["type"], "primary_price");
        // Decimal은 문자열로 직렬화되고 가격 없음은 null로 나간다
        assert_eq!(value["data"]["BTC"], "67000.5");
        assert_eq!(value["data"]["XYZ"], serde_json::Value::Null);
    }

    #[test]
    fn test_secondary_price_kind() {
        let frame = ServerFrame::price(FeedFamily::Secondary, PriceMap::new());
        assert_eq!(frame.kind(), "secondary_price");

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "secondary_price");
    }

    #[test]
    fn test_balance_frame_wire_shape() {
        let key = BalanceKey::new("0xabc", "uniswap");
        let mut balances = BalanceSet::new();
        balances.insert("ETH".to_string(), dec!(1.5));

        let frame = ServerFrame::Balance(BalanceUpdate::new(key, balances));
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "balance",
                "data": {
                    "address": "0xabc",
                    "protocol": "UNISWAP",
                    "balances": { "ETH": "1.5" }
                }
            })
        );
    }

    #[test]
    fn test_track_balances_wire_shape() {
        let frame = ClientFrame::track(vec![
            BalanceKey::new("0xabc", "UNISWAP"),
            BalanceKey::new("0xdef", "PERP"),
        ]);
        assert_eq!(frame.kind(), "track_balances");

        // 키 목록이 중간 래핑 없이 data 바로 아래에 온다
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "track_balances",
                "data": [
                    { "address": "0xabc", "protocol": "UNISWAP" },
                    { "address": "0xdef", "protocol": "PERP" }
                ]
            })
        );

        let parsed = ClientFrame::from_json(&frame.to_json().unwrap()).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_balance_update_key() {
        let key = BalanceKey::new("0xabc", "PERP");
        let update = BalanceUpdate::new(key.clone(), BalanceSet::new());
        assert_eq!(update.key(), key);
    }
}
