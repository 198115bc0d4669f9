//! 잔고 키 및 잔고 집합 정의.
//!
//! 이 모듈은 잔고 도메인 타입을 정의합니다:
//! - `BalanceKey` - (주소, 프로토콜) 복합 키
//! - `BalanceSet` - 한 키의 자산별 잔고
//! - `normalize_interest` - 관심 목록 정규화 (정렬 + 중복 제거)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::market::ProtocolId;

/// 한 잔고 키의 자산 -> 수량 매핑.
pub type BalanceSet = HashMap<String, Decimal>;

/// 잔고 추적의 복합 키.
///
/// 같은 주소가 여러 프로토콜에 잔고를 가질 수 있으므로
/// 주소와 프로토콜이 함께 하나의 키를 구성합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    /// 지갑/계정 주소
    pub address: String,
    /// 잔고가 속한 프로토콜
    pub protocol: ProtocolId,
}

impl BalanceKey {
    /// 새 잔고 키를 생성합니다.
    pub fn new(address: impl Into<String>, protocol: impl Into<ProtocolId>) -> Self {
        Self {
            address: address.into(),
            protocol: protocol.into(),
        }
    }

    /// 캐시 인덱싱용 복합 문자열 키를 반환합니다.
    ///
    /// 주소와 프로토콜을 함께 인코딩하므로 프로토콜이 다른
    /// 동일 주소끼리 충돌하지 않습니다.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.address, self.protocol)
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.protocol)
    }
}

/// 관심 목록을 정규화합니다 (정렬 후 중복 제거).
///
/// 순서만 다른 두 목록이 동일한 정규형을 갖게 되어
/// 중복 선언 비교에 사용할 수 있습니다.
pub fn normalize_interest(keys: &mut Vec<BalanceKey>) {
    keys.sort();
    keys.dedup();
}
