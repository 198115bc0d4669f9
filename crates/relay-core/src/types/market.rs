//! 프로토콜 식별자 및 피드 패밀리 정의.
//!
//! 이 모듈은 시세 도메인 타입을 정의합니다:
//! - `ProtocolId` - 인스트루먼트/잔고가 속한 프로토콜(거래 장소) 식별자
//! - `FeedFamily` - 실시간 오버레이 패밀리 (기본/보조)
//! - `FeedPartition` - 프로토콜을 패밀리에 매핑하는 정적 분할
//! - `PriceMap` - 한 패밀리의 시세 스냅샷 배치

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 한 패밀리의 시세 배치: 심볼 -> 널 허용 가격.
///
/// `None`은 "알려진 심볼이지만 현재 가격 없음"을 의미하며,
/// 읽기 시점에 기본 스냅샷으로 폴백됩니다.
pub type PriceMap = HashMap<String, Option<Decimal>>;

/// 인스트루먼트/잔고가 속한 프로토콜 식별자.
///
/// 항상 대문자로 정규화됩니다. 예: "UNISWAP", "PERP".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(String);

impl ProtocolId {
    /// 새 프로토콜 식별자를 생성합니다.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_uppercase())
    }

    /// 문자열 참조를 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProtocolId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// 실시간 오버레이 패밀리.
///
/// 두 개의 독립적인 실시간 피드가 존재하며, 각 프로토콜은
/// 정확히 하나의 패밀리에 정적으로 속합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFamily {
    /// 기본 피드 (대부분의 프로토콜)
    Primary,
    /// 보조 피드 (설정된 일부 프로토콜만)
    Secondary,
}

impl fmt::Display for FeedFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFamily::Primary => write!(f, "primary"),
            FeedFamily::Secondary => write!(f, "secondary"),
        }
    }
}

/// 프로토콜 -> 패밀리 정적 분할.
///
/// 설정에서 한 번 구성되며 런타임에 재협상되지 않습니다.
/// 보조 목록에 없는 모든 프로토콜은 기본 패밀리에 속합니다.
#[derive(Debug, Clone, Default)]
pub struct FeedPartition {
    secondary: HashSet<ProtocolId>,
}

impl FeedPartition {
    /// 보조 패밀리에 속하는 프로토콜 목록으로 분할을 생성합니다.
    pub fn new<I, P>(secondary_protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProtocolId>,
    {
        Self {
            secondary: secondary_protocols.into_iter().map(Into::into).collect(),
        }
    }

    /// 프로토콜이 속한 오버레이 패밀리를 반환합니다.
    pub fn family_for(&self, protocol: &ProtocolId) -> FeedFamily {
        if self.secondary.contains(protocol) {
            FeedFamily::Secondary
        } else {
            FeedFamily::Primary
        }
    }

    /// 보조 패밀리 프로토콜인지 확인합니다.
    pub fn is_secondary(&self, protocol: &ProtocolId) -> bool {
        self.secondary.contains(protocol)
    }
}

impl From<String> for ProtocolId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
