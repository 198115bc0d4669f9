//! 설정 관리.
//!
//! 이 모듈은 릴레이 설정을 정의하고 관리합니다.
//! 기본값 -> 설정 파일 -> `RELAY__` 접두사 환경 변수 순서로 적용됩니다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::FeedPartition;

/// 릴레이 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelayConfig {
    /// 기본 스냅샷 수집 설정
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// 공유 허브 설정
    #[serde(default)]
    pub hub: HubConfig,
    /// 피드 엔드포인트 설정
    #[serde(default)]
    pub feeds: FeedConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 기본 스냅샷 수집 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// 스냅샷 API 기본 URL
    pub base_url: String,
    /// 최신 시세 엔드포인트 경로
    pub endpoint: String,
    /// 폴링 간격 (초)
    pub poll_interval_secs: u64,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8600".to_string(),
            endpoint: "/prices/latest".to_string(),
            poll_interval_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl SnapshotConfig {
    /// 폴링 간격을 Duration으로 반환합니다.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// 요청 타임아웃을 Duration으로 반환합니다.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 공유 허브 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubConfig {
    /// 기본 패밀리 시세 폴링 간격 (밀리초)
    pub primary_interval_ms: u64,
    /// 보조 패밀리 시세 폴링 간격 (밀리초)
    pub secondary_interval_ms: u64,
    /// 잔고 사이클 간격 (밀리초)
    pub balance_interval_ms: u64,
    /// 브로드캐스트 채널 용량
    pub broadcast_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            primary_interval_ms: 1_000,
            secondary_interval_ms: 1_000,
            balance_interval_ms: 10_000,
            broadcast_capacity: 1024,
        }
    }
}

impl HubConfig {
    /// 기본 패밀리 폴링 간격을 Duration으로 반환합니다.
    pub fn primary_interval(&self) -> Duration {
        Duration::from_millis(self.primary_interval_ms)
    }

    /// 보조 패밀리 폴링 간격을 Duration으로 반환합니다.
    pub fn secondary_interval(&self) -> Duration {
        Duration::from_millis(self.secondary_interval_ms)
    }

    /// 잔고 사이클 간격을 Duration으로 반환합니다.
    pub fn balance_interval(&self) -> Duration {
        Duration::from_millis(self.balance_interval_ms)
    }
}

/// 피드 엔드포인트 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// 기본 패밀리 시세 피드 URL
    pub primary_url: String,
    /// 보조 패밀리 시세 피드 URL (없으면 보조 패밀리 비활성)
    #[serde(default)]
    pub secondary_url: Option<String>,
    /// 잔고 피드 URL
    pub balance_url: String,
    /// 피드 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 보조 패밀리에 속하는 프로토콜 목록
    #[serde(default)]
    pub secondary_protocols: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            primary_url: "http://127.0.0.1:8601".to_string(),
            secondary_url: None,
            balance_url: "http://127.0.0.1:8602".to_string(),
            request_timeout_secs: 10,
            secondary_protocols: Vec::new(),
        }
    }
}

impl FeedConfig {
    /// 피드 요청 타임아웃을 Duration으로 반환합니다.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RelayConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값 위에 환경 변수만 적용됩니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 설정된 보조 프로토콜 목록으로 피드 분할을 구성합니다.
    pub fn partition(&self) -> FeedPartition {
        FeedPartition::new(self.feeds.secondary_protocols.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedFamily, ProtocolId};

    #[test]
    fn test_default_intervals() {
        let config = RelayConfig::default();
        assert_eq!(config.snapshot.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.hub.balance_interval(), Duration::from_millis(10_000));
        assert_eq!(config.hub.broadcast_capacity, 1024);
    }

    #[test]
    fn test_partition_from_config() {
        let mut config = RelayConfig::default();
        config.feeds.secondary_protocols = vec!["perp".to_string()];

        let partition = config.partition();
        assert_eq!(
            partition.family_for(&ProtocolId::new("PERP")),
            FeedFamily::Secondary
        );
        assert_eq!(
            partition.family_for(&ProtocolId::new("UNISWAP")),
            FeedFamily::Primary
        );
    }
}
