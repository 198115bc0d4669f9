//! 데몬 상태 통계 구조체.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 릴레이 데몬 런타임 상태 요약
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayStatus {
    /// 공유 허브 연결 여부 (false면 로컬 모드)
    pub shared: bool,
    /// 허브에 붙은 수신 포트 수
    pub subscribers: usize,
    /// 기본 스냅샷 인스트루먼트 수
    pub base_entries: usize,
    /// 캐시된 잔고 키 수
    pub cached_balances: usize,
    /// 선언된 관심 키 수
    pub tracked_keys: usize,
}

impl RelayStatus {
    /// 상태 요약 로그 출력
    pub fn log_summary(&self, started_at: DateTime<Utc>) {
        let uptime = Utc::now().signed_duration_since(started_at);
        tracing::info!(
            mode = if self.shared { "shared" } else { "local" },
            subscribers = self.subscribers,
            base_entries = self.base_entries,
            cached_balances = self.cached_balances,
            tracked_keys = self.tracked_keys,
            uptime = format!("{}s", uptime.num_seconds()),
            "릴레이 상태"
        );
    }
}
