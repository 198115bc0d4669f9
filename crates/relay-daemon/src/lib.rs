//! Standalone relay daemon for the shared market-data relay.
//!
//! 이 crate는 허브와 포트를 한 프로세스에 띄우는 바이너리를 제공합니다:
//! - 데몬 모드 (REST 또는 시뮬레이션 피드, 로컬 폴백 포함)
//! - 기본 스냅샷 단발 조회

pub mod runtime;
pub mod stats;

pub use stats::RelayStatus;
