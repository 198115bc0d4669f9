//! # Relay Source
//!
//! 릴레이의 데이터 소스 계층을 제공합니다.
//!
//! 이 크레이트는 외부 데이터를 가져오는 모든 수단을 제공합니다:
//! - 순차 폴링 스케줄러 (`PollJob` / `spawn_poll`)
//! - 기본 스냅샷 API 클라이언트
//! - 시세/잔고 피드 트레이트 및 REST 구현
//! - 테스트와 데모용 시뮬레이션 피드

pub mod error;
pub mod feeds;
pub mod scheduler;
pub mod simulated;
pub mod snapshot;

pub use error::*;
pub use feeds::*;
pub use scheduler::*;
pub use simulated::*;
pub use snapshot::*;
