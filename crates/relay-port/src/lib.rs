//! # Relay Port
//!
//! 릴레이의 소비자 측을 제공합니다.
//!
//! 대시보드 표면(탭) 하나당 포트 하나가 붙으며, 포트는 로컬
//! 스토어와 공유 허브를 연결합니다:
//! - `RelayPort` - 가시성 게이트와 관심 중복 제거가 있는 포트
//! - `PriceBook` - 기본 스냅샷 + 오버레이 읽기 병합 스토어
//! - `BalanceBook` - 관심 목록 + 잔고 캐시 스토어
//! - `start_base_sync` - 기본 스냅샷 폴링
//! - `start_local_balance_service` - 허브 부재 시 포트 로컬 폴링

pub mod balance_book;
pub mod base_sync;
pub mod local;
pub mod port;
pub mod price_book;

pub use balance_book::*;
pub use base_sync::*;
pub use local::*;
pub use port::*;
pub use price_book::*;
