//! # Relay Hub
//!
//! 프로세스당 하나 떠 있는 공유 릴레이 허브를 제공합니다.
//!
//! 허브는 외부 시세/잔고 피드 연결을 독점 소유하고, 연결된 모든
//! 포트에 타입 지정 프레임을 팬아웃하며, 포트별 잔고 관심 선언을
//! 받아 합집합을 폴링합니다:
//! - `RelayHub` / `start_relay_hub` - 허브 서비스와 시작 헬퍼
//! - `HubHandle` - 포트 링크를 발급하는 커넥터 핸들
//! - `SharedRelay` / `SharedRelayCell` - 능력 검사 뒤의 지연 단일 생성

pub mod jobs;
pub mod service;
pub mod shared;

pub use jobs::*;
pub use service::*;
pub use shared::*;
