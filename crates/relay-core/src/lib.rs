//! # Relay Core
//!
//! 실시간 시세 릴레이의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 릴레이 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 프로토콜/인스트루먼트 식별자 및 피드 패밀리 분할
//! - 잔고 키 및 잔고 집합
//! - 허브와 포트 사이의 타입 지정 와이어 프로토콜
//! - 추상 채널(링크) 및 커넥터 인터페이스
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod link;
pub mod logging;
pub mod protocol;
pub mod types;

pub use config::*;
pub use error::*;
pub use link::*;
pub use logging::*;
pub use protocol::*;
pub use types::*;
