//! 릴레이 도메인 타입.
//!
//! 이 모듈은 시세 및 잔고 도메인 타입을 정의합니다.

pub mod balance;
pub mod market;

pub use balance::*;
pub use market::*;
