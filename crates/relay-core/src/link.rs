//! 허브-포트 링크 추상화.
//!
//! 허브와 포트는 구체 전송이 아닌 이 모듈의 타입을 통해서만 만납니다.
//! 여기서는 프로세스 내 tokio 채널이 링크를 구현하지만, 같은 형태가
//! OS 파이프 등 다른 전송 위에도 올라갈 수 있습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::protocol::{ClientFrame, ServerFrame};

/// 연결된 포트를 식별하는 ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(Uuid);

impl PortId {
    /// 새 포트 ID를 발급합니다.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 인바운드 전송 단위.
///
/// 발신자 식별은 전송 계층의 속성이며 페이로드에 포함되지 않습니다.
#[derive(Debug, Clone)]
pub struct PortCommand {
    /// 프레임을 보낸 포트
    pub from: PortId,
    /// 인바운드 프레임
    pub frame: ClientFrame,
}

/// 열린 양방향 링크 하나.
///
/// 허브가 발급하며, 포트는 `commands`로 프레임을 올리고
/// `updates`로 브로드캐스트를 받습니다.
pub struct PortLink {
    /// 이 링크에 발급된 포트 ID
    pub port_id: PortId,
    /// 링크 개설 시점에 찍힌 프로토콜 버전
    pub protocol_version: u16,
    /// 포트 -> 허브 커맨드 채널
    pub commands: mpsc::Sender<PortCommand>,
    /// 허브 -> 포트 브로드캐스트 수신기
    pub updates: broadcast::Receiver<ServerFrame>,
}

impl fmt::Debug for PortLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortLink")
            .field("port_id", &self.port_id)
            .field("protocol_version", &self.protocol_version)
            .finish_non_exhaustive()
    }
}

/// 포트 개설 인터페이스.
///
/// 조립 지점이 소비자에게 주입하며, 공유 허브가 없을 때는
/// 가용하지 않다고 보고하는 구현을 대신 꽂을 수 있습니다.
pub trait HubConnector: Send + Sync {
    /// 공유 허브가 가용한지 확인합니다.
    fn is_available(&self) -> bool;

    /// 새 포트 링크를 개설합니다.
    ///
    /// 허브가 가용하지 않으면 `None`을 반환합니다.
    fn open_port(&self) -> Option<PortLink>;
}
