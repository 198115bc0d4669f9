//! 릴레이 포트.
//!
//! 대시보드 표면 하나의 로컬 스토어를 허브에 연결합니다.
//! 수신 프레임은 포트가 전면(foreground)일 때만 스토어에
//! 반영되며, 숨김 상태의 프레임은 큐잉 없이 버려집니다.
//! 복귀 후 첫 브로드캐스트가 자연스럽게 상태를 재동기화합니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use relay_core::error::{RelayError, RelayResult};
use relay_core::link::{HubConnector, PortCommand, PortId};
use relay_core::protocol::{ClientFrame, ServerFrame, PROTOCOL_VERSION};
use relay_core::types::{normalize_interest, BalanceKey, FeedFamily};

use crate::balance_book::{BalanceBook, SharedBalanceBook};
use crate::price_book::{PriceBook, SharedPriceBook};

/// 허브에 연결된 소비자 포트.
pub struct RelayPort {
    port_id: PortId,
    commands: mpsc::Sender<PortCommand>,
    foreground: Arc<AtomicBool>,
    last_sent: Mutex<Option<Vec<BalanceKey>>>,
    recv_task: JoinHandle<()>,
}

impl RelayPort {
    /// 커넥터를 통해 포트를 연결합니다.
    ///
    /// 공유 허브가 가용하지 않거나 프로토콜 버전이 다르면 `None`을
    /// 반환합니다 (성능 저하 모드). 연결에 성공하면 데이터 도착
    /// 전에 두 오버레이 패밀리의 준비 플래그를 먼저 올려 초기
    /// 렌더가 차단되지 않게 합니다.
    pub fn attach(
        connector: &dyn HubConnector,
        price_book: SharedPriceBook,
        balance_book: SharedBalanceBook,
    ) -> Option<Self> {
        if !connector.is_available() {
            debug!("공유 허브 없음, 포트 연결 생략");
            return None;
        }

        let link = connector.open_port()?;
        if link.protocol_version != PROTOCOL_VERSION {
            warn!(
                expected = PROTOCOL_VERSION,
                actual = link.protocol_version,
                "프로토콜 버전 불일치, 링크 거부"
            );
            return None;
        }

        // 준비 플래그는 데이터보다 먼저 올라간다
        price_book.set_ready(FeedFamily::Primary, true);
        price_book.set_ready(FeedFamily::Secondary, true);

        let foreground = Arc::new(AtomicBool::new(true));
        let recv_task = tokio::spawn(
            run_receive_loop(
                link.port_id,
                link.updates,
                foreground.clone(),
                price_book,
                balance_book,
            )
            .instrument(relay_core::relay_span!("port_receive", link.port_id)),
        );

        info!(port = %link.port_id, "포트 연결됨");

        Some(Self {
            port_id: link.port_id,
            commands: link.commands,
            foreground,
            last_sent: Mutex::new(None),
            recv_task,
        })
    }

    /// 이 포트의 ID를 반환합니다.
    pub fn port_id(&self) -> PortId {
        self.port_id
    }

    /// 전면/숨김 상태를 설정합니다.
    pub fn set_foreground(&self, visible: bool) {
        self.foreground.store(visible, Ordering::Relaxed);
        debug!(port = %self.port_id, visible, "가시성 변경");
    }

    /// 현재 전면 상태인지 반환합니다.
    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::Relaxed)
    }

    /// 잔고 관심 목록을 선언합니다.
    ///
    /// 목록은 정규화(정렬 + 중복 제거) 후 전체 교체분으로
    /// 전송됩니다. 포트가 전면이고 마지막으로 실제 전송한 목록과
    /// 다를 때만 프레임이 나가며, 전송 여부를 반환합니다.
    /// 숨김 상태에서 바뀐 관심은 복귀 시 재전송되지 않습니다.
    pub async fn track_balances(&self, mut keys: Vec<BalanceKey>) -> RelayResult<bool> {
        if !self.is_foreground() {
            debug!(port = %self.port_id, "숨김 상태, 관심 선언 생략");
            return Ok(false);
        }

        normalize_interest(&mut keys);

        {
            let last = self.last_sent.lock().unwrap();
            if last.as_deref() == Some(keys.as_slice()) {
                debug!(port = %self.port_id, "동일한 관심 목록, 전송 생략");
                return Ok(false);
            }
        }

        self.commands
            .send(PortCommand {
                from: self.port_id,
                frame: ClientFrame::track(keys.clone()),
            })
            .await
            .map_err(|e| RelayError::Channel(e.to_string()))?;

        *self.last_sent.lock().unwrap() = Some(keys);
        Ok(true)
    }
}

impl Drop for RelayPort {
    fn drop(&mut self) {
        // 허브에는 아무것도 보내지 않는다 (명시적 해제 경로 없음)
        self.recv_task.abort();
    }
}

/// 브로드캐스트 수신 루프.
async fn run_receive_loop(
    port_id: PortId,
    mut updates: broadcast::Receiver<ServerFrame>,
    foreground: Arc<AtomicBool>,
    price_book: SharedPriceBook,
    balance_book: SharedBalanceBook,
) {
    loop {
        match updates.recv().await {
            Ok(frame) => {
                // 수신 시점의 가시성만 판단한다
                if !foreground.load(Ordering::Relaxed) {
                    continue;
                }
                apply_frame(frame, &price_book, &balance_book);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(port = %port_id, skipped = n, "브로드캐스트 지연, 프레임 건너뜀");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(port = %port_id, "허브 채널 종료, 수신 루프 종료");
                break;
            }
        }
    }
}

/// 프레임 하나를 스토어에 반영합니다.
fn apply_frame(frame: ServerFrame, price_book: &PriceBook, balance_book: &BalanceBook) {
    match frame {
        ServerFrame::PrimaryPrice(batch) => {
            price_book.apply_overlay(FeedFamily::Primary, batch);
        }
        ServerFrame::SecondaryPrice(batch) => {
            price_book.apply_overlay(FeedFamily::Secondary, batch);
        }
        ServerFrame::Balance(update) => {
            let key = update.key();
            balance_book.record_balance(&key, update.balances);
        }
    }
}
