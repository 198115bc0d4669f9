//! 릴레이 허브 서비스.
//!
//! 인바운드 포트 커맨드를 처리하는 메인 루프와, 포트 링크를
//! 발급하는 핸들을 제공합니다. 포트 등록 해제 경로는 없습니다.
//! 죽은 포트의 수신기는 브로드캐스트에서 자연히 떨어져 나가고
//! 허브는 남은 포트를 계속 서비스합니다.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relay_core::config::RelayConfig;
use relay_core::link::{HubConnector, PortCommand, PortId, PortLink};
use relay_core::protocol::{BalanceUpdate, ClientFrame, ServerFrame, PROTOCOL_VERSION};
use relay_core::types::{BalanceKey, FeedFamily};
use relay_source::feeds::{BalanceFeed, PriceFeed};
use relay_source::scheduler::{spawn_poll, PollHandle};

use crate::jobs::{BalanceCycleJob, PriceBroadcastJob};

/// 인바운드 커맨드 채널 용량.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// 포트별 관심 테이블.
///
/// 포트의 선언은 항상 통째 교체이며, 잔고 사이클은 전체 합집합을
/// 조회합니다.
#[derive(Debug, Default)]
pub struct InterestTable {
    inner: RwLock<HashMap<PortId, Vec<BalanceKey>>>,
}

/// 공유 관심 테이블 타입.
pub type SharedInterests = Arc<InterestTable>;

impl InterestTable {
    /// 빈 테이블을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 한 포트의 관심을 통째로 교체합니다.
    ///
    /// 교체로 인해 전체 합집합에 새로 들어온 키 목록을 반환합니다.
    pub fn replace(&self, port: PortId, keys: Vec<BalanceKey>) -> Vec<BalanceKey> {
        let mut inner = self.inner.write().unwrap();
        let before: HashSet<BalanceKey> = inner.values().flatten().cloned().collect();
        let added: Vec<BalanceKey> = keys
            .iter()
            .filter(|key| !before.contains(*key))
            .cloned()
            .collect();
        inner.insert(port, keys);
        added
    }

    /// 모든 포트 관심의 합집합을 반환합니다 (정렬, 중복 없음).
    pub fn union(&self) -> Vec<BalanceKey> {
        let inner = self.inner.read().unwrap();
        let set: BTreeSet<BalanceKey> = inner.values().flatten().cloned().collect();
        set.into_iter().collect()
    }

    /// 선언한 포트 수를 반환합니다.
    pub fn port_count(&self) -> usize {
        self.inner.read().unwrap().len()
    }
}

/// 공유 릴레이 허브 서비스.
pub struct RelayHub {
    commands_rx: mpsc::Receiver<PortCommand>,
    updates: broadcast::Sender<ServerFrame>,
    interests: SharedInterests,
    balance_feed: Arc<dyn BalanceFeed>,
}

impl RelayHub {
    /// 서비스 메인 루프.
    ///
    /// 인바운드 포트 커맨드를 순서대로 처리하고,
    /// CancellationToken으로 종료합니다.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("릴레이 허브 루프 시작");

        loop {
            tokio::select! {
                maybe_cmd = self.commands_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            debug!("모든 커맨드 송신자 종료");
                            break;
                        }
                    }
                }

                _ = shutdown.cancelled() => {
                    info!("릴레이 허브 종료");
                    break;
                }
            }
        }
    }

    /// 커맨드 하나를 처리합니다.
    async fn handle_command(&self, cmd: PortCommand) {
        match cmd.frame {
            ClientFrame::TrackBalances(keys) => {
                self.handle_track_balances(cmd.from, keys).await;
            }
        }
    }

    /// 관심 선언을 반영하고, 새로 추가된 키는 즉시 조회합니다.
    ///
    /// 즉시 조회 실패는 기록만 하고 버립니다. 사이클 폴링과 달리
    /// 여기서의 실패가 잔고 사이클을 멈추지는 않습니다.
    async fn handle_track_balances(&self, port: PortId, keys: Vec<BalanceKey>) {
        debug!(port = %port, keys = keys.len(), "관심 선언 수신");
        let added = self.interests.replace(port, keys);

        for key in added {
            match self.balance_feed.fetch_balances(&key).await {
                Ok(balances) => {
                    let frame = ServerFrame::Balance(BalanceUpdate::new(key, balances));
                    if self.updates.send(frame).is_err() {
                        debug!("수신 포트 없음, 잔고 브로드캐스트 생략");
                    }
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "신규 키 즉시 조회 실패");
                }
            }
        }
    }
}

/// 허브 커넥터 핸들.
///
/// 복제 가능하며, 포트 링크 발급(`HubConnector`)과 종료를
/// 담당합니다.
#[derive(Clone)]
pub struct HubHandle {
    commands_tx: mpsc::Sender<PortCommand>,
    updates: broadcast::Sender<ServerFrame>,
    shutdown: CancellationToken,
    poll_handles: Arc<Vec<PollHandle>>,
}

impl HubHandle {
    /// 허브 루프와 모든 폴링 작업을 중단합니다.
    pub fn shutdown(&self) {
        info!("릴레이 허브 종료 요청");
        self.shutdown.cancel();
        for handle in self.poll_handles.iter() {
            handle.stop();
        }
    }

    /// 현재 구독 중인 포트 수신기 수를 반환합니다.
    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }
}

impl HubConnector for HubHandle {
    fn is_available(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    fn open_port(&self) -> Option<PortLink> {
        if self.shutdown.is_cancelled() {
            return None;
        }

        let port_id = PortId::new();
        debug!(port = %port_id, "포트 링크 발급");

        Some(PortLink {
            port_id,
            protocol_version: PROTOCOL_VERSION,
            commands: self.commands_tx.clone(),
            updates: self.updates.subscribe(),
        })
    }
}

/// 릴레이 허브를 백그라운드로 시작합니다.
///
/// 기본 패밀리 시세 작업은 항상, 보조 패밀리 작업은 보조 피드가
/// 주어졌을 때만 시작됩니다.
pub fn start_relay_hub(
    config: &RelayConfig,
    primary_feed: Arc<dyn PriceFeed>,
    secondary_feed: Option<Arc<dyn PriceFeed>>,
    balance_feed: Arc<dyn BalanceFeed>,
) -> HubHandle {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (updates, _) = broadcast::channel(config.hub.broadcast_capacity);
    let interests: SharedInterests = Arc::new(InterestTable::new());
    let shutdown = CancellationToken::new();

    let mut poll_handles = Vec::new();
    poll_handles.push(spawn_poll(
        PriceBroadcastJob::new(primary_feed, FeedFamily::Primary, updates.clone()),
        config.hub.primary_interval(),
    ));
    if let Some(feed) = secondary_feed {
        poll_handles.push(spawn_poll(
            PriceBroadcastJob::new(feed, FeedFamily::Secondary, updates.clone()),
            config.hub.secondary_interval(),
        ));
    }
    poll_handles.push(spawn_poll(
        BalanceCycleJob::new(balance_feed.clone(), interests.clone(), updates.clone()),
        config.hub.balance_interval(),
    ));

    let hub = RelayHub {
        commands_rx,
        updates: updates.clone(),
        interests,
        balance_feed,
    };
    let token = shutdown.clone();
    tokio::spawn(async move {
        hub.run(token).await;
    });

    info!("릴레이 허브 시작됨");

    HubHandle {
        commands_tx,
        updates,
        shutdown,
        poll_handles: Arc::new(poll_handles),
    }
}
