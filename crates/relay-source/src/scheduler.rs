//! 순차 폴링 스케줄러.
//!
//! 요청 -> 반영 -> 대기를 엄격히 순차로 반복하는 범용 폴링
//! 프리미티브입니다. 핸들 하나당 동시에 진행 중인 요청은 최대
//! 하나이며, 고정 주기 타이머와 달리 요청이 느려져도 겹치지
//! 않습니다.
//!
//! 실패 정책: `request()`가 에러를 반환하면 루프는 재시도 없이
//! 종료됩니다. 재시도가 필요하면 호출자의 `request()` 안에서
//! 처리해야 합니다.

use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SourceResult;

/// 폴링 루프가 반복 실행하는 작업.
#[async_trait]
pub trait PollJob: Send + 'static {
    /// 요청 한 번의 결과 타입.
    type Output: Send;

    /// 로그에 표시할 작업 이름.
    fn name(&self) -> &str;

    /// 데이터를 한 번 가져옵니다.
    async fn request(&mut self) -> SourceResult<Self::Output>;

    /// 가져온 데이터를 반영합니다.
    ///
    /// 중단된 루프에서는 호출되지 않습니다. 짧은 동기 작업만
    /// 수행해야 합니다.
    fn apply(&mut self, output: Self::Output);
}

/// 실행 중인 폴링 루프의 핸들.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// 루프를 중단합니다.
    ///
    /// 대기 중인 타이머는 즉시 해제되고, 진행 중인 요청이 있으면
    /// 그 결과는 폐기됩니다 (`apply` 미호출).
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// 중단 요청 여부를 반환합니다.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 루프 태스크 종료를 기다립니다.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// 폴링 루프를 시작합니다.
///
/// 첫 요청은 지연 없이 즉시 발행되며, 이후에는 직전 요청이 끝난
/// 시점부터 `delay`가 지난 뒤 다음 요청이 발행됩니다.
pub fn spawn_poll<J: PollJob>(mut job: J, delay: Duration) -> PollHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        loop {
            let result = tokio::select! {
                _ = token.cancelled() => break,
                result = job.request() => result,
            };

            // 중단과 완료가 경합하면 결과를 폐기한다
            if token.is_cancelled() {
                break;
            }

            match result {
                Ok(output) => job.apply(output),
                Err(e) => {
                    warn!(job = job.name(), error = %e, "폴링 요청 실패, 루프 중단");
                    break;
                }
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        debug!(job = job.name(), "폴링 루프 종료");
    });

    PollHandle { cancel, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// 테스트용 폴링 작업.
    struct TestJob {
        requests: Arc<AtomicUsize>,
        applies: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        overlap: Arc<AtomicBool>,
        request_duration: Duration,
        fail: bool,
        block_on: Option<Arc<Notify>>,
    }

    impl TestJob {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let requests = Arc::new(AtomicUsize::new(0));
            let applies = Arc::new(AtomicUsize::new(0));
            let job = Self {
                requests: requests.clone(),
                applies: applies.clone(),
                in_flight: Arc::new(AtomicUsize::new(0)),
                overlap: Arc::new(AtomicBool::new(false)),
                request_duration: Duration::ZERO,
                fail: false,
                block_on: None,
            };
            (job, requests, applies)
        }
    }

    #[async_trait]
    impl PollJob for TestJob {
        type Output = usize;

        fn name(&self) -> &str {
            "test"
        }

        async fn request(&mut self) -> SourceResult<usize> {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlap.store(true, Ordering::SeqCst);
            }
            let count = self.requests.fetch_add(1, Ordering::SeqCst) + 1;

            if let Some(notify) = &self.block_on {
                // stop() 전에는 완료되지 않는 요청
                notify.notified().await;
            } else if !self.request_duration.is_zero() {
                tokio::time::sleep(self.request_duration).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                Err(SourceError::NetworkError("simulated".to_string()))
            } else {
                Ok(count)
            }
        }

        fn apply(&mut self, _output: usize) {
            self.applies.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let (job, requests, applies) = TestJob::new();
        let handle = spawn_poll(job, Duration::from_secs(60));

        // 긴 지연과 무관하게 첫 요청은 바로 나간다
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert_eq!(applies.load(Ordering::SeqCst), 1);

        handle.stop();
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_never_overlap() {
        let (mut job, requests, _applies) = TestJob::new();
        job.request_duration = Duration::from_millis(5);
        let overlap = job.overlap.clone();

        let handle = spawn_poll(job, Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.stop();
        handle.join().await;

        assert!(requests.load(Ordering::SeqCst) >= 2);
        assert!(!overlap.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let (mut job, requests, applies) = TestJob::new();
        let gate = Arc::new(Notify::new());
        job.block_on = Some(gate.clone());

        let handle = spawn_poll(job, Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(requests.load(Ordering::SeqCst), 1);

        // 요청이 진행 중인 상태에서 중단
        handle.stop();
        gate.notify_one();
        handle.join().await;

        // 진행 중이던 요청의 결과는 반영되지 않는다
        assert_eq!(applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_pending_delay() {
        let (job, requests, applies) = TestJob::new();
        let handle = spawn_poll(job, Duration::from_secs(600));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(applies.load(Ordering::SeqCst), 1);

        // 대기 타이머가 즉시 해제되어야 join이 바로 돌아온다
        handle.stop();
        assert!(handle.is_stopped());
        handle.join().await;

        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_rejection_halts_loop() {
        let (mut job, requests, applies) = TestJob::new();
        job.fail = true;

        let handle = spawn_poll(job, Duration::from_millis(1));

        // 중단 요청 없이도 루프가 스스로 종료된다
        handle.join().await;

        // 첫 실패 이후 두 번째 요청은 절대 발행되지 않는다
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert_eq!(applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_continues_after_success() {
        let (job, requests, applies) = TestJob::new();
        let handle = spawn_poll(job, Duration::from_millis(1));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();
        handle.join().await;

        let total = requests.load(Ordering::SeqCst);
        assert!(total >= 2, "expected repeated polling, got {}", total);
        // 성공한 요청 수만큼만 반영된다 (마지막 요청은 경합으로 폐기될 수 있음)
        let applied = applies.load(Ordering::SeqCst);
        assert!(applied == total || applied == total - 1);
    }
}
