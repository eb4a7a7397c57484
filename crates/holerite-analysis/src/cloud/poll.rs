//! Bounded polling of asynchronous analysis jobs.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use holerite::config::CloudConfig;

use super::CloudError;

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl From<&CloudConfig> for PollPolicy {
    fn from(config: &CloudConfig) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs),
            config.poll_max_attempts,
        )
    }
}

/// State reported by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPoll<T> {
    Pending,
    Done(T),
    Failed(String),
}

/// Poll `check` until the job completes, fails, or `policy.max_attempts`
/// polls have reported it pending.
///
/// `check` receives the 1-based attempt number. Cancellation is checked
/// before each poll and while waiting between polls.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    mut cancel: watch::Receiver<bool>,
    mut check: F,
) -> Result<T, CloudError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<JobPoll<T>, CloudError>>,
{
    for attempt in 1..=policy.max_attempts {
        if *cancel.borrow() {
            return Err(CloudError::Cancelled);
        }
        match check(attempt).await? {
            JobPoll::Done(result) => return Ok(result),
            JobPoll::Failed(reason) => return Err(CloudError::JobFailed(reason)),
            JobPoll::Pending => {
                debug!("Analysis job pending (poll {}/{})", attempt, policy.max_attempts);
            }
        }
        if attempt < policy.max_attempts {
            wait_or_cancel(policy.interval, &mut cancel).await?;
        }
    }
    Err(CloudError::Timeout {
        attempts: policy.max_attempts,
    })
}

async fn wait_or_cancel(
    interval: Duration,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), CloudError> {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return Err(CloudError::Cancelled),
                Ok(()) => continue,
                // Sender gone: nobody can cancel any more.
                Err(_) => {
                    (&mut sleep).await;
                    return Ok(());
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn test_completes_after_pending() {
        let (_tx, rx) = watch::channel(false);
        let result = poll_until(fast(5), rx, |attempt| async move {
            Ok(if attempt < 3 {
                JobPoll::Pending
            } else {
                JobPoll::Done(attempt)
            })
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_times_out_after_max_attempts() {
        let (_tx, rx) = watch::channel(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = poll_until(fast(4), rx, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(JobPoll::Pending) }
        })
        .await;
        assert!(matches!(result, Err(CloudError::Timeout { attempts: 4 })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_job_failure() {
        let (_tx, rx) = watch::channel(false);
        let result: Result<(), _> =
            poll_until(fast(3), rx, |_| async { Ok(JobPoll::Failed("bad page".into())) }).await;
        assert!(matches!(result, Err(CloudError::JobFailed(r)) if r == "bad page"));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let (tx, rx) = watch::channel(false);
        let policy = PollPolicy::new(Duration::from_secs(60), 10);
        let handle = tokio::spawn(poll_until(policy, rx, |_| async {
            Ok(JobPoll::<()>::Pending)
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(CloudError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let (_tx, rx) = watch::channel(true);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = poll_until(fast(3), rx, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(JobPoll::Pending) }
        })
        .await;
        assert!(matches!(result, Err(CloudError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
