//! The refresh round trip for a stale source component.
//!
//! The engine emits one "refresh requested" signal and waits for exactly one
//! "refresh completed" acknowledgement. This is the only suspension point of
//! a build.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::BuildError;

/// The host's answer to a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshAck {
    /// True if the host reselected a usable source component.
    pub success: bool,
}

/// Emits refresh requests toward the host.
pub trait SourceRefresher {
    /// Sends the request and returns the receiver for its single acknowledgement.
    fn request_refresh(&mut self) -> oneshot::Receiver<RefreshAck>;
}

/// A refresher for hosts that cannot reselect: every request fails at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefresh;

impl SourceRefresher for NoRefresh {
    fn request_refresh(&mut self) -> oneshot::Receiver<RefreshAck> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(RefreshAck { success: false });
        rx
    }
}

/// A pending refresh request, as seen by the host side.
#[derive(Debug)]
pub struct RefreshRequest {
    reply: oneshot::Sender<RefreshAck>,
}

impl RefreshRequest {
    /// Completes the request. Returns false if the build stopped waiting.
    pub fn complete(self, success: bool) -> bool {
        self.reply.send(RefreshAck { success }).is_ok()
    }
}

/// Forwards refresh requests over a channel to a host task.
#[derive(Debug, Clone)]
pub struct ChannelRefresher {
    requests: mpsc::UnboundedSender<RefreshRequest>,
}

impl ChannelRefresher {
    /// Creates the refresher and the receiving end the host listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RefreshRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { requests: tx }, rx)
    }
}

impl SourceRefresher for ChannelRefresher {
    fn request_refresh(&mut self) -> oneshot::Receiver<RefreshAck> {
        let (tx, rx) = oneshot::channel();
        if let Err(mpsc::error::SendError(request)) = self.requests.send(RefreshRequest { reply: tx }) {
            tracing::warn!("refresh listener is gone");
            // Dropping the request closes `rx`, which the waiter reports as stale.
            drop(request);
        }
        rx
    }
}

/// Requests a refresh and waits for its acknowledgement.
///
/// `timeout` of None waits indefinitely.
pub async fn await_refresh<R>(
    refresher: &mut R,
    timeout: Option<Duration>,
) -> Result<RefreshAck, BuildError>
where
    R: SourceRefresher + ?Sized,
{
    let ack = refresher.request_refresh();
    let received = match timeout {
        Some(limit) => tokio::time::timeout(limit, ack)
            .await
            .map_err(|_| BuildError::RefreshTimedOut {
                after_ms: limit.as_millis() as u64,
            })?,
        None => ack.await,
    };
    received.map_err(|_| BuildError::StaleSource {
        reason: "refresh was never acknowledged".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_refresh_fails_immediately() {
        let ack = await_refresh(&mut NoRefresh, None).await.unwrap();
        assert!(!ack.success);
    }

    #[tokio::test]
    async fn test_channel_round_trip() {
        let (mut refresher, mut requests) = ChannelRefresher::channel();
        let host = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            request.complete(true)
        });
        let ack = await_refresh(&mut refresher, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert!(ack.success);
        assert!(host.await.unwrap());
    }

    #[tokio::test]
    async fn test_timeout() {
        let (mut refresher, _requests) = ChannelRefresher::channel();
        let err = await_refresh(&mut refresher, Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert_eq!(err, BuildError::RefreshTimedOut { after_ms: 10 });
    }

    #[tokio::test]
    async fn test_listener_gone_is_stale() {
        let (mut refresher, requests) = ChannelRefresher::channel();
        drop(requests);
        let err = await_refresh(&mut refresher, None).await.unwrap_err();
        assert!(matches!(err, BuildError::StaleSource { .. }));
    }
}
