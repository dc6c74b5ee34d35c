//! Model adapter port
//!
//! Defines the uniform interface the application layer uses to talk to a
//! text-generation backend, and the [`StreamHandle`] that carries an
//! incremental response back.

use ace_domain::Message;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Number of fragments a producer may run ahead of its consumer.
const STREAM_BUFFER: usize = 32;

/// Errors that can occur while talking to a model backend
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend protocol error: {0}")]
    BackendProtocol(String),

    #[error("Backend sent nothing for {0:?}")]
    Timeout(Duration),
}

/// An event produced by an adapter's streaming task.
#[derive(Debug)]
pub enum StreamEvent {
    /// A text fragment, in emission order.
    Delta(String),
    /// The backend finished the response normally.
    Completed,
    /// The backend failed; no further events follow.
    Failed(GatewayError),
}

/// Handle for receiving the fragments of one streaming call.
///
/// Finite and single-pass: once [`next_fragment`](Self::next_fragment)
/// returns `None` or an error, the handle is exhausted. Dropping the handle
/// early aborts the producer task, which releases whatever network read it
/// was holding.
pub struct StreamHandle {
    receiver: mpsc::Receiver<StreamEvent>,
    producer: Option<JoinHandle<()>>,
    idle_timeout: Option<Duration>,
    finished: bool,
}

impl StreamHandle {
    /// Spawn `producer` on the runtime and hand it the sending half.
    ///
    /// Producers should stop as soon as a send fails; that means the
    /// consumer is gone.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(mpsc::Sender<StreamEvent>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let task = tokio::spawn(producer(tx));
        Self {
            receiver: rx,
            producer: Some(task),
            idle_timeout: None,
            finished: false,
        }
    }

    /// Fail with [`GatewayError::Timeout`] when no event arrives within `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Receive the next fragment.
    ///
    /// Returns `None` on normal completion. A channel that closes without a
    /// `Completed` event is reported as a protocol error.
    pub async fn next_fragment(&mut self) -> Option<Result<String, GatewayError>> {
        if self.finished {
            return None;
        }

        let event = match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.receiver.recv()).await {
                Ok(event) => event,
                Err(_) => {
                    self.cancel();
                    return Some(Err(GatewayError::Timeout(limit)));
                }
            },
            None => self.receiver.recv().await,
        };

        match event {
            Some(StreamEvent::Delta(text)) => Some(Ok(text)),
            Some(StreamEvent::Completed) => {
                self.finished = true;
                None
            }
            Some(StreamEvent::Failed(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            None => {
                self.finished = true;
                Some(Err(GatewayError::BackendProtocol(
                    "stream closed before completion".to_string(),
                )))
            }
        }
    }

    /// Consume the stream and concatenate every fragment.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(fragment) = self.next_fragment().await {
            full_text.push_str(&fragment?);
        }
        Ok(full_text)
    }

    /// Abandon the stream and stop the producer.
    pub fn cancel(&mut self) {
        self.finished = true;
        self.receiver.close();
        if let Some(task) = self.producer.take() {
            task.abort();
        }
    }

    /// Whether the stream has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if let Some(task) = self.producer.take() {
            task.abort();
        }
    }
}

/// Uniform interface to a text-generation backend.
///
/// Implementations translate the ordered role/content history into their
/// backend's request format. They never retry; failures surface as
/// [`GatewayError`] to the caller.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Short identifier used in logs (e.g. `ollama/qwen3:8b`).
    fn name(&self) -> String;

    /// Start a streaming generation over `history`.
    async fn stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError>;

    /// Generate and return the complete response text.
    ///
    /// Default implementation drains [`stream`](Self::stream).
    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError> {
        self.stream(history).await?.collect_text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn fragments_arrive_in_order_then_end() {
        let mut handle = StreamHandle::spawn(|tx| async move {
            for part in ["He", "llo"] {
                if tx.send(StreamEvent::Delta(part.to_string())).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Completed).await;
        });

        assert_eq!(handle.next_fragment().await.unwrap().unwrap(), "He");
        assert_eq!(handle.next_fragment().await.unwrap().unwrap(), "llo");
        assert!(handle.next_fragment().await.is_none());
        assert!(handle.is_finished());
        assert!(handle.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn failure_is_terminal() {
        let mut handle = StreamHandle::spawn(|tx| async move {
            let _ = tx.send(StreamEvent::Delta("a".to_string())).await;
            let _ = tx
                .send(StreamEvent::Failed(GatewayError::BackendUnavailable(
                    "down".to_string(),
                )))
                .await;
        });

        assert_eq!(handle.next_fragment().await.unwrap().unwrap(), "a");
        let err = handle.next_fragment().await.unwrap().unwrap_err();
        assert!(matches!(err, GatewayError::BackendUnavailable(_)));
        assert!(handle.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn closed_channel_without_completion_is_protocol_error() {
        let mut handle = StreamHandle::spawn(|tx| async move {
            let _ = tx.send(StreamEvent::Delta("x".to_string())).await;
        });

        assert!(handle.next_fragment().await.unwrap().is_ok());
        let err = handle.next_fragment().await.unwrap().unwrap_err();
        assert!(matches!(err, GatewayError::BackendProtocol(_)));
    }

    #[tokio::test]
    async fn drop_aborts_producer() {
        let (guard_tx, guard_rx) = oneshot::channel::<()>();
        let mut handle = StreamHandle::spawn(|tx| async move {
            let _guard = guard_tx;
            let _ = tx.send(StreamEvent::Delta("first".to_string())).await;
            std::future::pending::<()>().await;
        });

        assert_eq!(handle.next_fragment().await.unwrap().unwrap(), "first");
        drop(handle);

        // The guard is dropped with the aborted task, closing the oneshot.
        let outcome = tokio::time::timeout(Duration::from_secs(1), guard_rx).await;
        assert!(matches!(outcome, Ok(Err(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_fails_stalled_stream() {
        let mut handle = StreamHandle::spawn(|tx| async move {
            let _keep = tx;
            std::future::pending::<()>().await;
        })
        .with_idle_timeout(Duration::from_secs(5));

        let err = handle.next_fragment().await.unwrap().unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(d) if d == Duration::from_secs(5)));
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn collect_text_concatenates() {
        let handle = StreamHandle::spawn(|tx| async move {
            for part in ["a", "b", "c"] {
                let _ = tx.send(StreamEvent::Delta(part.to_string())).await;
            }
            let _ = tx.send(StreamEvent::Completed).await;
        });
        assert_eq!(handle.collect_text().await.unwrap(), "abc");
    }
}
