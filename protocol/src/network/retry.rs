//! Timeouts and bounded retry around node calls.
//!
//! Every call gets a `tokio::time::timeout`. Reads (fees, chain tip,
//! accounts) additionally get a few retries with a fixed pause when the
//! failure looks transient. Broadcasts get exactly one attempt: a
//! transaction that timed out may still have reached the node, and sending
//! it again could only produce a duplicate-transaction rejection or worse.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::NodeError;
use crate::config::{ClientConfig, DEFAULT_READ_RETRIES, DEFAULT_RPC_TIMEOUT, READ_RETRY_BACKOFF};

/// Timeout and retry settings for node calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first, for reads only.
    pub read_retries: u32,
    pub backoff: Duration,
}

impl Default for RpcPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RPC_TIMEOUT,
            read_retries: DEFAULT_READ_RETRIES,
            backoff: READ_RETRY_BACKOFF,
        }
    }
}

impl RpcPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            timeout: config.rpc_timeout(),
            read_retries: config.read_retries,
            backoff: READ_RETRY_BACKOFF,
        }
    }

    /// One attempt, bounded by the timeout.
    pub async fn once<T, Fut>(&self, method: &str, call: Fut) -> Result<T, NodeError>
    where
        Fut: Future<Output = Result<T, NodeError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NodeError::Timeout {
                method: method.to_string(),
                after: self.timeout,
            }),
        }
    }

    /// A state-changing call: one attempt, never repeated.
    pub async fn write<T, Fut>(&self, method: &str, call: Fut) -> Result<T, NodeError>
    where
        Fut: Future<Output = Result<T, NodeError>>,
    {
        self.once(method, call).await
    }

    /// A read: retried up to `read_retries` times on transient failures.
    pub async fn read<T, F, Fut>(&self, method: &str, mut call: F) -> Result<T, NodeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, NodeError>>,
    {
        let mut attempt = 0;
        loop {
            match self.once(method, call()).await {
                Err(err) if err.is_retryable() && attempt < self.read_retries => {
                    attempt += 1;
                    warn!(method, attempt, error = %err, "retrying read");
                    tokio::time::sleep(self.backoff).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RpcPolicy {
        RpcPolicy {
            timeout: Duration::from_millis(100),
            read_retries: 2,
            backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = policy()
            .read("get_chain_id", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(NodeError::Transport("reset".into()))
                } else {
                    Ok("chain")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "chain");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy()
            .read("get_chain_id", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NodeError::Transport("down".into()))
            })
            .await;
        assert!(matches!(result, Err(NodeError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_node_rejections_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy()
            .read("get_accounts", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NodeError::Rpc { code: 1, message: "bad".into() })
            })
            .await;
        assert!(matches!(result, Err(NodeError::Rpc { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_distinct() {
        let result: Result<(), _> = policy()
            .write("broadcast_transaction", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(
            result.unwrap_err(),
            NodeError::Timeout {
                method: "broadcast_transaction".into(),
                after: Duration::from_millis(100)
            }
        );
    }
}
