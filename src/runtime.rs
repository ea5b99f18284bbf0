//! Runtime - one-shot readiness for a wallet started in the background.

use crate::error::{Result, WalletError};
use std::future::Future;
use tokio::sync::oneshot;

/// Resolves exactly once: `Ok` when the wallet is ready, `Err` when startup failed.
pub struct Readiness<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T: Send + 'static> Readiness<T> {
    /// Run `startup` on the tokio runtime and hand back its single outcome.
    pub fn spawn<F>(startup: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = startup.await;
            if let Err(ref e) = outcome {
                tracing::error!("Startup failed: {}", e);
            }
            let _ = sender.send(outcome);
        });
        Self { receiver }
    }

    pub async fn wait(self) -> Result<T> {
        self.receiver
            .await
            .map_err(|_| WalletError::Startup("startup task ended without signalling".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready() {
        let ready = Readiness::spawn(async { Ok(7u32) });
        assert_eq!(ready.wait().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_failed() {
        let ready: Readiness<u32> = Readiness::spawn(async { Err(WalletError::oracle("down")) });
        assert!(matches!(ready.wait().await, Err(WalletError::Oracle(_))));
    }

    #[tokio::test]
    async fn test_panicked_startup_is_reported() {
        let ready: Readiness<u32> = Readiness::spawn(async {
            let value: u32 = "not a number".parse().expect("startup panics");
            Ok(value)
        });
        assert!(matches!(ready.wait().await, Err(WalletError::Startup(_))));
    }
}
