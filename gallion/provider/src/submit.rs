// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use ethers::providers::{Middleware, PendingTransaction};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, TxHash, U64};

use crate::client::DefaultSignerMiddleware;
use crate::config::SubmissionConfig;
use crate::error::ProviderError;
use crate::gas::GasPricingStrategy;

/// Exponential backoff for futures; reverted transactions are never retried.
macro_rules! retry {
    ($wait:expr, $retries:expr, $what:expr, $f:expr) => {{
        let mut retries = $retries;
        let mut wait = $wait;

        loop {
            let res = $f;
            if let Err(e) = &res {
                if e.downcast_ref::<$crate::error::ProviderError>().is_some() {
                    break res;
                }

                tracing::warn!(
                    error = e.to_string(),
                    retries,
                    wait = ?wait,
                    what = $what,
                    "submission failed"
                );

                if retries > 0 {
                    retries -= 1;

                    tokio::time::sleep(wait).await;

                    wait *= 2;
                    continue;
                }
            }

            break res;
        }
    }};
}

/// Sends transactions with the configured fees and waits for them to be mined.
#[derive(Clone)]
pub struct Submitter {
    signer: Arc<DefaultSignerMiddleware>,
    gas: GasPricingStrategy,
    config: SubmissionConfig,
}

impl Submitter {
    pub fn new(
        signer: Arc<DefaultSignerMiddleware>,
        gas: GasPricingStrategy,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            signer,
            gas,
            config,
        }
    }

    pub fn signer(&self) -> Arc<DefaultSignerMiddleware> {
        self.signer.clone()
    }

    /// The account paying for the transactions.
    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    /// Send the transaction and wait for a successful receipt.
    ///
    /// Failures to send are retried with a fresh transaction. Once the network
    /// accepted it, only the wait for the receipt of that hash is retried.
    pub async fn submit(
        &self,
        what: &str,
        tx: TypedTransaction,
    ) -> anyhow::Result<TransactionReceipt> {
        send_then_wait(
            &self.config,
            what,
            move || self.send(tx.clone()),
            move |tx_hash| self.wait(tx_hash),
        )
        .await
    }

    async fn send(&self, mut tx: TypedTransaction) -> anyhow::Result<TxHash> {
        let fees = self.gas.fees(self.signer.inner()).await?;
        fees.apply(&mut tx);

        let pending_tx = self
            .signer
            .send_transaction(tx, None)
            .await
            .context("failed to send transaction")?;

        Ok(pending_tx.tx_hash())
    }

    async fn wait(&self, tx_hash: TxHash) -> anyhow::Result<Option<TransactionReceipt>> {
        let receipt = PendingTransaction::new(tx_hash, self.signer.inner())
            .retries(self.config.receipt_retries)
            .await?;
        Ok(receipt)
    }
}

/// Send once successfully, then wait for the receipt of that one transaction.
async fn send_then_wait<S, SF, W, WF>(
    config: &SubmissionConfig,
    what: &str,
    mut send: S,
    mut wait: W,
) -> anyhow::Result<TransactionReceipt>
where
    S: FnMut() -> SF,
    SF: Future<Output = anyhow::Result<TxHash>>,
    W: FnMut(TxHash) -> WF,
    WF: Future<Output = anyhow::Result<Option<TransactionReceipt>>>,
{
    let timeout = config.timeout;

    let tx_hash = retry!(config.retry_delay, config.max_retries, what, {
        match tokio::time::timeout(timeout, send()).await {
            Ok(res) => res,
            Err(_) => Err(anyhow!("sending {what} timed out after {timeout:?}")),
        }
    })?;

    tracing::debug!(?tx_hash, what, "transaction sent");

    let receipt = retry!(config.retry_delay, config.max_retries, what, {
        match tokio::time::timeout(timeout, wait(tx_hash)).await {
            Ok(Ok(Some(receipt))) => Ok(receipt),
            Ok(Ok(None)) => Err(anyhow!(
                "txn {tx_hash:?} sent to network, but receipt cannot be obtained, please check scanner"
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow!(
                "no receipt for txn {tx_hash:?} after {timeout:?}, please check scanner"
            )),
        }
    })?;

    check_receipt(receipt)
}

/// Mined transactions with status 0 reverted.
pub(crate) fn check_receipt(receipt: TransactionReceipt) -> anyhow::Result<TransactionReceipt> {
    if receipt.status != Some(U64::from(1)) {
        return Err(ProviderError::UpgradeTransactionFailed {
            tx_hash: receipt.transaction_hash,
        }
        .into());
    }
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::anyhow;
    use ethers::types::{TransactionReceipt, H256, U64};

    use crate::config::SubmissionConfig;
    use crate::error::ProviderError;

    use super::{check_receipt, send_then_wait};

    fn config(max_retries: u32) -> SubmissionConfig {
        SubmissionConfig {
            max_retries,
            retry_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(50),
            receipt_retries: 1,
        }
    }

    fn mined(tx_hash: H256, status: u64) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(U64::from(status)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn receipt_failures_do_not_send_again() {
        let sends = AtomicUsize::new(0);
        let waits = AtomicUsize::new(0);
        let tx_hash = H256::repeat_byte(3);

        let receipt = send_then_wait(
            &config(3),
            "test",
            || {
                sends.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, anyhow::Error>(tx_hash) }
            },
            |hash| {
                let n = waits.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => Err(anyhow!("connection reset")),
                        1 => Ok(None),
                        _ => Ok(Some(mined(hash, 1))),
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(receipt.transaction_hash, tx_hash);
        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(waits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_receipts_keep_waiting_on_the_same_hash() {
        let sends = AtomicUsize::new(0);
        let waits = AtomicUsize::new(0);

        let res = send_then_wait(
            &config(2),
            "test",
            || {
                sends.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, anyhow::Error>(H256::repeat_byte(4)) }
            },
            |_| {
                waits.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<Option<TransactionReceipt>, anyhow::Error>(None)
                }
            },
        )
        .await;

        let err = res.unwrap_err();
        assert!(err.to_string().contains("no receipt"), "{err}");
        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(waits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_sends_are_retried() {
        let sends = AtomicUsize::new(0);

        let receipt = send_then_wait(
            &config(2),
            "test",
            || {
                let n = sends.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(anyhow!("nonce too low"))
                    } else {
                        Ok(H256::repeat_byte(5))
                    }
                }
            },
            |hash| async move { Ok::<_, anyhow::Error>(Some(mined(hash, 1))) },
        )
        .await
        .unwrap();

        assert_eq!(receipt.transaction_hash, H256::repeat_byte(5));
        assert_eq!(sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reverted_receipt_is_final() {
        let sends = AtomicUsize::new(0);
        let waits = AtomicUsize::new(0);

        let err = send_then_wait(
            &config(3),
            "test",
            || {
                sends.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, anyhow::Error>(H256::repeat_byte(6)) }
            },
            |hash| {
                waits.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, anyhow::Error>(Some(mined(hash, 0))) }
            },
        )
        .await
        .unwrap_err();

        assert!(err.downcast_ref::<ProviderError>().is_some());
        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(waits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let mut attempts = 0;

        let res: anyhow::Result<u32> = retry!(Duration::from_millis(1), 3u32, "test", {
            attempts += 1;
            if attempts < 3 {
                Err(anyhow!("connection reset"))
            } else {
                Ok(attempts)
            }
        });

        assert_eq!(res.unwrap(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let mut attempts = 0;

        let res: anyhow::Result<()> = retry!(Duration::from_millis(1), 2u32, "test", {
            attempts += 1;
            Err::<(), anyhow::Error>(anyhow!("connection reset"))
        });

        assert!(res.is_err());
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn reverted_transactions_are_not_retried() {
        let mut attempts = 0;

        let res: anyhow::Result<()> = retry!(Duration::from_millis(1), 5u32, "test", {
            attempts += 1;
            Err::<(), anyhow::Error>(
                ProviderError::UpgradeTransactionFailed {
                    tx_hash: H256::repeat_byte(1),
                }
                .into(),
            )
        });

        assert_eq!(attempts, 1);
        assert!(res.unwrap_err().to_string().contains("diamond upgrade failed"));
    }

    #[test]
    fn receipt_status() {
        let receipt = TransactionReceipt {
            transaction_hash: H256::repeat_byte(7),
            status: Some(U64::from(0)),
            ..Default::default()
        };

        let err = check_receipt(receipt).unwrap_err();
        match err.downcast_ref::<ProviderError>() {
            Some(ProviderError::UpgradeTransactionFailed { tx_hash }) => {
                assert_eq!(*tx_hash, H256::repeat_byte(7))
            }
            None => panic!("unexpected error: {err}"),
        }

        let receipt = TransactionReceipt {
            status: Some(U64::from(1)),
            ..Default::default()
        };
        assert!(check_receipt(receipt).is_ok());
    }
}
