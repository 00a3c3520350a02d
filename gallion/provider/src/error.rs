// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use ethers::types::TxHash;
use thiserror::Error;

/// Failures that must not be retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The transaction was mined but reverted; the diamond is left as it was.
    #[error("diamond upgrade failed: {tx_hash:?}")]
    UpgradeTransactionFailed { tx_hash: TxHash },
}
