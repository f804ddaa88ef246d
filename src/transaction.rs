//! Transaction Coordinator
//!
//! Runs a sequence of store operations as one sled multi-tree transaction.
//! Writes are buffered until commit, so an abort, a cancellation or a panic
//! anywhere in the sequence leaves the store untouched. sled re-runs the
//! sequence when a concurrent transaction conflicts; attempts are bounded so a
//! command fails fast instead of spinning.

use crate::error::{EngineError, StorageError};
use crate::store::{abort, StoreTrees, StoreTx, TxResult};
use serde::{Deserialize, Serialize};
use sled::Transactional;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transaction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Attempts (first run plus conflict retries) before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    16
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl TransactionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("transaction.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Shared flag a caller flips to abandon a command before it commits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Abort the surrounding transaction if cancellation was requested.
    pub fn check(&self) -> TxResult<()> {
        if self.is_cancelled() {
            return abort(EngineError::Cancelled);
        }
        Ok(())
    }
}

/// Opens, commits and rolls back units of work over the directory trees.
#[derive(Clone)]
pub struct TransactionCoordinator {
    db: sled::Db,
    trees: StoreTrees,
    config: TransactionConfig,
    flush_on_commit: bool,
}

impl TransactionCoordinator {
    pub fn new(db: sled::Db, trees: StoreTrees, config: TransactionConfig) -> Self {
        Self {
            db,
            trees,
            config,
            flush_on_commit: false,
        }
    }

    /// Flush the database to disk after every successful commit.
    pub fn with_flush_on_commit(mut self, flush: bool) -> Self {
        self.flush_on_commit = flush;
        self
    }

    /// Run `work` as a single unit of work.
    ///
    /// `work` may be invoked more than once when sled detects a conflict; each
    /// invocation starts from freshly read state. The token is checked before
    /// `work` runs and again right before commit.
    pub fn run<T, F>(&self, operation: &'static str, cancel: &CancelToken, work: F) -> Result<T, EngineError>
    where
        F: Fn(&StoreTx<'_>) -> TxResult<T>,
    {
        let attempts = Cell::new(0u32);
        let max_attempts = self.config.max_attempts;

        let result = self.trees.as_slice().transaction(|view| {
            let attempt = attempts.get() + 1;
            attempts.set(attempt);
            if attempt > max_attempts {
                return abort(StorageError::RetriesExhausted {
                    operation,
                    attempts: max_attempts,
                });
            }
            if attempt > 1 {
                warn!(operation, attempt, "Retrying transaction after conflict");
            }

            cancel.check()?;
            let tx = StoreTx::from_view(view);
            let output = work(&tx)?;
            cancel.check()?;
            Ok(output)
        });

        match result {
            Ok(output) => {
                if self.flush_on_commit {
                    report_flush(operation, self.db.flush());
                }
                debug!(operation, attempts = attempts.get(), "Transaction committed");
                Ok(output)
            }
            Err(err) => {
                let err = EngineError::from(err);
                warn!(
                    operation,
                    attempts = attempts.get(),
                    kind = ?err.kind(),
                    error = %err,
                    "Transaction rolled back"
                );
                Err(err)
            }
        }
    }
}

/// Runs after the commit, so a flush failure is logged and never returned.
fn report_flush(operation: &'static str, flushed: sled::Result<usize>) -> bool {
    match flushed {
        Ok(bytes) => {
            debug!(operation, bytes, "Flushed after commit");
            true
        }
        Err(err) => {
            warn!(operation, error = %err, "Commit succeeded but flush failed");
            false
        }
    }
}
