//! Mutation lock for catalog writers.
//!
//! Catalog mutation (adding or removing tables and jobs) must be serialized
//! to at most one active writer at a time: two writers racing against
//! independently loaded in-memory catalogs can allocate the same id or lose
//! one writer's root-record update. The catalog does not enforce this
//! internally; this module provides the reference mechanism, a lock using
//! the storage backend itself as the coordination point:
//!
//! - **CAS**: atomic acquisition via preconditioned writes
//! - **TTL**: automatic expiry to prevent deadlocks
//! - **Retry with backoff**: handles transient conflicts gracefully
//!
//! # How It Works
//!
//! 1. Lock acquisition writes a lock file with the holder's ID and expiry time
//! 2. The write uses the `DoesNotExist` precondition - only one writer can succeed
//! 3. If the lock exists, check if expired - if so, take it over via CAS
//! 4. Lock release deletes the lock file (or leaves it for TTL expiry)
//!
//! # Example
//!
//! ```rust,ignore
//! let lock = CatalogLock::new(storage.clone());
//!
//! // Acquire lock with 30s TTL and 5 retries
//! let guard = lock.acquire(Duration::from_secs(30), 5).await?;
//!
//! // Critical section - mutate and persist the catalog
//! let table = writer.create_table(&mut db, draft).await?;
//!
//! guard.release().await?;
//! ```

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use framehouse_core::{
    DatasetPaths, DatasetStorage, Error as CoreError, WritePrecondition, WriteResult,
};

use crate::error::Result;

/// Default lock TTL (30 seconds).
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

/// Default maximum retry attempts for lock acquisition.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Base backoff duration for retries.
const BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Maximum backoff duration.
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Lock file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockInfo {
    /// Unique lock holder ID.
    pub holder_id: String,

    /// When the lock expires.
    pub expires_at: DateTime<Utc>,

    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,

    /// Optional description of the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl LockInfo {
    /// Creates a new lock info with the given holder ID and TTL.
    #[must_use]
    pub fn new(holder_id: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            holder_id: holder_id.into(),
            expires_at: now
                + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(30)),
            acquired_at: now,
            operation: None,
        }
    }

    /// Returns whether this lock has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns the remaining TTL, or zero if expired.
    #[must_use]
    pub fn remaining_ttl(&self) -> Duration {
        let remaining = self.expires_at - Utc::now();
        let millis = remaining.num_milliseconds();
        if millis <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
        }
    }
}

/// The catalog mutation lock, backed by the dataset's storage.
///
/// Only one holder at a time can hold the lock for a given dataset root.
#[derive(Clone)]
pub struct CatalogLock {
    storage: DatasetStorage,
    lock_path: String,
    holder_id: String,
}

impl CatalogLock {
    /// Creates a new lock handle for the dataset.
    ///
    /// Each handle gets a unique holder ID for identification.
    #[must_use]
    pub fn new(storage: DatasetStorage) -> Self {
        Self {
            storage,
            lock_path: DatasetPaths::CATALOG_LOCK.to_string(),
            holder_id: Ulid::new().to_string(),
        }
    }

    /// Returns the holder ID for this lock handle.
    #[must_use]
    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }

    /// Attempts to acquire the lock with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock could not be acquired after all retries.
    pub async fn acquire(&self, ttl: Duration, max_retries: u32) -> Result<LockGuard> {
        self.acquire_with_operation(ttl, max_retries, None).await
    }

    /// Attempts to acquire the lock with an operation description.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock could not be acquired after all retries.
    pub async fn acquire_with_operation(
        &self,
        ttl: Duration,
        max_retries: u32,
        operation: Option<String>,
    ) -> Result<LockGuard> {
        let mut attempts = 0;
        let mut backoff = BACKOFF_BASE;

        loop {
            match self.try_acquire(ttl, operation.clone()).await {
                Ok(guard) => return Ok(guard),
                Err(LockAttemptError::AlreadyHeld(holder)) => {
                    attempts += 1;
                    if attempts >= max_retries {
                        return Err(CoreError::PreconditionFailed {
                            message: format!("lock held by {holder} after {max_retries} retries"),
                        }
                        .into());
                    }

                    // Exponential backoff with jitter
                    let jitter = Duration::from_millis(rand_jitter());
                    let delay = backoff.min(BACKOFF_MAX) + jitter;
                    tokio::time::sleep(delay).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(LockAttemptError::Storage(e)) => return Err(e.into()),
            }
        }
    }

    /// Attempts to acquire the lock once (no retries).
    async fn try_acquire(
        &self,
        ttl: Duration,
        operation: Option<String>,
    ) -> std::result::Result<LockGuard, LockAttemptError> {
        // First, try to create the lock with the DoesNotExist precondition
        let mut lock_info = LockInfo::new(&self.holder_id, ttl);
        lock_info.operation = operation;

        let lock_bytes = Bytes::from(serde_json::to_vec(&lock_info).map_err(|e| {
            LockAttemptError::Storage(CoreError::Serialization {
                message: format!("serialize lock: {e}"),
            })
        })?);

        match self
            .storage
            .put(
                &self.lock_path,
                lock_bytes.clone(),
                WritePrecondition::DoesNotExist,
            )
            .await
            .map_err(LockAttemptError::Storage)?
        {
            WriteResult::Success { .. } => {
                return Ok(LockGuard {
                    storage: self.storage.clone(),
                    lock_path: self.lock_path.clone(),
                    holder_id: self.holder_id.clone(),
                    released: false,
                });
            }
            WriteResult::PreconditionFailed { .. } => {
                // Lock exists - check if expired
            }
        }

        let existing = read_lock(&self.storage, &self.lock_path)
            .await
            .map_err(LockAttemptError::Storage)?;

        match existing {
            Some(info) if info.is_expired() => {
                // Expired lock - take it over atomically at its current version
                let meta = self
                    .storage
                    .head(&self.lock_path)
                    .await
                    .map_err(LockAttemptError::Storage)?
                    .ok_or_else(|| {
                        LockAttemptError::AlreadyHeld("race".into())
                    })?;

                match self
                    .storage
                    .put(
                        &self.lock_path,
                        lock_bytes,
                        WritePrecondition::MatchesVersion(meta.version),
                    )
                    .await
                    .map_err(LockAttemptError::Storage)?
                {
                    WriteResult::Success { .. } => Ok(LockGuard {
                        storage: self.storage.clone(),
                        lock_path: self.lock_path.clone(),
                        holder_id: self.holder_id.clone(),
                        released: false,
                    }),
                    WriteResult::PreconditionFailed { .. } => {
                        // Someone else took it - retry
                        Err(LockAttemptError::AlreadyHeld("unknown".into()))
                    }
                }
            }
            Some(info) => {
                // Lock is held and not expired
                Err(LockAttemptError::AlreadyHeld(info.holder_id))
            }
            None => {
                // Lock disappeared - retry from start
                Err(LockAttemptError::AlreadyHeld("race".into()))
            }
        }
    }

    /// Forcefully breaks an existing lock (admin operation).
    ///
    /// # Warning
    ///
    /// This should only be used for recovery when a lock is known to be
    /// stale but hasn't expired (e.g., crashed holder with a long TTL).
    ///
    /// # Errors
    ///
    /// Returns an error if the lock could not be broken.
    pub async fn force_break(&self) -> Result<()> {
        Ok(self.storage.delete(&self.lock_path).await?)
    }

    /// Checks if the lock is currently held (regardless of holder).
    ///
    /// # Errors
    ///
    /// Returns an error if the lock state could not be read.
    pub async fn is_locked(&self) -> Result<bool> {
        Ok(read_lock(&self.storage, &self.lock_path)
            .await?
            .is_some_and(|info| !info.is_expired()))
    }
}

/// Reads the current lock info, if any.
async fn read_lock(
    storage: &DatasetStorage,
    lock_path: &str,
) -> std::result::Result<Option<LockInfo>, CoreError> {
    match storage.get(lock_path).await {
        Ok(data) => {
            let info: LockInfo =
                serde_json::from_slice(&data).map_err(|e| CoreError::Serialization {
                    message: format!("parse lock: {e}"),
                })?;
            Ok(Some(info))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// RAII guard for a held lock.
///
/// The lock is released best-effort when the guard is dropped; prefer
/// calling [`release`](Self::release) explicitly to observe errors.
pub struct LockGuard {
    storage: DatasetStorage,
    lock_path: String,
    holder_id: String,
    released: bool,
}

impl LockGuard {
    /// Returns the holder ID for this lock.
    #[must_use]
    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }

    /// Explicitly releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock could not be released.
    pub async fn release(mut self) -> Result<()> {
        self.do_release().await
    }

    async fn do_release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }

        // Only release if we still own it
        if let Some(info) = read_lock(&self.storage, &self.lock_path).await? {
            if info.holder_id == self.holder_id {
                self.storage.delete(&self.lock_path).await?;
            }
        }

        self.released = true;
        Ok(())
    }

    /// Extends the lock TTL.
    ///
    /// Useful for long-running operations that need to hold the lock longer
    /// than initially expected.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is no longer held by this guard.
    pub async fn extend(&self, additional_ttl: Duration) -> Result<()> {
        let current = read_lock(&self.storage, &self.lock_path).await?;

        match current {
            Some(info) if info.holder_id == self.holder_id => {
                let mut new_info = info;
                new_info.expires_at = Utc::now()
                    + chrono::Duration::from_std(additional_ttl)
                        .unwrap_or(chrono::Duration::seconds(30));

                let lock_bytes = Bytes::from(serde_json::to_vec(&new_info).map_err(|e| {
                    CoreError::Serialization {
                        message: format!("serialize lock: {e}"),
                    }
                })?);

                // Use CAS to ensure we still own it
                let meta = self
                    .storage
                    .head(&self.lock_path)
                    .await?
                    .ok_or_else(|| CoreError::NotFound(self.lock_path.clone()))?;

                match self
                    .storage
                    .put(
                        &self.lock_path,
                        lock_bytes,
                        WritePrecondition::MatchesVersion(meta.version),
                    )
                    .await?
                {
                    WriteResult::Success { .. } => Ok(()),
                    WriteResult::PreconditionFailed { .. } => Err(CoreError::PreconditionFailed {
                        message: "lock modified by another holder".into(),
                    }
                    .into()),
                }
            }
            Some(_) => Err(CoreError::PreconditionFailed {
                message: "lock held by different holder".into(),
            }
            .into()),
            None => Err(CoreError::NotFound(self.lock_path.clone()).into()),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released {
            // Best-effort async release in destructor; outside a runtime the
            // lock is left for TTL expiry.
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let storage = self.storage.clone();
                let path = self.lock_path.clone();
                let holder = self.holder_id.clone();

                handle.spawn(async move {
                    if let Ok(data) = storage.get(&path).await {
                        if let Ok(info) = serde_json::from_slice::<LockInfo>(&data) {
                            if info.holder_id == holder {
                                let _ = storage.delete(&path).await;
                            }
                        }
                    }
                });
            }
        }
    }
}

/// Internal lock acquisition errors.
enum LockAttemptError {
    AlreadyHeld(String),
    Storage(CoreError),
}

/// Generates random jitter for backoff (0-50ms).
fn rand_jitter() -> u64 {
    // Simple time-derived jitter (avoids a rand dependency for this)
    use std::time::SystemTime;
    let seed = u64::from(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos(),
    );
    seed % 50
}
