//! Live scan progress
//!
//! Written by the scan workers, read at any time by whoever draws the
//! progress screen. Values are approximate while a scan runs.

use std::{
    path::PathBuf,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

#[derive(Debug, Default)]
pub struct ScanProgress {
    current_path: Mutex<Option<PathBuf>>,
    total_bytes: AtomicU64,
    total_items: AtomicU64,
}

/// Point-in-time copy of [`ScanProgress`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub current_path: Option<PathBuf>,
    pub total_bytes: u64,
    pub total_items: u64,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to zero; called at the start of every scan
    pub fn reset(&self) {
        *self.lock_path() = None;
        self.total_bytes.store(0, Ordering::Relaxed);
        self.total_items.store(0, Ordering::Relaxed);
    }

    pub fn set_current_path(&self, path: PathBuf) {
        *self.lock_path() = Some(path);
    }

    /// Account for one raw directory entry of `size` bytes
    pub fn record_entry(&self, size: u64) {
        self.total_items.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock_path().clone()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn total_items(&self) -> u64 {
        self.total_items.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current_path: self.current_path(),
            total_bytes: self.total_bytes(),
            total_items: self.total_items(),
        }
    }

    fn lock_path(&self) -> std::sync::MutexGuard<'_, Option<PathBuf>> {
        self.current_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
