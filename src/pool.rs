//! Worker pool that expands directories in parallel
//!
//! Directories waiting to be expanded sit in a bounded queue of `4 * workers`
//! slots. A worker that discovers subdirectories tries to queue each one a few
//! times; if the queue stays full it expands that subtree itself, depth-first,
//! without touching the queue. Workers therefore never block on a full queue,
//! which would deadlock the pool once every worker is waiting to enqueue.
//!
//! Completion is tracked by a single outstanding-work counter: it starts at 1
//! for the root, is incremented before a subdirectory is handed off and is
//! decremented once a directory is fully expanded. The worker that brings it
//! to zero closes the queue, and the remaining workers drain and exit.

use crate::{
    error::{Error, Result},
    file_node::FileNode,
    fs::read_directory,
    group::group_small_files,
    progress::ScanProgress,
};
use crossbeam_channel::{Receiver, SendError, Sender, TrySendError, bounded};
use std::{
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};
use tracing::{debug, trace};

/// Queue slots per worker
pub const QUEUE_SLOTS_PER_WORKER: usize = 4;

/// Attempts to queue a subdirectory before expanding it inline
const ENQUEUE_ATTEMPTS: usize = 3;

/// Pause between enqueue attempts while the queue is full
const ENQUEUE_BACKOFF: Duration = Duration::from_micros(1);

/// Counters describing how the work was distributed
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Directories handed to the queue
    pub enqueued: AtomicU64,

    /// Directories expanded inline because the queue was full
    pub inlined: AtomicU64,

    /// Directories that could not be read
    pub unreadable: AtomicU64,
}

impl PoolStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn inlined(&self) -> u64 {
        self.inlined.load(Ordering::Relaxed)
    }

    pub fn unreadable(&self) -> u64 {
        self.unreadable.load(Ordering::Relaxed)
    }
}

pub struct ScanPool<'a> {
    workers: usize,
    threshold: u64,
    progress: &'a ScanProgress,

    /// Taken exactly once, when the outstanding counter reaches zero
    sender: RwLock<Option<Sender<Arc<FileNode>>>>,
    receiver: Receiver<Arc<FileNode>>,

    outstanding: AtomicUsize,
    stats: PoolStats,
}

impl<'a> ScanPool<'a> {
    pub fn new(workers: usize, threshold: u64, progress: &'a ScanProgress) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = bounded(workers * QUEUE_SLOTS_PER_WORKER);

        Self {
            workers,
            threshold,
            progress,
            sender: RwLock::new(Some(sender)),
            receiver,
            outstanding: AtomicUsize::new(1),
            stats: PoolStats::default(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn capacity(&self) -> usize {
        self.workers * QUEUE_SLOTS_PER_WORKER
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Expand `root` and everything below it, returning once every worker exited
    pub fn run(&self, root: Arc<FileNode>) -> Result<()> {
        thread::scope(|scope| {
            for id in 0..self.workers {
                let spawned = thread::Builder::new()
                    .name(format!("scan-{id}"))
                    .spawn_scoped(scope, move || self.worker_loop(id));

                if let Err(source) = spawned {
                    // let the workers already running drain and exit
                    self.close();
                    return Err(Error::Spawn { source });
                }
            }

            self.seed(root);
            Ok(())
        })?;

        debug!(
            workers = self.workers,
            enqueued = self.stats.enqueued(),
            inlined = self.stats.inlined(),
            unreadable = self.stats.unreadable(),
            "Scan pool finished"
        );
        Ok(())
    }

    fn seed(&self, root: Arc<FileNode>) {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let sent = match guard.as_ref() {
            Some(sender) => sender.send(root),
            None => Err(SendError(root)),
        };
        drop(guard);

        if let Err(SendError(root)) = sent {
            self.expand_inline(root);
        }
    }

    fn worker_loop(&self, id: usize) {
        trace!(worker = id, "Scan worker starting");
        let mut expanded = 0u64;

        while let Ok(dir) = self.receiver.recv() {
            self.process(&dir);
            expanded += 1;
        }

        trace!(worker = id, dirs = expanded, "Scan worker stopping");
    }

    /// Expand a dequeued directory and hand off its subdirectories
    fn process(&self, dir: &Arc<FileNode>) {
        if let Some(subdirs) = self.expand(dir) {
            for subdir in subdirs {
                self.outstanding.fetch_add(1, Ordering::AcqRel);
                if let Err(subdir) = self.try_enqueue(subdir) {
                    self.stats.inlined.fetch_add(1, Ordering::Relaxed);
                    self.expand_inline(subdir);
                }
            }
        }
        self.finish_task();
    }

    /// Expand `dir` and its whole subtree on the calling thread.
    ///
    /// `dir` must already be counted as outstanding.
    fn expand_inline(&self, dir: Arc<FileNode>) {
        let mut stack = vec![dir];
        while let Some(dir) = stack.pop() {
            if let Some(subdirs) = self.expand(&dir) {
                self.outstanding.fetch_add(subdirs.len(), Ordering::AcqRel);
                stack.extend(subdirs.into_iter().rev());
            }
            self.finish_task();
        }
    }

    /// Read one directory, group its entries and install them as children.
    ///
    /// Returns the real subdirectories, or `None` if the directory could not
    /// be read, in which case it is left empty.
    fn expand(&self, dir: &Arc<FileNode>) -> Option<Vec<Arc<FileNode>>> {
        let path = dir.path();
        self.progress.set_current_path(path.clone());

        let entries = match read_directory(&path) {
            Ok(entries) => entries,
            Err(e) => {
                self.stats.unreadable.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, "Directory skipped");
                return None;
            }
        };

        for entry in &entries {
            self.progress.record_entry(entry.size());
        }

        let children = group_small_files(dir, entries, self.threshold);
        let subdirs = children
            .iter()
            .filter(|c| c.is_dir())
            .cloned()
            .collect();
        dir.set_children(children);
        Some(subdirs)
    }

    /// Queue `dir` for another worker, giving it back if the queue stays full
    fn try_enqueue(&self, dir: Arc<FileNode>) -> std::result::Result<(), Arc<FileNode>> {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            return Err(dir);
        };

        let mut dir = dir;
        for _ in 0..ENQUEUE_ATTEMPTS {
            match sender.try_send(dir) {
                Ok(()) => {
                    self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }
                Err(TrySendError::Full(back)) => {
                    dir = back;
                    thread::sleep(ENQUEUE_BACKOFF);
                }
                Err(TrySendError::Disconnected(back)) => return Err(back),
            }
        }
        Err(dir)
    }

    fn finish_task(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.close();
        }
    }

    /// Drop the only sender; workers exit once the queue is drained
    fn close(&self) {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            trace!("Scan queue closed");
        }
    }
}
