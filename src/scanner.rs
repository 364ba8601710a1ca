use crate::{
    args::Args,
    error::Result,
    file_node::FileNode,
    group::MB,
    pool::ScanPool,
    progress::ScanProgress,
};
use std::{path::Path, sync::Arc, time::Instant};
use tracing::info;

/// Tuning for a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Worker threads; 0 picks one per available CPU
    pub concurrency: usize,
    /// Files smaller than this many bytes are grouped; 0 disables grouping
    pub threshold: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 0,
            threshold: MB,
        }
    }
}

impl From<&Args> for ScanOptions {
    fn from(args: &Args) -> Self {
        Self {
            concurrency: args.concurrency,
            threshold: args.threshold.saturating_mul(MB),
        }
    }
}

/// Result of a scan. Owns the root, and through it every node of the tree.
#[derive(Debug)]
pub struct ScanTree {
    root: Arc<FileNode>,
}

impl ScanTree {
    pub fn root(&self) -> &Arc<FileNode> {
        &self.root
    }

    /// Children of the starting directory
    pub fn children(&self) -> Vec<Arc<FileNode>> {
        self.root.children()
    }
}

/// Number of workers used when none is requested
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

/// Scan `path` in parallel and build the browsable tree.
///
/// `progress` is reset first and then updated by the workers while the scan
/// runs. Unreadable directories, including `path` itself, show up empty rather
/// than failing the scan.
pub fn scan_directory(path: &Path, options: &ScanOptions, progress: &ScanProgress) -> Result<ScanTree> {
    progress.reset();

    let started = Instant::now();
    let root = FileNode::root(path);
    let workers = match options.concurrency {
        0 => default_concurrency(),
        n => n,
    };

    info!(
        path = %path.display(),
        workers,
        threshold = options.threshold,
        "Scan starting"
    );

    let pool = ScanPool::new(workers, options.threshold, progress);
    pool.run(Arc::clone(&root))?;

    info!(
        items = progress.total_items(),
        bytes = progress.total_bytes(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Scan complete"
    );

    Ok(ScanTree { root })
}
