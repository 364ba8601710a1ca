//! In-memory result tree
//!
//! A [`FileNode`] is one row of the browsable tree: a real file, a real
//! directory, or a synthetic group of small files. Parents own their children
//! through `Arc`; children point back with a `Weak` used for path
//! reconstruction and cache invalidation only.
//!
//! Aggregate size and count are memoized per node. A cached value is tagged
//! with the node's epoch; bumping the epoch (from `set_children` on the node
//! itself, or from a child) makes the next read recompute. Concurrent readers
//! may compute the same value twice, which is harmless because the
//! computation only depends on already materialized children.

use crate::error::{Error, Result};
use std::{
    borrow::Cow,
    ffi::OsString,
    fmt,
    fs::{self, Metadata},
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock, RwLockReadGuard, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

/// Label shown for the node the scan started from
pub const ROOT_LABEL: &str = "/..";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
    /// Merged small files; totals are fixed at creation
    Virtual { size: u64, count: u64 },
}

#[derive(Debug, Clone, Copy, Default)]
struct Memo {
    epoch: u64,
    size: Option<u64>,
    count: Option<u64>,
}

/// Represents a file, a directory or a group of small files
pub struct FileNode {
    name: OsString,
    kind: NodeKind,
    /// `None` only for the root
    parent: Option<Weak<FileNode>>,
    children: RwLock<Vec<Arc<FileNode>>>,
    memo: Mutex<Memo>,
    epoch: AtomicU64,
    info: OnceLock<Option<Metadata>>,
}

impl FileNode {
    /// Build the root from the starting path.
    ///
    /// The root starts out with zero size and count so that an unreadable
    /// starting directory still yields a usable (empty) tree. Expanding it
    /// replaces those totals.
    pub fn root(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let info = match fs::metadata(&path) {
            Ok(metadata) => OnceLock::from(Some(metadata)),
            Err(_) => OnceLock::new(),
        };
        Arc::new(Self {
            name: path.into_os_string(),
            kind: NodeKind::Dir,
            parent: None,
            children: RwLock::new(Vec::new()),
            memo: Mutex::new(Memo {
                epoch: 0,
                size: Some(0),
                count: Some(0),
            }),
            epoch: AtomicU64::new(0),
            info,
        })
    }

    /// Build a node for an entry discovered while reading `parent`
    pub fn entry(parent: &Arc<FileNode>, name: OsString, metadata: Metadata) -> Arc<Self> {
        let kind = if metadata.is_dir() {
            NodeKind::Dir
        } else {
            NodeKind::File
        };
        Arc::new(Self {
            name,
            kind,
            parent: Some(Arc::downgrade(parent)),
            children: RwLock::new(Vec::new()),
            memo: Mutex::new(Memo::default()),
            epoch: AtomicU64::new(0),
            info: OnceLock::from(Some(metadata)),
        })
    }

    /// Build a synthetic node standing in for `count` files totalling `size` bytes
    pub fn virtual_group(parent: &Arc<FileNode>, name: String, size: u64, count: u64) -> Arc<Self> {
        Arc::new(Self {
            name: OsString::from(name),
            kind: NodeKind::Virtual { size, count },
            parent: Some(Arc::downgrade(parent)),
            children: RwLock::new(Vec::new()),
            memo: Mutex::new(Memo::default()),
            epoch: AtomicU64::new(0),
            info: OnceLock::from(None),
        })
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// True for real directories; virtual groups are never directories
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, NodeKind::Virtual { .. })
    }

    /// True for the node built from the starting path
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<Arc<FileNode>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Snapshot of the current children
    pub fn children(&self) -> Vec<Arc<FileNode>> {
        self.read_children().clone()
    }

    /// Current children minus `child` (compared by identity)
    pub fn without_child(&self, child: &Arc<FileNode>) -> Vec<Arc<FileNode>> {
        self.read_children()
            .iter()
            .filter(|c| !Arc::ptr_eq(c, child))
            .cloned()
            .collect()
    }

    /// Full path, rebuilt from the parent chain
    pub fn path(&self) -> PathBuf {
        match self.parent() {
            Some(parent) => parent.path().join(&self.name),
            None => PathBuf::from(&self.name),
        }
    }

    pub fn label(&self) -> String {
        if self.is_virtual() {
            return self.name().into_owned();
        }
        if self.is_root() {
            return ROOT_LABEL.to_string();
        }
        if self.is_dir() {
            return format!("{}/", self.name());
        }
        self.name().into_owned()
    }

    /// Stat result for this node.
    ///
    /// Scanned entries carry the metadata from the directory listing. The root
    /// is stat'ed lazily, once, if the initial stat failed.
    pub fn info(&self) -> Option<&Metadata> {
        self.info
            .get_or_init(|| match self.kind {
                NodeKind::Virtual { .. } => None,
                _ => fs::symlink_metadata(self.path()).ok(),
            })
            .as_ref()
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.info().and_then(|m| m.modified().ok())
    }

    /// Total bytes below (and including) this node
    pub fn size(&self) -> u64 {
        if let NodeKind::Virtual { size, .. } = self.kind {
            return size;
        }
        let memo = self.current_memo();
        if let Some(size) = memo.size {
            return size;
        }

        let total = match self.kind {
            NodeKind::File => self.info().map_or(0, Metadata::len),
            _ => self.read_children().iter().map(|c| c.size()).sum(),
        };

        let mut guard = self.lock_memo();
        if guard.epoch == memo.epoch && self.epoch.load(Ordering::Acquire) == memo.epoch {
            guard.size = Some(total);
        }
        total
    }

    /// Number of entries represented by this node.
    ///
    /// Files count as one, directories as one plus their contents, and a
    /// virtual group as the number of files it merged.
    pub fn count(&self) -> u64 {
        match self.kind {
            NodeKind::Virtual { count, .. } => return count,
            NodeKind::File => return 1,
            NodeKind::Dir => {}
        }
        let memo = self.current_memo();
        if let Some(count) = memo.count {
            return count;
        }

        let total = 1 + self
            .read_children()
            .iter()
            .map(|c| c.count())
            .sum::<u64>();

        let mut guard = self.lock_memo();
        if guard.epoch == memo.epoch && self.epoch.load(Ordering::Acquire) == memo.epoch {
            guard.count = Some(total);
        }
        total
    }

    /// Replace the children wholesale.
    ///
    /// This node's totals are reset before the children lock is released. The
    /// parent is only notified (its epoch is bumped) and recomputes on its next
    /// read; ancestors further up keep their cached totals.
    pub fn set_children(&self, children: Vec<Arc<FileNode>>) {
        {
            let mut current = self
                .children
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let mut memo = self.lock_memo();
            *current = children;
            let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
            *memo = Memo {
                epoch,
                size: None,
                count: None,
            };
        }
        if let Some(parent) = self.parent() {
            parent.invalidate();
        }
    }

    /// Remove the underlying file or directory tree from disk.
    ///
    /// The in-memory tree is left alone; callers drop the node from its parent
    /// with [`FileNode::without_child`] and [`FileNode::set_children`].
    pub fn delete(&self) -> Result<()> {
        let path = self.path();
        let removed = match self.kind {
            NodeKind::Virtual { .. } => {
                return Err(Error::VirtualEntry {
                    name: self.name().into_owned(),
                });
            }
            NodeKind::Dir => fs::remove_dir_all(&path),
            NodeKind::File => fs::remove_file(&path),
        };
        removed.map_err(|source| Error::Delete { path, source })
    }

    fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Memo for the current epoch, dropping values cached before an invalidation
    fn current_memo(&self) -> Memo {
        let mut memo = self.lock_memo();
        let epoch = self.epoch.load(Ordering::Acquire);
        if memo.epoch != epoch {
            *memo = Memo {
                epoch,
                size: None,
                count: None,
            };
        }
        *memo
    }

    fn lock_memo(&self) -> MutexGuard<'_, Memo> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_children(&self) -> RwLockReadGuard<'_, Vec<Arc<FileNode>>> {
        self.children.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("children", &self.read_children().len())
            .finish()
    }
}

impl fmt::Display for FileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}
