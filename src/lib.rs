pub mod app;
pub mod args;
pub mod colors;
pub mod error;
pub mod file_node;
pub mod fs;
pub mod group;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod sort;
pub mod ui;
pub mod utils;

pub use app::App;
pub use args::Args;
pub use error::{Error, Result};
pub use file_node::{FileNode, NodeKind};
pub use group::{MB, group_small_files, small_files_label};
pub use pool::ScanPool;
pub use progress::{ProgressSnapshot, ScanProgress};
pub use scanner::{ScanOptions, ScanTree, default_concurrency, scan_directory};
pub use sort::SortMode;
