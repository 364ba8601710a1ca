//! Small-file grouping
//!
//! Files below the threshold are not materialized individually: their sizes
//! and number are folded into one virtual node per directory, so a directory
//! holding half a million tiny files still renders as a handful of rows.

use crate::{file_node::FileNode, fs::DirEntryInfo};
use std::sync::Arc;

pub const MB: u64 = 1024 * 1024;

/// Name of the virtual node that stands in for files below `threshold` bytes
pub fn small_files_label(threshold: u64) -> String {
    format!("<Files smaller than {}MB>", threshold / MB)
}

/// Turn a directory listing into the children of `parent`.
///
/// Directories and files of at least `threshold` bytes become nodes of their
/// own. Smaller files are merged into a single virtual node appended at the
/// end; none is created when there are no small files.
pub fn group_small_files(
    parent: &Arc<FileNode>,
    entries: Vec<DirEntryInfo>,
    threshold: u64,
) -> Vec<Arc<FileNode>> {
    let mut children = Vec::with_capacity(entries.len().min(64));
    let mut small_size = 0u64;
    let mut small_count = 0u64;

    for entry in entries {
        if !entry.is_dir() && entry.size() < threshold {
            small_size += entry.size();
            small_count += 1;
        } else {
            children.push(FileNode::entry(parent, entry.name, entry.metadata));
        }
    }

    if small_count > 0 {
        children.push(FileNode::virtual_group(
            parent,
            small_files_label(threshold),
            small_size,
            small_count,
        ));
    }
    children
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::{file_node::NodeKind, fs::read_directory};
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn make_file(dir: &std::path::Path, name: &str, len: u64) {
        File::create(dir.join(name)).unwrap().set_len(len).unwrap();
    }

    #[test]
    fn label_uses_whole_megabytes() {
        assert_eq!(small_files_label(MB), "<Files smaller than 1MB>");
        assert_eq!(small_files_label(5 * MB + 10), "<Files smaller than 5MB>");
        assert_eq!(small_files_label(512), "<Files smaller than 0MB>");
    }

    #[test]
    fn all_small_files_collapse_into_one_node() {
        let tmp = tempdir().unwrap();
        for i in 0..20 {
            make_file(tmp.path(), &format!("f{i}"), 100);
        }
        let root = FileNode::root(tmp.path());

        let children = group_small_files(&root, read_directory(tmp.path()).unwrap(), MB);

        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), NodeKind::Virtual { size: 2000, count: 20 });
        assert_eq!(children[0].name(), "<Files smaller than 1MB>");
    }

    #[test]
    fn no_small_files_means_no_virtual_node() {
        let tmp = tempdir().unwrap();
        make_file(tmp.path(), "big1", 2 * MB);
        make_file(tmp.path(), "big2", MB);
        fs::create_dir(tmp.path().join("dir")).unwrap();
        let root = FileNode::root(tmp.path());

        let children = group_small_files(&root, read_directory(tmp.path()).unwrap(), MB);

        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|c| !c.is_virtual()));
        assert_eq!(children.iter().filter(|c| c.is_dir()).count(), 1);
    }

    #[test]
    fn mixed_listing_keeps_large_entries_and_appends_group() {
        let tmp = tempdir().unwrap();
        make_file(tmp.path(), "big", 3 * MB);
        make_file(tmp.path(), "small", 10);
        make_file(tmp.path(), "empty", 0);
        fs::create_dir(tmp.path().join("dir")).unwrap();
        let root = FileNode::root(tmp.path());

        let children = group_small_files(&root, read_directory(tmp.path()).unwrap(), MB);

        assert_eq!(children.len(), 3);
        let group = children.last().unwrap();
        assert_eq!(group.kind(), NodeKind::Virtual { size: 10, count: 2 });
        assert!(Arc::ptr_eq(&group.parent().unwrap(), &root));
    }

    #[test]
    fn zero_threshold_disables_grouping() {
        let tmp = tempdir().unwrap();
        make_file(tmp.path(), "empty", 0);
        make_file(tmp.path(), "tiny", 1);
        let root = FileNode::root(tmp.path());

        let children = group_small_files(&root, read_directory(tmp.path()).unwrap(), 0);

        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| !c.is_virtual()));
    }
}
