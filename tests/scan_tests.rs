//! End-to-end scans over synthetic directory trees

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]

use pdu::{Error, FileNode, MB, NodeKind, ScanOptions, ScanProgress, ScanTree, default_concurrency, scan_directory};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};
use tempfile::tempdir;

fn sized(path: &Path, len: u64) {
    File::create(path).unwrap().set_len(len).unwrap();
}

fn scan(path: &Path, concurrency: usize, threshold: u64) -> ScanTree {
    let options = ScanOptions { concurrency, threshold };
    scan_directory(path, &options, &ScanProgress::new()).unwrap()
}

/// Every node's totals keyed by path
fn totals(tree: &ScanTree) -> BTreeMap<PathBuf, (u64, u64, bool)> {
    fn walk(node: &Arc<FileNode>, out: &mut BTreeMap<PathBuf, (u64, u64, bool)>) {
        out.insert(node.path(), (node.size(), node.count(), node.is_virtual()));
        for child in node.children() {
            walk(&child, out);
        }
    }
    let mut out = BTreeMap::new();
    walk(tree.root(), &mut out);
    out
}

fn assert_aggregates_consistent(node: &Arc<FileNode>) {
    match node.kind() {
        NodeKind::Dir => {
            let children = node.children();
            let size: u64 = children.iter().map(|c| c.size()).sum();
            let count: u64 = children.iter().map(|c| c.count()).sum();
            assert_eq!(node.size(), size, "size of {}", node);
            assert_eq!(node.count(), 1 + count, "count of {}", node);
            for child in &children {
                assert_aggregates_consistent(child);
            }
        }
        NodeKind::File => assert_eq!(node.count(), 1),
        NodeKind::Virtual { size, count } => {
            assert_eq!(node.size(), size);
            assert_eq!(node.count(), count);
            assert!(node.children().is_empty());
        }
    }
}

/// A few levels of mixed content
fn build_tree(root: &Path) {
    for i in 0..6 {
        let dir = root.join(format!("d{i}"));
        fs::create_dir(&dir).unwrap();
        for j in 0..5 {
            let sub = dir.join(format!("s{j}"));
            fs::create_dir(&sub).unwrap();
            sized(&sub.join("big"), (i * 5 + j + 1) * MB);
            for k in 0..4 {
                sized(&sub.join(format!("small{k}")), 100 * (k + 1));
            }
        }
        sized(&dir.join("tiny"), 7);
    }
    sized(&root.join("top"), 3 * MB);
}

#[test]
fn worked_example() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir_all(data.join("sub")).unwrap();
    sized(&data.join("a.txt"), 2 * MB);
    sized(&data.join("b.txt"), MB / 2);
    sized(&data.join("sub/c.txt"), 10 * MB);

    let tree = scan(&data, 4, MB);
    let children = tree.children();
    assert_eq!(children.len(), 3);

    let by_label: BTreeMap<String, &Arc<FileNode>> =
        children.iter().map(|c| (c.label(), c)).collect();

    let sub = by_label["sub/"];
    assert_eq!(sub.size(), 10 * MB);
    assert_eq!(sub.count(), 2);

    let group = by_label["<Files smaller than 1MB>"];
    assert!(group.is_virtual());
    assert_eq!(group.size(), MB / 2);
    assert_eq!(group.count(), 1);

    let a = by_label["a.txt"];
    assert_eq!(a.size(), 2 * MB);
    assert_eq!(a.count(), 1);

    assert_eq!(tree.root().size(), 12 * MB + MB / 2);
    assert_eq!(tree.root().count(), 5);
    assert_eq!(tree.root().label(), "/..");
}

#[test]
fn aggregates_follow_children() {
    let tmp = tempdir().unwrap();
    build_tree(tmp.path());

    let tree = scan(tmp.path(), 3, MB);
    assert_aggregates_consistent(tree.root());

    // each subdir: itself, big, 4 grouped files; each dir: itself, 5 subdirs, 1 grouped file
    assert_eq!(tree.root().count(), 1 + 6 * (1 + 5 * (1 + 1 + 4) + 1) + 1);
}

#[test]
fn results_do_not_depend_on_concurrency() {
    let tmp = tempdir().unwrap();
    build_tree(tmp.path());

    let single = totals(&scan(tmp.path(), 1, MB));
    let four = totals(&scan(tmp.path(), 4, MB));
    let auto = totals(&scan(tmp.path(), default_concurrency(), MB));
    let zero = totals(&scan(tmp.path(), 0, MB));

    assert_eq!(single, four);
    assert_eq!(single, auto);
    assert_eq!(single, zero);
}

#[test]
fn wide_directory_does_not_deadlock() {
    let tmp = tempdir().unwrap();
    let wide = tmp.path().join("wide");
    fs::create_dir(&wide).unwrap();
    for i in 0..10_000 {
        fs::create_dir(wide.join(format!("d{i:05}"))).unwrap();
    }
    for i in (0..10_000).step_by(1000) {
        let dir = wide.join(format!("d{i:05}"));
        fs::create_dir(dir.join("nested")).unwrap();
        sized(&dir.join("nested/blob"), 2 * MB);
    }

    let root = tmp.path().to_path_buf();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let tree = scan(&root, 2, MB);
        let _ = tx.send((tree.root().size(), tree.root().count()));
    });

    let (size, count) = rx
        .recv_timeout(Duration::from_secs(120))
        .expect("scan did not finish");
    assert_eq!(size, 10 * 2 * MB);
    // root + wide + 10,000 dirs + 10 nested dirs + 10 blobs
    assert_eq!(count, 1 + 1 + 10_000 + 10 + 10);
}

#[test]
fn deep_chain_completes() {
    let tmp = tempdir().unwrap();
    let mut dir = tmp.path().to_path_buf();
    for i in 0..200 {
        dir = dir.join(format!("l{i}"));
    }
    fs::create_dir_all(&dir).unwrap();
    sized(&dir.join("leaf"), 5 * MB);

    let tree = scan(tmp.path(), 2, MB);
    assert_eq!(tree.root().size(), 5 * MB);
    assert_eq!(tree.root().count(), 1 + 200 + 1);
}

#[test]
fn progress_counts_raw_entries() {
    let tmp = tempdir().unwrap();
    for i in 0..30 {
        sized(&tmp.path().join(format!("f{i}")), 10);
    }

    let progress = ScanProgress::new();
    let tree = scan_directory(tmp.path(), &ScanOptions::default(), &progress).unwrap();

    assert_eq!(progress.total_items(), 30);
    assert_eq!(progress.total_bytes(), 300);
    // only the group is materialized
    assert_eq!(tree.children().len(), 1);
    assert_eq!(progress.current_path(), Some(tmp.path().to_path_buf()));
}

#[test]
fn unreadable_root_yields_empty_tree() {
    let tmp = tempdir().unwrap();
    let tree = scan(&tmp.path().join("missing"), 2, MB);

    assert!(tree.children().is_empty());
    assert_eq!(tree.root().size(), 0);
    assert_eq!(tree.root().count(), 0);
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_counts_as_empty() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let locked = tmp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    sized(&locked.join("hidden"), 4 * MB);
    sized(&tmp.path().join("open"), 2 * MB);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // privileged users can read it anyway
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let tree = scan(tmp.path(), 2, MB);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let locked_node = tree
        .children()
        .into_iter()
        .find(|c| c.name() == "locked")
        .unwrap();
    assert!(locked_node.children().is_empty());
    assert_eq!(locked_node.size(), 0);
    assert_eq!(locked_node.count(), 1);
    assert_eq!(tree.root().size(), 2 * MB);
}

#[test]
fn delete_then_update_parent() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("keep")).unwrap();
    fs::create_dir_all(tmp.path().join("drop/inner")).unwrap();
    sized(&tmp.path().join("keep/k"), 2 * MB);
    sized(&tmp.path().join("drop/inner/x"), 3 * MB);

    let tree = scan(tmp.path(), 2, MB);
    let root = tree.root();
    assert_eq!(root.size(), 5 * MB);
    assert_eq!(root.count(), 6);

    let target = tree
        .children()
        .into_iter()
        .find(|c| c.name() == "drop")
        .unwrap();
    target.delete().unwrap();
    assert!(!tmp.path().join("drop").exists());

    root.set_children(root.without_child(&target));
    assert_eq!(root.children().len(), 1);
    assert_eq!(root.size(), 2 * MB);
    assert_eq!(root.count(), 3);
}

#[test]
fn failed_delete_keeps_tree() {
    let tmp = tempdir().unwrap();
    sized(&tmp.path().join("f"), 2 * MB);

    let tree = scan(tmp.path(), 2, MB);
    let file = tree.children().pop().unwrap();
    fs::remove_file(tmp.path().join("f")).unwrap();

    match file.delete() {
        Err(Error::Delete { path, source }) => {
            assert_eq!(path, tmp.path().join("f"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(tree.children().len(), 1);
    assert_eq!(tree.root().size(), 2 * MB);
}
