use crate::{file_node::FileNode, scanner::ScanTree, sort::SortMode};
use ratatui::widgets::ListState;
use std::sync::Arc;
use tracing::{info, warn};

/// Application State
pub struct App {
    pub tree: ScanTree,
    pub current_node: Arc<FileNode>,
    /// Children of `current_node` in display order
    pub entries: Vec<Arc<FileNode>>,
    pub state: ListState,
    pub status_message: Option<String>,
    pub show_help: bool,
    pub pending_delete: Option<Arc<FileNode>>,
    pub sort_mode: SortMode,
    pub sort_ascending: bool,
}

impl App {
    pub fn new(tree: ScanTree) -> Self {
        let current_node = Arc::clone(tree.root());
        let mut app = Self {
            tree,
            current_node,
            entries: Vec::new(),
            state: ListState::default(),
            status_message: None,
            show_help: false,
            pending_delete: None,
            sort_mode: SortMode::Size,
            sort_ascending: false,
        };
        app.load_entries(None);
        app
    }

    /// Rebuild the visible list from the current node and pick a selection
    fn load_entries(&mut self, select: Option<&Arc<FileNode>>) {
        self.entries = self.current_node.children();
        self.sort_current_view();
        let index = select
            .and_then(|node| self.entries.iter().position(|e| Arc::ptr_eq(e, node)))
            .unwrap_or(0);
        if self.entries.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(index));
        }
    }

    pub fn sort_current_view(&mut self) {
        let sort_mode = self.sort_mode;
        let ascending = self.sort_ascending;
        self.entries.sort_by(|a, b| {
            let cmp = match sort_mode {
                SortMode::Size => a.size().cmp(&b.size()),
                SortMode::ModifiedTime => a.modified().cmp(&b.modified()),
                SortMode::ItemCount => a.count().cmp(&b.count()),
            };
            if ascending { cmp } else { cmp.reverse() }
        });
    }

    fn toggle_sort(&mut self, mode: SortMode) {
        if self.sort_mode == mode {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_mode = mode;
            self.sort_ascending = false;
        }
        let selected = self.selected();
        self.sort_current_view();
        if let Some(node) = selected
            && let Some(index) = self.entries.iter().position(|e| Arc::ptr_eq(e, &node))
        {
            self.state.select(Some(index));
        }
        self.status_message = Some(format!(
            "Sort: {} {}",
            self.sort_mode.name(),
            if self.sort_ascending { "asc" } else { "desc" }
        ));
    }

    pub fn toggle_sort_by_size(&mut self) {
        self.toggle_sort(SortMode::Size);
    }

    pub fn toggle_sort_by_mtime(&mut self) {
        self.toggle_sort(SortMode::ModifiedTime);
    }

    pub fn toggle_sort_by_count(&mut self) {
        self.toggle_sort(SortMode::ItemCount);
    }

    pub fn selected(&self) -> Option<Arc<FileNode>> {
        self.state
            .selected()
            .and_then(|i| self.entries.get(i))
            .cloned()
    }

    pub fn next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let page_size = 10;
        let i = match self.state.selected() {
            Some(i) => (i + page_size).min(self.entries.len() - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let page_size = 10;
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(page_size),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn go_to_first(&mut self) {
        if !self.entries.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn go_to_last(&mut self) {
        if !self.entries.is_empty() {
            self.state.select(Some(self.entries.len() - 1));
        }
    }

    /// Enter the selected directory
    pub fn enter_dir(&mut self) {
        if let Some(selected) = self.selected()
            && selected.is_dir()
        {
            self.current_node = selected;
            self.load_entries(None);
        }
    }

    /// Go up one level, keeping the directory we came from selected
    pub fn go_up(&mut self) {
        if let Some(parent) = self.current_node.parent() {
            let previous = std::mem::replace(&mut self.current_node, parent);
            self.load_entries(Some(&previous));
        }
    }

    /// Ask for confirmation before deleting the selected entry
    pub fn request_delete(&mut self) {
        match self.selected() {
            Some(node) if node.is_virtual() => {
                self.status_message = Some("Grouped small files cannot be deleted".to_string());
            }
            Some(node) => self.pending_delete = Some(node),
            None => {}
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the entry awaiting confirmation from disk and from the tree.
    ///
    /// On failure the tree is left as it was and the error is shown.
    pub fn confirm_delete(&mut self) {
        let Some(node) = self.pending_delete.take() else {
            return;
        };

        if let Err(e) = node.delete() {
            warn!(path = %node.path().display(), error = %e, "Delete failed");
            self.status_message = Some(e.to_string());
            return;
        }

        info!(path = %node.path().display(), "Deleted");
        let index = self.state.selected().unwrap_or(0);
        self.current_node
            .set_children(self.current_node.without_child(&node));
        self.refresh_ancestors();

        self.entries = self.current_node.children();
        self.sort_current_view();
        if self.entries.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(index.min(self.entries.len() - 1)));
        }
        self.status_message = Some(format!("Deleted {}", node.name()));
    }

    /// Re-set every ancestor's children; `set_children` only invalidates one level up
    fn refresh_ancestors(&self) {
        let mut node = self.current_node.parent();
        while let Some(ancestor) = node {
            ancestor.set_children(ancestor.children());
            node = ancestor.parent();
        }
    }

    pub fn current_total_size(&self) -> u64 {
        self.current_node.size()
    }
}
