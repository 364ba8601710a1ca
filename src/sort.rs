#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortMode {
    Size,
    ModifiedTime,
    ItemCount,
}

impl SortMode {
    pub fn name(&self) -> &'static str {
        match self {
            SortMode::Size => "size",
            SortMode::ModifiedTime => "mtime",
            SortMode::ItemCount => "count",
        }
    }
}
