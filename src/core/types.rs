use std::collections::BTreeSet;

/// 1-based token position within a document.
pub type Position = u32;

/// Document identifier: a file path or a URL.
pub type Location = String;

/// Ordered, unique positions of one term within one document.
pub type Posting = BTreeSet<Position>;
