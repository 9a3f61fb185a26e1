use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::index::builder::{index_file, text_files};
use crate::index::concurrent::ConcurrentInvertedIndex;
use crate::index::inverted::InvertedIndex;
use crate::parallel::work_queue::WorkQueue;

/// Multithreaded index builder
///
/// Every text file becomes one task: the task stems the file into a private
/// index and merges it into the shared index with a single `add_all`.
pub struct ConcurrentIndexBuilder {
    index: Arc<ConcurrentInvertedIndex>,
    queue: Arc<WorkQueue>,
    analyzer: Arc<Analyzer>,
}

impl ConcurrentIndexBuilder {
    pub fn new(index: Arc<ConcurrentInvertedIndex>, queue: Arc<WorkQueue>) -> Self {
        ConcurrentIndexBuilder::with_analyzer(index, queue, Analyzer::standard_english())
    }

    pub fn with_analyzer(
        index: Arc<ConcurrentInvertedIndex>,
        queue: Arc<WorkQueue>,
        analyzer: Analyzer,
    ) -> Self {
        ConcurrentIndexBuilder {
            index,
            queue,
            analyzer: Arc::new(analyzer),
        }
    }

    /// Index every text file under `root` and wait for all file tasks.
    ///
    /// Returns the number of files this build indexed. A failed file is
    /// recorded on the queue like any other task failure.
    pub fn build(&self, root: &Path) -> Result<usize> {
        let files = text_files(root)?;
        let total = files.len();
        tracing::info!(
            "Building index from {} files under {} with {} workers",
            total,
            root.display(),
            self.queue.size()
        );

        let indexed = Arc::new(AtomicUsize::new(0));
        for file in files {
            let index = self.index.clone();
            let analyzer = self.analyzer.clone();
            let indexed = indexed.clone();

            self.queue.execute(move || {
                let mut local = InvertedIndex::new();
                index_file(&file, &mut local, &analyzer)?;
                index.add_all(local);
                indexed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            });
        }

        self.queue.finish();

        let indexed = indexed.load(Ordering::Relaxed);
        if indexed < total {
            tracing::warn!("{} of {} files could not be indexed", total - indexed, total);
        }
        tracing::info!("Built {}", self.index);
        Ok(indexed)
    }
}
