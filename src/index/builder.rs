use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Position;
use crate::index::inverted::InvertedIndex;

/// Text files are recognized by a `.txt` or `.text` extension, any case.
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("text"))
}

/// Files to index under `root`.
///
/// A directory is walked recursively and filtered with [`is_text_file`]; any
/// other path is returned as is. Unreadable directory entries are skipped.
pub fn text_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::new(
            ErrorKind::NotFound,
            format!("Build path {} does not exist", root.display()),
        ));
    }

    if !root.is_dir() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_text_file(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping entry: {}", Error::from(e)),
        }
    }

    Ok(files)
}

/// Location string a file is indexed under.
pub fn location_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Stem every line of `path` into `index`, numbering tokens from 1.
///
/// Returns the number of tokens added.
pub fn index_file(path: &Path, index: &mut InvertedIndex, analyzer: &Analyzer) -> Result<usize> {
    let location = location_of(path);
    let reader = BufReader::new(File::open(path)?);
    let mut position: Position = 0;

    for line in reader.lines() {
        for stem in analyzer.stems(&line?) {
            position += 1;
            index.add(&stem, &location, position);
        }
    }

    tracing::debug!("Indexed {} ({} tokens)", location, position);
    Ok(position as usize)
}

/// Single-threaded index builder
pub struct IndexBuilder<'a> {
    index: &'a mut InvertedIndex,
    analyzer: Analyzer,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(index: &'a mut InvertedIndex) -> Self {
        IndexBuilder::with_analyzer(index, Analyzer::standard_english())
    }

    pub fn with_analyzer(index: &'a mut InvertedIndex, analyzer: Analyzer) -> Self {
        IndexBuilder { index, analyzer }
    }

    /// Index every text file under `root`.
    ///
    /// A file that cannot be read is logged and skipped. Returns the number
    /// of files indexed.
    pub fn build(&mut self, root: &Path) -> Result<usize> {
        let files = text_files(root)?;
        tracing::info!("Building index from {} files under {}", files.len(), root.display());

        let mut indexed = 0;
        for file in &files {
            match index_file(file, self.index, &self.analyzer) {
                Ok(_) => indexed += 1,
                Err(e) => tracing::warn!("Failed to index {}: {}", file.display(), e),
            }
        }

        tracing::info!("Built {}", self.index);
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_text_file() {
        assert!(is_text_file(Path::new("a/b.txt")));
        assert!(is_text_file(Path::new("b.TEXT")));
        assert!(is_text_file(Path::new("b.Txt")));
        assert!(!is_text_file(Path::new("b.md")));
        assert!(!is_text_file(Path::new("txt")));
    }

    #[test]
    fn test_index_file_positions_span_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "Hello world\n\nhello again, 42\n").unwrap();

        let mut index = InvertedIndex::new();
        let tokens = index_file(&path, &mut index, &Analyzer::standard_english()).unwrap();
        let location = location_of(&path);

        assert_eq!(tokens, 4);
        assert_eq!(index.count(&location), 4);
        assert!(index.contains_position("hello", &location, 1));
        assert!(index.contains_position("hello", &location, 3));
        assert!(index.contains_position("again", &location, 4));
    }

    #[test]
    fn test_build_walks_text_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "apple").unwrap();
        fs::write(dir.path().join("skip.md"), "banana").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("b.text"), "cherry").unwrap();

        let mut index = InvertedIndex::new();
        let indexed = IndexBuilder::new(&mut index).build(dir.path()).unwrap();

        assert_eq!(indexed, 2);
        assert!(index.contains("appl"));
        assert!(index.contains("cherri"));
        assert!(!index.contains("banana"));
    }

    #[test]
    fn test_build_single_file_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "zebra").unwrap();

        let mut index = InvertedIndex::new();
        IndexBuilder::new(&mut index).build(&path).unwrap();

        assert!(index.contains("zebra"));
    }

    #[test]
    fn test_build_missing_root() {
        let mut index = InvertedIndex::new();
        let err = IndexBuilder::new(&mut index)
            .build(Path::new("/definitely/not/here"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
