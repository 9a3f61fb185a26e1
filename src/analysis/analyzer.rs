use std::collections::BTreeSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Text analysis pipeline
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// Normalized terms in the order they appear in `text`.
    pub fn stems(&self, text: &str) -> Vec<String> {
        self.analyze(text)
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    /// Sorted, deduplicated normalized terms of `text`.
    pub fn unique_stems(&self, text: &str) -> BTreeSet<String> {
        self.analyze(text)
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    /// Create standard analyzer for English: lowercased words, Snowball stems.
    pub fn standard_english() -> Self {
        Analyzer::new("standard_english".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(StemmerFilter::english()))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::standard_english()
    }
}

impl Clone for Analyzer {
    fn clone(&self) -> Self {
        Analyzer {
            tokenizer: self.tokenizer.clone_box(),
            filters: self.filters.iter().map(|f| f.clone_box()).collect(),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stems_lowercase_and_stem() {
        let analyzer = Analyzer::standard_english();

        let stems = analyzer.stems("Computers COMPUTING computed");
        assert_eq!(stems, vec!["comput", "comput", "comput"]);
    }

    #[test]
    fn test_unique_stems_are_sorted_and_deduplicated() {
        let analyzer = Analyzer::standard_english();

        let stems = analyzer.unique_stems("zebra apple Apples zebra");
        let stems: Vec<&str> = stems.iter().map(String::as_str).collect();
        assert_eq!(stems, vec!["appl", "zebra"]);
    }

    #[test]
    fn test_clone_keeps_pipeline() {
        let analyzer = Analyzer::standard_english().clone();

        assert_eq!(analyzer.filters.len(), 1);
        assert_eq!(analyzer.filters[0].name(), "stemmer");
        assert_eq!(analyzer.tokenizer.name(), "standard");
    }
}
