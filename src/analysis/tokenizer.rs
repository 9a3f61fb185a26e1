use crate::analysis::token::Token;
use crate::core::types::Position;
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

/// Standard Unicode tokenizer
///
/// Splits on Unicode word boundaries and keeps only the alphabetic characters
/// of each word, so `"don't"` becomes `"dont"` and `"42nd"` becomes `"nd"`.
/// Words left empty after cleaning are dropped and do not consume a position.
#[derive(Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            max_token_length: 255,
        }
    }
}

impl StandardTokenizer {
    fn clean(&self, word: &str) -> String {
        let letters = word.chars().filter(|c| c.is_alphabetic());
        if self.lowercase {
            letters.flat_map(char::to_lowercase).collect()
        } else {
            letters.collect()
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position: Position = 1;

        for (offset, word) in text.unicode_word_indices() {
            let cleaned = self.clean(word);
            if cleaned.is_empty() || cleaned.len() > self.max_token_length {
                continue;
            }

            tokens.push(Token::new(cleaned, position, offset));
            position += 1;
        }

        tokens
    }

    fn name(&self) -> &str {
        "standard"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}
