use crate::core::types::Position;

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,        // The token text
    pub position: Position,  // 1-based position within the analyzed text
    pub offset: usize,       // Byte offset of the source word
}

impl Token {
    pub fn new(text: String, position: Position, offset: usize) -> Self {
        Token {
            text,
            position,
            offset,
        }
    }
}
