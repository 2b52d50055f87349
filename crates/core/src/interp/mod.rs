//! Content-stream tokenization and interpretation.

pub mod interpreter;
pub mod tokenizer;

pub use interpreter::{ContentInterpreter, PageContent};
pub use tokenizer::{Token, TokenKind, tokenize};
