mod token;

#[cfg(test)]
mod token_test;

pub use self::token::{tokenize, Token, TokenizerError};
