use std::error::Error;
use std::fmt;

/**
    Tokenizer

    Works line by line, in three passes before the whitespace split:

    1. String literals are pulled out verbatim (no escape processing;
       a literal ends at the next `"`) and replaced by numbered
       placeholders so the later passes never look inside them.
    2. A `;` starts a comment running to the end of the line.
    3. `(`, `)` and `'` are padded with spaces so they become words of
       their own.

    A consequence of the ordering is that a literal must close on the
    line it opened on.
*/

/// Stands in for an extracted string literal while the rest of the
/// line is split. Not a character source text is expected to contain.
const LITERAL_MARK: char = '\u{1a}';

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open,
    Close,
    Quote,
    Dot,
    Str(String),
    Word(String),
}

/// The possible errors while tokenizing the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenizerError {
    UnterminatedString,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TokenizerError::UnterminatedString => fmt.write_str("unterminated string literal"),
        }
    }
}

impl Error for TokenizerError {}

pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizerError> {
    let mut tokens = Vec::new();
    for line in source.lines() {
        tokenize_line(line, &mut tokens)?;
    }
    Ok(tokens)
}

fn tokenize_line(line: &str, tokens: &mut Vec<Token>) -> Result<(), TokenizerError> {
    let mut literals = Vec::new();
    let mut stripped = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '"' {
            stripped.push(c);
            continue;
        }
        let mut literal = String::new();
        loop {
            match chars.next() {
                Some('"') => break,
                Some(c) => literal.push(c),
                None => return Err(TokenizerError::UnterminatedString),
            }
        }
        stripped.push(' ');
        stripped.push(LITERAL_MARK);
        stripped.push_str(&literals.len().to_string());
        stripped.push(' ');
        literals.push(literal);
    }

    let code = match stripped.find(';') {
        Some(at) => &stripped[..at],
        None => &stripped[..],
    };

    let mut padded = String::with_capacity(code.len());
    for c in code.chars() {
        match c {
            '(' | ')' | '\'' => {
                padded.push(' ');
                padded.push(c);
                padded.push(' ');
            }
            _ => padded.push(c),
        }
    }

    for word in padded.split_whitespace() {
        let token = match word {
            "(" => Token::Open,
            ")" => Token::Close,
            "'" => Token::Quote,
            "." => Token::Dot,
            _ => match literal_index(word) {
                Some(index) => match literals.get(index) {
                    Some(literal) => Token::Str(literal.clone()),
                    None => Token::Word(word.to_owned()),
                },
                None => Token::Word(word.to_owned()),
            },
        };
        tokens.push(token);
    }
    Ok(())
}

fn literal_index(word: &str) -> Option<usize> {
    word.strip_prefix(LITERAL_MARK)?.parse().ok()
}
