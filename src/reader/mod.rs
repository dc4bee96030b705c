//! Convert tokens into values.
//!
//! Parsing works against a token buffer and only consumes tokens once
//! a whole expression is available: running out of tokens mid
//! expression reports `Incomplete` and leaves the buffer untouched, so
//! a driver can append another line of input and try again.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

use fallible_iterator::FallibleIterator;

use crate::lexer::{tokenize, Token, TokenizerError};
use crate::vm::{intern, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderError {
    Tokenizer(TokenizerError),
    /// The buffer ended in the middle of an expression. More input
    /// may complete it.
    Incomplete,
    UnexpectedClose,
    BadDot,
}

impl From<TokenizerError> for ReaderError {
    fn from(error: TokenizerError) -> ReaderError {
        ReaderError::Tokenizer(error)
    }
}

impl fmt::Display for ReaderError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReaderError::Tokenizer(ref error) => write!(fmt, "{}", error),
            ReaderError::Incomplete => fmt.write_str("unexpected end of input"),
            ReaderError::UnexpectedClose => fmt.write_str("unexpected `)`"),
            ReaderError::BadDot => fmt.write_str("malformed dotted list"),
        }
    }
}

impl Error for ReaderError {}

/// A buffer of pending tokens, shared between the driver and the
/// `read` built-in.
#[derive(Debug, Default)]
pub struct Input {
    tokens: VecDeque<Token>,
}

impl Input {
    pub fn new() -> Input {
        Input {
            tokens: VecDeque::new(),
        }
    }

    /// Tokenize a chunk of source text and queue its tokens.
    pub fn push_source(&mut self, source: &str) -> Result<(), ReaderError> {
        let tokens = tokenize(source)?;
        self.tokens.extend(tokens);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Drop whatever is queued, e.g. after a parse error at the REPL.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Parse one expression, consuming its tokens. `Ok(None)` signals
    /// an empty buffer; `Incomplete` leaves the buffer as it was.
    pub fn read(&mut self) -> Result<Option<Value>, ReaderError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }
        let mut cursor = 0;
        let value = parse_expr(&self.tokens, &mut cursor)?;
        self.tokens.drain(..cursor);
        Ok(Some(value))
    }
}

/// Expression stream over a complete source string.
pub struct Exprs {
    input: Input,
}

impl Exprs {
    pub fn new(source: &str) -> Result<Exprs, ReaderError> {
        let mut input = Input::new();
        input.push_source(source)?;
        Ok(Exprs { input })
    }
}

impl FallibleIterator for Exprs {
    type Item = Value;
    type Error = ReaderError;

    fn next(&mut self) -> Result<Option<Value>, ReaderError> {
        self.input.read()
    }
}

fn parse_expr(tokens: &VecDeque<Token>, cursor: &mut usize) -> Result<Value, ReaderError> {
    let token = tokens.get(*cursor).ok_or(ReaderError::Incomplete)?;
    *cursor += 1;
    match *token {
        Token::Word(ref word) => Ok(classify(word)),
        Token::Str(ref literal) => Ok(Value::string(literal)),
        Token::Quote => {
            let quoted = parse_expr(tokens, cursor)?;
            Ok(Value::list(vec![Value::Symbol(intern("quote")), quoted]))
        }
        Token::Open => parse_list(tokens, cursor),
        Token::Close => Err(ReaderError::UnexpectedClose),
        Token::Dot => Err(ReaderError::BadDot),
    }
}

fn parse_list(tokens: &VecDeque<Token>, cursor: &mut usize) -> Result<Value, ReaderError> {
    let mut elements = Vec::new();
    loop {
        let next = tokens.get(*cursor).ok_or(ReaderError::Incomplete)?;
        match *next {
            Token::Close => {
                *cursor += 1;
                return Ok(Value::list(elements));
            }
            Token::Dot => {
                *cursor += 1;
                if elements.is_empty() {
                    return Err(ReaderError::BadDot);
                }
                let tail = match tokens.get(*cursor) {
                    Some(&Token::Close) => return Err(ReaderError::BadDot),
                    Some(_) => parse_expr(tokens, cursor)?,
                    None => return Err(ReaderError::Incomplete),
                };
                // Exactly one tail element, then the closing paren.
                return match tokens.get(*cursor) {
                    Some(&Token::Close) => {
                        *cursor += 1;
                        Ok(Value::improper(elements, tail))
                    }
                    Some(_) => Err(ReaderError::BadDot),
                    None => Err(ReaderError::Incomplete),
                };
            }
            _ => elements.push(parse_expr(tokens, cursor)?),
        }
    }
}

fn classify(word: &str) -> Value {
    match word {
        "#t" => Value::Boolean(true),
        "#f" => Value::Boolean(false),
        _ => {
            if looks_numeric(word) {
                if let Ok(n) = word.parse::<i64>() {
                    return Value::Integer(n);
                }
                if let Ok(f) = word.parse::<f64>() {
                    return Value::Float(f);
                }
            }
            Value::Symbol(intern(word))
        }
    }
}

/// A word is numeric if it starts with a digit, or with a sign or dot
/// directly followed by one. `+`, `-` and `...` stay symbols, and so
/// do names like `nan` that `f64` would otherwise happily parse.
fn looks_numeric(word: &str) -> bool {
    let mut chars = word.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if first.is_ascii_digit() {
        return true;
    }
    if first == '+' || first == '-' || first == '.' {
        match chars.next() {
            Some(c) => c.is_ascii_digit() || c == '.',
            None => false,
        }
    } else {
        false
    }
}

#[cfg(test)]
mod test {
    use fallible_iterator::FallibleIterator;

    use super::{Exprs, Input, ReaderError};
    use crate::vm::{intern, Value};

    fn read_one(source: &str) -> Result<Option<Value>, ReaderError> {
        let mut input = Input::new();
        input.push_source(source)?;
        input.read()
    }

    fn assert_reads(source: &str, expected: Value) {
        match read_one(source) {
            Ok(Some(value)) => assert_eq!(value, expected, "reading {:?}", source),
            other => panic!("reading {:?} gave {:?}", source, other),
        }
    }

    #[test]
    fn atoms() {
        assert_reads("42", Value::Integer(42));
        assert_reads("-17", Value::Integer(-17));
        assert_reads("2.5", Value::Float(2.5));
        assert_reads("1e3", Value::Float(1000.0));
        assert_reads(".5", Value::Float(0.5));
        assert_reads("#t", Value::Boolean(true));
        assert_reads("#f", Value::Boolean(false));
        assert_reads("\"hi there\"", Value::string("hi there"));
        assert_reads("foo", Value::Symbol(intern("foo")));
    }

    #[test]
    fn sign_words_stay_symbols() {
        assert_reads("+", Value::Symbol(intern("+")));
        assert_reads("-", Value::Symbol(intern("-")));
        assert_reads("...", Value::Symbol(intern("...")));
        assert_reads("nan", Value::Symbol(intern("nan")));
    }

    #[test]
    fn lists_nest() {
        assert_reads(
            "(+ 1 (add 2 3))",
            Value::list(vec![
                Value::Symbol(intern("+")),
                Value::Integer(1),
                Value::list(vec![
                    Value::Symbol(intern("add")),
                    Value::Integer(2),
                    Value::Integer(3),
                ]),
            ]),
        );
        assert_reads("()", Value::Null);
    }

    #[test]
    fn dotted_pairs() {
        assert_reads(
            "(1 . 2)",
            Value::cons(Value::Integer(1), Value::Integer(2)),
        );
        assert_reads(
            "(1 2 . 3)",
            Value::improper(
                vec![Value::Integer(1), Value::Integer(2)],
                Value::Integer(3),
            ),
        );
    }

    #[test]
    fn quote_expands() {
        assert_reads(
            "'x",
            Value::list(vec![
                Value::Symbol(intern("quote")),
                Value::Symbol(intern("x")),
            ]),
        );
        assert_reads(
            "''x",
            Value::list(vec![
                Value::Symbol(intern("quote")),
                Value::list(vec![
                    Value::Symbol(intern("quote")),
                    Value::Symbol(intern("x")),
                ]),
            ]),
        );
    }

    #[test]
    fn reader_errors() {
        assert_eq!(read_one(")"), Err(ReaderError::UnexpectedClose));
        assert_eq!(read_one("(1 . )"), Err(ReaderError::BadDot));
        assert_eq!(read_one("(. 2)"), Err(ReaderError::BadDot));
        assert_eq!(read_one("(1 . 2 3)"), Err(ReaderError::BadDot));
        assert_eq!(read_one("(1 2"), Err(ReaderError::Incomplete));
        assert_eq!(read_one("'"), Err(ReaderError::Incomplete));
    }

    #[test]
    fn incomplete_reads_leave_the_buffer_for_more_input() {
        let mut input = Input::new();
        input.push_source("(cons 1").expect("tokens");
        assert_eq!(input.read(), Err(ReaderError::Incomplete));
        input.push_source("2)").expect("tokens");
        let value = input.read().expect("complete now").expect("one expression");
        assert_eq!(
            value,
            Value::list(vec![
                Value::Symbol(intern("cons")),
                Value::Integer(1),
                Value::Integer(2),
            ])
        );
        assert!(input.is_empty());
    }

    #[test]
    fn read_consumes_one_expression_at_a_time() {
        let mut input = Input::new();
        input.push_source("1 2 3").expect("tokens");
        assert_eq!(input.read(), Ok(Some(Value::Integer(1))));
        assert_eq!(input.read(), Ok(Some(Value::Integer(2))));
        assert_eq!(input.read(), Ok(Some(Value::Integer(3))));
        assert_eq!(input.read(), Ok(None));
    }

    #[test]
    fn exprs_streams_a_whole_source() {
        let exprs = Exprs::new("1 (2 3) x").expect("tokens");
        let all = exprs.collect::<Vec<_>>().expect("three expressions");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], Value::Integer(1));
        assert_eq!(
            all[1],
            Value::list(vec![Value::Integer(2), Value::Integer(3)])
        );
        assert_eq!(all[2], Value::Symbol(intern("x")));
    }

    #[test]
    fn symbols_read_interned() {
        let a = read_one("foo").unwrap().unwrap();
        let b = read_one("foo").unwrap().unwrap();
        assert!(a.is_eq(&b));
    }
}
