extern crate fallible_iterator;
#[macro_use]
extern crate gc;
#[macro_use]
extern crate log;

pub mod lexer;
pub mod reader;
pub mod vm;

use std::error::Error;
use std::fmt;

use fallible_iterator::FallibleIterator;

use crate::reader::{Exprs, ReaderError};
use crate::vm::{ExecutionError, Machine, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterError {
    Read(ReaderError),
    Exec(ExecutionError),
    /// The source contained no expression at all.
    Eof,
}

impl From<ReaderError> for InterpreterError {
    fn from(error: ReaderError) -> InterpreterError {
        InterpreterError::Read(error)
    }
}

impl From<ExecutionError> for InterpreterError {
    fn from(error: ExecutionError) -> InterpreterError {
        InterpreterError::Exec(error)
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            InterpreterError::Read(ref error) => write!(fmt, "{}", error),
            InterpreterError::Exec(ref error) => write!(fmt, "{}", error),
            InterpreterError::Eof => fmt.write_str("no expression"),
        }
    }
}

impl Error for InterpreterError {}

/// Evaluate every expression in `source` on the given machine and
/// return the last value.
pub fn interpret(source: &str, machine: &mut Machine) -> Result<Value, InterpreterError> {
    let mut exprs = Exprs::new(source)?;
    let mut value = None;
    while let Some(expr) = exprs.next()? {
        value = Some(machine.exec(expr)?);
    }
    value.ok_or(InterpreterError::Eof)
}
