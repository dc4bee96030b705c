use std::io::{self, Write};

use super::value::{NativeFn, Value};
use super::{nth, ErrorKind, Machine};

pub(super) const STDLIB: [(&str, isize, NativeFn); 21] = [
    ("car", 1, car),
    ("cdr", 1, cdr),
    ("cons", 2, cons),
    ("eq?", 2, are_eq),
    ("eqv?", 2, are_eqv),
    ("pair?", 1, is_pair),
    ("null?", 1, is_null),
    ("not", 1, not),
    ("list", -1, list),
    ("display", 1, display),
    ("newline", 0, newline),
    ("read", 0, read),
    ("eof-object?", 1, is_eof_object),
    ("symbol?", 1, is_symbol),
    ("+", 2, addition),
    ("-", 2, subtraction),
    ("*", 2, multiplication),
    ("<", 2, less_than),
    ("=", 2, numeric_equal),
    ("error", 2, user_error),
    ("globals", 0, globals),
];

// By the time a native runs, `apply` has checked the arity against the
// table, so `nth` on the argument list cannot miss.

fn car(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match nth(&args, 0)? {
        Value::Pair(ref pair) => Ok(pair.0.clone()),
        _ => Err(ErrorKind::BadArgType("car: expected a pair")),
    }
}

fn cdr(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match nth(&args, 0)? {
        Value::Pair(ref pair) => Ok(pair.1.clone()),
        _ => Err(ErrorKind::BadArgType("cdr: expected a pair")),
    }
}

fn cons(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    Ok(Value::cons(nth(&args, 0)?, nth(&args, 1)?))
}

fn are_eq(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    Ok(Value::Boolean(nth(&args, 0)?.is_eq(&nth(&args, 1)?)))
}

fn are_eqv(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    Ok(Value::Boolean(nth(&args, 0)?.is_eqv(&nth(&args, 1)?)))
}

fn is_pair(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    let test = match nth(&args, 0)? {
        Value::Pair(_) => true,
        _ => false,
    };
    Ok(Value::Boolean(test))
}

fn is_null(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    Ok(Value::Boolean(nth(&args, 0)?.is_null()))
}

fn not(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    Ok(Value::Boolean(nth(&args, 0)?.is_false()))
}

fn list(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    // The evaluated argument list is already the answer.
    Ok(args)
}

fn display(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    print!("{}", nth(&args, 0)?.to_display());
    let _ = io::stdout().flush();
    Ok(Value::Void)
}

fn newline(_machine: &mut Machine, _args: Value) -> Result<Value, ErrorKind> {
    println!();
    Ok(Value::Void)
}

fn read(machine: &mut Machine, _args: Value) -> Result<Value, ErrorKind> {
    let input = match machine.input() {
        Some(input) => input,
        None => return Ok(Value::Eof),
    };
    let result = input.borrow_mut().read();
    match result {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Ok(Value::Eof),
        Err(error) => Err(ErrorKind::Read(format!("{}", error))),
    }
}

fn is_eof_object(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    let test = match nth(&args, 0)? {
        Value::Eof => true,
        _ => false,
    };
    Ok(Value::Boolean(test))
}

fn is_symbol(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    let test = match nth(&args, 0)? {
        Value::Symbol(_) => true,
        _ => false,
    };
    Ok(Value::Boolean(test))
}

fn addition(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match (nth(&args, 0)?, nth(&args, 1)?) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_add(b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(a + b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        _ => Err(ErrorKind::BadArgType("+: expected numbers")),
    }
}

fn subtraction(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match (nth(&args, 0)?, nth(&args, 1)?) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_sub(b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(a as f64 - b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(a - b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        _ => Err(ErrorKind::BadArgType("-: expected numbers")),
    }
}

fn multiplication(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match (nth(&args, 0)?, nth(&args, 1)?) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_mul(b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(a as f64 * b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(a * b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        _ => Err(ErrorKind::BadArgType("*: expected numbers")),
    }
}

fn less_than(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match (nth(&args, 0)?, nth(&args, 1)?) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Boolean(a < b)),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Boolean((a as f64) < b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Boolean(a < b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Boolean(a < b)),
        _ => Err(ErrorKind::BadArgType("<: expected numbers")),
    }
}

fn numeric_equal(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    match (nth(&args, 0)?, nth(&args, 1)?) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Boolean(a == b)),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Boolean(a as f64 == b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Boolean(a == b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Boolean(a == b)),
        _ => Err(ErrorKind::BadArgType("=: expected numbers")),
    }
}

fn user_error(_machine: &mut Machine, args: Value) -> Result<Value, ErrorKind> {
    let message = nth(&args, 0)?;
    let irritant = nth(&args, 1)?;
    Err(ErrorKind::User(format!(
        "{} {}",
        message.to_display(),
        irritant.to_repl()
    )))
}

fn globals(machine: &mut Machine, _args: Value) -> Result<Value, ErrorKind> {
    Ok(machine.global_symbols())
}
