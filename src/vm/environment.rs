//! Lexical environments.
//!
//! An environment is a singly linked chain of bindings. A binding with
//! no symbol is a frame marker: it delimits a function activation so
//! that `define` inside a closure body extends that activation instead
//! of the global frame. The global environment is a frame marker
//! followed by the intrinsic bindings; top-level `define` splices new
//! bindings right behind that marker by mutating its `next` pointer.

use std::fmt::{Debug, Error as FmtError, Formatter};

use gc::{Finalize, Trace};

use super::gc::{shared, GcShared};
use super::symbol::Symbol;
use super::value::Value;
use super::ErrorKind;

pub type Env = GcShared<Binding>;

#[derive(Trace, Finalize)]
pub struct Binding {
    /// `None` marks a frame boundary.
    pub symbol: Option<Symbol>,
    /// The only mutable value slot in the system (written by `set!`).
    pub value: Value,
    pub next: Option<Env>,
}

impl Debug for Binding {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), FmtError> {
        // Chains are cyclic through closures; print just this link.
        match self.symbol {
            Some(ref symbol) => write!(fmt, "Binding({})", symbol),
            None => write!(fmt, "Binding(#frame)"),
        }
    }
}

pub fn frame_marker(next: Option<Env>) -> Env {
    shared(Binding {
        symbol: None,
        value: Value::Void,
        next,
    })
}

pub fn extend(env: &Env, symbol: Symbol, value: Value) -> Env {
    shared(Binding {
        symbol: Some(symbol),
        value,
        next: Some(env.clone()),
    })
}

/// First binding whose symbol is identical to the query, head to tail.
pub fn lookup(env: &Env, symbol: &Symbol) -> Option<Env> {
    let mut current = Some(env.clone());
    while let Some(node) = current {
        let found = match node.borrow().symbol {
            Some(ref bound) => bound.is(symbol),
            None => false,
        };
        if found {
            return Some(node);
        }
        current = node.borrow().next.clone();
    }
    None
}

/// Insert a binding immediately after the nearest enclosing frame
/// marker, where lookups from this scope will find it first.
pub fn define(env: &Env, symbol: Symbol, value: Value) -> Result<(), ErrorKind> {
    let mut current = env.clone();
    loop {
        let is_marker = current.borrow().symbol.is_none();
        if is_marker {
            let tail = current.borrow().next.clone();
            let binding = shared(Binding {
                symbol: Some(symbol),
                value,
                next: tail,
            });
            current.borrow_mut().next = Some(binding);
            return Ok(());
        }
        let next = current.borrow().next.clone();
        match next {
            Some(node) => current = node,
            None => return Err(ErrorKind::Internal("no frame marker in scope")),
        }
    }
}

/// Extend a closure's captured environment with its arguments.
///
/// Walks formals and arguments in lockstep: a proper formal list binds
/// pairwise and must be exhausted together with the arguments; a
/// dotted tail (or a bare symbol) binds the remaining argument list as
/// a rest argument.
pub fn bind_params(params: &Value, args: &Value, env: &Env) -> Result<Env, ErrorKind> {
    let mut env = env.clone();
    let mut params = params.clone();
    let mut args = args.clone();
    loop {
        let (next_params, next_args) = match params {
            Value::Null => {
                return match args {
                    Value::Null => Ok(env),
                    Value::Pair(_) => Err(ErrorKind::ArityMismatch(
                        "too many arguments".to_owned(),
                    )),
                    _ => Err(ErrorKind::ImproperList),
                };
            }
            Value::Symbol(ref rest) => {
                env = extend(&env, rest.clone(), args);
                return Ok(env);
            }
            Value::Pair(ref param) => {
                let symbol = match param.0 {
                    Value::Symbol(ref symbol) => symbol.clone(),
                    _ => return Err(ErrorKind::BadForm("lambda: formals must be symbols")),
                };
                match args {
                    Value::Pair(ref arg) => {
                        env = extend(&env, symbol, arg.0.clone());
                        (param.1.clone(), arg.1.clone())
                    }
                    Value::Null => {
                        return Err(ErrorKind::ArityMismatch("too few arguments".to_owned()))
                    }
                    _ => return Err(ErrorKind::ImproperList),
                }
            }
            _ => return Err(ErrorKind::BadForm("lambda: malformed formals")),
        };
        params = next_params;
        args = next_args;
    }
}

#[cfg(test)]
mod test {
    use super::super::symbol::intern;
    use super::super::value::Value;
    use super::super::ErrorKind;
    use super::*;

    fn root() -> Env {
        frame_marker(None)
    }

    #[test]
    fn lookup_finds_nearest_binding() {
        let env = extend(&root(), intern("x"), Value::Integer(1));
        let env = extend(&env, intern("x"), Value::Integer(2));
        let binding = lookup(&env, &intern("x")).expect("bound");
        assert_eq!(binding.borrow().value, Value::Integer(2));
    }

    #[test]
    fn lookup_misses_unbound_symbols() {
        let env = extend(&root(), intern("x"), Value::Integer(1));
        assert!(lookup(&env, &intern("y")).is_none());
    }

    #[test]
    fn define_splices_after_the_marker() {
        let global = root();
        let env = extend(&global, intern("old"), Value::Integer(1));
        // Defining through the extended scope must still land behind
        // the marker, where the whole chain sees it.
        define(&env, intern("new"), Value::Integer(2)).expect("frame marker present");
        let through_global = lookup(&global, &intern("new")).expect("visible from the marker");
        assert_eq!(through_global.borrow().value, Value::Integer(2));
        assert!(lookup(&env, &intern("old")).is_some());
    }

    #[test]
    fn set_slot_is_shared() {
        let global = root();
        define(&global, intern("x"), Value::Integer(1)).expect("frame marker present");
        let binding = lookup(&global, &intern("x")).expect("bound");
        binding.borrow_mut().value = Value::Integer(5);
        let seen = lookup(&global, &intern("x")).expect("bound");
        assert_eq!(seen.borrow().value, Value::Integer(5));
    }

    #[test]
    fn bind_params_pairwise() {
        let params = Value::list(vec![
            Value::Symbol(intern("a")),
            Value::Symbol(intern("b")),
        ]);
        let args = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        let env = bind_params(&params, &args, &root()).expect("matching arity");
        let a = lookup(&env, &intern("a")).expect("bound");
        assert_eq!(a.borrow().value, Value::Integer(1));
        let b = lookup(&env, &intern("b")).expect("bound");
        assert_eq!(b.borrow().value, Value::Integer(2));
    }

    #[test]
    fn bind_params_arity_errors() {
        let params = Value::list(vec![
            Value::Symbol(intern("a")),
            Value::Symbol(intern("b")),
        ]);
        let too_few = Value::list(vec![Value::Integer(1)]);
        match bind_params(&params, &too_few, &root()) {
            Err(ErrorKind::ArityMismatch(ref message)) => {
                assert!(message.contains("too few"))
            }
            other => panic!("expected arity error, got {:?}", other),
        }
        let too_many = Value::list(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);
        match bind_params(&params, &too_many, &root()) {
            Err(ErrorKind::ArityMismatch(ref message)) => {
                assert!(message.contains("too many"))
            }
            other => panic!("expected arity error, got {:?}", other),
        }
    }

    #[test]
    fn bind_params_dotted_rest() {
        // (a . rest)
        let params = Value::improper(
            vec![Value::Symbol(intern("a"))],
            Value::Symbol(intern("rest")),
        );
        let args = Value::list(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);
        let env = bind_params(&params, &args, &root()).expect("rest binds");
        let rest = lookup(&env, &intern("rest")).expect("bound");
        assert_eq!(
            rest.borrow().value,
            Value::list(vec![Value::Integer(2), Value::Integer(3)])
        );
    }

    #[test]
    fn bind_params_bare_symbol_takes_everything() {
        let params = Value::Symbol(intern("args"));
        let args = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        let env = bind_params(&params, &args, &root()).expect("rest binds");
        let bound = lookup(&env, &intern("args")).expect("bound");
        assert_eq!(bound.borrow().value, args);
    }
}
