//! Interned symbols.
//!
//! Every name maps to exactly one `Symbol` for the lifetime of the
//! process, so symbol comparison is pointer identity and never looks at
//! the characters.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use gc::{Finalize, Trace};

#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Identity comparison. Interning guarantees this is equivalent to
    /// name equality for symbols produced by `intern`.
    pub fn is(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        self.is(other)
    }
}

impl Eq for Symbol {}

impl fmt::Debug for Symbol {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

impl Finalize for Symbol {}
unsafe impl Trace for Symbol {
    unsafe_empty_trace!();
}

thread_local! {
    static INTERNER: RefCell<HashMap<String, Symbol>> = RefCell::new(HashMap::new());
}

pub fn intern(name: &str) -> Symbol {
    INTERNER.with(|interner| {
        let mut interner = interner.borrow_mut();
        if let Some(symbol) = interner.get(name) {
            return symbol.clone();
        }
        let symbol = Symbol(Rc::from(name));
        interner.insert(name.to_owned(), symbol.clone());
        symbol
    })
}
