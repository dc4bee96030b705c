//! Shared mutable cells for the environment graph.
//!
//! Closures stored in global bindings reach back to those bindings
//! through the environment chain, so the graph is cyclic and plain
//! reference counting would leak it.

use gc::{Gc, GcCell, Trace};

pub type GcShared<T> = Gc<GcCell<T>>;

pub fn shared<T: Trace>(x: T) -> GcShared<T> {
    Gc::new(GcCell::new(x))
}
