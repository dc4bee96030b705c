//! The continuation: an ordered stack of pending operations.
//!
//! The top frame is the next operation the machine resumes with.
//! Reifying copies the whole stack into an immutable snapshot; the
//! live machine and a snapshot never observe each other's later
//! mutations.

use std::fmt;

use gc::{Finalize, Gc, Trace};

use super::environment::Env;
use super::symbol::Symbol;
use super::value::Value;

#[derive(Debug, Clone, Trace, Finalize)]
pub enum Frame {
    /// `(consequent [alternative])` of a pending `if`.
    Then(Value),
    /// Remaining body forms of a `begin` or closure body.
    Begin(Value),
    /// Symbol awaiting its defined value.
    Define(Symbol),
    /// Resolved binding awaiting its new value.
    SetQ(Env),
    /// Unevaluated argument list; the incoming value is the operator.
    Apply(Value),
    /// Evaluated operator waiting for its argument list.
    ApplyFun(Value),
    /// An argument expression not yet evaluated.
    EvalArg(Value),
    /// Argument values accumulated so far, in source order.
    ConsArgs(Value),
    /// Environment to reinstate once the current callee returns.
    RestoreEnv(Env),
}

impl fmt::Display for Frame {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Frame::Then(ref alts) => write!(fmt, "if {}", alts.to_repl()),
            Frame::Begin(ref rest) => write!(fmt, "begin {}", rest.to_repl()),
            Frame::Define(ref symbol) => write!(fmt, "define {}", symbol),
            Frame::SetQ(ref binding) => match binding.borrow().symbol {
                Some(ref symbol) => write!(fmt, "set! {}", symbol),
                None => write!(fmt, "set!"),
            },
            Frame::Apply(ref args) => write!(fmt, "application {}", args.to_repl()),
            Frame::ApplyFun(ref op) => write!(fmt, "call to {}", op.to_repl()),
            Frame::EvalArg(ref arg) => write!(fmt, "argument {}", arg.to_repl()),
            Frame::ConsArgs(ref acc) => write!(fmt, "arguments {}", acc.to_repl()),
            Frame::RestoreEnv(_) => write!(fmt, "restore environment"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Continuation {
    frames: Vec<Frame>,
}

impl Continuation {
    pub fn new() -> Continuation {
        Continuation { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Push an environment-restore frame, unless one is already on
    /// top. Restoring twice in a row is idempotent, and collapsing the
    /// pair is what keeps a chain of tail calls from growing the
    /// stack.
    pub fn push_restore_env(&mut self, env: &Env) {
        if let Some(&Frame::RestoreEnv(_)) = self.frames.last() {
            return;
        }
        self.frames.push(Frame::RestoreEnv(env.clone()));
    }

    /// Immutable snapshot for a first-class continuation.
    pub fn reify(&self) -> Gc<Vec<Frame>> {
        Gc::new(self.frames.clone())
    }

    /// Replace the live stack wholesale with a snapshot's contents,
    /// discarding all pending work.
    pub fn restore(&mut self, snapshot: &Gc<Vec<Frame>>) {
        self.frames = (**snapshot).clone();
    }

    /// Pending operations rendered innermost first, for error reports.
    pub fn render_trace(&self) -> Vec<String> {
        self.frames
            .iter()
            .rev()
            .map(|frame| format!("  in {}", frame))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::super::environment::frame_marker;
    use super::super::value::Value;
    use super::{Continuation, Frame};

    #[test]
    fn restore_env_frames_collapse() {
        let mut cont = Continuation::new();
        let env = frame_marker(None);
        cont.push_restore_env(&env);
        cont.push_restore_env(&frame_marker(None));
        assert_eq!(cont.depth(), 1);
        // A non-restore frame on top makes the next push real again.
        cont.push(Frame::ConsArgs(Value::Null));
        cont.push_restore_env(&env);
        assert_eq!(cont.depth(), 3);
    }

    #[test]
    fn snapshots_are_independent() {
        let mut cont = Continuation::new();
        cont.push(Frame::ConsArgs(Value::Null));
        let snapshot = cont.reify();
        cont.push(Frame::EvalArg(Value::Integer(1)));
        cont.push(Frame::EvalArg(Value::Integer(2)));
        assert_eq!(snapshot.len(), 1);
        cont.restore(&snapshot);
        assert_eq!(cont.depth(), 1);
    }

    #[test]
    fn pop_is_lifo() {
        let mut cont = Continuation::new();
        cont.push(Frame::EvalArg(Value::Integer(1)));
        cont.push(Frame::ConsArgs(Value::Null));
        match cont.pop() {
            Some(Frame::ConsArgs(_)) => {}
            other => panic!("expected the argument accumulator, got {:?}", other),
        }
        match cont.pop() {
            Some(Frame::EvalArg(Value::Integer(1))) => {}
            other => panic!("expected the pending argument, got {:?}", other),
        }
        assert!(cont.is_empty());
    }
}
