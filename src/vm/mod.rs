//! The evaluator: a two-phase trampoline over `(exp, env, k)`.
//!
//! Phase A analyzes the current expression down to a value, pushing
//! pending operations onto the continuation as it goes. Phase B feeds
//! that value to the topmost pending operation, which either produces
//! the next expression to analyze or consumes another frame. The
//! machine never recurses through the host stack, which is what makes
//! reified continuations and proper tail calls possible.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use ::gc::Gc;

pub mod environment;
mod gc;
pub mod stack;
mod stdlib;
pub mod symbol;
pub mod value;


pub use self::environment::{Binding, Env};
pub use self::gc::{shared, GcShared};
pub use self::stack::{Continuation, Frame};
pub use self::symbol::{intern, Symbol};
pub use self::value::{Lambda, Native, NativeFn, NativeProcedure, Pair, Value};

use crate::reader::Input;

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    UnboundSymbol(String),
    ArityMismatch(String),
    NotCallable(String),
    ImproperList,
    BadArgType(&'static str),
    BadForm(&'static str),
    Read(String),
    User(String),
    /// An impossible continuation state. Reaching this is a bug.
    Internal(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::UnboundSymbol(ref name) => write!(fmt, "unbound symbol: {}", name),
            ErrorKind::ArityMismatch(ref message) => write!(fmt, "{}", message),
            ErrorKind::NotCallable(ref printed) => write!(fmt, "not callable: {}", printed),
            ErrorKind::ImproperList => fmt.write_str("expected a proper list"),
            ErrorKind::BadArgType(message) => fmt.write_str(message),
            ErrorKind::BadForm(form) => write!(fmt, "bad syntax in {}", form),
            ErrorKind::Read(ref message) => write!(fmt, "read error: {}", message),
            ErrorKind::User(ref message) => fmt.write_str(message),
            ErrorKind::Internal(what) => write!(fmt, "internal error: {}", what),
        }
    }
}

/// An evaluation failure, carrying the pending operations at the point
/// of failure as a pseudo stack trace. Errors raised by the `error`
/// built-in travel without a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionError {
    pub kind: ErrorKind,
    pub trace: Vec<String>,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.kind)?;
        for line in &self.trace {
            write!(fmt, "\n{}", line)?;
        }
        Ok(())
    }
}

impl Error for ExecutionError {}

enum Form {
    Quote,
    If,
    Begin,
    Lambda,
    Define,
    SetQ,
}

/// The special form symbols, interned once at machine startup so Phase
/// A can dispatch on identity.
struct SpecialForms {
    quote: Symbol,
    if_: Symbol,
    begin: Symbol,
    lambda: Symbol,
    define: Symbol,
    set: Symbol,
}

impl SpecialForms {
    fn new() -> SpecialForms {
        SpecialForms {
            quote: intern("quote"),
            if_: intern("if"),
            begin: intern("begin"),
            lambda: intern("lambda"),
            define: intern("define"),
            set: intern("set!"),
        }
    }

    fn recognize(&self, head: &Value) -> Option<Form> {
        let symbol = match *head {
            Value::Symbol(ref symbol) => symbol,
            _ => return None,
        };
        if symbol.is(&self.quote) {
            Some(Form::Quote)
        } else if symbol.is(&self.if_) {
            Some(Form::If)
        } else if symbol.is(&self.begin) {
            Some(Form::Begin)
        } else if symbol.is(&self.lambda) {
            Some(Form::Lambda)
        } else if symbol.is(&self.define) {
            Some(Form::Define)
        } else if symbol.is(&self.set) {
            Some(Form::SetQ)
        } else {
            None
        }
    }
}

pub struct Machine {
    env: Env,
    global: Env,
    cont: Continuation,
    forms: SpecialForms,
    input: Option<Rc<RefCell<Input>>>,
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}

impl Machine {
    pub fn new() -> Machine {
        Machine::build(None)
    }

    /// A machine whose `read` built-in pulls expressions from the
    /// given token buffer, shared with the driver.
    pub fn with_input(input: Rc<RefCell<Input>>) -> Machine {
        Machine::build(Some(input))
    }

    fn build(input: Option<Rc<RefCell<Input>>>) -> Machine {
        let global = default_env();
        Machine {
            env: global.clone(),
            global,
            cont: Continuation::new(),
            forms: SpecialForms::new(),
            input,
        }
    }

    pub fn continuation_depth(&self) -> usize {
        self.cont.depth()
    }

    pub(crate) fn input(&self) -> Option<Rc<RefCell<Input>>> {
        self.input.clone()
    }

    /// All symbols bound in the global environment, head to tail.
    pub(crate) fn global_symbols(&self) -> Value {
        let mut symbols = Vec::new();
        let mut current = Some(self.global.clone());
        while let Some(node) = current {
            if let Some(ref symbol) = node.borrow().symbol {
                symbols.push(Value::Symbol(symbol.clone()));
            }
            current = node.borrow().next.clone();
        }
        Value::list(symbols)
    }

    /// Evaluate one top-level expression to a value.
    pub fn exec(&mut self, expr: Value) -> Result<Value, ExecutionError> {
        debug!("exec {}", expr.to_repl());
        match self.run(expr) {
            Ok(value) => Ok(value),
            Err(kind) => {
                let trace = match kind {
                    ErrorKind::User(_) => Vec::new(),
                    _ => self.cont.render_trace(),
                };
                self.cont.clear();
                self.env = self.global.clone();
                Err(ExecutionError { kind, trace })
            }
        }
    }

    fn run(&mut self, mut exp: Value) -> Result<Value, ErrorKind> {
        'eval: loop {
            // Phase A: bring `exp` down to a value.
            loop {
                debug!("analyze {}", exp.to_repl());
                let (head, rest) = match exp {
                    Value::Pair(ref pair) => (pair.0.clone(), pair.1.clone()),
                    Value::Symbol(ref symbol) => {
                        let binding = environment::lookup(&self.env, symbol)
                            .ok_or_else(|| ErrorKind::UnboundSymbol(symbol.name().to_owned()))?;
                        let value = binding.borrow().value.clone();
                        exp = value;
                        break;
                    }
                    _ => break,
                };
                match self.forms.recognize(&head) {
                    Some(Form::Quote) => {
                        exp = form_arg1(&rest, "quote")?;
                        break;
                    }
                    Some(Form::If) => {
                        let (test, alts) = split_pair(&rest).ok_or(ErrorKind::BadForm("if"))?;
                        match alts.list_len() {
                            Ok(1) | Ok(2) => {}
                            _ => return Err(ErrorKind::BadForm("if")),
                        }
                        self.cont.push(Frame::Then(alts));
                        exp = test;
                    }
                    Some(Form::Begin) => match rest {
                        Value::Null => {
                            exp = Value::Void;
                            break;
                        }
                        Value::Pair(ref body) => {
                            if !body.1.is_null() {
                                self.cont.push(Frame::Begin(body.1.clone()));
                            }
                            exp = body.0.clone();
                        }
                        _ => return Err(ErrorKind::BadForm("begin")),
                    },
                    Some(Form::Lambda) => {
                        let (params, body) =
                            split_pair(&rest).ok_or(ErrorKind::BadForm("lambda"))?;
                        match body {
                            Value::Pair(_) => {}
                            _ => return Err(ErrorKind::BadForm("lambda: empty body")),
                        }
                        exp = Value::Closure(Gc::new(Lambda {
                            params,
                            body,
                            environment: self.env.clone(),
                        }));
                        break;
                    }
                    Some(Form::Define) => {
                        let (target, value_forms) =
                            split_pair(&rest).ok_or(ErrorKind::BadForm("define"))?;
                        match target {
                            Value::Symbol(ref symbol) => {
                                let value_form = form_arg1(&value_forms, "define")?;
                                self.cont.push(Frame::Define(symbol.clone()));
                                exp = value_form;
                            }
                            Value::Pair(ref signature) => {
                                // (define (f . formals) body...) is
                                // (define f (lambda formals body...)).
                                let name = match signature.0 {
                                    Value::Symbol(ref name) => name.clone(),
                                    _ => {
                                        return Err(ErrorKind::BadForm(
                                            "define: name must be a symbol",
                                        ))
                                    }
                                };
                                match value_forms {
                                    Value::Pair(_) => {}
                                    _ => return Err(ErrorKind::BadForm("define: empty body")),
                                }
                                self.cont.push(Frame::Define(name));
                                exp = Value::cons(
                                    Value::Symbol(self.forms.lambda.clone()),
                                    Value::cons(signature.1.clone(), value_forms),
                                );
                            }
                            _ => return Err(ErrorKind::BadForm("define")),
                        }
                    }
                    Some(Form::SetQ) => {
                        let (target, value_forms) =
                            split_pair(&rest).ok_or(ErrorKind::BadForm("set!"))?;
                        let symbol = match target {
                            Value::Symbol(ref symbol) => symbol.clone(),
                            _ => return Err(ErrorKind::BadForm("set!: target must be a symbol")),
                        };
                        // The binding is resolved now, not when the
                        // value arrives.
                        let binding = environment::lookup(&self.env, &symbol)
                            .ok_or_else(|| ErrorKind::UnboundSymbol(symbol.name().to_owned()))?;
                        let value_form = form_arg1(&value_forms, "set!")?;
                        self.cont.push(Frame::SetQ(binding));
                        exp = value_form;
                    }
                    None => {
                        self.cont.push(Frame::Apply(rest));
                        exp = head;
                    }
                }
            }

            // Phase B: feed the value to the next pending operation.
            loop {
                let frame = match self.cont.pop() {
                    Some(frame) => frame,
                    None => return Ok(exp),
                };
                debug!("resume [{}] {} <- {}", self.cont.depth(), frame, exp.to_repl());
                match frame {
                    Frame::Then(ref alts) => {
                        let (consequent, alternative) =
                            split_pair(alts).ok_or(ErrorKind::Internal("malformed if frame"))?;
                        if !exp.is_false() {
                            exp = consequent;
                            continue 'eval;
                        }
                        match alternative.pair() {
                            Some(alt) => {
                                exp = alt.0.clone();
                                continue 'eval;
                            }
                            None => exp = Value::Void,
                        }
                    }
                    Frame::Begin(ref rest) => {
                        let body = rest
                            .pair()
                            .ok_or(ErrorKind::Internal("malformed begin frame"))?;
                        if !body.1.is_null() {
                            self.cont.push(Frame::Begin(body.1.clone()));
                        }
                        exp = body.0.clone();
                        continue 'eval;
                    }
                    Frame::Define(ref symbol) => {
                        environment::define(&self.env, symbol.clone(), exp)?;
                        exp = Value::Void;
                    }
                    Frame::SetQ(ref binding) => {
                        binding.borrow_mut().value = exp;
                        exp = Value::Void;
                    }
                    Frame::Apply(ref args) => {
                        let operator = exp;
                        match args {
                            Value::Null => {
                                exp = self.apply(operator, Value::Null)?;
                            }
                            Value::Pair(_) => {
                                let mut items = Vec::new();
                                for item in args.iter() {
                                    items.push(item?);
                                }
                                self.cont.push(Frame::ApplyFun(operator));
                                // Arguments evaluate right to left:
                                // the last one goes first, the rest
                                // wait on the stack.
                                let last = items
                                    .pop()
                                    .ok_or(ErrorKind::Internal("empty argument frame"))?;
                                for arg in items {
                                    self.cont.push(Frame::EvalArg(arg));
                                }
                                self.cont.push(Frame::ConsArgs(Value::Null));
                                exp = last;
                                continue 'eval;
                            }
                            _ => return Err(ErrorKind::ImproperList),
                        }
                    }
                    Frame::ConsArgs(ref acc) => {
                        let acc = Value::cons(exp, acc.clone());
                        match self.cont.pop() {
                            Some(Frame::EvalArg(ref arg)) => {
                                let arg = arg.clone();
                                self.cont.push(Frame::ConsArgs(acc));
                                exp = arg;
                                continue 'eval;
                            }
                            Some(Frame::ApplyFun(ref operator)) => {
                                exp = self.apply(operator.clone(), acc)?;
                            }
                            _ => return Err(ErrorKind::Internal("argument frames out of order")),
                        }
                    }
                    Frame::RestoreEnv(ref previous) => {
                        self.env = previous.clone();
                    }
                    Frame::ApplyFun(_) | Frame::EvalArg(_) => {
                        return Err(ErrorKind::Internal("unexpected continuation frame"))
                    }
                }
            }
        }
    }

    /// Apply an operator to an already evaluated argument list.
    ///
    /// The returned value continues Phase B: intrinsics answer
    /// directly, closures answer `Void` after queueing their body, and
    /// continuations answer their argument after replacing the stack.
    fn apply(&mut self, operator: Value, arguments: Value) -> Result<Value, ErrorKind> {
        let mut operator = operator;
        let mut arguments = arguments;
        // Peel `apply` and `call/cc`, which rewrite the application
        // instead of computing anything themselves.
        loop {
            let special = match operator {
                Value::Intrinsic(ref native) => match native.native {
                    Native::Fun(_) => None,
                    Native::Apply => Some(Native::Apply),
                    Native::CallCc => Some(Native::CallCc),
                },
                _ => None,
            };
            match special {
                Some(Native::CallCc) => {
                    expect_exact("call/cc", 1, &arguments)?;
                    // The receiver runs in tail position; the snapshot
                    // includes the restore frame pushed here.
                    self.cont.push_restore_env(&self.env);
                    let receiver = nth(&arguments, 0)?;
                    let k = Value::Continuation(self.cont.reify());
                    operator = receiver;
                    arguments = Value::cons(k, Value::Null);
                }
                Some(Native::Apply) => {
                    expect_exact("apply", 2, &arguments)?;
                    let real_operator = nth(&arguments, 0)?;
                    let real_arguments = nth(&arguments, 1)?;
                    operator = real_operator;
                    arguments = real_arguments;
                }
                _ => break,
            }
        }

        match operator {
            Value::Intrinsic(native) => {
                let got = arguments.list_len()?;
                if native.arity >= 0 && got != native.arity as usize {
                    return Err(arity_error(native.name, native.arity as usize, got));
                }
                match native.native {
                    Native::Fun(fun) => fun(self, arguments),
                    _ => Err(ErrorKind::Internal("special callable escaped the peel loop")),
                }
            }
            Value::Closure(ref lambda) => {
                self.cont.push_restore_env(&self.env);
                self.cont.push(Frame::Begin(lambda.body.clone()));
                let env = environment::bind_params(&lambda.params, &arguments, &lambda.environment)?;
                // The fresh marker scopes `define`s in the body to
                // this activation.
                self.env = environment::frame_marker(Some(env));
                Ok(Value::Void)
            }
            Value::Continuation(ref snapshot) => {
                expect_exact("continuation", 1, &arguments)?;
                // All pending work is discarded in favor of the
                // snapshot's.
                self.cont.restore(snapshot);
                nth(&arguments, 0)
            }
            other => Err(ErrorKind::NotCallable(other.to_repl())),
        }
    }
}

/// The global environment: a frame marker followed by the intrinsic
/// bindings. Top-level `define` splices right behind the marker.
pub fn default_env() -> Env {
    let mut next: Option<Env> = None;
    for &(name, arity, fun) in stdlib::STDLIB.iter().rev() {
        next = Some(shared(Binding {
            symbol: Some(intern(name)),
            value: Value::Intrinsic(NativeProcedure {
                name,
                arity,
                native: Native::Fun(fun),
            }),
            next,
        }));
    }
    for &(name, arity, native) in [("call/cc", 1, Native::CallCc), ("apply", 2, Native::Apply)].iter()
    {
        next = Some(shared(Binding {
            symbol: Some(intern(name)),
            value: Value::Intrinsic(NativeProcedure {
                name,
                arity,
                native,
            }),
            next,
        }));
    }
    environment::frame_marker(next)
}

fn split_pair(value: &Value) -> Option<(Value, Value)> {
    value.pair().map(|pair| (pair.0.clone(), pair.1.clone()))
}

/// Destructure a one-element tail `(e)`, as in `(quote e)`.
fn form_arg1(rest: &Value, form: &'static str) -> Result<Value, ErrorKind> {
    match split_pair(rest) {
        Some((first, Value::Null)) => Ok(first),
        _ => Err(ErrorKind::BadForm(form)),
    }
}

pub(crate) fn nth(args: &Value, index: usize) -> Result<Value, ErrorKind> {
    let mut rest = args.clone();
    for _ in 0..index {
        rest = match rest {
            Value::Pair(ref pair) => pair.1.clone(),
            _ => return Err(ErrorKind::Internal("argument index out of range")),
        };
    }
    match rest {
        Value::Pair(ref pair) => Ok(pair.0.clone()),
        _ => Err(ErrorKind::Internal("argument index out of range")),
    }
}

fn expect_exact(name: &str, expected: usize, args: &Value) -> Result<(), ErrorKind> {
    let got = args.list_len()?;
    if got != expected {
        return Err(arity_error(name, expected, got));
    }
    Ok(())
}

fn arity_error(name: &str, expected: usize, got: usize) -> ErrorKind {
    let noun = if expected == 1 { "argument" } else { "arguments" };
    ErrorKind::ArityMismatch(format!(
        "{}: expected {} {}, got {}",
        name, expected, noun, got
    ))
}