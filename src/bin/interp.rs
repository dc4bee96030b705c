extern crate env_logger;
extern crate miniscm;
extern crate rustyline;

use std::cell::RefCell;
use std::env::args;
use std::process::exit;
use std::rc::Rc;

use miniscm::reader::{Input, ReaderError};
use miniscm::vm::{Machine, Value};

use rustyline::error::ReadlineError;

type SharedInput = Rc<RefCell<Input>>;

fn main() {
    env_logger::init();

    let file = args().nth(1);
    let then_repl = match args().nth(2) {
        Some(ref flag) if flag == "-" => true,
        _ => false,
    };

    let input: SharedInput = Rc::new(RefCell::new(Input::new()));
    let mut machine = Machine::with_input(input.clone());

    match file {
        Some(path) => {
            run_file(&path, &mut machine, &input);
            if then_repl {
                run_repl(&mut machine, &input);
            }
        }
        None => run_repl(&mut machine, &input),
    }
}

fn run_file(path: &str, machine: &mut Machine, input: &SharedInput) {
    use std::fs::File;
    use std::io::Read;

    let source = {
        let mut buffer = String::new();
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(error) => {
                eprintln!("{}: {}", path, error);
                exit(1);
            }
        };
        if let Err(error) = file.read_to_string(&mut buffer) {
            eprintln!("{}: {}", path, error);
            exit(1);
        }
        buffer
    };

    if let Err(error) = input.borrow_mut().push_source(&source) {
        eprintln!("{}", error);
        exit(1);
    }

    loop {
        // The borrow must end before `exec`: the `read` built-in pulls
        // from this same buffer.
        let expr = input.borrow_mut().read();
        match expr {
            Ok(Some(expr)) => {
                if let Err(error) = machine.exec(expr) {
                    eprintln!("{}", error);
                    exit(1);
                }
            }
            Ok(None) => break,
            Err(error) => {
                eprintln!("{}", error);
                exit(1);
            }
        }
    }
}

fn run_repl(machine: &mut Machine, input: &SharedInput) {
    let mut rl = rustyline::Editor::<()>::new();
    let mut pending = false;

    loop {
        let prompt = if pending { "| " } else { "> " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => {
                input.borrow_mut().clear();
                pending = false;
                continue;
            }
            Err(_) => break,
        };

        rl.add_history_entry(&line);

        if let Err(error) = input.borrow_mut().push_source(&line) {
            println!("{}", error);
            input.borrow_mut().clear();
            pending = false;
            continue;
        }

        pending = false;
        loop {
            let expr = input.borrow_mut().read();
            match expr {
                Ok(Some(expr)) => match machine.exec(expr) {
                    Ok(Value::Void) => {}
                    Ok(value) => println!("{}", value.to_repl()),
                    Err(error) => {
                        println!("{}", error);
                        input.borrow_mut().clear();
                    }
                },
                Ok(None) => break,
                Err(ReaderError::Incomplete) => {
                    pending = true;
                    break;
                }
                Err(error) => {
                    println!("{}", error);
                    input.borrow_mut().clear();
                    break;
                }
            }
        }
    }

    println!("Goodbye");
}
