// Copyright 2019 The Skylark in Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The embedder API: threads, predeclared environments, host-defined
//! types, and the resource controls.

use codemap::CodeMap;
use codemap_diagnostic::Diagnostic;
use skylark::environment::Environment;
use skylark::errors::ErrorKind;
use skylark::eval::{eval_module, thread, Module, Thread};
use skylark::resolve::resolve;
use skylark::stdlib::global_environment;
use skylark::syntax::dialect::Dialect;
use skylark::syntax::parser::parse;
use skylark::values::error::ValueError;
use skylark::values::{TypedValue, Value, ValueResult};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

fn run(
    content: &str,
    env: &Environment,
    thread: &mut Thread,
) -> Result<Rc<Module>, Diagnostic> {
    let map = Arc::new(Mutex::new(CodeMap::new()));
    let dialect = Dialect {
        allow_top_level_control: true,
        allow_recursion: false,
    };
    let ast = parse(&map, "<test>", content)?;
    let program = resolve(&map, ast, &dialect, env)?;
    let module = Rc::new(Module::new("test", &program));
    eval_module(&program, &module, thread, env)?;
    Ok(module)
}

fn default_env() -> Environment {
    let env = global_environment();
    env.freeze();
    env
}

#[test]
fn modules_expose_ordered_globals() {
    let env = default_env();
    let mut thread = Thread::new(&Dialect::STRICT);
    let m = run("b = 2\na = 1\ndef f():\n  pass\n", &env, &mut thread).unwrap();
    assert_eq!(
        vec!["b".to_owned(), "a".to_owned(), "f".to_owned()],
        m.names().to_vec()
    );
    assert_eq!("1", m.get("a").unwrap().to_repr());
    assert!(m.is_frozen());
}

#[test]
fn module_globals_are_frozen_after_initialization() {
    let env = default_env();
    let mut thread = Thread::new(&Dialect::STRICT);
    let m = run("l = [1, [2]]\n", &env, &mut thread).unwrap();
    let l = m.get("l").unwrap();
    assert!(l.set_at(Value::from(0), Value::from(9)).is_err());
    // Transitively frozen.
    let inner = l.at(Value::from(1)).unwrap();
    assert!(inner.set_at(Value::from(0), Value::from(9)).is_err());
}

#[test]
fn step_limit_terminates_execution() {
    let env = default_env();
    let mut thread = Thread::new(&Dialect::STRICT);
    thread.set_step_limit(10);
    let err = run("for i in range(1000000):\n  x = i\n", &env, &mut thread).unwrap_err();
    assert_eq!(Some(thread::STEP_LIMIT_ERROR_CODE.to_owned()), err.code);
}

#[test]
fn cancellation_is_observed_between_statements() {
    let env = default_env();
    let mut thread = Thread::new(&Dialect::STRICT);
    thread.cancellation_flag().store(true, Ordering::Relaxed);
    let err = run("x = 1\n", &env, &mut thread).unwrap_err();
    assert_eq!(Some(thread::CANCELLED_ERROR_CODE.to_owned()), err.code);
}

#[test]
fn print_goes_through_the_thread_handler() {
    let env = default_env();
    let mut thread = Thread::new(&Dialect::STRICT);
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = lines.clone();
    thread.set_print_handler(move |s| sink.borrow_mut().push(s.to_owned()));
    run("print(\"a\", 1, [2])\n", &env, &mut thread).unwrap();
    assert_eq!(vec!["a 1 [2]".to_owned()], lines.borrow().clone());
}

#[test]
fn hosts_can_predeclare_values() {
    let universe = global_environment();
    let env = universe.child("predeclared");
    env.set("greeting", Value::from("hello")).unwrap();
    env.freeze();
    let mut thread = Thread::new(&Dialect::STRICT);
    let m = run("x = greeting + \" world\"\n", &env, &mut thread).unwrap();
    assert_eq!("\"hello world\"", m.get("x").unwrap().to_repr());
}

#[test]
fn predeclared_names_can_be_shadowed_once() {
    let env = default_env();
    let mut thread = Thread::new(&Dialect::STRICT);
    let m = run("len = 3\nx = len\n", &env, &mut thread).unwrap();
    assert_eq!("3", m.get("x").unwrap().to_repr());
}

/// A host-defined type taking part in the object protocol.
struct Vector2 {
    x: i64,
    y: i64,
}

impl TypedValue for Vector2 {
    skylark::any!();

    fn get_type(&self) -> &'static str {
        "vec2"
    }

    fn to_repr_impl(&self, buf: &mut String) -> std::fmt::Result {
        use std::fmt::Write as _;
        write!(buf, "vec2({}, {})", self.x, self.y)
    }

    fn get_attr(&self, attribute: &str) -> ValueResult {
        match attribute {
            "x" => Ok(Value::from(self.x)),
            "y" => Ok(Value::from(self.y)),
            _ => Err(ValueError::OperationNotSupported {
                op: format!(".{}", attribute),
                left: "vec2".to_owned(),
                right: None,
            }),
        }
    }

    fn has_attr(&self, attribute: &str) -> Result<bool, ValueError> {
        Ok(attribute == "x" || attribute == "y")
    }

    fn dir_attr(&self) -> Result<Vec<String>, ValueError> {
        Ok(vec!["x".to_owned(), "y".to_owned()])
    }
}

#[test]
fn host_types_participate_in_the_object_protocol() {
    let universe = global_environment();
    let env = universe.child("predeclared");
    env.set("origin", Value::new(Vector2 { x: 3, y: 4 })).unwrap();
    env.freeze();
    let mut thread = Thread::new(&Dialect::STRICT);
    let m = run(
        "a = origin.x + origin.y\nb = type(origin)\nc = repr(origin)\nd = dir(origin)\n",
        &env,
        &mut thread,
    )
    .unwrap();
    assert_eq!("7", m.get("a").unwrap().to_repr());
    assert_eq!("\"vec2\"", m.get("b").unwrap().to_repr());
    assert_eq!("\"vec2(3, 4)\"", m.get("c").unwrap().to_repr());
    assert_eq!("[\"x\", \"y\"]", m.get("d").unwrap().to_repr());
}

#[test]
fn every_failure_reports_its_kind() {
    let env = default_env();
    let check = |source: &str, kind: ErrorKind| {
        let mut thread = Thread::new(&Dialect::STRICT);
        let err = run(source, &env, &mut thread).unwrap_err();
        assert_eq!(Some(kind), ErrorKind::of(&err), "for {:?}", source);
    };
    check("x = 'abc\n", ErrorKind::Syntax);
    check("x = 1 +\n", ErrorKind::Syntax);
    check("x = y\n", ErrorKind::Static);
    check("return 1\n", ErrorKind::Static);
    check("x = 1 + 'a'\n", ErrorKind::Type);
    check("x = {'a': 1}['b']\n", ErrorKind::Value);
    check("x = int('zz')\n", ErrorKind::Value);
    check("x = 1 // 0\n", ErrorKind::Arithmetic);
    check("x = 1 << -1\n", ErrorKind::Arithmetic);
    check("x = [1, 2][::0]\n", ErrorKind::Arithmetic);
    check("l = [1]\nfor x in l:\n  l.append(x)\n", ErrorKind::Mutation);
    check("def f(a):\n  pass\nf()\n", ErrorKind::Argument);
    check("def f(a):\n  pass\nf(1, b = 2)\n", ErrorKind::Argument);
    check("def f():\n  f()\nf()\n", ErrorKind::Interrupted);

    // Mutating a frozen module's value is a mutation-kind error too.
    let mut t1 = Thread::new(&Dialect::STRICT);
    let m = run("l = [1]\ndef f():\n  l.append(2)\n", &env, &mut t1).unwrap();
    let f = m.get("f").unwrap();
    let mut t2 = Thread::new(&Dialect::STRICT);
    let mut ctx = skylark::eval::CallContext {
        thread: &mut t2,
        env: &env,
    };
    let err = f
        .call(&mut ctx, Vec::new(), Default::default(), None, None)
        .unwrap_err();
    assert_eq!(ErrorKind::Mutation, err.kind());
}

#[test]
fn execution_is_deterministic() {
    let source = "d = {}\nfor pair in [(\"b\", 1), (\"a\", 2), (\"c\", 3)]:\n  d[pair[0]] = pair[1]\nkeys = d.keys()\ns = set([9, 3, 1])\n";
    let render = |m: &Module| {
        format!(
            "{} {}",
            m.get("keys").unwrap().to_repr(),
            m.get("s").unwrap().to_repr()
        )
    };
    let env = default_env();
    let mut t1 = Thread::new(&Dialect::STRICT);
    let m1 = run(source, &env, &mut t1).unwrap();
    let mut t2 = Thread::new(&Dialect::STRICT);
    let m2 = run(source, &env, &mut t2).unwrap();
    assert_eq!(render(&m1), render(&m2));
    assert_eq!("[\"b\", \"a\", \"c\"] set([9, 3, 1])", render(&m1));
}
