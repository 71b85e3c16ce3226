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

//! The evaluator: executes resolved syntax trees against a [`Thread`] and a
//! [`Module`].
//!
//! Argument evaluation is strictly left to right; `and`/`or` short-circuit;
//! a conditional expression evaluates only the selected branch. Step
//! counting and cancellation are checked between statements.

pub mod call_stack;
pub mod loader;
pub mod module;
pub mod thread;

#[cfg(test)]
mod tests;

pub use self::loader::{FileLoader, ModuleCache};
pub use self::module::Module;
pub use self::thread::Thread;

use crate::environment::{Environment, EnvironmentError};
use crate::resolve::{FreeVarSource, Program, ScopeInfo, Slot};
use crate::syntax::ast::*;
use crate::syntax::errors::SyntaxError;
use crate::values::cell::ValueCell;
use crate::values::dict::Dictionary;
use crate::values::error::ValueError;
use crate::values::function::{Def, FunctionBody, FunctionSignature, WrappedMethod};
use crate::values::list::List;
use crate::values::none::NoneType;
use crate::values::set::Set;
use crate::values::tuple::Tuple;
use crate::values::{Value, ValueResult};
use codemap::{CodeMap, Span, Spanned};
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};
use linked_hash_map::LinkedHashMap;
use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

// Error codes -- CE = Critical Evaluation
pub const BREAK_ERROR_CODE: &str = "CE00";
pub const CONTINUE_ERROR_CODE: &str = "CE01";
pub const RETURN_ERROR_CODE: &str = "CE02";
pub const INCORRECT_UNPACK_ERROR_CODE: &str = "CE03";
pub const RECURSION_ERROR_CODE: &str = "CE04";
pub const UNRESOLVED_ERROR_CODE: &str = "CE05";

/// Exceptional outcomes of evaluating one statement: control flow reaching
/// for an enclosing construct, or an error carried as a diagnostic.
#[derive(Debug, Clone)]
pub enum EvalException {
    Break(Span),
    Continue(Span),
    Return(Span, Value),
    IncorrectNumberOfValueToUnpack(Span, i64, i64),
    DiagnosedError(Diagnostic),
}

impl From<Diagnostic> for EvalException {
    fn from(diagnostic: Diagnostic) -> Self {
        EvalException::DiagnosedError(diagnostic)
    }
}

impl From<EvalException> for Diagnostic {
    fn from(exception: EvalException) -> Diagnostic {
        let with_span = |span, message: String, code: &str| Diagnostic {
            level: Level::Error,
            message,
            code: Some(code.to_owned()),
            spans: vec![SpanLabel {
                span,
                style: SpanStyle::Primary,
                label: None,
            }],
        };
        match exception {
            EvalException::DiagnosedError(e) => e,
            EvalException::Break(s) => with_span(
                s,
                "Break statement used outside of a loop".to_owned(),
                BREAK_ERROR_CODE,
            ),
            EvalException::Continue(s) => with_span(
                s,
                "Continue statement used outside of a loop".to_owned(),
                CONTINUE_ERROR_CODE,
            ),
            EvalException::Return(s, ..) => with_span(
                s,
                "Return statement used outside of a function call".to_owned(),
                RETURN_ERROR_CODE,
            ),
            EvalException::IncorrectNumberOfValueToUnpack(s, expected, got) => with_span(
                s,
                format!("Unpacked {} values but expected {}", got, expected),
                INCORRECT_UNPACK_ERROR_CODE,
            ),
        }
    }
}

type EvalResult = Result<Value, EvalException>;

/// An object with a [`Span`].
trait AsSpan {
    fn as_span(&self) -> Span;
}

impl AsSpan for Span {
    fn as_span(&self) -> Span {
        *self
    }
}

impl<T> AsSpan for Spanned<T> {
    fn as_span(&self) -> Span {
        self.span
    }
}

impl<T> AsSpan for Rc<Spanned<T>> {
    fn as_span(&self) -> Span {
        self.span
    }
}

/// Attach the span of the offending syntax node to an internal error.
fn t<T, E: SyntaxError, S: AsSpan>(r: Result<T, E>, spanned: &S) -> Result<T, EvalException> {
    match r {
        Ok(v) => Ok(v),
        Err(e) => Err(EvalException::DiagnosedError(
            e.to_diagnostic(spanned.as_span()),
        )),
    }
}

macro_rules! eval_vector {
    ($v:expr, $ctx:expr) => {{
        let mut r = Vec::new();
        for s in $v.iter() {
            r.push(eval_expr(s, $ctx)?)
        }
        r
    }};
}

/// The context native functions receive: the running thread and the
/// environment used for method lookup.
pub struct CallContext<'a> {
    pub thread: &'a mut Thread,
    pub env: &'a Environment,
}

/// One activation record: plain local slots, owned cells, and the cells
/// captured from enclosing functions.
pub(crate) struct LocalFrame {
    slots: Vec<Option<Value>>,
    cells: Vec<ValueCell>,
    captured: Vec<ValueCell>,
}

impl LocalFrame {
    fn new(scope: &ScopeInfo) -> LocalFrame {
        LocalFrame {
            slots: vec![None; scope.local_count as usize],
            cells: (0..scope.cell_count).map(|_| ValueCell::new()).collect(),
            captured: Vec::new(),
        }
    }
}

pub(crate) struct EvaluationContext<'a> {
    thread: &'a mut Thread,
    env: &'a Environment,
    module: Rc<Module>,
    frame: LocalFrame,
    map: Arc<Mutex<CodeMap>>,
}

fn unresolved(span: Span) -> EvalException {
    EvalException::DiagnosedError(Diagnostic {
        level: Level::Error,
        message: "Identifier was not resolved before evaluation".to_owned(),
        code: Some(UNRESOLVED_ERROR_CODE.to_owned()),
        spans: vec![SpanLabel {
            span,
            style: SpanStyle::Primary,
            label: None,
        }],
    })
}

fn unassigned(name: &AstString) -> EvalException {
    t::<Value, _, _>(
        Err(EnvironmentError::VariableReferencedBeforeAssignment(
            name.node.clone(),
        )),
        name,
    )
    .unwrap_err()
}

fn read_ident(name: &AstString, slot: &SlotCell, ctx: &mut EvaluationContext) -> EvalResult {
    let slot = match slot.get() {
        Some(s) => s,
        None => return Err(unresolved(name.span)),
    };
    match slot {
        Slot::Local(i) => match ctx.frame.slots[i as usize].clone() {
            Some(v) => Ok(v),
            None => Err(unassigned(name)),
        },
        Slot::Cell(i) => match ctx.frame.cells[i as usize].get() {
            Some(v) => Ok(v),
            None => Err(unassigned(name)),
        },
        Slot::Free(i) => match ctx.frame.captured[i as usize].get() {
            Some(v) => Ok(v),
            None => Err(unassigned(name)),
        },
        Slot::Global(i) => t(ctx.module.get_slot(i, &name.node), name),
        Slot::FileLocal(i) => t(ctx.module.get_file_slot(i, &name.node), name),
        Slot::Predeclared => t(ctx.env.get(&name.node), name),
    }
}

fn write_ident(
    name: &AstString,
    slot: &SlotCell,
    ctx: &mut EvaluationContext,
    value: Value,
) -> Result<(), EvalException> {
    let slot = match slot.get() {
        Some(s) => s,
        None => return Err(unresolved(name.span)),
    };
    match slot {
        Slot::Local(i) => {
            ctx.frame.slots[i as usize] = Some(value);
            Ok(())
        }
        Slot::Cell(i) => t(ctx.frame.cells[i as usize].set(value), name),
        Slot::Free(i) => t(ctx.frame.captured[i as usize].set(value), name),
        Slot::Global(i) => t(ctx.module.set_slot(i, value), name),
        Slot::FileLocal(i) => t(ctx.module.set_file_slot(i, value), name),
        Slot::Predeclared => Err(unresolved(name.span)),
    }
}

// === Expressions ===

fn eval_compare<F>(
    this: &AstExpr,
    left: &AstExpr,
    right: &AstExpr,
    cmp: F,
    ctx: &mut EvaluationContext,
) -> EvalResult
where
    F: Fn(Ordering) -> bool,
{
    let l = eval_expr(left, ctx)?;
    let r = eval_expr(right, ctx)?;
    Ok(Value::new(cmp(t(l.compare(&r), this)?)))
}

fn eval_equals<F>(
    this: &AstExpr,
    left: &AstExpr,
    right: &AstExpr,
    wrap: F,
    ctx: &mut EvaluationContext,
) -> EvalResult
where
    F: Fn(bool) -> bool,
{
    let l = eval_expr(left, ctx)?;
    let r = eval_expr(right, ctx)?;
    Ok(Value::new(wrap(t(l.equals(&r), this)?)))
}

fn eval_membership(
    this: &AstExpr,
    left: &AstExpr,
    right: &AstExpr,
    negate: bool,
    ctx: &mut EvaluationContext,
) -> EvalResult {
    // Left to right: the needle evaluates before the haystack.
    let l = eval_expr(left, ctx)?;
    let r = eval_expr(right, ctx)?;
    let contained = t(r.is_in(&l), this)?;
    Ok(Value::new(contained != negate))
}

fn eval_slice(
    this: &AstExpr,
    object: &AstExpr,
    start: &Option<AstExpr>,
    stop: &Option<AstExpr>,
    stride: &Option<AstExpr>,
    ctx: &mut EvaluationContext,
) -> EvalResult {
    let object = eval_expr(object, ctx)?;
    let start = match start {
        Some(e) => Some(eval_expr(e, ctx)?),
        None => None,
    };
    let stop = match stop {
        Some(e) => Some(eval_expr(e, ctx)?),
        None => None,
    };
    let stride = match stride {
        Some(e) => Some(eval_expr(e, ctx)?),
        None => None,
    };
    t(object.slice(start, stop, stride), this)
}

fn eval_dot(
    this: &AstExpr,
    object: &AstExpr,
    field: &AstString,
    ctx: &mut EvaluationContext,
) -> EvalResult {
    let left = eval_expr(object, ctx)?;
    if let Some(v) = ctx.env.get_type_value(&left, &field.node) {
        if v.get_type() == "function" {
            // Bind the receiver so the method sees the object it acts on.
            Ok(WrappedMethod::new(left, v))
        } else {
            Ok(v)
        }
    } else {
        t(left.get_attr(&field.node), this)
    }
}

fn eval_call(
    this: &AstExpr,
    f: &AstExpr,
    pos: &[AstExpr],
    named: &[(AstString, AstExpr)],
    args: &Option<AstExpr>,
    kwargs: &Option<AstExpr>,
    ctx: &mut EvaluationContext,
) -> EvalResult {
    let callee = eval_expr(f, ctx)?;
    let npos = eval_vector!(pos, ctx);
    let mut nnamed = LinkedHashMap::new();
    for (k, v) in named.iter() {
        nnamed.insert(k.node.clone(), eval_expr(v, ctx)?);
    }
    let nargs = match args {
        Some(x) => Some(eval_expr(x, ctx)?),
        None => None,
    };
    let nkwargs = match kwargs {
        Some(x) => Some(eval_expr(x, ctx)?),
        None => None,
    };

    if let Some(id) = callee.function_id() {
        if !ctx.thread.recursion_enabled && ctx.thread.call_stack.contains(id) {
            return Err(EvalException::DiagnosedError(Diagnostic {
                level: Level::Error,
                message: format!(
                    "Function {} recursed, call stack:{}",
                    callee.to_str(),
                    ctx.thread.call_stack.print_with_newline_before()
                ),
                code: Some(RECURSION_ERROR_CODE.to_owned()),
                spans: vec![SpanLabel {
                    span: this.span,
                    style: SpanStyle::Primary,
                    label: Some("Recursive call".to_owned()),
                }],
            }));
        }
    }
    if ctx.thread.call_stack.depth() >= ctx.thread.max_call_depth() {
        return Err(EvalException::DiagnosedError(Diagnostic {
            level: Level::Error,
            message: "Call stack depth limit exceeded".to_owned(),
            code: Some(thread::STACK_OVERFLOW_ERROR_CODE.to_owned()),
            spans: vec![SpanLabel {
                span: this.span,
                style: SpanStyle::Primary,
                label: None,
            }],
        }));
    }
    ctx.thread
        .call_stack
        .push(callee.clone(), ctx.map.clone(), this.span.low());
    let result = {
        let mut call_ctx = CallContext {
            thread: &mut *ctx.thread,
            env: ctx.env,
        };
        callee.call(&mut call_ctx, npos, nnamed, nargs, nkwargs)
    };
    ctx.thread.call_stack.pop();
    t(result, this)
}

fn make_signature(
    params: &[AstParameter],
    ctx: &mut EvaluationContext,
) -> Result<FunctionSignature, EvalException> {
    let mut signature = FunctionSignature::new();
    let mut seen_star = false;
    for p in params {
        match &p.node {
            Parameter::Normal(n) => {
                signature = if seen_star {
                    signature.named(&n.node)
                } else {
                    signature.required(&n.node)
                };
            }
            Parameter::WithDefaultValue(n, default) => {
                // Defaults are evaluated once, at definition time, and
                // shared across calls.
                let default = eval_expr(default, ctx)?;
                signature = if seen_star {
                    signature.named_optional(&n.node, default)
                } else {
                    signature.optional(&n.node, default)
                };
            }
            Parameter::Args(n) => {
                seen_star = true;
                if !n.node.is_empty() {
                    signature = signature.with_args(&n.node);
                }
            }
            Parameter::KWArgs(n) => {
                signature = signature.with_kwargs(&n.node);
            }
        }
    }
    Ok(signature)
}

fn make_function(
    name: &str,
    params: &[AstParameter],
    body: FunctionBody,
    scope_cell: &ScopeCell,
    ctx: &mut EvaluationContext,
) -> EvalResult {
    let signature = make_signature(params, ctx)?;
    let scope = scope_cell.info().clone();
    let captured: Vec<ValueCell> = scope
        .free
        .iter()
        .map(|src| match src {
            FreeVarSource::Cell(i) => ctx.frame.cells[*i as usize].clone(),
            FreeVarSource::Free(i) => ctx.frame.captured[*i as usize].clone(),
        })
        .collect();
    Ok(Def::new(
        name.to_owned(),
        ctx.module.name().to_owned(),
        signature,
        body,
        scope,
        captured,
        ctx.module.clone(),
        ctx.map.clone(),
    ))
}

/// Execute a function body after argument binding. Called back from
/// [`Def::call`] through the object protocol.
pub(crate) fn eval_def_call(
    def: &Def,
    ctx: &mut CallContext<'_>,
    bound: Vec<Value>,
) -> ValueResult {
    let scope = def.scope();
    let mut frame = LocalFrame::new(scope);
    frame.captured = def.captured().to_vec();
    for (slot, value) in scope.params.iter().zip(bound.into_iter()) {
        match slot.get() {
            Slot::Local(i) => frame.slots[i as usize] = Some(value),
            Slot::Cell(i) => {
                // A frame's own cells are never frozen during its call.
                let _ = frame.cells[i as usize].set(value);
            }
            s => unreachable!("parameter bound to non-frame slot {:?}", s),
        }
    }
    let mut context = EvaluationContext {
        thread: &mut *ctx.thread,
        env: ctx.env,
        module: def.module().clone(),
        frame,
        map: def.map().clone(),
    };
    match def.body() {
        FunctionBody::Statements(stmts) => match eval_stmt(stmts, &mut context) {
            Err(EvalException::Return(_, v)) => Ok(v),
            Err(x) => Err(ValueError::DiagnosedError(x.into())),
            Ok(..) => Ok(Value::new(NoneType::None)),
        },
        FunctionBody::Expression(e) => match eval_expr(e, &mut context) {
            Ok(v) => Ok(v),
            Err(x) => Err(ValueError::DiagnosedError(x.into())),
        },
    }
}

/// Evaluate the clause chain of a comprehension, invoking `body` once per
/// matching iteration.
fn eval_comprehension(
    clauses: &[AstClause],
    ctx: &mut EvaluationContext,
    body: &mut dyn FnMut(&mut EvaluationContext) -> Result<(), EvalException>,
) -> Result<(), EvalException> {
    match clauses.split_first() {
        None => body(ctx),
        Some((clause, rest)) => match &clause.node {
            Clause::If(cond) => {
                if eval_expr(cond, ctx)?.to_bool() {
                    eval_comprehension(rest, ctx, body)?;
                }
                Ok(())
            }
            Clause::For(target, over) => {
                let iterable = eval_expr(over, ctx)?;
                let it = t(iterable.iter(), clause)?;
                for v in it {
                    set_target(target, ctx, v)?;
                    eval_comprehension(rest, ctx, body)?;
                }
                Ok(())
            }
        },
    }
}

fn eval_expr(expr: &AstExpr, ctx: &mut EvaluationContext) -> EvalResult {
    match &expr.node {
        Expr::Identifier(name, slot) => read_ident(name, slot, ctx),
        Expr::IntLiteral(i) => Ok(Value::new(i.node.clone())),
        Expr::FloatLiteral(f) => Ok(Value::new(f.node)),
        Expr::StringLiteral(s) => Ok(Value::new(s.node.clone())),
        Expr::Tuple(exprs) => {
            let values = eval_vector!(exprs, ctx);
            Ok(Value::new(Tuple::new(values)))
        }
        Expr::List(exprs) => {
            let values = eval_vector!(exprs, ctx);
            Ok(Value::new(List::from_values(values)))
        }
        Expr::Set(exprs) => {
            let mut result = Set::new_typed();
            for e in exprs {
                let v = eval_expr(e, ctx)?;
                t(result.insert(v), expr)?;
            }
            Ok(Value::new(result))
        }
        Expr::Dict(pairs) => {
            let mut result = Dictionary::new_typed();
            for (k, v) in pairs {
                let k = eval_expr(k, ctx)?;
                let v = eval_expr(v, ctx)?;
                t(result.insert(k, v), expr)?;
            }
            Ok(Value::new(result))
        }
        Expr::Dot(object, field) => eval_dot(expr, object, field, ctx),
        Expr::ArrayIndirection(object, index) => {
            let object = eval_expr(object, ctx)?;
            let index = eval_expr(index, ctx)?;
            t(object.at(index), expr)
        }
        Expr::Slice(object, start, stop, stride) => {
            eval_slice(expr, object, start, stop, stride, ctx)
        }
        Expr::Call(f, pos, named, args, kwargs) => {
            eval_call(expr, f, pos, named, args, kwargs, ctx)
        }
        Expr::Not(e) => Ok(Value::new(!eval_expr(e, ctx)?.to_bool())),
        Expr::UnOp(UnOp::Plus, e) => t(eval_expr(e, ctx)?.plus(), expr),
        Expr::UnOp(UnOp::Minus, e) => t(eval_expr(e, ctx)?.minus(), expr),
        Expr::And(l, r) => {
            let l = eval_expr(l, ctx)?;
            Ok(if !l.to_bool() { l } else { eval_expr(r, ctx)? })
        }
        Expr::Or(l, r) => {
            let l = eval_expr(l, ctx)?;
            Ok(if l.to_bool() { l } else { eval_expr(r, ctx)? })
        }
        Expr::If(cond, v1, v2) => {
            if eval_expr(cond, ctx)?.to_bool() {
                eval_expr(v1, ctx)
            } else {
                eval_expr(v2, ctx)
            }
        }
        Expr::BinOp(BinOp::EqualsTo, l, r) => eval_equals(expr, l, r, |x| x, ctx),
        Expr::BinOp(BinOp::Different, l, r) => eval_equals(expr, l, r, |x| !x, ctx),
        Expr::BinOp(BinOp::LowerThan, l, r) => {
            eval_compare(expr, l, r, |x| x == Ordering::Less, ctx)
        }
        Expr::BinOp(BinOp::GreaterThan, l, r) => {
            eval_compare(expr, l, r, |x| x == Ordering::Greater, ctx)
        }
        Expr::BinOp(BinOp::LowerOrEqual, l, r) => {
            eval_compare(expr, l, r, |x| x != Ordering::Greater, ctx)
        }
        Expr::BinOp(BinOp::GreaterOrEqual, l, r) => {
            eval_compare(expr, l, r, |x| x != Ordering::Less, ctx)
        }
        Expr::BinOp(BinOp::In, l, r) => eval_membership(expr, l, r, false, ctx),
        Expr::BinOp(BinOp::NotIn, l, r) => eval_membership(expr, l, r, true, ctx),
        Expr::BinOp(op, l, r) => {
            let l = eval_expr(l, ctx)?;
            let r = eval_expr(r, ctx)?;
            t(
                match op {
                    BinOp::Addition => l.add(r),
                    BinOp::Subtraction => l.sub(r),
                    BinOp::Multiplication => l.mul(r),
                    BinOp::Division => l.div(r),
                    BinOp::FloorDivision => l.floor_div(r),
                    BinOp::Percent => l.percent(r),
                    BinOp::Pipe => l.pipe(r),
                    BinOp::Ampersand => l.bit_and(r),
                    BinOp::Caret => l.bit_xor(r),
                    BinOp::LeftShift => l.left_shift(r),
                    BinOp::RightShift => l.right_shift(r),
                    op => unreachable!("binary operator {:?} handled elsewhere", op),
                },
                expr,
            )
        }
        Expr::Lambda(params, body, scope_cell) => make_function(
            "lambda",
            params,
            FunctionBody::Expression(body.clone()),
            scope_cell,
            ctx,
        ),
        Expr::ListComprehension(e, clauses) => {
            let mut result = Vec::new();
            eval_comprehension(clauses, ctx, &mut |ctx| {
                result.push(eval_expr(e, ctx)?);
                Ok(())
            })?;
            Ok(Value::new(List::from_values(result)))
        }
        Expr::SetComprehension(e, clauses) => {
            let mut items = Vec::new();
            eval_comprehension(clauses, ctx, &mut |ctx| {
                items.push(eval_expr(e, ctx)?);
                Ok(())
            })?;
            let mut result = Set::new_typed();
            for v in items {
                t(result.insert(v), expr)?;
            }
            Ok(Value::new(result))
        }
        Expr::DictComprehension((k, v), clauses) => {
            let mut items = Vec::new();
            eval_comprehension(clauses, ctx, &mut |ctx| {
                let key = eval_expr(k, ctx)?;
                let value = eval_expr(v, ctx)?;
                items.push((key, value));
                Ok(())
            })?;
            let mut result = Dictionary::new_typed();
            for (key, value) in items {
                // Duplicate keys overwrite, keeping the first insertion
                // point.
                t(result.insert(key, value), expr)?;
            }
            Ok(Value::new(result))
        }
    }
}

// === Assignment ===

fn set_target(
    target: &AstAssignTargetExpr,
    ctx: &mut EvaluationContext,
    new_value: Value,
) -> Result<(), EvalException> {
    match &target.node {
        AssignTargetExpr::Identifier(name, slot) => write_ident(name, slot, ctx, new_value),
        AssignTargetExpr::Dot(object, field) => {
            let object = eval_expr(object, ctx)?;
            t(object.set_attr(&field.node, new_value), target)
        }
        AssignTargetExpr::ArrayIndirection(array, index) => {
            let array = eval_expr(array, ctx)?;
            let index = eval_expr(index, ctx)?;
            t(array.set_at(index, new_value), target)
        }
        AssignTargetExpr::Subtargets(subs) => {
            let values = t(new_value.to_vec(), target)?;
            if values.len() != subs.len() {
                return Err(EvalException::IncorrectNumberOfValueToUnpack(
                    target.span,
                    subs.len() as i64,
                    values.len() as i64,
                ));
            }
            for (sub, v) in subs.iter().zip(values.into_iter()) {
                set_target(sub, ctx, v)?;
            }
            Ok(())
        }
    }
}

fn apply_augmented(op: AugmentedAssignOp, left: &Value, right: Value) -> ValueResult {
    if let AugmentedAssignOp::Increment = op {
        // `x += y` on a list mutates it in place, unlike `x = x + y`.
        if left.get_type() == "list" {
            let items = right.to_vec()?;
            {
                let mut l = left.downcast_mut::<List>().unwrap();
                l.content_mut()?.extend(items);
            }
            return Ok(left.clone());
        }
    }
    match op {
        AugmentedAssignOp::Increment => left.add(right),
        AugmentedAssignOp::Decrement => left.sub(right),
        AugmentedAssignOp::Multiplier => left.mul(right),
        AugmentedAssignOp::Divider => left.div(right),
        AugmentedAssignOp::FloorDivider => left.floor_div(right),
        AugmentedAssignOp::Percent => left.percent(right),
        AugmentedAssignOp::BitOr => left.pipe(right),
        AugmentedAssignOp::BitAnd => left.bit_and(right),
        AugmentedAssignOp::BitXor => left.bit_xor(right),
        AugmentedAssignOp::LeftShift => left.left_shift(right),
        AugmentedAssignOp::RightShift => left.right_shift(right),
    }
}

/// Augmented assignment evaluates the target's subexpressions once.
fn eval_augmented_assign(
    stmt: &AstStatement,
    target: &AstAugmentedAssignTargetExpr,
    op: AugmentedAssignOp,
    rhs: &AstExpr,
    ctx: &mut EvaluationContext,
) -> EvalResult {
    match &target.node {
        AugmentedAssignTargetExpr::Identifier(name, slot) => {
            let old = read_ident(name, slot, ctx)?;
            let right = eval_expr(rhs, ctx)?;
            let new = t(apply_augmented(op, &old, right), stmt)?;
            write_ident(name, slot, ctx, new)?;
        }
        AugmentedAssignTargetExpr::Dot(object, field) => {
            let object = eval_expr(object, ctx)?;
            let old = t(object.get_attr(&field.node), target)?;
            let right = eval_expr(rhs, ctx)?;
            let new = t(apply_augmented(op, &old, right), stmt)?;
            t(object.set_attr(&field.node, new), target)?;
        }
        AugmentedAssignTargetExpr::ArrayIndirection(array, index) => {
            let array = eval_expr(array, ctx)?;
            let index = eval_expr(index, ctx)?;
            let old = t(array.at(index.clone()), target)?;
            let right = eval_expr(rhs, ctx)?;
            let new = t(apply_augmented(op, &old, right), stmt)?;
            t(array.set_at(index, new), target)?;
        }
    }
    Ok(Value::new(NoneType::None))
}

// === Statements ===

fn eval_stmt(stmt: &AstStatement, ctx: &mut EvaluationContext) -> EvalResult {
    t(ctx.thread.check_step(), stmt)?;
    match &stmt.node {
        Statement::Break => Err(EvalException::Break(stmt.span)),
        Statement::Continue => Err(EvalException::Continue(stmt.span)),
        Statement::Pass => Ok(Value::new(NoneType::None)),
        Statement::Return(Some(e)) => {
            Err(EvalException::Return(stmt.span, eval_expr(e, ctx)?))
        }
        Statement::Return(None) => {
            Err(EvalException::Return(stmt.span, Value::new(NoneType::None)))
        }
        Statement::Expression(e) => eval_expr(e, ctx),
        Statement::Assign(target, rhs) => {
            let rhs = eval_expr(rhs, ctx)?;
            set_target(target, ctx, rhs)?;
            Ok(Value::new(NoneType::None))
        }
        Statement::AugmentedAssign(target, op, rhs) => {
            eval_augmented_assign(stmt, target, *op, rhs, ctx)
        }
        Statement::Statements(stmts) => {
            let mut r = Value::new(NoneType::None);
            for s in stmts {
                r = eval_stmt(s, ctx)?;
            }
            Ok(r)
        }
        Statement::If(cond, body) => {
            if eval_expr(cond, ctx)?.to_bool() {
                eval_stmt(body, ctx)
            } else {
                Ok(Value::new(NoneType::None))
            }
        }
        Statement::IfElse(cond, then_block, else_block) => {
            if eval_expr(cond, ctx)?.to_bool() {
                eval_stmt(then_block, ctx)
            } else {
                eval_stmt(else_block, ctx)
            }
        }
        Statement::For(target, over, body) => {
            let iterable = eval_expr(over, ctx)?;
            let mut result = Ok(Value::new(NoneType::None));
            let it = t(iterable.iter(), stmt)?;
            for v in it {
                set_target(target, ctx, v)?;
                match eval_stmt(body, ctx) {
                    Err(EvalException::Break(..)) => break,
                    Err(EvalException::Continue(..)) => (),
                    Err(x) => {
                        result = Err(x);
                        break;
                    }
                    Ok(..) => (),
                }
            }
            result
        }
        Statement::While(cond, body) => {
            let mut result = Ok(Value::new(NoneType::None));
            while eval_expr(cond, ctx)?.to_bool() {
                match eval_stmt(body, ctx) {
                    Err(EvalException::Break(..)) => break,
                    Err(EvalException::Continue(..)) => (),
                    Err(x) => {
                        result = Err(x);
                        break;
                    }
                    Ok(..) => (),
                }
            }
            result
        }
        Statement::Def(name, params, suite, name_slot, scope_cell) => {
            let f = make_function(
                &name.node,
                params,
                FunctionBody::Statements(suite.clone()),
                scope_cell,
                ctx,
            )?;
            write_ident(name, name_slot, ctx, f.clone())?;
            Ok(f)
        }
        Statement::Load(path, symbols) => {
            let loader = match ctx.thread.loader.clone() {
                Some(l) => l,
                None => {
                    return Err(EvalException::DiagnosedError(Diagnostic {
                        level: Level::Error,
                        message: "load() is not supported: no loader was configured".to_owned(),
                        code: Some(loader::NO_LOADER_ERROR_CODE.to_owned()),
                        spans: vec![SpanLabel {
                            span: stmt.span,
                            style: SpanStyle::Primary,
                            label: None,
                        }],
                    }))
                }
            };
            let loaded = loader
                .load(ctx.thread, &path.node)
                .map_err(EvalException::DiagnosedError)?;
            for symbol in symbols {
                if symbol.original.node.starts_with('_') || symbol.original.node.is_empty() {
                    return Err(t::<Value, _, _>(
                        Err(EnvironmentError::CannotImportPrivateSymbol(
                            symbol.original.node.clone(),
                        )),
                        &symbol.original,
                    )
                    .unwrap_err());
                }
                let value = match loaded.get(&symbol.original.node) {
                    Some(v) => v,
                    None => {
                        return Err(t::<Value, _, _>(
                            Err(EnvironmentError::VariableNotFound(
                                symbol.original.node.clone(),
                            )),
                            &symbol.original,
                        )
                        .unwrap_err())
                    }
                };
                write_ident(&symbol.local, &symbol.slot, ctx, value)?;
            }
            Ok(Value::new(NoneType::None))
        }
    }
}

/// Execute a resolved program's top-level statements against `module`.
///
/// On success the module's entire value graph is frozen, after which it may
/// be shared freely.
pub fn eval_module(
    program: &Program,
    module: &Rc<Module>,
    thread: &mut Thread,
    env: &Environment,
) -> Result<Value, Diagnostic> {
    let mut ctx = EvaluationContext {
        thread,
        env,
        module: module.clone(),
        frame: LocalFrame::new(&program.scope),
        map: program.map.clone(),
    };
    match eval_stmt(&program.stmt, &mut ctx) {
        Ok(v) => {
            module.freeze();
            Ok(v)
        }
        Err(e) => Err(e.into()),
    }
}
