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

//! Static name resolution.
//!
//! Every identifier use is classified before execution: local or cell slot
//! in the enclosing function frame, capture from an outer function, module
//! global, load-imported file-local, or predeclared/universal name. The
//! resolver also enforces the static rules of the language (placement of
//! `return`, `break`, `continue` and `load`, binding uniqueness at module
//! level, reserved words, dialect gates).
//!
//! Binding annotations are shared `Rc<Cell<Slot>>` handles: when a later
//! capture promotes a local variable to a cell, earlier annotated uses of
//! the same binding observe the promoted slot.

use crate::environment::Environment;
use crate::syntax::ast::*;
use crate::syntax::dialect::Dialect;
use codemap::{CodeMap, Span};
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

// Error codes -- CS = Critical Static analysis
pub const UNDEFINED_NAME_ERROR_CODE: &str = "CS00";
pub const DUPLICATE_GLOBAL_BINDING_ERROR_CODE: &str = "CS01";
pub const GLOBAL_FILE_CLASH_ERROR_CODE: &str = "CS02";
pub const LOAD_NOT_TOP_LEVEL_ERROR_CODE: &str = "CS03";
pub const RETURN_OUTSIDE_FUNCTION_ERROR_CODE: &str = "CS04";
pub const BREAK_CONTINUE_OUTSIDE_LOOP_ERROR_CODE: &str = "CS05";
pub const RESERVED_WORD_ERROR_CODE: &str = "CS06";
pub const TOP_LEVEL_CONTROL_ERROR_CODE: &str = "CS07";
pub const WHILE_NOT_ALLOWED_ERROR_CODE: &str = "CS08";
pub const TOP_LEVEL_AUGMENTED_ASSIGN_ERROR_CODE: &str = "CS09";
pub const DUPLICATE_LOAD_SYMBOL_ERROR_CODE: &str = "CS10";

/// Words that are reserved for future use: not keywords at lex time, but
/// rejected as identifiers. `assert` is deliberately usable.
const RESERVED_WORDS: &[&str] = &[
    "as", "class", "del", "except", "finally", "from", "global", "import", "is", "nonlocal",
    "raise", "try", "with", "yield",
];

/// The resolved classification of one identifier use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Slot in the current frame's plain locals.
    Local(u32),
    /// Slot in the current frame's cells (a local captured by a nested
    /// function).
    Cell(u32),
    /// Index into the current function's captured-cells vector.
    Free(u32),
    /// Slot in the module's globals.
    Global(u32),
    /// Slot in the module's file block (a `load`ed symbol).
    FileLocal(u32),
    /// A host-predeclared or universal name, looked up by name.
    Predeclared,
}

/// How the frame defining a closure supplies one of its captured cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeVarSource {
    /// One of the defining frame's own cells.
    Cell(u32),
    /// One of the defining function's own captures, passed through.
    Free(u32),
}

pub(crate) type SlotRef = Rc<Cell<Slot>>;

/// Resolver output for one function, lambda or module block.
#[derive(Debug, Clone, Default)]
pub struct ScopeInfo {
    /// Number of plain local slots (including holes left by promotion).
    pub local_count: u32,
    /// Number of cell slots.
    pub cell_count: u32,
    /// Sources for the cells a closure over this block captures.
    pub free: Vec<FreeVarSource>,
    /// The binding of each declared parameter, in declaration order
    /// (excluding a bare `*` marker).
    pub params: Vec<SlotRef>,
}

/// A resolved module, ready to execute.
#[derive(Debug)]
pub struct Program {
    pub(crate) stmt: AstStatement,
    pub(crate) scope: ScopeInfo,
    globals: Vec<String>,
    file_names: Vec<String>,
    pub(crate) map: Arc<Mutex<CodeMap>>,
}

impl Program {
    /// The ordered names of the module's globals.
    pub fn global_names(&self) -> &[String] {
        &self.globals
    }

    pub(crate) fn file_names(&self) -> &[String] {
        &self.file_names
    }
}

#[derive(Debug)]
struct ResolveError {
    code: &'static str,
    message: String,
    span: Span,
}

impl ResolveError {
    fn to_diagnostic(self) -> Diagnostic {
        Diagnostic {
            level: Level::Error,
            message: self.message.clone(),
            code: Some(self.code.to_owned()),
            spans: vec![SpanLabel {
                span: self.span,
                style: SpanStyle::Primary,
                label: Some(self.message),
            }],
        }
    }
}

type ResolveResult<T> = Result<T, ResolveError>;

struct BindingState {
    slot: SlotRef,
}

#[derive(Default)]
struct FrameState {
    /// Stack of sub-scopes (the root scope, then one per comprehension
    /// clause); each maps a name to an index into `bindings`.
    scopes: Vec<HashMap<String, usize>>,
    bindings: Vec<BindingState>,
    cell_count: u32,
    free: Vec<FreeVarSource>,
    /// Memoized captures keyed by (defining frame, binding index).
    free_map: HashMap<(usize, usize), u32>,
}

impl FrameState {
    fn new() -> FrameState {
        FrameState {
            scopes: vec![HashMap::new()],
            ..Default::default()
        }
    }
}

struct Resolver<'a> {
    dialect: &'a Dialect,
    env: &'a Environment,
    globals: Vec<String>,
    globals_map: HashMap<String, u32>,
    file_names: Vec<String>,
    file_map: HashMap<String, u32>,
    frames: Vec<FrameState>,
}

/// Resolve a parsed module against a dialect and a predeclared environment,
/// annotating the tree in place.
pub fn resolve(
    map: &Arc<Mutex<CodeMap>>,
    stmt: AstStatement,
    dialect: &Dialect,
    env: &Environment,
) -> Result<Program, Diagnostic> {
    let mut resolver = Resolver {
        dialect,
        env,
        globals: Vec::new(),
        globals_map: HashMap::new(),
        file_names: Vec::new(),
        file_map: HashMap::new(),
        frames: vec![FrameState::new()],
    };
    let r = resolver
        .collect_module(&stmt)
        .and_then(|()| resolver.resolve_stmt(&stmt, false));
    match r {
        Err(e) => Err(e.to_diagnostic()),
        Ok(()) => {
            let frame = resolver.frames.pop().unwrap();
            Ok(Program {
                stmt,
                scope: ScopeInfo {
                    local_count: frame.bindings.len() as u32,
                    cell_count: frame.cell_count,
                    free: frame.free,
                    params: Vec::new(),
                },
                globals: resolver.globals,
                file_names: resolver.file_names,
                map: map.clone(),
            })
        }
    }
}

impl<'a> Resolver<'a> {
    fn error<T>(&self, code: &'static str, message: String, span: Span) -> ResolveResult<T> {
        Err(ResolveError {
            code,
            message,
            span,
        })
    }

    fn check_not_reserved(&self, name: &AstString) -> ResolveResult<()> {
        if RESERVED_WORDS.contains(&name.node.as_str()) {
            return self.error(
                RESERVED_WORD_ERROR_CODE,
                format!("'{}' is a reserved word and cannot be used", name.node),
                name.span,
            );
        }
        Ok(())
    }

    // === Module-level binding collection ===

    fn bind_global(&mut self, name: &AstString) -> ResolveResult<()> {
        self.check_not_reserved(name)?;
        if self.file_map.contains_key(&name.node) {
            return self.error(
                GLOBAL_FILE_CLASH_ERROR_CODE,
                format!(
                    "Name '{}' is already bound by a load statement",
                    name.node
                ),
                name.span,
            );
        }
        if self.globals_map.contains_key(&name.node) {
            if self.dialect.allow_top_level_control {
                return Ok(());
            }
            return self.error(
                DUPLICATE_GLOBAL_BINDING_ERROR_CODE,
                format!("Global '{}' is bound more than once", name.node),
                name.span,
            );
        }
        let index = self.globals.len() as u32;
        self.globals.push(name.node.clone());
        self.globals_map.insert(name.node.clone(), index);
        Ok(())
    }

    fn bind_file_local(&mut self, name: &AstString) -> ResolveResult<()> {
        self.check_not_reserved(name)?;
        if self.globals_map.contains_key(&name.node) {
            return self.error(
                GLOBAL_FILE_CLASH_ERROR_CODE,
                format!("Name '{}' is already bound as a global", name.node),
                name.span,
            );
        }
        if self.file_map.contains_key(&name.node) {
            return self.error(
                DUPLICATE_LOAD_SYMBOL_ERROR_CODE,
                format!("Symbol '{}' is loaded more than once", name.node),
                name.span,
            );
        }
        let index = self.file_names.len() as u32;
        self.file_names.push(name.node.clone());
        self.file_map.insert(name.node.clone(), index);
        Ok(())
    }

    fn bind_global_targets(&mut self, target: &AstAssignTargetExpr) -> ResolveResult<()> {
        match &target.node {
            AssignTargetExpr::Identifier(name, ..) => self.bind_global(name),
            AssignTargetExpr::Subtargets(subs) => {
                for s in subs {
                    self.bind_global_targets(s)?;
                }
                Ok(())
            }
            AssignTargetExpr::Dot(..) | AssignTargetExpr::ArrayIndirection(..) => Ok(()),
        }
    }

    /// Collect the module block's bindings: globals and file-locals, and
    /// enforce the top-level dialect gates.
    fn collect_module(&mut self, stmt: &AstStatement) -> ResolveResult<()> {
        match &stmt.node {
            Statement::Statements(stmts) => {
                for s in stmts {
                    self.collect_module(s)?;
                }
                Ok(())
            }
            Statement::Assign(target, ..) => self.bind_global_targets(target),
            Statement::AugmentedAssign(target, ..) => {
                if let AugmentedAssignTargetExpr::Identifier(name, ..) = &target.node {
                    if !self.dialect.allow_top_level_control {
                        return self.error(
                            TOP_LEVEL_AUGMENTED_ASSIGN_ERROR_CODE,
                            "Augmented assignment on a global is not allowed in the strict \
                             dialect"
                                .to_owned(),
                            stmt.span,
                        );
                    }
                    self.bind_global(name)?;
                }
                Ok(())
            }
            Statement::Def(name, ..) => self.bind_global(name),
            Statement::Load(_, symbols) => {
                for s in symbols {
                    self.bind_file_local(&s.local)?;
                }
                Ok(())
            }
            Statement::If(_, body) => {
                self.check_top_level_control(stmt.span)?;
                self.collect_module(body)
            }
            Statement::IfElse(_, then_block, else_block) => {
                self.check_top_level_control(stmt.span)?;
                self.collect_module(then_block)?;
                self.collect_module(else_block)
            }
            Statement::For(target, _, body) => {
                self.check_top_level_control(stmt.span)?;
                self.bind_global_targets(target)?;
                self.collect_module(body)
            }
            Statement::While(_, body) => {
                self.check_top_level_control(stmt.span)?;
                self.collect_module(body)
            }
            Statement::Break
            | Statement::Continue
            | Statement::Pass
            | Statement::Return(..)
            | Statement::Expression(..) => Ok(()),
        }
    }

    fn check_top_level_control(&self, span: Span) -> ResolveResult<()> {
        if self.dialect.allow_top_level_control {
            Ok(())
        } else {
            Err(ResolveError {
                code: TOP_LEVEL_CONTROL_ERROR_CODE,
                message: "Control-flow statements are not allowed at the top level of a module \
                          in the strict dialect"
                    .to_owned(),
                span,
            })
        }
    }

    // === Frame management ===

    fn current_frame(&mut self) -> &mut FrameState {
        self.frames.last_mut().unwrap()
    }

    fn push_scope(&mut self) {
        self.current_frame().scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.current_frame().scopes.pop().unwrap();
    }

    /// Create a binding for `name` in the innermost scope of the current
    /// frame, unless that scope already binds it.
    fn bind_local(&mut self, name: &str) {
        let frame = self.frames.last_mut().unwrap();
        let index = frame.bindings.len();
        let scope = frame.scopes.last_mut().unwrap();
        if scope.contains_key(name) {
            return;
        }
        scope.insert(name.to_owned(), index);
        frame.bindings.push(BindingState {
            slot: Rc::new(Cell::new(Slot::Local(index as u32))),
        });
    }

    fn lookup_in_frame(&self, frame_index: usize, name: &str) -> Option<usize> {
        let frame = &self.frames[frame_index];
        for scope in frame.scopes.iter().rev() {
            if let Some(&i) = scope.get(name) {
                return Some(i);
            }
        }
        None
    }

    /// Promote a binding to a cell, returning its cell index.
    fn promote_to_cell(&mut self, frame_index: usize, binding_index: usize) -> u32 {
        let frame = &mut self.frames[frame_index];
        let binding = &frame.bindings[binding_index];
        match binding.slot.get() {
            Slot::Cell(i) => i,
            Slot::Local(..) => {
                let i = frame.cell_count;
                frame.cell_count += 1;
                binding.slot.set(Slot::Cell(i));
                i
            }
            s => unreachable!("promoting non-local slot {:?}", s),
        }
    }

    /// Record in `frame_index` a capture of `source` (from the frame right
    /// below it), deduplicated by the originating binding.
    fn intern_free(
        &mut self,
        frame_index: usize,
        key: (usize, usize),
        source: FreeVarSource,
    ) -> u32 {
        let frame = &mut self.frames[frame_index];
        if let Some(&i) = frame.free_map.get(&key) {
            return i;
        }
        let i = frame.free.len() as u32;
        frame.free.push(source);
        frame.free_map.insert(key, i);
        i
    }

    /// Resolve a name use to a binding handle, searching innermost to
    /// outermost: frames (with cell promotion and capture threading), file
    /// block, module block, then the predeclared environments.
    fn resolve_name_use(&mut self, name: &AstString) -> ResolveResult<SlotRef> {
        self.check_not_reserved(name)?;
        let nframes = self.frames.len();
        for fi in (0..nframes).rev() {
            if let Some(bi) = self.lookup_in_frame(fi, &name.node) {
                if fi == nframes - 1 {
                    return Ok(self.frames[fi].bindings[bi].slot.clone());
                }
                // The variable lives in an enclosing frame: promote it to a
                // cell and thread the capture through every frame between
                // its owner and the innermost one.
                let cell_index = self.promote_to_cell(fi, bi);
                let mut source = FreeVarSource::Cell(cell_index);
                let mut free_index = 0;
                for g in fi + 1..nframes {
                    free_index = self.intern_free(g, (fi, bi), source);
                    source = FreeVarSource::Free(free_index);
                }
                return Ok(Rc::new(Cell::new(Slot::Free(free_index))));
            }
        }
        if let Some(&i) = self.file_map.get(&name.node) {
            return Ok(Rc::new(Cell::new(Slot::FileLocal(i))));
        }
        if let Some(&i) = self.globals_map.get(&name.node) {
            return Ok(Rc::new(Cell::new(Slot::Global(i))));
        }
        if self.env.contains(&name.node) {
            return Ok(Rc::new(Cell::new(Slot::Predeclared)));
        }
        self.error(
            UNDEFINED_NAME_ERROR_CODE,
            format!("Name '{}' is not defined", name.node),
            name.span,
        )
    }

    // === Statements ===

    fn resolve_stmt(&mut self, stmt: &AstStatement, in_loop: bool) -> ResolveResult<()> {
        match &stmt.node {
            Statement::Break | Statement::Continue => {
                if in_loop {
                    Ok(())
                } else {
                    let kw = if let Statement::Break = stmt.node {
                        "break"
                    } else {
                        "continue"
                    };
                    self.error(
                        BREAK_CONTINUE_OUTSIDE_LOOP_ERROR_CODE,
                        format!("'{}' cannot be used outside of a loop", kw),
                        stmt.span,
                    )
                }
            }
            Statement::Pass => Ok(()),
            Statement::Return(e) => {
                if self.frames.len() < 2 {
                    return self.error(
                        RETURN_OUTSIDE_FUNCTION_ERROR_CODE,
                        "'return' cannot be used outside of a function".to_owned(),
                        stmt.span,
                    );
                }
                match e {
                    Some(e) => self.resolve_expr(e),
                    None => Ok(()),
                }
            }
            Statement::Expression(e) => self.resolve_expr(e),
            Statement::Assign(target, rhs) => {
                self.resolve_expr(rhs)?;
                self.resolve_assign_target(target)
            }
            Statement::AugmentedAssign(target, _, rhs) => {
                self.resolve_aug_target(target)?;
                self.resolve_expr(rhs)
            }
            Statement::Statements(stmts) => {
                for s in stmts {
                    self.resolve_stmt(s, in_loop)?;
                }
                Ok(())
            }
            Statement::If(cond, body) => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(body, in_loop)
            }
            Statement::IfElse(cond, then_block, else_block) => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(then_block, in_loop)?;
                self.resolve_stmt(else_block, in_loop)
            }
            Statement::For(target, over, body) => {
                self.resolve_expr(over)?;
                self.resolve_assign_target(target)?;
                self.resolve_stmt(body, true)
            }
            Statement::While(cond, body) => {
                if !self.dialect.allow_recursion {
                    return self.error(
                        WHILE_NOT_ALLOWED_ERROR_CODE,
                        "'while' loops require the recursion dialect option".to_owned(),
                        stmt.span,
                    );
                }
                self.resolve_expr(cond)?;
                self.resolve_stmt(body, true)
            }
            Statement::Def(name, params, suite, name_slot, scope_cell) => {
                self.resolve_function(params, FunctionContents::Suite(suite), scope_cell)?;
                name_slot.bind(self.resolve_name_use(name)?);
                Ok(())
            }
            Statement::Load(_, symbols) => {
                if self.frames.len() > 1 {
                    return self.error(
                        LOAD_NOT_TOP_LEVEL_ERROR_CODE,
                        "'load' can only be used at the top level of a module".to_owned(),
                        stmt.span,
                    );
                }
                for s in symbols {
                    let index = self.file_map[&s.local.node];
                    s.slot.bind(Rc::new(Cell::new(Slot::FileLocal(index))));
                }
                Ok(())
            }
        }
    }

    fn resolve_assign_target(&mut self, target: &AstAssignTargetExpr) -> ResolveResult<()> {
        match &target.node {
            AssignTargetExpr::Identifier(name, slot) => {
                slot.bind(self.resolve_name_use(name)?);
                Ok(())
            }
            AssignTargetExpr::Dot(object, ..) => self.resolve_expr(object),
            AssignTargetExpr::ArrayIndirection(array, index) => {
                self.resolve_expr(array)?;
                self.resolve_expr(index)
            }
            AssignTargetExpr::Subtargets(subs) => {
                for s in subs {
                    self.resolve_assign_target(s)?;
                }
                Ok(())
            }
        }
    }

    fn resolve_aug_target(&mut self, target: &AstAugmentedAssignTargetExpr) -> ResolveResult<()> {
        match &target.node {
            AugmentedAssignTargetExpr::Identifier(name, slot) => {
                slot.bind(self.resolve_name_use(name)?);
                Ok(())
            }
            AugmentedAssignTargetExpr::Dot(object, ..) => self.resolve_expr(object),
            AugmentedAssignTargetExpr::ArrayIndirection(array, index) => {
                self.resolve_expr(array)?;
                self.resolve_expr(index)
            }
        }
    }

    // === Functions ===

    fn resolve_function(
        &mut self,
        params: &[AstParameter],
        contents: FunctionContents<'_>,
        scope_cell: &ScopeCell,
    ) -> ResolveResult<()> {
        // Parameter defaults are evaluated at definition time, in the
        // enclosing scope.
        for p in params {
            if let Parameter::WithDefaultValue(_, default) = &p.node {
                self.resolve_expr(default)?;
            }
        }
        self.frames.push(FrameState::new());
        let mut param_slots = Vec::new();
        for p in params {
            if p.node.is_star_marker() {
                continue;
            }
            let name = p.node.name().to_owned();
            self.bind_local(&name);
            let index = self.lookup_in_frame(self.frames.len() - 1, &name).unwrap();
            param_slots.push(self.current_frame().bindings[index].slot.clone());
        }
        let r = (|| {
            match contents {
                FunctionContents::Suite(suite) => {
                    self.collect_function_locals(suite);
                    self.resolve_stmt(suite, false)?;
                }
                FunctionContents::Expression(body) => {
                    self.resolve_expr(body)?;
                }
            }
            Ok(())
        })();
        let frame = self.frames.pop().unwrap();
        r?;
        scope_cell.set(ScopeInfo {
            local_count: frame.bindings.len() as u32,
            cell_count: frame.cell_count,
            free: frame.free,
            params: param_slots,
        });
        Ok(())
    }

    /// Pre-scan a function body for the names it binds, so that a use can
    /// precede its (textual) binding. Does not descend into nested `def`s
    /// (only their name binds here) or comprehensions (which have their own
    /// scope).
    fn collect_function_locals(&mut self, stmt: &AstStatement) {
        match &stmt.node {
            Statement::Assign(target, ..) => self.collect_target_locals(target),
            Statement::AugmentedAssign(target, ..) => {
                if let AugmentedAssignTargetExpr::Identifier(name, ..) = &target.node {
                    self.bind_local(&name.node);
                }
            }
            Statement::For(target, _, body) => {
                self.collect_target_locals(target);
                self.collect_function_locals(body);
            }
            Statement::While(_, body) | Statement::If(_, body) => {
                self.collect_function_locals(body)
            }
            Statement::IfElse(_, then_block, else_block) => {
                self.collect_function_locals(then_block);
                self.collect_function_locals(else_block);
            }
            Statement::Statements(stmts) => {
                for s in stmts {
                    self.collect_function_locals(s);
                }
            }
            Statement::Def(name, ..) => self.bind_local(&name.node),
            Statement::Break
            | Statement::Continue
            | Statement::Pass
            | Statement::Return(..)
            | Statement::Expression(..)
            | Statement::Load(..) => {}
        }
    }

    fn collect_target_locals(&mut self, target: &AstAssignTargetExpr) {
        match &target.node {
            AssignTargetExpr::Identifier(name, ..) => self.bind_local(&name.node),
            AssignTargetExpr::Subtargets(subs) => {
                for s in subs {
                    self.collect_target_locals(s);
                }
            }
            AssignTargetExpr::Dot(..) | AssignTargetExpr::ArrayIndirection(..) => {}
        }
    }

    fn collect_comprehension_target(&mut self, target: &AstAssignTargetExpr) {
        match &target.node {
            AssignTargetExpr::Identifier(name, ..) => {
                // Comprehension variables always shadow: bind in the fresh
                // scope unconditionally.
                let frame = self.frames.last_mut().unwrap();
                let index = frame.bindings.len();
                frame
                    .scopes
                    .last_mut()
                    .unwrap()
                    .insert(name.node.clone(), index);
                frame.bindings.push(BindingState {
                    slot: Rc::new(Cell::new(Slot::Local(index as u32))),
                });
            }
            AssignTargetExpr::Subtargets(subs) => {
                for s in subs {
                    self.collect_comprehension_target(s);
                }
            }
            AssignTargetExpr::Dot(..) | AssignTargetExpr::ArrayIndirection(..) => {}
        }
    }

    // === Expressions ===

    fn resolve_expr(&mut self, expr: &AstExpr) -> ResolveResult<()> {
        match &expr.node {
            Expr::Identifier(name, slot) => {
                slot.bind(self.resolve_name_use(name)?);
                Ok(())
            }
            Expr::IntLiteral(..) | Expr::FloatLiteral(..) | Expr::StringLiteral(..) => Ok(()),
            Expr::Tuple(exprs) | Expr::List(exprs) | Expr::Set(exprs) => {
                for e in exprs {
                    self.resolve_expr(e)?;
                }
                Ok(())
            }
            Expr::Dict(pairs) => {
                for (k, v) in pairs {
                    self.resolve_expr(k)?;
                    self.resolve_expr(v)?;
                }
                Ok(())
            }
            Expr::Dot(object, ..) => self.resolve_expr(object),
            Expr::ArrayIndirection(array, index) => {
                self.resolve_expr(array)?;
                self.resolve_expr(index)
            }
            Expr::Slice(object, start, stop, stride) => {
                self.resolve_expr(object)?;
                for e in [start, stop, stride].iter().copied().flatten() {
                    self.resolve_expr(e)?;
                }
                Ok(())
            }
            Expr::Call(f, pos, named, args, kwargs) => {
                self.resolve_expr(f)?;
                for e in pos {
                    self.resolve_expr(e)?;
                }
                for (_, e) in named {
                    self.resolve_expr(e)?;
                }
                for e in [args, kwargs].iter().copied().flatten() {
                    self.resolve_expr(e)?;
                }
                Ok(())
            }
            Expr::Not(e) | Expr::UnOp(_, e) => self.resolve_expr(e),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::BinOp(_, l, r) => {
                self.resolve_expr(l)?;
                self.resolve_expr(r)
            }
            Expr::If(cond, v1, v2) => {
                self.resolve_expr(cond)?;
                self.resolve_expr(v1)?;
                self.resolve_expr(v2)
            }
            Expr::Lambda(params, body, scope_cell) => {
                self.resolve_function(params, FunctionContents::Expression(body), scope_cell)
            }
            Expr::ListComprehension(e, clauses) | Expr::SetComprehension(e, clauses) => {
                self.resolve_comprehension(&[e], clauses)
            }
            Expr::DictComprehension((k, v), clauses) => {
                self.resolve_comprehension(&[k, v], clauses)
            }
        }
    }

    /// The first `for` iterable resolves in the enclosing scope; every
    /// later clause and the body resolve in the comprehension's own scopes.
    fn resolve_comprehension(
        &mut self,
        exprs: &[&AstExpr],
        clauses: &[AstClause],
    ) -> ResolveResult<()> {
        match clauses.split_first() {
            None => {
                for e in exprs {
                    self.resolve_expr(e)?;
                }
                Ok(())
            }
            Some((clause, rest)) => match &clause.node {
                Clause::For(target, over) => {
                    self.resolve_expr(over)?;
                    self.push_scope();
                    self.collect_comprehension_target(target);
                    let r = self
                        .resolve_assign_target(target)
                        .and_then(|()| self.resolve_comprehension(exprs, rest));
                    self.pop_scope();
                    r
                }
                Clause::If(cond) => {
                    self.resolve_expr(cond)?;
                    self.resolve_comprehension(exprs, rest)
                }
            },
        }
    }
}

enum FunctionContents<'a> {
    Suite(&'a AstStatement),
    Expression(&'a AstExpr),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse;

    fn do_resolve(content: &str, dialect: &Dialect) -> Result<Program, Diagnostic> {
        let map = Arc::new(Mutex::new(CodeMap::new()));
        let env = Environment::new("test");
        env.set("len", crate::values::Value::from(1)).unwrap();
        env.freeze();
        let ast = parse(&map, "<test>", content).unwrap();
        resolve(&map, ast, dialect, &env)
    }

    fn ok(content: &str) -> Program {
        do_resolve(content, &Dialect::STRICT).unwrap()
    }

    fn fails(content: &str) -> String {
        do_resolve(content, &Dialect::STRICT).unwrap_err().code.unwrap()
    }

    #[test]
    fn globals_are_collected_in_order() {
        let p = ok("a = 1\nb = 2\ndef f():\n  pass\n");
        assert_eq!(vec!["a", "b", "f"], p.global_names().to_vec());
    }

    #[test]
    fn undefined_name() {
        assert_eq!(UNDEFINED_NAME_ERROR_CODE, fails("a = b\n"));
    }

    #[test]
    fn predeclared_names_resolve() {
        ok("a = len\n");
    }

    #[test]
    fn duplicate_global_is_rejected_in_strict_dialect() {
        assert_eq!(DUPLICATE_GLOBAL_BINDING_ERROR_CODE, fails("a = 1\na = 2\n"));
        do_resolve("a = 1\na = 2\n", &Dialect::EXTENDED).unwrap();
    }

    #[test]
    fn load_and_global_are_disjoint() {
        assert_eq!(
            GLOBAL_FILE_CLASH_ERROR_CODE,
            fails("x = 1\nload('m.sky', 'x')\n")
        );
        assert_eq!(
            DUPLICATE_LOAD_SYMBOL_ERROR_CODE,
            fails("load('m.sky', 'x')\nload('n.sky', 'x')\n")
        );
    }

    #[test]
    fn static_placement_rules() {
        assert_eq!(RETURN_OUTSIDE_FUNCTION_ERROR_CODE, fails("return 1\n"));
        assert_eq!(
            BREAK_CONTINUE_OUTSIDE_LOOP_ERROR_CODE,
            fails("def f():\n  break\n")
        );
        assert_eq!(
            LOAD_NOT_TOP_LEVEL_ERROR_CODE,
            fails("def f():\n  load('m.sky', 'x')\n")
        );
        assert_eq!(TOP_LEVEL_CONTROL_ERROR_CODE, fails("if 1:\n  a = 1\n"));
        assert_eq!(
            WHILE_NOT_ALLOWED_ERROR_CODE,
            fails("def f():\n  while 1:\n    pass\n")
        );
    }

    #[test]
    fn reserved_words_are_rejected_but_assert_is_usable() {
        assert_eq!(RESERVED_WORD_ERROR_CODE, fails("class = 1\n"));
        assert_eq!(RESERVED_WORD_ERROR_CODE, fails("a = yield\n"));
        ok("assert = 1\n");
    }

    #[test]
    fn locals_are_slotted() {
        let p = ok("def f(a, b):\n  c = a\n  return c\n");
        // The function's scope is attached to the def node, not the module.
        assert_eq!(0, p.scope.local_count);
        assert_eq!(0, p.scope.cell_count);
    }

    #[test]
    fn captured_locals_become_cells() {
        ok("def outer():\n  x = 1\n  def inner():\n    return x\n  return inner\n");
    }

    #[test]
    fn use_before_binding_in_function_is_local() {
        // `x` is a local of f even though the use precedes the binding.
        ok("def f():\n  def g():\n    pass\n  x = 1\n  return x\n");
    }

    #[test]
    fn comprehension_variables_do_not_leak() {
        assert_eq!(
            UNDEFINED_NAME_ERROR_CODE,
            fails("a = [x for x in [1]]\nb = x\n")
        );
    }

    #[test]
    fn module_comprehensions_use_module_frame_slots() {
        let p = ok("a = [x for x in [1, 2]]\n");
        assert_eq!(1, p.scope.local_count);
    }
}
