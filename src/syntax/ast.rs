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

//! The syntax tree produced by the parser and annotated by the resolver.
//!
//! Expression and statement nodes are reference counted so that function
//! values can share their body with the tree they were compiled from; the
//! shared body pointer doubles as the function identity used for recursion
//! detection.

use crate::resolve::{ScopeInfo, Slot};
use crate::syntax::fmt::{comma_separated_fmt, fmt_float_literal, fmt_string_literal, indent};
use codemap::{Span, Spanned};
use num_bigint::BigInt;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[doc(hidden)]
pub type AstExpr = Rc<Spanned<Expr>>;
#[doc(hidden)]
pub type AstAssignTargetExpr = Spanned<AssignTargetExpr>;
#[doc(hidden)]
pub type AstAugmentedAssignTargetExpr = Spanned<AugmentedAssignTargetExpr>;
#[doc(hidden)]
pub type AstArgument = Spanned<Argument>;
#[doc(hidden)]
pub type AstString = Spanned<String>;
#[doc(hidden)]
pub type AstParameter = Spanned<Parameter>;
#[doc(hidden)]
pub type AstClause = Spanned<Clause>;
#[doc(hidden)]
pub type AstInt = Spanned<BigInt>;
#[doc(hidden)]
pub type AstFloat = Spanned<f64>;
#[doc(hidden)]
pub type AstStatement = Rc<Spanned<Statement>>;

#[doc(hidden)]
pub trait ToAst<T> {
    fn to_ast(self, span: Span) -> T;
}

macro_rules! to_ast_trait {
    ($t1:ty, $t2:ty, $t3:ident) => {
        impl ToAst<$t2> for $t1 {
            fn to_ast(self, span: Span) -> $t2 {
                $t3::new(Spanned { span, node: self })
            }
        }
    };
    ($t1:ty, $t2:ty) => {
        impl ToAst<$t2> for $t1 {
            fn to_ast(self, span: Span) -> $t2 {
                Spanned { span, node: self }
            }
        }
    };
}

to_ast_trait!(Expr, AstExpr, Rc);
to_ast_trait!(Statement, AstStatement, Rc);
to_ast_trait!(String, AstString);
to_ast_trait!(BigInt, AstInt);
to_ast_trait!(f64, AstFloat);
to_ast_trait!(Argument, AstArgument);
to_ast_trait!(Parameter, AstParameter);
to_ast_trait!(Clause, AstClause);
to_ast_trait!(AssignTargetExpr, AstAssignTargetExpr);
to_ast_trait!(AugmentedAssignTargetExpr, AstAugmentedAssignTargetExpr);

/// The binding annotation the resolver attaches to every identifier use.
///
/// The annotation is shared (`Rc`) with the binding it refers to: if the
/// resolver later promotes a local binding to a cell, already-annotated uses
/// observe the promotion.
#[derive(Debug, Clone, Default)]
pub struct SlotCell(RefCell<Option<Rc<Cell<Slot>>>>);

impl SlotCell {
    pub fn new() -> SlotCell {
        Default::default()
    }

    pub(crate) fn bind(&self, binding: Rc<Cell<Slot>>) {
        *self.0.borrow_mut() = Some(binding);
    }

    /// The resolved slot, or `None` for an unresolved tree.
    pub fn get(&self) -> Option<Slot> {
        self.0.borrow().as_ref().map(|b| b.get())
    }
}

/// Per-block resolver output attached to `def`, `lambda` and module nodes.
#[derive(Debug, Clone, Default)]
pub struct ScopeCell(Rc<RefCell<ScopeInfo>>);

impl ScopeCell {
    pub fn new() -> ScopeCell {
        Default::default()
    }

    pub(crate) fn set(&self, info: ScopeInfo) {
        *self.0.borrow_mut() = info;
    }

    pub(crate) fn info(&self) -> Ref<'_, ScopeInfo> {
        self.0.borrow()
    }
}

/// An argument at a call site.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum Argument {
    Positional(AstExpr),
    Named(AstString, AstExpr),
    ArgsArray(AstExpr),
    KWArgsDict(AstExpr),
}

/// A declared parameter of a `def` or `lambda`. A bare `*` separator is
/// represented as `Args` with an empty name.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum Parameter {
    Normal(AstString),
    WithDefaultValue(AstString, AstExpr),
    Args(AstString),
    KWArgs(AstString),
}

impl Parameter {
    pub(crate) fn name(&self) -> &str {
        match self {
            Parameter::Normal(n) => &n.node,
            Parameter::WithDefaultValue(n, ..) => &n.node,
            Parameter::Args(n) => &n.node,
            Parameter::KWArgs(n) => &n.node,
        }
    }

    /// A bare `*` marks the start of keyword-only parameters but binds
    /// nothing itself.
    pub(crate) fn is_star_marker(&self) -> bool {
        match self {
            Parameter::Args(n) => n.node.is_empty(),
            _ => false,
        }
    }
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum Expr {
    Tuple(Vec<AstExpr>),
    Dot(AstExpr, AstString),
    Call(
        AstExpr,
        Vec<AstExpr>,
        Vec<(AstString, AstExpr)>,
        Option<AstExpr>,
        Option<AstExpr>,
    ),
    ArrayIndirection(AstExpr, AstExpr),
    Slice(AstExpr, Option<AstExpr>, Option<AstExpr>, Option<AstExpr>),
    Identifier(AstString, SlotCell),
    IntLiteral(AstInt),
    FloatLiteral(AstFloat),
    StringLiteral(AstString),
    Not(AstExpr),
    And(AstExpr, AstExpr),
    Or(AstExpr, AstExpr),
    BinOp(BinOp, AstExpr, AstExpr),
    UnOp(UnOp, AstExpr),
    /// Order: condition, v1, v2 <=> v1 if condition else v2
    If(AstExpr, AstExpr, AstExpr),
    Lambda(Vec<AstParameter>, AstExpr, ScopeCell),
    List(Vec<AstExpr>),
    Set(Vec<AstExpr>),
    Dict(Vec<(AstExpr, AstExpr)>),
    ListComprehension(AstExpr, Vec<AstClause>),
    SetComprehension(AstExpr, Vec<AstClause>),
    DictComprehension((AstExpr, AstExpr), Vec<AstClause>),
}

/// `x` in `x = a`
#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum AssignTargetExpr {
    Identifier(AstString, SlotCell),
    Dot(AstExpr, AstString),
    ArrayIndirection(AstExpr, AstExpr),
    Subtargets(Vec<AstAssignTargetExpr>),
}

/// `x` in `x += a`
#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum AugmentedAssignTargetExpr {
    Identifier(AstString, SlotCell),
    Dot(AstExpr, AstString),
    ArrayIndirection(AstExpr, AstExpr),
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum Clause {
    For(AstAssignTargetExpr, AstExpr),
    If(AstExpr),
}

#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    EqualsTo,
    Different,
    LowerThan,
    GreaterThan,
    LowerOrEqual,
    GreaterOrEqual,
    In,
    NotIn,
    Subtraction,
    Addition,
    Multiplication,
    Percent,
    Division,
    FloorDivision,
    Pipe,
    Caret,
    Ampersand,
    LeftShift,
    RightShift,
}

#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
}

#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentedAssignOp {
    Increment,
    Decrement,
    Multiplier,
    Divider,
    FloorDivider,
    Percent,
    BitOr,
    BitAnd,
    BitXor,
    LeftShift,
    RightShift,
}

/// One imported symbol of a `load` statement: `local = "original"`.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct LoadSymbol {
    pub local: AstString,
    pub original: AstString,
    pub slot: SlotCell,
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum Statement {
    Break,
    Continue,
    Pass,
    Return(Option<AstExpr>),
    Expression(AstExpr),
    Assign(AstAssignTargetExpr, AstExpr),
    AugmentedAssign(AstAugmentedAssignTargetExpr, AugmentedAssignOp, AstExpr),
    Statements(Vec<AstStatement>),
    If(AstExpr, AstStatement),
    IfElse(AstExpr, AstStatement, AstStatement),
    For(AstAssignTargetExpr, AstExpr, AstStatement),
    While(AstExpr, AstStatement),
    /// The `SlotCell` is the binding of the function's name; the
    /// `ScopeCell` is the resolver output for its body.
    Def(AstString, Vec<AstParameter>, AstStatement, SlotCell, ScopeCell),
    Load(AstString, Vec<LoadSymbol>),
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            BinOp::EqualsTo => f.write_str("=="),
            BinOp::Different => f.write_str("!="),
            BinOp::LowerThan => f.write_str("<"),
            BinOp::GreaterThan => f.write_str(">"),
            BinOp::LowerOrEqual => f.write_str("<="),
            BinOp::GreaterOrEqual => f.write_str(">="),
            BinOp::In => f.write_str("in"),
            BinOp::NotIn => f.write_str("not in"),
            BinOp::Subtraction => f.write_str("-"),
            BinOp::Addition => f.write_str("+"),
            BinOp::Multiplication => f.write_str("*"),
            BinOp::Percent => f.write_str("%"),
            BinOp::Division => f.write_str("/"),
            BinOp::FloorDivision => f.write_str("//"),
            BinOp::Pipe => f.write_str("|"),
            BinOp::Caret => f.write_str("^"),
            BinOp::Ampersand => f.write_str("&"),
            BinOp::LeftShift => f.write_str("<<"),
            BinOp::RightShift => f.write_str(">>"),
        }
    }
}

impl Display for UnOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Plus => f.write_str("+"),
            UnOp::Minus => f.write_str("-"),
        }
    }
}

impl Display for AugmentedAssignOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            AugmentedAssignOp::Increment => f.write_str(" += "),
            AugmentedAssignOp::Decrement => f.write_str(" -= "),
            AugmentedAssignOp::Multiplier => f.write_str(" *= "),
            AugmentedAssignOp::Divider => f.write_str(" /= "),
            AugmentedAssignOp::FloorDivider => f.write_str(" //= "),
            AugmentedAssignOp::Percent => f.write_str(" %= "),
            AugmentedAssignOp::BitOr => f.write_str(" |= "),
            AugmentedAssignOp::BitAnd => f.write_str(" &= "),
            AugmentedAssignOp::BitXor => f.write_str(" ^= "),
            AugmentedAssignOp::LeftShift => f.write_str(" <<= "),
            AugmentedAssignOp::RightShift => f.write_str(" >>= "),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Tuple(e) => {
                f.write_str("(")?;
                comma_separated_fmt(f, e, |x, f| write!(f, "{}", x.node), true)?;
                f.write_str(")")
            }
            Expr::Dot(e, s) => write!(f, "{}.{}", e.node, s.node),
            Expr::Call(e, pos, named, args, kwargs) => {
                write!(f, "{}(", e.node)?;
                let mut first = true;
                for a in pos {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}", a.node)?;
                }
                for (k, v) in named {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{} = {}", k.node, v.node)?;
                }
                if let Some(x) = args {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "*{}", x.node)?;
                }
                if let Some(x) = kwargs {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "**{}", x.node)?;
                }
                f.write_str(")")
            }
            Expr::ArrayIndirection(e, i) => write!(f, "{}[{}]", e.node, i.node),
            Expr::Slice(e, start, stop, stride) => {
                write!(f, "{}[", e.node)?;
                if let Some(x) = start {
                    write!(f, "{}", x.node)?;
                }
                f.write_str(":")?;
                if let Some(x) = stop {
                    write!(f, "{}", x.node)?;
                }
                f.write_str(":")?;
                if let Some(x) = stride {
                    write!(f, "{}", x.node)?;
                }
                f.write_str("]")
            }
            Expr::Identifier(s, ..) => f.write_str(&s.node),
            Expr::IntLiteral(i) => write!(f, "{}", i.node),
            Expr::FloatLiteral(v) => fmt_float_literal(f, v.node),
            Expr::StringLiteral(s) => fmt_string_literal(f, &s.node),
            Expr::Not(e) => write!(f, "(not {})", e.node),
            Expr::And(l, r) => write!(f, "({} and {})", l.node, r.node),
            Expr::Or(l, r) => write!(f, "({} or {})", l.node, r.node),
            Expr::BinOp(op, l, r) => write!(f, "({} {} {})", l.node, op, r.node),
            Expr::UnOp(op, e) => write!(f, "{}{}", op, e.node),
            Expr::If(cond, v1, v2) => write!(f, "({} if {} else {})", v1.node, cond.node, v2.node),
            Expr::Lambda(params, body, ..) => {
                f.write_str("(lambda")?;
                if !params.is_empty() {
                    f.write_str(" ")?;
                }
                comma_separated_fmt(f, params, |x, f| write!(f, "{}", x.node), false)?;
                write!(f, ": {})", body.node)
            }
            Expr::List(v) => {
                f.write_str("[")?;
                comma_separated_fmt(f, v, |x, f| write!(f, "{}", x.node), false)?;
                f.write_str("]")
            }
            Expr::Set(v) => {
                f.write_str("{")?;
                comma_separated_fmt(f, v, |x, f| write!(f, "{}", x.node), false)?;
                f.write_str("}")
            }
            Expr::Dict(v) => {
                f.write_str("{")?;
                comma_separated_fmt(f, v, |x, f| write!(f, "{}: {}", x.0.node, x.1.node), false)?;
                f.write_str("}")
            }
            Expr::ListComprehension(e, c) => {
                write!(f, "[{}", e.node)?;
                for x in c {
                    write!(f, "{}", x.node)?;
                }
                f.write_str("]")
            }
            Expr::SetComprehension(e, c) => {
                write!(f, "{{{}", e.node)?;
                for x in c {
                    write!(f, "{}", x.node)?;
                }
                f.write_str("}")
            }
            Expr::DictComprehension((k, v), c) => {
                write!(f, "{{{}: {}", k.node, v.node)?;
                for x in c {
                    write!(f, "{}", x.node)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Display for AssignTargetExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssignTargetExpr::Identifier(s, ..) => f.write_str(&s.node),
            AssignTargetExpr::Dot(e, s) => write!(f, "{}.{}", e.node, s.node),
            AssignTargetExpr::ArrayIndirection(e, i) => write!(f, "{}[{}]", e.node, i.node),
            AssignTargetExpr::Subtargets(v) => {
                f.write_str("(")?;
                comma_separated_fmt(f, v, |x, f| write!(f, "{}", x.node), true)?;
                f.write_str(")")
            }
        }
    }
}

impl Display for AugmentedAssignTargetExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AugmentedAssignTargetExpr::Identifier(s, ..) => f.write_str(&s.node),
            AugmentedAssignTargetExpr::Dot(e, s) => write!(f, "{}.{}", e.node, s.node),
            AugmentedAssignTargetExpr::ArrayIndirection(e, i) => {
                write!(f, "{}[{}]", e.node, i.node)
            }
        }
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Positional(e) => write!(f, "{}", e.node),
            Argument::Named(n, e) => write!(f, "{} = {}", n.node, e.node),
            Argument::ArgsArray(e) => write!(f, "*{}", e.node),
            Argument::KWArgsDict(e) => write!(f, "**{}", e.node),
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Normal(s) => f.write_str(&s.node),
            Parameter::WithDefaultValue(s, e) => write!(f, "{} = {}", s.node, e.node),
            Parameter::Args(s) => write!(f, "*{}", s.node),
            Parameter::KWArgs(s) => write!(f, "**{}", s.node),
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Clause::For(t, e) => write!(f, " for {} in {}", t.node, e.node),
            Clause::If(e) => write!(f, " if {}", e.node),
        }
    }
}

impl Statement {
    fn fmt_with_tab(&self, f: &mut dyn fmt::Write, tab: &str) -> fmt::Result {
        match self {
            Statement::Break => writeln!(f, "{}break", tab),
            Statement::Continue => writeln!(f, "{}continue", tab),
            Statement::Pass => writeln!(f, "{}pass", tab),
            Statement::Return(Some(e)) => writeln!(f, "{}return {}", tab, e.node),
            Statement::Return(None) => writeln!(f, "{}return", tab),
            Statement::Expression(e) => writeln!(f, "{}{}", tab, e.node),
            Statement::Assign(l, r) => writeln!(f, "{}{} = {}", tab, l.node, r.node),
            Statement::AugmentedAssign(l, op, r) => {
                writeln!(f, "{}{}{}{}", tab, l.node, op, r.node)
            }
            Statement::Statements(v) => {
                for s in v {
                    s.node.fmt_with_tab(f, tab)?;
                }
                Ok(())
            }
            Statement::If(cond, suite) => {
                writeln!(f, "{}if {}:", tab, cond.node)?;
                suite.node.fmt_with_tab(f, &indent(tab))
            }
            Statement::IfElse(cond, suite1, suite2) => {
                writeln!(f, "{}if {}:", tab, cond.node)?;
                suite1.node.fmt_with_tab(f, &indent(tab))?;
                writeln!(f, "{}else:", tab)?;
                suite2.node.fmt_with_tab(f, &indent(tab))
            }
            Statement::For(bind, coll, suite) => {
                writeln!(f, "{}for {} in {}:", tab, bind.node, coll.node)?;
                suite.node.fmt_with_tab(f, &indent(tab))
            }
            Statement::While(cond, suite) => {
                writeln!(f, "{}while {}:", tab, cond.node)?;
                suite.node.fmt_with_tab(f, &indent(tab))
            }
            Statement::Def(name, params, suite, ..) => {
                write!(f, "{}def {}(", tab, name.node)?;
                comma_separated_fmt(f, params, |x, f| write!(f, "{}", x.node), false)?;
                f.write_str("):\n")?;
                suite.node.fmt_with_tab(f, &indent(tab))
            }
            Statement::Load(filename, symbols) => {
                write!(f, "{}load(", tab)?;
                fmt_string_literal(f, &filename.node)?;
                for s in symbols {
                    f.write_str(", ")?;
                    write!(f, "{} = ", s.local.node)?;
                    fmt_string_literal(f, &s.original.node)?;
                }
                f.write_str(")\n")
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        self.fmt_with_tab(&mut buf, "")?;
        f.write_str(&buf)
    }
}
