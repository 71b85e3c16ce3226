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

//! A recursive descent parser over the token stream, following the
//! documented grammar of the language.

use crate::syntax::ast::*;
use crate::syntax::errors::SyntaxError;
use crate::syntax::lexer::{Lexer, LexerItem, Token};
use codemap::{CodeMap, Span, Spanned};
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// Error codes -- CP = Critical Parsing
pub const UNEXPECTED_TOKEN_ERROR_CODE: &str = "CP00";
pub const CHAINED_COMPARISON_ERROR_CODE: &str = "CP01";
pub const INCORRECT_ASSIGNMENT_TARGET_ERROR_CODE: &str = "CP02";
pub const INCORRECT_AUGMENTED_ASSIGNMENT_TARGET_ERROR_CODE: &str = "CP03";
pub const POSITIONAL_ARGUMENT_AFTER_NON_POSITIONAL_ERROR_CODE: &str = "CP04";
pub const NAMED_ARGUMENT_AFTER_KWARGS_DICT_ERROR_CODE: &str = "CP05";
pub const ARGS_ARRAY_AFTER_ANOTHER_ARGS_OR_KWARGS_ERROR_CODE: &str = "CP06";
pub const MULTIPLE_KWARGS_DICT_IN_ARGS_ERROR_CODE: &str = "CP07";
pub const DUPLICATE_NAMED_ARGUMENT_ERROR_CODE: &str = "CP08";
pub const POSITIONAL_PARAMETER_AFTER_DEFAULT_ERROR_CODE: &str = "CP09";
pub const ARGS_PARAMETER_AFTER_ANOTHER_ERROR_CODE: &str = "CP10";
pub const PARAMETER_AFTER_KWARGS_ERROR_CODE: &str = "CP11";
pub const DUPLICATE_PARAMETER_NAME_ERROR_CODE: &str = "CP12";
pub const BARE_STAR_WITHOUT_NAMED_PARAMETER_ERROR_CODE: &str = "CP13";
pub const LOAD_ARGUMENT_NOT_A_STRING_ERROR_CODE: &str = "CP14";

/// A parse failure, convertible to a diagnostic once the file span is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub code: &'static str,
    pub message: String,
    pub label: String,
    pub lo: u64,
    pub hi: u64,
}

impl SyntaxError for ParseError {
    fn to_diagnostic(self, file_span: Span) -> Diagnostic {
        Diagnostic {
            level: Level::Error,
            message: self.message,
            code: Some(self.code.to_owned()),
            spans: vec![SpanLabel {
                span: file_span.subspan(self.lo, self.hi),
                style: SpanStyle::Primary,
                label: Some(self.label),
            }],
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parse a module. The file is registered in `map` so that diagnostics can
/// be rendered against it; the result is the module's statement list.
pub fn parse(
    map: &Arc<Mutex<CodeMap>>,
    filename: &str,
    content: &str,
) -> Result<AstStatement, Diagnostic> {
    let file = map
        .lock()
        .unwrap()
        .add_file(filename.to_owned(), content.to_owned());
    let file_span = file.span;
    let mut tokens = Vec::new();
    for item in Lexer::new(content) {
        match item {
            Ok(t) => tokens.push(t),
            Err(e) => return Err(e.to_diagnostic(file_span)),
        }
    }
    Parser::new(tokens, file_span)
        .parse_module()
        .map_err(|e| e.to_diagnostic(file_span))
}

struct Parser {
    tokens: Vec<LexerItem>,
    pos: usize,
    file_span: Span,
}

impl Parser {
    fn new(tokens: Vec<LexerItem>, file_span: Span) -> Parser {
        Parser {
            tokens,
            pos: 0,
            file_span,
        }
    }

    fn item(&self) -> &LexerItem {
        // The token stream always ends with Eof, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.item().1
    }

    fn peek_at(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].1
    }

    fn lo(&self) -> u64 {
        self.item().0
    }

    fn hi(&self) -> u64 {
        self.item().2
    }

    fn bump(&mut self) -> LexerItem {
        let item = self.item().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.peek() == t {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, t: &Token) -> ParseResult<(u64, u64)> {
        if self.peek() == t {
            let (lo, _, hi) = self.bump();
            Ok((lo, hi))
        } else {
            Err(self.unexpected(&format!("{}", t)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError {
            code: UNEXPECTED_TOKEN_ERROR_CODE,
            message: format!("Unexpected {}, expected {}", self.peek(), expected),
            label: format!("expected {}", expected),
            lo: self.lo(),
            hi: self.hi(),
        }
    }

    fn error(&self, code: &'static str, message: String, lo: u64, hi: u64) -> ParseError {
        ParseError {
            code,
            label: message.clone(),
            message,
            lo,
            hi,
        }
    }

    fn span(&self, lo: u64, hi: u64) -> Span {
        self.file_span.subspan(lo, hi)
    }

    // === Module and statements ===

    fn parse_module(mut self) -> ParseResult<AstStatement> {
        let lo = self.lo();
        let mut stmts = Vec::new();
        loop {
            if self.eat(&Token::Newline) {
                continue;
            }
            if *self.peek() == Token::Eof {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        let hi = self.hi();
        Ok(Statement::Statements(stmts).to_ast(self.span(lo, hi)))
    }

    fn parse_stmt(&mut self) -> ParseResult<AstStatement> {
        match self.peek() {
            Token::If => self.parse_if_stmt(),
            Token::For => self.parse_for_stmt(),
            Token::While => self.parse_while_stmt(),
            Token::Def => self.parse_def_stmt(),
            _ => self.parse_simple_stmt_line(),
        }
    }

    /// One or more small statements separated by `;`, ended by a newline.
    fn parse_simple_stmt_line(&mut self) -> ParseResult<AstStatement> {
        let lo = self.lo();
        let mut stmts = vec![self.parse_small_stmt()?];
        while self.eat(&Token::Semicolon) {
            if *self.peek() == Token::Newline || *self.peek() == Token::Eof {
                break;
            }
            stmts.push(self.parse_small_stmt()?);
        }
        let hi = self.hi();
        self.expect(&Token::Newline)?;
        if stmts.len() == 1 {
            Ok(stmts.pop().unwrap())
        } else {
            Ok(Statement::Statements(stmts).to_ast(self.span(lo, hi)))
        }
    }

    fn parse_small_stmt(&mut self) -> ParseResult<AstStatement> {
        let lo = self.lo();
        match self.peek() {
            Token::Break => {
                let (lo, _, hi) = self.bump();
                Ok(Statement::Break.to_ast(self.span(lo, hi)))
            }
            Token::Continue => {
                let (lo, _, hi) = self.bump();
                Ok(Statement::Continue.to_ast(self.span(lo, hi)))
            }
            Token::Pass => {
                let (lo, _, hi) = self.bump();
                Ok(Statement::Pass.to_ast(self.span(lo, hi)))
            }
            Token::Return => {
                let (lo, _, mut hi) = self.bump();
                let e = match self.peek() {
                    Token::Newline | Token::Semicolon | Token::Eof => None,
                    _ => {
                        let e = self.parse_expression()?;
                        hi = e.span.high() - self.file_span.low();
                        Some(e)
                    }
                };
                Ok(Statement::Return(e).to_ast(self.span(lo, hi)))
            }
            Token::Load => self.parse_load_stmt(),
            _ => {
                let expr = self.parse_expression()?;
                match self.peek() {
                    Token::Equal => {
                        self.bump();
                        let target = self.to_assign_target(&expr)?;
                        let rhs = self.parse_expression()?;
                        let hi = rhs.span.high() - self.file_span.low();
                        Ok(Statement::Assign(target, rhs).to_ast(self.span(lo, hi)))
                    }
                    t => {
                        let op = match t {
                            Token::PlusEqual => Some(AugmentedAssignOp::Increment),
                            Token::MinusEqual => Some(AugmentedAssignOp::Decrement),
                            Token::StarEqual => Some(AugmentedAssignOp::Multiplier),
                            Token::SlashEqual => Some(AugmentedAssignOp::Divider),
                            Token::SlashSlashEqual => Some(AugmentedAssignOp::FloorDivider),
                            Token::PercentEqual => Some(AugmentedAssignOp::Percent),
                            Token::PipeEqual => Some(AugmentedAssignOp::BitOr),
                            Token::AmpersandEqual => Some(AugmentedAssignOp::BitAnd),
                            Token::CaretEqual => Some(AugmentedAssignOp::BitXor),
                            Token::LessLessEqual => Some(AugmentedAssignOp::LeftShift),
                            Token::GreaterGreaterEqual => Some(AugmentedAssignOp::RightShift),
                            _ => None,
                        };
                        match op {
                            Some(op) => {
                                self.bump();
                                let target = self.to_augmented_assign_target(&expr)?;
                                let rhs = self.parse_expression()?;
                                let hi = rhs.span.high() - self.file_span.low();
                                Ok(Statement::AugmentedAssign(target, op, rhs)
                                    .to_ast(self.span(lo, hi)))
                            }
                            None => {
                                let hi = expr.span.high() - self.file_span.low();
                                Ok(Statement::Expression(expr).to_ast(self.span(lo, hi)))
                            }
                        }
                    }
                }
            }
        }
    }

    fn parse_load_stmt(&mut self) -> ParseResult<AstStatement> {
        let (lo, ..) = self.bump(); // load
        self.expect(&Token::OpeningParen)?;
        let path = self.parse_string_literal()?;
        let mut symbols = Vec::new();
        while self.eat(&Token::Comma) {
            if *self.peek() == Token::ClosingParen {
                break;
            }
            match self.peek().clone() {
                Token::StringLiteral(..) => {
                    let s = self.parse_string_literal()?;
                    symbols.push(LoadSymbol {
                        local: s.clone(),
                        original: s,
                        slot: SlotCell::new(),
                    });
                }
                Token::Identifier(..) => {
                    let local = self.parse_identifier()?;
                    self.expect(&Token::Equal)?;
                    let original = self.parse_string_literal()?;
                    symbols.push(LoadSymbol {
                        local,
                        original,
                        slot: SlotCell::new(),
                    });
                }
                _ => {
                    return Err(self.error(
                        LOAD_ARGUMENT_NOT_A_STRING_ERROR_CODE,
                        "load() arguments must be string literals or name = \"string\" pairs"
                            .to_owned(),
                        self.lo(),
                        self.hi(),
                    ));
                }
            }
        }
        let (_, hi) = self.expect(&Token::ClosingParen)?;
        Ok(Statement::Load(path, symbols).to_ast(self.span(lo, hi)))
    }

    fn parse_if_stmt(&mut self) -> ParseResult<AstStatement> {
        let (lo, ..) = self.bump(); // if
        let cond = self.parse_test()?;
        let then_suite = self.parse_suite()?;
        let node = self.parse_elif_else(lo, cond, then_suite)?;
        Ok(node)
    }

    fn parse_elif_else(
        &mut self,
        lo: u64,
        cond: AstExpr,
        then_suite: AstStatement,
    ) -> ParseResult<AstStatement> {
        match self.peek() {
            Token::Elif => {
                let (elif_lo, ..) = self.bump();
                let elif_cond = self.parse_test()?;
                let elif_suite = self.parse_suite()?;
                let else_branch = self.parse_elif_else(elif_lo, elif_cond, elif_suite)?;
                let hi = else_branch.span.high() - self.file_span.low();
                Ok(Statement::IfElse(cond, then_suite, else_branch).to_ast(self.span(lo, hi)))
            }
            Token::Else => {
                self.bump();
                let else_suite = self.parse_suite()?;
                let hi = else_suite.span.high() - self.file_span.low();
                Ok(Statement::IfElse(cond, then_suite, else_suite).to_ast(self.span(lo, hi)))
            }
            _ => {
                let hi = then_suite.span.high() - self.file_span.low();
                Ok(Statement::If(cond, then_suite).to_ast(self.span(lo, hi)))
            }
        }
    }

    fn parse_for_stmt(&mut self) -> ParseResult<AstStatement> {
        let (lo, ..) = self.bump(); // for
        let target = self.parse_target_list()?;
        self.expect(&Token::In)?;
        let iterable = self.parse_test()?;
        let suite = self.parse_suite()?;
        let hi = suite.span.high() - self.file_span.low();
        Ok(Statement::For(target, iterable, suite).to_ast(self.span(lo, hi)))
    }

    fn parse_while_stmt(&mut self) -> ParseResult<AstStatement> {
        let (lo, ..) = self.bump(); // while
        let cond = self.parse_test()?;
        let suite = self.parse_suite()?;
        let hi = suite.span.high() - self.file_span.low();
        Ok(Statement::While(cond, suite).to_ast(self.span(lo, hi)))
    }

    fn parse_def_stmt(&mut self) -> ParseResult<AstStatement> {
        let (lo, ..) = self.bump(); // def
        let name = self.parse_identifier()?;
        self.expect(&Token::OpeningParen)?;
        let params = self.parse_parameter_list(&Token::ClosingParen)?;
        self.expect(&Token::ClosingParen)?;
        let suite = self.parse_suite()?;
        let hi = suite.span.high() - self.file_span.low();
        Ok(
            Statement::Def(name, params, suite, SlotCell::new(), ScopeCell::new())
                .to_ast(self.span(lo, hi)),
        )
    }

    fn parse_suite(&mut self) -> ParseResult<AstStatement> {
        self.expect(&Token::Colon)?;
        if self.eat(&Token::Newline) {
            let (lo, _) = self.expect(&Token::Indent)?;
            let mut stmts = Vec::new();
            loop {
                if self.eat(&Token::Newline) {
                    continue;
                }
                if *self.peek() == Token::Dedent {
                    break;
                }
                stmts.push(self.parse_stmt()?);
            }
            let (_, hi) = self.expect(&Token::Dedent)?;
            Ok(Statement::Statements(stmts).to_ast(self.span(lo, hi)))
        } else {
            self.parse_simple_stmt_line()
        }
    }

    // === Targets ===

    fn to_assign_target(&self, expr: &AstExpr) -> ParseResult<AstAssignTargetExpr> {
        let node = match &expr.node {
            Expr::Identifier(s, ..) => AssignTargetExpr::Identifier(s.clone(), SlotCell::new()),
            Expr::Dot(object, field) => AssignTargetExpr::Dot(object.clone(), field.clone()),
            Expr::ArrayIndirection(array, index) => {
                AssignTargetExpr::ArrayIndirection(array.clone(), index.clone())
            }
            Expr::List(subexprs) | Expr::Tuple(subexprs) => AssignTargetExpr::Subtargets(
                subexprs
                    .iter()
                    .map(|e| self.to_assign_target(e))
                    .collect::<ParseResult<Vec<_>>>()?,
            ),
            _ => {
                let lo = expr.span.low() - self.file_span.low();
                let hi = expr.span.high() - self.file_span.low();
                return Err(self.error(
                    INCORRECT_ASSIGNMENT_TARGET_ERROR_CODE,
                    "Incorrect expression as assignment target".to_owned(),
                    lo,
                    hi,
                ));
            }
        };
        Ok(Spanned {
            span: expr.span,
            node,
        })
    }

    fn to_augmented_assign_target(
        &self,
        expr: &AstExpr,
    ) -> ParseResult<AstAugmentedAssignTargetExpr> {
        let node = match &expr.node {
            Expr::Identifier(s, ..) => {
                AugmentedAssignTargetExpr::Identifier(s.clone(), SlotCell::new())
            }
            Expr::Dot(object, field) => {
                AugmentedAssignTargetExpr::Dot(object.clone(), field.clone())
            }
            Expr::ArrayIndirection(array, index) => {
                AugmentedAssignTargetExpr::ArrayIndirection(array.clone(), index.clone())
            }
            _ => {
                let lo = expr.span.low() - self.file_span.low();
                let hi = expr.span.high() - self.file_span.low();
                return Err(self.error(
                    INCORRECT_AUGMENTED_ASSIGNMENT_TARGET_ERROR_CODE,
                    "Augmented assignment target must be a name, index or attribute".to_owned(),
                    lo,
                    hi,
                ));
            }
        };
        Ok(Spanned {
            span: expr.span,
            node,
        })
    }

    /// A comma separated list of assignment targets, as in `for` headers.
    /// Targets parse at the `|` precedence level so that the `in` keyword is
    /// not taken as a comparison.
    fn parse_target_list(&mut self) -> ParseResult<AstAssignTargetExpr> {
        let lo = self.lo();
        let first = self.parse_bitor()?;
        if *self.peek() != Token::Comma {
            return self.to_assign_target(&first);
        }
        let mut items = vec![first];
        let mut hi = self.hi();
        while self.eat(&Token::Comma) {
            if *self.peek() == Token::In || *self.peek() == Token::Colon {
                break;
            }
            let item = self.parse_bitor()?;
            hi = item.span.high() - self.file_span.low();
            items.push(item);
        }
        let tuple = Expr::Tuple(items).to_ast(self.span(lo, hi));
        self.to_assign_target(&tuple)
    }

    // === Parameters and arguments ===

    fn parse_parameter_list(&mut self, terminator: &Token) -> ParseResult<Vec<AstParameter>> {
        let mut params: Vec<AstParameter> = Vec::new();
        let mut seen = HashSet::new();
        // 0: positional; 1: defaulted; 2: after star; 3: after kwargs
        let mut stage = 0;
        let mut named_after_star = 0usize;
        let mut star_lo = 0;
        let mut star_was_bare = false;
        loop {
            if self.peek() == terminator {
                break;
            }
            let lo = self.lo();
            let param = match self.peek().clone() {
                Token::Star => {
                    self.bump();
                    if stage >= 2 {
                        return Err(self.error(
                            ARGS_PARAMETER_AFTER_ANOTHER_ERROR_CODE,
                            "A function may have at most one *args parameter".to_owned(),
                            lo,
                            self.hi(),
                        ));
                    }
                    stage = 2;
                    star_lo = lo;
                    match self.peek() {
                        Token::Identifier(..) => {
                            let name = self.parse_identifier()?;
                            let hi = name.span.high() - self.file_span.low();
                            star_was_bare = false;
                            Parameter::Args(name).to_ast(self.span(lo, hi))
                        }
                        _ => {
                            star_was_bare = true;
                            let empty = String::new().to_ast(self.span(lo, lo));
                            Parameter::Args(empty).to_ast(self.span(lo, lo))
                        }
                    }
                }
                Token::StarStar => {
                    self.bump();
                    if stage >= 3 {
                        return Err(self.error(
                            MULTIPLE_KWARGS_DICT_IN_ARGS_ERROR_CODE,
                            "A function may have at most one **kwargs parameter".to_owned(),
                            lo,
                            self.hi(),
                        ));
                    }
                    stage = 3;
                    let name = self.parse_identifier()?;
                    let hi = name.span.high() - self.file_span.low();
                    Parameter::KWArgs(name).to_ast(self.span(lo, hi))
                }
                Token::Identifier(..) => {
                    if stage >= 3 {
                        return Err(self.error(
                            PARAMETER_AFTER_KWARGS_ERROR_CODE,
                            "No parameter is allowed after **kwargs".to_owned(),
                            lo,
                            self.hi(),
                        ));
                    }
                    let name = self.parse_identifier()?;
                    if self.eat(&Token::Equal) {
                        let default = self.parse_test()?;
                        let hi = default.span.high() - self.file_span.low();
                        if stage < 2 {
                            stage = 1;
                        } else {
                            named_after_star += 1;
                        }
                        Parameter::WithDefaultValue(name, default).to_ast(self.span(lo, hi))
                    } else {
                        let hi = name.span.high() - self.file_span.low();
                        if stage == 1 {
                            return Err(self.error(
                                POSITIONAL_PARAMETER_AFTER_DEFAULT_ERROR_CODE,
                                "A parameter without a default value may not follow one with a \
                                 default value"
                                    .to_owned(),
                                lo,
                                hi,
                            ));
                        }
                        if stage == 2 {
                            named_after_star += 1;
                        }
                        Parameter::Normal(name).to_ast(self.span(lo, hi))
                    }
                }
                _ => return Err(self.unexpected("a parameter")),
            };
            if !param.node.is_star_marker() {
                let name = param.node.name().to_owned();
                if !seen.insert(name.clone()) {
                    let hi = param.span.high() - self.file_span.low();
                    return Err(self.error(
                        DUPLICATE_PARAMETER_NAME_ERROR_CODE,
                        format!("Duplicated parameter name '{}'", name),
                        lo,
                        hi,
                    ));
                }
            }
            params.push(param);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        if star_was_bare && named_after_star == 0 {
            return Err(self.error(
                BARE_STAR_WITHOUT_NAMED_PARAMETER_ERROR_CODE,
                "A bare * must be followed by at least one named parameter".to_owned(),
                star_lo,
                star_lo + 1,
            ));
        }
        Ok(params)
    }

    /// Parse the arguments of a call, enforcing the staging rules:
    /// positional, then named, then `*args`, then `**kwargs`.
    fn parse_call_arguments(
        &mut self,
    ) -> ParseResult<(
        Vec<AstExpr>,
        Vec<(AstString, AstExpr)>,
        Option<AstExpr>,
        Option<AstExpr>,
    )> {
        let mut pos_args = Vec::new();
        let mut named_args: Vec<(AstString, AstExpr)> = Vec::new();
        let mut args_array = None;
        let mut kwargs_dict = None;
        let mut stage = 0;
        loop {
            if *self.peek() == Token::ClosingParen {
                break;
            }
            let lo = self.lo();
            match self.peek().clone() {
                Token::Star => {
                    self.bump();
                    let e = self.parse_test()?;
                    if stage > 1 {
                        let hi = e.span.high() - self.file_span.low();
                        return Err(self.error(
                            ARGS_ARRAY_AFTER_ANOTHER_ARGS_OR_KWARGS_ERROR_CODE,
                            "*args argument after another *args or **kwargs".to_owned(),
                            lo,
                            hi,
                        ));
                    }
                    stage = 2;
                    args_array = Some(e);
                }
                Token::StarStar => {
                    self.bump();
                    let e = self.parse_test()?;
                    if stage == 3 {
                        let hi = e.span.high() - self.file_span.low();
                        return Err(self.error(
                            MULTIPLE_KWARGS_DICT_IN_ARGS_ERROR_CODE,
                            "Multiple **kwargs dictionaries in arguments".to_owned(),
                            lo,
                            hi,
                        ));
                    }
                    stage = 3;
                    kwargs_dict = Some(e);
                }
                _ => {
                    let e = self.parse_test()?;
                    if *self.peek() == Token::Equal {
                        let name = match &e.node {
                            Expr::Identifier(s, ..) => s.clone(),
                            _ => return Err(self.unexpected("a named argument")),
                        };
                        self.bump();
                        let v = self.parse_test()?;
                        if stage > 2 {
                            let hi = v.span.high() - self.file_span.low();
                            return Err(self.error(
                                NAMED_ARGUMENT_AFTER_KWARGS_DICT_ERROR_CODE,
                                "Named argument after **kwargs dictionary".to_owned(),
                                lo,
                                hi,
                            ));
                        }
                        if named_args.iter().any(|(n, _)| n.node == name.node) {
                            let hi = v.span.high() - self.file_span.low();
                            return Err(self.error(
                                DUPLICATE_NAMED_ARGUMENT_ERROR_CODE,
                                format!("Duplicated named argument '{}'", name.node),
                                lo,
                                hi,
                            ));
                        }
                        if stage == 0 {
                            stage = 1;
                        }
                        named_args.push((name, v));
                    } else {
                        if stage > 0 {
                            let hi = e.span.high() - self.file_span.low();
                            return Err(self.error(
                                POSITIONAL_ARGUMENT_AFTER_NON_POSITIONAL_ERROR_CODE,
                                "Positional argument after non-positional argument".to_owned(),
                                lo,
                                hi,
                            ));
                        }
                        pos_args.push(e);
                    }
                }
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok((pos_args, named_args, args_array, kwargs_dict))
    }

    // === Expressions ===

    fn parse_identifier(&mut self) -> ParseResult<AstString> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                let (lo, _, hi) = self.bump();
                Ok(name.to_ast(self.span(lo, hi)))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn parse_string_literal(&mut self) -> ParseResult<AstString> {
        match self.peek().clone() {
            Token::StringLiteral(s) => {
                let (lo, _, hi) = self.bump();
                Ok(s.to_ast(self.span(lo, hi)))
            }
            _ => Err(self.unexpected("a string literal")),
        }
    }

    /// An expression, possibly an unparenthesized tuple.
    fn parse_expression(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let first = self.parse_test()?;
        if *self.peek() != Token::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        let mut hi = self.hi();
        while self.eat(&Token::Comma) {
            hi = self.hi();
            match self.peek() {
                Token::Newline
                | Token::Semicolon
                | Token::Eof
                | Token::Equal
                | Token::ClosingParen
                | Token::ClosingBracket
                | Token::ClosingBrace
                | Token::Colon => break,
                _ => {
                    let item = self.parse_test()?;
                    hi = item.span.high() - self.file_span.low();
                    items.push(item);
                }
            }
        }
        Ok(Expr::Tuple(items).to_ast(self.span(lo, hi)))
    }

    /// A single expression: ternary conditional, lambda, or anything below.
    fn parse_test(&mut self) -> ParseResult<AstExpr> {
        if *self.peek() == Token::Lambda {
            return self.parse_lambda();
        }
        let lo = self.lo();
        let expr = self.parse_or_test()?;
        if self.eat(&Token::If) {
            let cond = self.parse_or_test()?;
            self.expect(&Token::Else)?;
            let else_val = self.parse_test()?;
            let hi = else_val.span.high() - self.file_span.low();
            Ok(Expr::If(cond, expr, else_val).to_ast(self.span(lo, hi)))
        } else {
            Ok(expr)
        }
    }

    fn parse_lambda(&mut self) -> ParseResult<AstExpr> {
        let (lo, ..) = self.bump(); // lambda
        let params = self.parse_parameter_list(&Token::Colon)?;
        self.expect(&Token::Colon)?;
        let body = self.parse_test()?;
        let hi = body.span.high() - self.file_span.low();
        Ok(Expr::Lambda(params, body, ScopeCell::new()).to_ast(self.span(lo, hi)))
    }

    fn parse_or_test(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_and_test()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and_test()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::Or(left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_and_test(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_not_test()?;
        while self.eat(&Token::And) {
            let right = self.parse_not_test()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::And(left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_not_test(&mut self) -> ParseResult<AstExpr> {
        if *self.peek() == Token::Not {
            let (lo, ..) = self.bump();
            let e = self.parse_not_test()?;
            let hi = e.span.high() - self.file_span.low();
            Ok(Expr::Not(e).to_ast(self.span(lo, hi)))
        } else {
            self.parse_comparison()
        }
    }

    fn comparison_op(&self) -> Option<BinOp> {
        match self.peek() {
            Token::EqualEqual => Some(BinOp::EqualsTo),
            Token::BangEqual => Some(BinOp::Different),
            Token::Less => Some(BinOp::LowerThan),
            Token::Greater => Some(BinOp::GreaterThan),
            Token::LessEqual => Some(BinOp::LowerOrEqual),
            Token::GreaterEqual => Some(BinOp::GreaterOrEqual),
            Token::In => Some(BinOp::In),
            Token::Not if *self.peek_at(1) == Token::In => Some(BinOp::NotIn),
            _ => None,
        }
    }

    /// Comparison operators are non-associative: `a < b < c` is rejected.
    fn parse_comparison(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let left = self.parse_bitor()?;
        let op = match self.comparison_op() {
            Some(op) => op,
            None => return Ok(left),
        };
        if op == BinOp::NotIn {
            self.bump();
        }
        self.bump();
        let right = self.parse_bitor()?;
        let hi = right.span.high() - self.file_span.low();
        if self.comparison_op().is_some() {
            return Err(self.error(
                CHAINED_COMPARISON_ERROR_CODE,
                "Comparison operators are non-associative and cannot be chained".to_owned(),
                self.lo(),
                self.hi(),
            ));
        }
        Ok(Expr::BinOp(op, left, right).to_ast(self.span(lo, hi)))
    }

    fn parse_bitor(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_bitxor()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_bitxor()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::BinOp(BinOp::Pipe, left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_bitand()?;
        while self.eat(&Token::Caret) {
            let right = self.parse_bitand()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::BinOp(BinOp::Caret, left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_shift()?;
        while self.eat(&Token::Ampersand) {
            let right = self.parse_shift()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::BinOp(BinOp::Ampersand, left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_arith()?;
        loop {
            let op = match self.peek() {
                Token::LessLess => BinOp::LeftShift,
                Token::GreaterGreater => BinOp::RightShift,
                _ => break,
            };
            self.bump();
            let right = self.parse_arith()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::BinOp(op, left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_arith(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Addition,
                Token::Minus => BinOp::Subtraction,
                _ => break,
            };
            self.bump();
            let right = self.parse_term()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::BinOp(op, left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Multiplication,
                Token::Slash => BinOp::Division,
                Token::SlashSlash => BinOp::FloorDivision,
                Token::Percent => BinOp::Percent,
                _ => break,
            };
            self.bump();
            let right = self.parse_factor()?;
            let hi = right.span.high() - self.file_span.low();
            left = Expr::BinOp(op, left, right).to_ast(self.span(lo, hi));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> ParseResult<AstExpr> {
        match self.peek() {
            Token::Plus => {
                let (lo, ..) = self.bump();
                let e = self.parse_factor()?;
                let hi = e.span.high() - self.file_span.low();
                Ok(Expr::UnOp(UnOp::Plus, e).to_ast(self.span(lo, hi)))
            }
            Token::Minus => {
                let (lo, ..) = self.bump();
                let e = self.parse_factor()?;
                let hi = e.span.high() - self.file_span.low();
                Ok(Expr::UnOp(UnOp::Minus, e).to_ast(self.span(lo, hi)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<AstExpr> {
        let lo = self.lo();
        let mut e = self.parse_atom()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.bump();
                    let attr = self.parse_identifier()?;
                    let hi = attr.span.high() - self.file_span.low();
                    e = Expr::Dot(e, attr).to_ast(self.span(lo, hi));
                }
                Token::OpeningParen => {
                    self.bump();
                    let (pos, named, args, kwargs) = self.parse_call_arguments()?;
                    let (_, hi) = self.expect(&Token::ClosingParen)?;
                    e = Expr::Call(e, pos, named, args, kwargs).to_ast(self.span(lo, hi));
                }
                Token::OpeningBracket => {
                    self.bump();
                    e = self.parse_subscript(lo, e)?;
                }
                _ => break,
            }
        }
        Ok(e)
    }

    fn parse_subscript(&mut self, lo: u64, object: AstExpr) -> ParseResult<AstExpr> {
        let start = if *self.peek() == Token::Colon {
            None
        } else {
            Some(self.parse_test()?)
        };
        if self.eat(&Token::Colon) {
            let stop = match self.peek() {
                Token::Colon | Token::ClosingBracket => None,
                _ => Some(self.parse_test()?),
            };
            let stride = if self.eat(&Token::Colon) {
                match self.peek() {
                    Token::ClosingBracket => None,
                    _ => Some(self.parse_test()?),
                }
            } else {
                None
            };
            let (_, hi) = self.expect(&Token::ClosingBracket)?;
            Ok(Expr::Slice(object, start, stop, stride).to_ast(self.span(lo, hi)))
        } else {
            let index = match start {
                Some(i) => i,
                None => return Err(self.unexpected("an index expression")),
            };
            let (_, hi) = self.expect(&Token::ClosingBracket)?;
            Ok(Expr::ArrayIndirection(object, index).to_ast(self.span(lo, hi)))
        }
    }

    fn parse_atom(&mut self) -> ParseResult<AstExpr> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                let (lo, _, hi) = self.bump();
                let span = self.span(lo, hi);
                Ok(Expr::Identifier(name.to_ast(span), SlotCell::new()).to_ast(span))
            }
            Token::IntLiteral(i) => {
                let (lo, _, hi) = self.bump();
                let span = self.span(lo, hi);
                Ok(Expr::IntLiteral(i.to_ast(span)).to_ast(span))
            }
            Token::FloatLiteral(v) => {
                let (lo, _, hi) = self.bump();
                let span = self.span(lo, hi);
                Ok(Expr::FloatLiteral(v.to_ast(span)).to_ast(span))
            }
            Token::StringLiteral(s) => {
                let (lo, _, hi) = self.bump();
                let span = self.span(lo, hi);
                Ok(Expr::StringLiteral(s.to_ast(span)).to_ast(span))
            }
            Token::OpeningParen => {
                let (lo, ..) = self.bump();
                if *self.peek() == Token::ClosingParen {
                    let (_, hi) = self.expect(&Token::ClosingParen)?;
                    return Ok(Expr::Tuple(Vec::new()).to_ast(self.span(lo, hi)));
                }
                let inner = self.parse_expression()?;
                self.expect(&Token::ClosingParen)?;
                Ok(inner)
            }
            Token::OpeningBracket => {
                let (lo, ..) = self.bump();
                if *self.peek() == Token::ClosingBracket {
                    let (_, hi) = self.expect(&Token::ClosingBracket)?;
                    return Ok(Expr::List(Vec::new()).to_ast(self.span(lo, hi)));
                }
                let first = self.parse_test()?;
                if *self.peek() == Token::For {
                    let clauses = self.parse_comprehension_clauses()?;
                    let (_, hi) = self.expect(&Token::ClosingBracket)?;
                    return Ok(Expr::ListComprehension(first, clauses).to_ast(self.span(lo, hi)));
                }
                let mut items = vec![first];
                while self.eat(&Token::Comma) {
                    if *self.peek() == Token::ClosingBracket {
                        break;
                    }
                    items.push(self.parse_test()?);
                }
                let (_, hi) = self.expect(&Token::ClosingBracket)?;
                Ok(Expr::List(items).to_ast(self.span(lo, hi)))
            }
            Token::OpeningBrace => {
                let (lo, ..) = self.bump();
                if *self.peek() == Token::ClosingBrace {
                    let (_, hi) = self.expect(&Token::ClosingBrace)?;
                    return Ok(Expr::Dict(Vec::new()).to_ast(self.span(lo, hi)));
                }
                let first = self.parse_test()?;
                if self.eat(&Token::Colon) {
                    // Dictionary literal or comprehension.
                    let first_value = self.parse_test()?;
                    if *self.peek() == Token::For {
                        let clauses = self.parse_comprehension_clauses()?;
                        let (_, hi) = self.expect(&Token::ClosingBrace)?;
                        return Ok(Expr::DictComprehension((first, first_value), clauses)
                            .to_ast(self.span(lo, hi)));
                    }
                    let mut items = vec![(first, first_value)];
                    while self.eat(&Token::Comma) {
                        if *self.peek() == Token::ClosingBrace {
                            break;
                        }
                        let k = self.parse_test()?;
                        self.expect(&Token::Colon)?;
                        let v = self.parse_test()?;
                        items.push((k, v));
                    }
                    let (_, hi) = self.expect(&Token::ClosingBrace)?;
                    Ok(Expr::Dict(items).to_ast(self.span(lo, hi)))
                } else {
                    // Set literal or comprehension.
                    if *self.peek() == Token::For {
                        let clauses = self.parse_comprehension_clauses()?;
                        let (_, hi) = self.expect(&Token::ClosingBrace)?;
                        return Ok(
                            Expr::SetComprehension(first, clauses).to_ast(self.span(lo, hi))
                        );
                    }
                    let mut items = vec![first];
                    while self.eat(&Token::Comma) {
                        if *self.peek() == Token::ClosingBrace {
                            break;
                        }
                        items.push(self.parse_test()?);
                    }
                    let (_, hi) = self.expect(&Token::ClosingBrace)?;
                    Ok(Expr::Set(items).to_ast(self.span(lo, hi)))
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `for target in iterable [if cond]...` clause chains of comprehensions.
    /// The iterable parses at `or` precedence so that a following `if` starts
    /// a filter clause rather than a conditional expression.
    fn parse_comprehension_clauses(&mut self) -> ParseResult<Vec<AstClause>> {
        let mut clauses = Vec::new();
        loop {
            match self.peek() {
                Token::For => {
                    let (lo, ..) = self.bump();
                    let target = self.parse_target_list()?;
                    self.expect(&Token::In)?;
                    let over = self.parse_or_test()?;
                    let hi = over.span.high() - self.file_span.low();
                    clauses.push(Clause::For(target, over).to_ast(self.span(lo, hi)));
                }
                Token::If => {
                    let (lo, ..) = self.bump();
                    let cond = self.parse_or_test()?;
                    let hi = cond.span.high() - self.file_span.low();
                    clauses.push(Clause::If(cond).to_ast(self.span(lo, hi)));
                }
                _ => break,
            }
        }
        Ok(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(content: &str) -> AstStatement {
        let map = Arc::new(Mutex::new(CodeMap::new()));
        parse(&map, "<test>", content).unwrap()
    }

    fn parse_err(content: &str) -> Diagnostic {
        let map = Arc::new(Mutex::new(CodeMap::new()));
        parse(&map, "<test>", content).unwrap_err()
    }

    fn printed(content: &str) -> String {
        format!("{}", parse_ok(content).node)
    }

    #[test]
    fn simple_assignments() {
        assert_eq!("x = 1\n", printed("x = 1"));
        assert_eq!("x[1] = (2 + 3)\n", printed("x[1] = 2 + 3"));
        assert_eq!("a.b = \"s\"\n", printed("a.b = 's'"));
        assert_eq!("(a, b) = c\n", printed("a, b = c"));
    }

    #[test]
    fn operator_precedence() {
        assert_eq!("x = (1 + (2 * 3))\n", printed("x = 1 + 2 * 3"));
        assert_eq!("x = ((1 + 2) * 3)\n", printed("x = (1 + 2) * 3"));
        assert_eq!("x = (1 | (2 ^ (3 & (4 << 5))))\n", printed("x = 1 | 2 ^ 3 & 4 << 5"));
        assert_eq!("x = ((1 + 2) < (3 * 4))\n", printed("x = 1 + 2 < 3 * 4"));
        assert_eq!(
            "x = ((a and b) or (not c))\n",
            printed("x = a and b or not c")
        );
        assert_eq!("x = -(2 + 3)\n", printed("x = -(2 + 3)"));
    }

    #[test]
    fn chained_comparison_is_rejected() {
        let d = parse_err("x = 1 < 2 < 3");
        assert_eq!(Some(CHAINED_COMPARISON_ERROR_CODE.to_owned()), d.code);
    }

    #[test]
    fn ternary_and_lambda() {
        assert_eq!("x = (1 if c else 2)\n", printed("x = 1 if c else 2"));
        assert_eq!("f = (lambda x: (x + 1))\n", printed("f = lambda x: x + 1"));
    }

    #[test]
    fn def_and_calls() {
        assert_eq!(
            "def f(a, b = 1, *args, c, **kwargs):\n  return (a + b)\n",
            printed("def f(a, b=1, *args, c, **kwargs):\n  return a + b\n")
        );
        assert_eq!(
            "x = f(1, 2, a = 3, *b, **c)\n",
            printed("x = f(1, 2, a=3, *b, **c)")
        );
    }

    #[test]
    fn parameter_errors() {
        assert_eq!(
            Some(DUPLICATE_PARAMETER_NAME_ERROR_CODE.to_owned()),
            parse_err("def f(a, a): pass").code
        );
        assert_eq!(
            Some(POSITIONAL_PARAMETER_AFTER_DEFAULT_ERROR_CODE.to_owned()),
            parse_err("def f(a = 1, b): pass").code
        );
        assert_eq!(
            Some(BARE_STAR_WITHOUT_NAMED_PARAMETER_ERROR_CODE.to_owned()),
            parse_err("def f(a, *): pass").code
        );
        assert_eq!(
            Some(PARAMETER_AFTER_KWARGS_ERROR_CODE.to_owned()),
            parse_err("def f(**kwargs, a): pass").code
        );
    }

    #[test]
    fn call_argument_errors() {
        assert_eq!(
            Some(POSITIONAL_ARGUMENT_AFTER_NON_POSITIONAL_ERROR_CODE.to_owned()),
            parse_err("f(a = 1, 2)").code
        );
        assert_eq!(
            Some(DUPLICATE_NAMED_ARGUMENT_ERROR_CODE.to_owned()),
            parse_err("f(a = 1, a = 2)").code
        );
        assert_eq!(
            Some(MULTIPLE_KWARGS_DICT_IN_ARGS_ERROR_CODE.to_owned()),
            parse_err("f(**a, **b)").code
        );
    }

    #[test]
    fn assignment_target_errors() {
        assert_eq!(
            Some(INCORRECT_ASSIGNMENT_TARGET_ERROR_CODE.to_owned()),
            parse_err("1 + 2 = 3").code
        );
        assert_eq!(
            Some(INCORRECT_AUGMENTED_ASSIGNMENT_TARGET_ERROR_CODE.to_owned()),
            parse_err("(a, b) += 3").code
        );
    }

    #[test]
    fn compound_statements() {
        assert_eq!(
            "if x:\n  pass\nelse:\n  pass\n",
            printed("if x:\n  pass\nelse:\n  pass\n")
        );
        assert_eq!(
            "if a:\n  pass\nelse:\n  if b:\n    pass\n  else:\n    pass\n",
            printed("if a:\n  pass\nelif b:\n  pass\nelse:\n  pass\n")
        );
        assert_eq!(
            "for (x, y) in z:\n  break\n",
            printed("for x, y in z:\n  break\n")
        );
        assert_eq!("while x:\n  continue\n", printed("while x:\n  continue\n"));
    }

    #[test]
    fn comprehensions() {
        assert_eq!(
            "l = [(x * x) for x in y if ((x % 2) == 0)]\n",
            printed("l = [x * x for x in y if x % 2 == 0]")
        );
        assert_eq!(
            "d = {k: v for (k, v) in items}\n",
            printed("d = {k: v for k, v in items}")
        );
        assert_eq!("s = {x for x in y}\n", printed("s = {x for x in y}"));
    }

    #[test]
    fn load_statement() {
        assert_eq!(
            "load(\"a.sky\", x = \"x\", y = \"_y\")\n",
            printed("load('a.sky', 'x', y = '_y')")
        );
        assert_eq!(
            Some(LOAD_ARGUMENT_NOT_A_STRING_ERROR_CODE.to_owned()),
            parse_err("load('a.sky', 1)").code
        );
    }

    #[test]
    fn print_parse_print_is_stable() {
        let examples = &[
            "x = 1 + 2 * 3 - 4 % 5\n",
            "def f(a, b = [1, 2], *args, **kwargs):\n  return {a: b for a in args if a}\n",
            "for x in range(10):\n  if x % 2 == 0:\n    continue\n  l.append(x)\n",
            "load('lib.sky', 'helper')\nresult = helper(1)[2][3:4]\n",
            "x = 'a\\nb' % (1, 2)\n",
            "t = (1,)\nu = ()\nv = 1, 2\n",
        ];
        for e in examples {
            let once = printed(e);
            let twice = printed(&once);
            assert_eq!(once, twice, "for example {:?}", e);
        }
    }

    #[test]
    fn empty_containers() {
        assert_eq!("x = []\n", printed("x = []"));
        assert_eq!("x = {}\n", printed("x = {}"));
        assert_eq!("x = ()\n", printed("x = ()"));
    }

    #[test]
    fn slices() {
        assert_eq!("x = a[1]\n", printed("x = a[1]"));
        assert_eq!("x = a[1::]\n", printed("x = a[1:]"));
        assert_eq!("x = a[1:2:]\n", printed("x = a[1:2]"));
        assert_eq!("x = a[::-1]\n", printed("x = a[::-1]"));
    }
}
