//! Recursive-descent parser for emitted evaluation-function bodies.
//!
//! Statements understood:
//! - `const auto NAME = [&](PARAMS) -> double { return EXPR; };`
//! - `std::array<bool|double, N> NAME{};`
//! - `double NAME = EXPR;`, `bool* NAME = EXPR;`, `double* NAME = EXPR;`
//! - `for (TYPE VAR = EXPR; EXPR; ++VAR) STMT`
//! - `struct { double FIELD = EXPR; ... } NAME;`
//! - `EXPR;`

use crate::error::{EvalError, EvalResult};
use crate::target::lexer::{Token, TokenKind};

// ══════════════════════════════════════════════════════════════════════════════
// AST
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Int,
    UnsignedInt,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Ident(String),
    Neg(Box<Expr>),
    Cast {
        ty: CastType,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Comma(Box<Expr>, Box<Expr>),
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Field {
        object: Box<Expr>,
        field: String,
    },
    Method {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

/// A lambda bound by `const auto NAME = ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemType {
    Bool,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Lambda {
        name: String,
        lambda: Lambda,
    },
    Array {
        name: String,
        elem: ElemType,
        len: usize,
    },
    Let {
        name: String,
        value: Expr,
    },
    For {
        var: String,
        init: Expr,
        cond: Expr,
        body: Box<Stmt>,
    },
    Record {
        name: String,
        fields: Vec<(String, Expr)>,
    },
    Expr(Expr),
}

// ══════════════════════════════════════════════════════════════════════════════
// Parser
// ══════════════════════════════════════════════════════════════════════════════

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse every statement up to end of input.
    pub fn parse(mut self) -> EvalResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    // ── Cursor ────────────────────────────────────────────────────────────

    fn peek_kind(&self) -> &TokenKind {
        self.peek_kind_at(0)
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek_kind().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(n) if n == name)
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> EvalResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {kind:?}, found {:?}", self.peek_kind())))
        }
    }

    fn expect_ident(&mut self) -> EvalResult<String> {
        match self.advance() {
            TokenKind::Ident(name) => Ok(name),
            other => Err(self.error(format!("expected identifier, found {other:?}"))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> EvalResult<()> {
        if self.check_ident(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{keyword}', found {:?}", self.peek_kind())))
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn parse_statement(&mut self) -> EvalResult<Stmt> {
        let keyword = match self.peek_kind() {
            TokenKind::Ident(name) => name.clone(),
            _ => String::new(),
        };
        match keyword.as_str() {
            "const" => self.parse_lambda_decl(),
            "std::array" => self.parse_array_decl(),
            "double" | "bool" => self.parse_let(),
            "for" => self.parse_for(),
            "struct" => self.parse_record(),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::Semicolon)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// `const auto NAME = [&](PARAMS) -> double { return EXPR; };`
    fn parse_lambda_decl(&mut self) -> EvalResult<Stmt> {
        self.expect_keyword("const")?;
        self.expect_keyword("auto")?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        self.expect(&TokenKind::LBracket)?;
        self.expect(&TokenKind::Amp)?;
        self.expect(&TokenKind::RBracket)?;
        self.expect(&TokenKind::LParen)?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.parse_param()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Arrow)?;
        self.expect_keyword("double")?;
        self.expect(&TokenKind::LBrace)?;
        self.expect_keyword("return")?;
        let body = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::RBrace)?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Lambda {
            name,
            lambda: Lambda { params, body },
        })
    }

    /// A parameter declaration; its name is the last identifier before the
    /// next `,` or `)`.
    fn parse_param(&mut self) -> EvalResult<String> {
        let mut name = None;
        loop {
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::RParen => break,
                TokenKind::Ident(id) => {
                    name = Some(id.clone());
                    self.advance();
                }
                TokenKind::Amp | TokenKind::Star => {
                    self.advance();
                }
                other => return Err(self.error(format!("unexpected {other:?} in parameter"))),
            }
        }
        name.ok_or_else(|| self.error("parameter without a name"))
    }

    /// `std::array<T, N> NAME{};`
    fn parse_array_decl(&mut self) -> EvalResult<Stmt> {
        self.expect_keyword("std::array")?;
        self.expect(&TokenKind::Lt)?;
        let elem = match self.expect_ident()?.as_str() {
            "bool" => ElemType::Bool,
            "double" => ElemType::Double,
            other => return Err(self.error(format!("unsupported array element type '{other}'"))),
        };
        self.expect(&TokenKind::Comma)?;
        let len = match self.advance() {
            TokenKind::Number(n) if n >= 0.0 && n.fract() == 0.0 => n as usize,
            other => return Err(self.error(format!("expected array length, found {other:?}"))),
        };
        self.expect(&TokenKind::Gt)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        self.expect(&TokenKind::RBrace)?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Array { name, elem, len })
    }

    /// `double NAME = EXPR;` (optionally a pointer declaration).
    fn parse_let(&mut self) -> EvalResult<Stmt> {
        self.advance(); // type
        if self.check(&TokenKind::Star) {
            self.advance();
        }
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        let value = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Let { name, value })
    }

    /// `for (TYPE VAR = EXPR; EXPR; ++VAR) STMT`
    fn parse_for(&mut self) -> EvalResult<Stmt> {
        self.expect_keyword("for")?;
        self.expect(&TokenKind::LParen)?;
        self.expect_ident()?; // index type
        let var = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        let init = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon)?;
        let cond = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::PlusPlus)?;
        let step = self.expect_ident()?;
        if step != var {
            return Err(self.error(format!("loop increments '{step}', expected '{var}'")));
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_statement()?;
        Ok(Stmt::For {
            var,
            init,
            cond,
            body: Box::new(body),
        })
    }

    /// `struct { double FIELD = EXPR; ... } NAME;`
    fn parse_record(&mut self) -> EvalResult<Stmt> {
        self.expect_keyword("struct")?;
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            self.expect_keyword("double")?;
            let field = self.expect_ident()?;
            self.expect(&TokenKind::Assign)?;
            let value = self.parse_expression()?;
            self.expect(&TokenKind::Semicolon)?;
            fields.push((field, value));
        }
        self.expect(&TokenKind::RBrace)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Record { name, fields })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// `Expr = Assign { "," Assign }`
    pub fn parse_expression(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_assignment()?;
        while self.check(&TokenKind::Comma) {
            self.advance();
            let right = self.parse_assignment()?;
            left = Expr::Comma(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `Assign = Conditional [ "=" Assign ]`
    fn parse_assignment(&mut self) -> EvalResult<Expr> {
        let target = self.parse_conditional()?;
        if self.check(&TokenKind::Assign) {
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Expr::Assign {
                target: Box::new(target),
                value: Box::new(value),
            });
        }
        Ok(target)
    }

    /// `Conditional = Equality [ "?" Expr ":" Assign ]`
    fn parse_conditional(&mut self) -> EvalResult<Expr> {
        let cond = self.parse_equality()?;
        if !self.check(&TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();
        let then = self.parse_expression()?;
        self.expect(&TokenKind::Colon)?;
        let otherwise = self.parse_assignment()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// `Equality = Relational { ("==" | "!=") Relational }`
    fn parse_equality(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `Relational = Additive { ("<" | ">" | "<=" | ">=") Additive }`
    fn parse_relational(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `Additive = Multiplicative { ("+" | "-") Multiplicative }`
    fn parse_additive(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `Multiplicative = Unary { ("*" | "/") Unary }`
    fn parse_multiplicative(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `Unary = "-" Unary | "+" Unary | "(" Type ")" Unary | Postfix`
    fn parse_unary(&mut self) -> EvalResult<Expr> {
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            TokenKind::LParen => match self.cast_type() {
                Some((ty, len)) => {
                    self.pos += len;
                    let operand = self.parse_unary()?;
                    Ok(Expr::Cast {
                        ty,
                        operand: Box::new(operand),
                    })
                }
                None => self.parse_postfix(),
            },
            _ => self.parse_postfix(),
        }
    }

    /// Recognize `(int)`, `(double)` or `(unsigned int)` at the cursor,
    /// returning the cast and its token length.
    fn cast_type(&self) -> Option<(CastType, usize)> {
        let ident = |offset| match self.peek_kind_at(offset) {
            TokenKind::Ident(name) => Some(name.as_str()),
            _ => None,
        };
        let (ty, len) = match (ident(1), ident(2)) {
            (Some("int"), _) => (CastType::Int, 3),
            (Some("double"), _) => (CastType::Double, 3),
            (Some("unsigned"), Some("int")) => (CastType::UnsignedInt, 4),
            (Some("unsigned"), _) => (CastType::UnsignedInt, 3),
            _ => return None,
        };
        (self.peek_kind_at(len - 1) == &TokenKind::RParen).then_some((ty, len))
    }

    /// `Postfix = Primary { "(" Args ")" | "." Ident [ "(" Args ")" ] | "[" Expr "]" }`
    fn parse_postfix(&mut self) -> EvalResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let callee = match &expr {
                        Expr::Ident(name) => name.clone(),
                        _ => return Err(self.error("only named functions can be called")),
                    };
                    self.advance();
                    let args = self.parse_args()?;
                    expr = Expr::Call { callee, args };
                }
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect_ident()?;
                    if self.check(&TokenKind::LParen) {
                        self.advance();
                        let args = self.parse_args()?;
                        expr = Expr::Method {
                            object: Box::new(expr),
                            method: member,
                            args,
                        };
                    } else {
                        expr = Expr::Field {
                            object: Box::new(expr),
                            field: member,
                        };
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Arguments after an opening `(`, through the closing `)`.
    fn parse_args(&mut self) -> EvalResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            match self.advance() {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(args),
                other => return Err(self.error(format!("expected ',' or ')', found {other:?}"))),
            }
        }
    }

    fn parse_primary(&mut self) -> EvalResult<Expr> {
        match self.advance() {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                _ => Expr::Ident(name),
            }),
            TokenKind::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(self.error(format!("unexpected {other:?} in expression"))),
        }
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::lexer::Lexer;

    fn parse_expr(source: &str) -> Expr {
        let tokens = Lexer::new(source).lex().unwrap();
        Parser::new(tokens).parse_expression().unwrap()
    }

    fn parse_stmts(source: &str) -> Vec<Stmt> {
        let tokens = Lexer::new(source).lex().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_expr("1.0 + 2.0 * 3.0"),
            binary(
                Expr::Number(1.0),
                BinOp::Add,
                binary(Expr::Number(2.0), BinOp::Mul, Expr::Number(3.0))
            )
        );
    }

    #[test]
    fn test_cast_vs_parenthesized() {
        assert_eq!(
            parse_expr("(unsigned int)(-2.0)"),
            Expr::Cast {
                ty: CastType::UnsignedInt,
                operand: Box::new(Expr::Neg(Box::new(Expr::Number(2.0)))),
            }
        );
        assert_eq!(parse_expr("(x)"), Expr::Ident("x".into()));
    }

    #[test]
    fn test_memo_guard_shape() {
        let e = parse_expr("(V[0] ? C[0] : (C[0] = (1.0), V[0] = true, C[0]))");
        let Expr::Conditional { otherwise, .. } = e else {
            panic!("expected conditional");
        };
        assert!(matches!(*otherwise, Expr::Comma(..)));
    }

    #[test]
    fn test_method_and_field_chain() {
        let e = parse_expr("(Point(EvalPoint).Scale(2.0)).x");
        let Expr::Field { object, field } = e else {
            panic!("expected field");
        };
        assert_eq!(field, "x");
        assert!(matches!(*object, Expr::Method { ref method, .. } if method == "Scale"));
    }

    #[test]
    fn test_statements() {
        let stmts = parse_stmts(concat!(
            "\tconst auto F = [&](const Point& EvalPoint, const auto& NamedInput, bool* CacheIsValid, double* Cache) -> double\n",
            "\t{\n\t\treturn 1.0;\n\t};\n",
            "\tstd::array<bool, 2> S{};\n",
            "\tbool* V = S.data();\n",
            "\tfor (std::size_t i = 0; i < 2; ++i)\n\t\tV[i] = false;\n",
            "\tstruct\n\t{\n\t\tdouble A = 2.0;\n\t} NamedInput;\n",
            "\tdouble FinalResult = F(Point(EvalPoint), NamedInput, V, V);\n",
        ));
        assert_eq!(stmts.len(), 6);
        match &stmts[0] {
            Stmt::Lambda { name, lambda } => {
                assert_eq!(name, "F");
                assert_eq!(
                    lambda.params,
                    ["EvalPoint", "NamedInput", "CacheIsValid", "Cache"]
                );
            }
            other => panic!("expected lambda, got {other:?}"),
        }
        assert_eq!(
            stmts[1],
            Stmt::Array {
                name: "S".into(),
                elem: ElemType::Bool,
                len: 2
            }
        );
        assert!(matches!(stmts[3], Stmt::For { .. }));
        assert!(matches!(&stmts[4], Stmt::Record { fields, .. } if fields.len() == 1));
    }

    #[test]
    fn test_error_reports_line() {
        let tokens = Lexer::new("double x = ;\n").lex().unwrap();
        assert!(matches!(
            Parser::new(tokens).parse(),
            Err(EvalError::Parse { line: 1, .. })
        ));
    }
}
