//! Tokenizer for the C++ subset the code generator emits.
//!
//! - Block (`/* */`) and line (`//`) comments are skipped
//! - Qualified names (`std::max`, `std::numeric_limits<double>::infinity`)
//!   lex as a single identifier
//! - Keywords are plain identifiers; the parser gives them meaning

use crate::error::{EvalError, EvalResult};

/// Kind of a target token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),

    // ── Delimiters ──
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Question,
    Colon,
    Arrow,

    // ── Operators ──
    Plus,
    PlusPlus,
    Minus,
    Star,
    Slash,
    Amp,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    Assign,

    Eof,
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

/// The target-text lexer.
pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    line: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    /// Lex the whole input. The result always ends with [`TokenKind::Eof`].
    pub fn lex(mut self) -> EvalResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let line = self.line;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                });
                return Ok(tokens);
            };
            let kind = if c.is_ascii_digit()
                || (c == b'.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
            {
                self.scan_number()?
            } else if c.is_ascii_alphabetic() || c == b'_' {
                TokenKind::Ident(self.scan_identifier())
            } else {
                self.scan_punct(c)?
            };
            tokens.push(Token { kind, line });
        }
    }

    // ── Cursor ────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn rest_starts_with(&self, text: &str) -> bool {
        self.source[self.pos..].starts_with(text.as_bytes())
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    // ── Scanners ──────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) -> EvalResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    loop {
                        if self.rest_starts_with("*/") {
                            self.pos += 2;
                            break;
                        }
                        if self.advance().is_none() {
                            return Err(self.error("unterminated block comment"));
                        }
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_number(&mut self) -> EvalResult<TokenKind> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'.') {
            self.advance();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]);
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("malformed number '{text}'")))
    }

    fn scan_identifier(&mut self) -> String {
        let start = self.pos;
        loop {
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
            {
                self.advance();
            }
            if self.source[start..self.pos].ends_with(b"numeric_limits")
                && self.rest_starts_with("<double>")
            {
                self.pos += "<double>".len();
            }
            let qualified = self.rest_starts_with("::")
                && self
                    .peek_at(2)
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_');
            if !qualified {
                break;
            }
            self.pos += 2;
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn scan_punct(&mut self, c: u8) -> EvalResult<TokenKind> {
        let next = self.peek_at(1);
        let (kind, len) = match (c, next) {
            (b'+', Some(b'+')) => (TokenKind::PlusPlus, 2),
            (b'-', Some(b'>')) => (TokenKind::Arrow, 2),
            (b'<', Some(b'=')) => (TokenKind::Le, 2),
            (b'>', Some(b'=')) => (TokenKind::Ge, 2),
            (b'=', Some(b'=')) => (TokenKind::EqEq, 2),
            (b'!', Some(b'=')) => (TokenKind::NotEq, 2),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b'{', _) => (TokenKind::LBrace, 1),
            (b'}', _) => (TokenKind::RBrace, 1),
            (b'[', _) => (TokenKind::LBracket, 1),
            (b']', _) => (TokenKind::RBracket, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b';', _) => (TokenKind::Semicolon, 1),
            (b'.', _) => (TokenKind::Dot, 1),
            (b'?', _) => (TokenKind::Question, 1),
            (b':', _) => (TokenKind::Colon, 1),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'&', _) => (TokenKind::Amp, 1),
            (b'<', _) => (TokenKind::Lt, 1),
            (b'>', _) => (TokenKind::Gt, 1),
            (b'=', _) => (TokenKind::Assign, 1),
            _ => return Err(self.error(format!("unexpected character '{}'", c as char))),
        };
        self.pos += len;
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_qualified_names() {
        assert_eq!(
            kinds("std::max(a,b)"),
            vec![
                TokenKind::Ident("std::max".into()),
                TokenKind::LParen,
                TokenKind::Ident("a".into()),
                TokenKind::Comma,
                TokenKind::Ident("b".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("std::numeric_limits<double>::infinity()")[0],
            TokenKind::Ident("std::numeric_limits<double>::infinity".into())
        );
    }

    #[test]
    fn test_array_type_is_not_qualified_template() {
        assert_eq!(
            kinds("std::array<bool, 3>"),
            vec![
                TokenKind::Ident("std::array".into()),
                TokenKind::Lt,
                TokenKind::Ident("bool".into()),
                TokenKind::Comma,
                TokenKind::Number(3.0),
                TokenKind::Gt,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("2.5 1e-300 6.02214076e23 0"),
            vec![
                TokenKind::Number(2.5),
                TokenKind::Number(1e-300),
                TokenKind::Number(6.02214076e23),
                TokenKind::Number(0.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens = Lexer::new("/*low*/(x) // tail\n++i").lex().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LParen);
        let inc = tokens.iter().find(|t| t.kind == TokenKind::PlusPlus).unwrap();
        assert_eq!(inc.line, 2);
    }

    #[test]
    fn test_rejects_unknown_character() {
        assert!(matches!(
            Lexer::new("a # b").lex(),
            Err(EvalError::Parse { line: 1, .. })
        ));
    }
}
