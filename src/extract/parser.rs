//! Source module scanner.
//!
//! Walks one authoring module's text and pulls out the top-level export
//! declarations. Only signatures are modeled - function bodies are skipped
//! by balanced-brace scanning, with string literals, template literals, and
//! comments handled so braces inside them don't confuse the depth count.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected token '{0}' at line {1}")]
    UnexpectedToken(String, usize),
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// A parameter as written: name plus raw declared type text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub name: String,
    pub ty: String,
}

/// An exported function signature, before type mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignature {
    pub name: String,
    pub params: Vec<RawParam>,
    pub return_type: Option<String>,
    pub has_async_keyword: bool,
    pub line: usize,
}

/// One top-level export found in a module.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExport {
    Function(RawSignature),
    /// `export default ...` - anonymous, never a bridge function.
    Default { line: usize },
    /// Any other named export (`const`, `class`, a re-export, ...).
    Other {
        name: String,
        keyword: String,
        line: usize,
    },
}

/// Scan a module's source text for top-level exports.
pub fn scan_module(src: &str) -> Result<Vec<RawExport>, ParseError> {
    let mut scanner = Scanner::new(src);
    let mut exports = Vec::new();

    loop {
        scanner.skip_trivia();
        let Some(ch) = scanner.peek() else { break };

        if is_ident_start(ch) {
            let line = scanner.line;
            let word = scanner.read_ident();
            if word == "export" {
                scanner.parse_export(line, &mut exports)?;
            } else {
                scanner.skip_statement();
            }
        } else {
            scanner.skip_statement();
        }
    }

    Ok(exports)
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Scanner {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.bump() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    while let Some(ch) = self.bump() {
                        if ch == '*' && self.peek() == Some('/') {
                            self.bump();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                ident.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(ch) if is_ident_start(ch) => Ok(self.read_ident()),
            Some(ch) => Err(ParseError::UnexpectedToken(ch.to_string(), self.line)),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(ch) => Err(ParseError::UnexpectedToken(ch.to_string(), self.line)),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn skip_string(&mut self, quote: char) {
        // Opening quote already consumed.
        while let Some(ch) = self.bump() {
            match ch {
                '\\' => {
                    self.bump();
                }
                '$' if quote == '`' && self.peek() == Some('{') => {
                    self.skip_braces();
                }
                ch if ch == quote => break,
                _ => {}
            }
        }
    }

    /// Skip a balanced `{ ... }` block, current position at the opening brace.
    fn skip_braces(&mut self) {
        debug_assert_eq!(self.peek(), Some('{'));
        self.bump();
        let mut depth = 1usize;
        while depth > 0 {
            self.skip_trivia();
            match self.bump() {
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some(q @ ('"' | '\'' | '`')) => self.skip_string(q),
                Some(_) => {}
                None => break,
            }
        }
    }

    /// Skip a statement we don't model: consume until a top-level `;`, a
    /// top-level newline (approximating automatic semicolon insertion), or
    /// end of input. Bracketed groups and strings are consumed atomically.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => break,
                Some(';') if depth == 0 => {
                    self.bump();
                    break;
                }
                Some('\n') if depth == 0 => {
                    self.bump();
                    break;
                }
                Some('/') if matches!(self.peek_at(1), Some('/') | Some('*')) => {
                    self.skip_trivia();
                }
                Some('{') => {
                    self.skip_braces();
                }
                Some('(') | Some('[') => {
                    depth += 1;
                    self.bump();
                }
                Some(')') | Some(']') => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                Some(q @ ('"' | '\'' | '`')) => {
                    self.bump();
                    self.skip_string(q);
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Parse whatever follows the `export` keyword.
    fn parse_export(
        &mut self,
        line: usize,
        exports: &mut Vec<RawExport>,
    ) -> Result<(), ParseError> {
        self.skip_trivia();

        // `export { a, b as c } from '...'` and `export * from '...'`
        if self.peek() == Some('{') {
            self.parse_reexport_list(line, exports)?;
            return Ok(());
        }
        if self.peek() == Some('*') {
            self.skip_statement();
            exports.push(RawExport::Other {
                name: "*".to_string(),
                keyword: "re-export".to_string(),
                line,
            });
            return Ok(());
        }

        let keyword = self.expect_ident()?;
        match keyword.as_str() {
            "default" => {
                self.skip_statement();
                exports.push(RawExport::Default { line });
            }
            "async" => {
                let next = self.expect_ident()?;
                if next != "function" {
                    return Err(ParseError::UnexpectedToken(next, self.line));
                }
                exports.push(RawExport::Function(self.parse_function(true, line)?));
            }
            "function" => {
                exports.push(RawExport::Function(self.parse_function(false, line)?));
            }
            "const" | "let" | "var" | "class" | "enum" | "interface" | "type" | "abstract" => {
                self.skip_trivia();
                let name = match self.peek() {
                    Some(ch) if is_ident_start(ch) => self.read_ident(),
                    _ => "(anonymous)".to_string(),
                };
                self.skip_statement();
                exports.push(RawExport::Other {
                    name,
                    keyword,
                    line,
                });
            }
            other => return Err(ParseError::UnexpectedToken(other.to_string(), line)),
        }
        Ok(())
    }

    fn parse_reexport_list(
        &mut self,
        line: usize,
        exports: &mut Vec<RawExport>,
    ) -> Result<(), ParseError> {
        self.expect_char('{')?;
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                break;
            }
            let mut name = self.expect_ident()?;
            self.skip_trivia();
            // `a as b` exports under the alias.
            if self.peek().map(is_ident_start).unwrap_or(false) {
                let kw = self.read_ident();
                if kw == "as" {
                    name = self.expect_ident()?;
                } else {
                    return Err(ParseError::UnexpectedToken(kw, self.line));
                }
            }
            exports.push(RawExport::Other {
                name,
                keyword: "re-export".to_string(),
                line,
            });
            self.skip_trivia();
            if self.peek() == Some(',') {
                self.bump();
            }
        }
        // Trailing `from '...'` clause, if any.
        self.skip_statement();
        Ok(())
    }

    fn parse_function(
        &mut self,
        has_async_keyword: bool,
        line: usize,
    ) -> Result<RawSignature, ParseError> {
        let name = self.expect_ident()?;
        self.expect_char('(')?;

        let mut params = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(ch) if is_ident_start(ch) => {
                    let param_name = self.read_ident();
                    self.skip_trivia();
                    if self.peek() == Some('?') {
                        self.bump();
                    }
                    self.expect_char(':')?;
                    let ty = self.read_type_text(&[',', ')', '='])?;
                    if self.peek() == Some('=') {
                        // Default value: consumed, not modeled.
                        self.bump();
                        self.skip_expression_until(&[',', ')']);
                    }
                    params.push(RawParam {
                        name: param_name,
                        ty,
                    });
                    self.skip_trivia();
                    if self.peek() == Some(',') {
                        self.bump();
                    }
                }
                Some(ch) => {
                    return Err(ParseError::UnexpectedToken(ch.to_string(), self.line))
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }

        self.skip_trivia();
        let return_type = if self.peek() == Some(':') {
            self.bump();
            Some(self.read_type_text(&['{', ';'])?)
        } else {
            None
        };

        self.skip_trivia();
        match self.peek() {
            Some('{') => self.skip_braces(),
            Some(';') => {
                self.bump();
            }
            Some(ch) => return Err(ParseError::UnexpectedToken(ch.to_string(), self.line)),
            None => return Err(ParseError::UnexpectedEof),
        }

        Ok(RawSignature {
            name,
            params,
            return_type,
            has_async_keyword,
            line,
        })
    }

    /// Read raw type text until one of `stops` appears at bracket depth
    /// zero. The `=>` of an arrow type is kept intact: its `=` never stops
    /// the read and its `>` never closes a generic bracket.
    fn read_type_text(&mut self, stops: &[char]) -> Result<String, ParseError> {
        self.skip_trivia();
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            let Some(ch) = self.peek() else {
                break;
            };
            if depth == 0 && stops.contains(&ch) {
                // An arrow's `=` is part of the type, not a stop.
                if !(ch == '=' && self.peek_at(1) == Some('>')) {
                    break;
                }
            }
            match ch {
                '<' | '(' | '[' | '{' => depth += 1,
                '>' => {
                    if !text.ends_with('=') {
                        depth = depth.saturating_sub(1);
                    }
                }
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            text.push(ch);
            self.bump();
        }
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(match self.peek() {
                Some(ch) => ParseError::UnexpectedToken(ch.to_string(), self.line),
                None => ParseError::UnexpectedEof,
            });
        }
        Ok(text)
    }

    /// Consume a default-value expression until one of `stops` at depth zero.
    fn skip_expression_until(&mut self, stops: &[char]) {
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            if depth == 0 && stops.contains(&ch) {
                break;
            }
            match ch {
                '(' | '[' | '{' => {
                    depth += 1;
                    self.bump();
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                '"' | '\'' | '`' => {
                    let q = ch;
                    self.bump();
                    self.skip_string(q);
                }
                _ => {
                    self.bump();
                }
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
