//! Scanner for two-way SQL text.
//!
//! The input is ordinary SQL in which every directive is hidden inside a
//! comment, so the scanner's job is mostly deciding which comments are
//! directives (`/*expr*/`, `/*IF ...*/`, `--ELSE`, ...) and which are just
//! comments. Everything else passes through as literal text.

use std::borrow::Cow;

use crate::error::{ParseError, ParseErrorKind, source_line};
use crate::interface::ParseOptions;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind<'a>,
    /// 1-indexed line the token started on.
    pub(crate) line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind<'a> {
    /// Verbatim SQL text, including whitespace runs and quoted strings.
    Literal(Cow<'a, str>),
    /// A newline, kept as its own token so merges can re-emit it.
    Eol,
    /// An ordinary (non-directive) comment, full text with delimiters.
    Comment(&'a str),
    /// A connective (`AND` / `OR` / `,`) at the head of a conditional
    /// branch, detached so the merge can drop it when the branch is the
    /// first active clause.
    Prefix(Cow<'a, str>),
    /// `/*expr*/placeholder` with the placeholder already consumed.
    Bind { expression: &'a str, paren: bool },
    /// `/*$expr*/placeholder` with the placeholder already consumed.
    Embed(&'a str),
    /// A bare `?`, numbered by occurrence (1-based).
    Question { index: i64 },
    If(&'a str),
    Else,
    Begin,
    End,
}

/// What kind of branch head the scanner is currently at, if any. A
/// connective here becomes a [`TokenKind::Prefix`] instead of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefixScan {
    None,
    /// Right after `/*IF ...*/` or `/*BEGIN*/`; a connective takes its
    /// trailing spaces with it.
    Block,
    /// Right after `--ELSE` (which eats its own trailing spaces); a
    /// connective leaves its trailing spaces in the branch body.
    Else,
}

pub(crate) fn tokenize(input: &str, options: ParseOptions) -> Result<Vec<Token<'_>>, ParseError> {
    let mut lexer = Lexer {
        input: strip_trailing_semicolon(input),
        pos: 0,
        line: 1,
        options,
        tokens: Vec::new(),
        prefix_scan: PrefixScan::None,
        question_count: 0,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

/// A trailing `;` (plus trailing spaces/tabs) is tolerated and stripped.
fn strip_trailing_semicolon(input: &str) -> &str {
    let trimmed = input.trim_end_matches([' ', '\t']);
    trimmed.strip_suffix(';').unwrap_or(input)
}

/// Byte length of a `'...'` string at the start of `s`, with `''` escapes,
/// or `None` if it never closes.
fn quoted_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
            } else {
                return Some(i + 1);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Does `s` start with `keyword` (ASCII case-insensitive) at a word
/// boundary?
fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    if !s
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
    {
        return false;
    }
    match s[keyword.len()..].chars().next() {
        Some(c) => !(c.is_ascii_alphanumeric() || c == '_'),
        None => true,
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    options: ParseOptions,
    tokens: Vec<Token<'a>>,
    prefix_scan: PrefixScan,
    question_count: i64,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.peek_char() {
            if self.peek("/*") || self.peek("#*") {
                self.scan_comment()?;
            } else if let Some(len) = self.peek_else_marker() {
                self.scan_else(len);
            } else if c.is_ascii_whitespace() {
                self.scan_whitespace();
            } else if self.prefix_scan != PrefixScan::None && self.try_prefix() {
                // prefix token emitted
            } else if c == '?' {
                self.scan_question();
            } else if c == '\'' {
                self.scan_quoted();
            } else {
                self.scan_literal();
            }
        }
        Ok(())
    }

    fn peek(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn error_at(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line,
            context: source_line(self.input, line),
            kind,
        }
    }

    /// Pushes a token and updates the branch-head state: `IF` / `BEGIN` /
    /// `ELSE` open a branch head, whitespace keeps it open, anything else
    /// closes it.
    fn push(&mut self, kind: TokenKind<'a>, line: usize) {
        self.prefix_scan = match &kind {
            TokenKind::If(_) | TokenKind::Begin => PrefixScan::Block,
            TokenKind::Else => PrefixScan::Else,
            TokenKind::Eol => self.prefix_scan_after_whitespace(),
            TokenKind::Literal(text) if text.chars().all(|c| c.is_ascii_whitespace()) => {
                self.prefix_scan_after_whitespace()
            }
            TokenKind::Literal(_)
            | TokenKind::Comment(_)
            | TokenKind::Prefix(_)
            | TokenKind::Bind { .. }
            | TokenKind::Embed(_)
            | TokenKind::Question { .. }
            | TokenKind::End => PrefixScan::None,
        };
        self.tokens.push(Token { kind, line });
    }

    /// An `--ELSE` already ate its own trailing spaces, so whitespace after
    /// it means we are past the marker's reach; treat the head like a
    /// block's from here on.
    const fn prefix_scan_after_whitespace(&self) -> PrefixScan {
        match self.prefix_scan {
            PrefixScan::None => PrefixScan::None,
            PrefixScan::Block | PrefixScan::Else => PrefixScan::Block,
        }
    }

    /// `-{2,}`, optional spaces/tabs, then `ELSE` at a word boundary.
    /// Returns the marker's byte length (excluding trailing whitespace).
    fn peek_else_marker(&self) -> Option<usize> {
        let rest = &self.input[self.pos..];
        if !rest.starts_with("--") {
            return None;
        }
        let dashes = rest.bytes().take_while(|&b| b == b'-').count();
        let after = &rest[dashes..];
        let gap = after
            .bytes()
            .take_while(|&b| b == b' ' || b == b'\t')
            .count();
        if starts_with_keyword(&after[gap..], "ELSE") {
            Some(dashes + gap + 4)
        } else {
            None
        }
    }

    fn scan_else(&mut self, marker_len: usize) {
        let line = self.line;
        self.pos += marker_len;
        // the marker owns the spaces that follow it
        while matches!(self.peek_char(), Some(' ' | '\t')) {
            self.pos += 1;
        }
        self.push(TokenKind::Else, line);
    }

    fn scan_question(&mut self) {
        let line = self.line;
        self.question_count += 1;
        self.pos += 1;
        self.push(
            TokenKind::Question {
                index: self.question_count,
            },
            line,
        );
    }

    fn scan_whitespace(&mut self) {
        let line = self.line;
        if self.options.is_compact_mode() {
            let start = self.pos;
            while let Some(c) = self.peek_char() {
                if !c.is_ascii_whitespace() {
                    break;
                }
                if c == '\n' {
                    self.line += 1;
                }
                self.pos += 1;
            }
            // runs touching either end of the input are dropped outright
            if start > 0 && self.pos < self.input.len() {
                self.push(TokenKind::Literal(Cow::Borrowed(" ")), line);
            }
        } else if self.options.is_preserve_eol() && self.peek("\n") {
            self.pos += 1;
            self.line += 1;
            self.push(TokenKind::Eol, line);
        } else {
            let start = self.pos;
            let mut saw_newline = false;
            while let Some(c) = self.peek_char() {
                match c {
                    ' ' | '\t' | '\r' => self.pos += 1,
                    '\n' if !self.options.is_preserve_eol() => {
                        saw_newline = true;
                        self.line += 1;
                        self.pos += 1;
                    }
                    _ => break,
                }
            }
            let text = &self.input[start..self.pos];
            let text = if saw_newline {
                Cow::Owned(text.replace("\r\n", " ").replace('\n', " "))
            } else {
                Cow::Borrowed(text)
            };
            self.push(TokenKind::Literal(text), line);
        }
    }

    /// A connective at a branch head. Returns false (consuming nothing)
    /// when the head starts with an ordinary word, which also closes the
    /// head so later connectives stay literal.
    fn try_prefix(&mut self) -> bool {
        let rest = &self.input[self.pos..];
        let word_len = if rest.starts_with(',') {
            1
        } else if starts_with_keyword(rest, "AND") {
            3
        } else if starts_with_keyword(rest, "OR") {
            2
        } else {
            self.prefix_scan = PrefixScan::None;
            return false;
        };
        let line = self.line;
        let mut end = self.pos + word_len;
        if self.prefix_scan == PrefixScan::Block {
            end += self.input[end..]
                .bytes()
                .take_while(|&b| b == b' ' || b == b'\t')
                .count();
        }
        let text = &self.input[self.pos..end];
        self.pos = end;
        let text = if self.options.is_compact_mode() && text.len() > word_len + 1 {
            Cow::Owned(format!("{} ", &text[..word_len]))
        } else {
            Cow::Borrowed(text)
        };
        self.push(TokenKind::Prefix(text), line);
        true
    }

    fn scan_quoted(&mut self) {
        let line = self.line;
        let start = self.pos;
        if let Some(len) = quoted_len(&self.input[start..]) {
            let text = &self.input[start..start + len];
            self.line += text.matches('\n').count();
            self.pos += len;
            self.push(TokenKind::Literal(Cow::Borrowed(text)), line);
        } else {
            // a lone quote is just text
            self.pos += 1;
            self.push(TokenKind::Literal(Cow::Borrowed("'")), line);
        }
    }

    fn scan_literal(&mut self) {
        let line = self.line;
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_whitespace() || c == '?' || c == '\'' {
                break;
            }
            if self.peek("/*") || self.peek("#*") {
                break;
            }
            if self.pos > start && self.peek_else_marker().is_some() {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.push(
            TokenKind::Literal(Cow::Borrowed(&self.input[start..self.pos])),
            line,
        );
    }

    fn scan_comment(&mut self) -> Result<(), ParseError> {
        let open_line = self.line;
        let start = self.pos;
        let closer = if self.peek("/*") { "*/" } else { "*#" };
        let body_start = start + 2;
        let Some(idx) = self.input[body_start..].find(closer) else {
            return Err(self.error_at(open_line, ParseErrorKind::UnterminatedComment));
        };
        let body = &self.input[body_start..body_start + idx];
        let end = body_start + idx + 2;

        // an opener followed by whitespace, or a block spanning lines, is
        // an ordinary comment rather than a directive
        let is_ordinary = body.is_empty()
            || body
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_whitespace())
            || body.contains('\n');
        if is_ordinary {
            let text = &self.input[start..end];
            self.line += text.matches('\n').count();
            self.pos = end;
            if self.options.is_preserve_comment() {
                self.push(TokenKind::Literal(Cow::Borrowed(text)), open_line);
            } else {
                self.push(TokenKind::Comment(text), open_line);
            }
            return Ok(());
        }

        self.pos = end;
        if let Some(expression) = body.strip_prefix('$') {
            let expression = expression.trim();
            self.consume_placeholder(expression, open_line, false)?;
            self.push(TokenKind::Embed(expression), open_line);
            return Ok(());
        }

        let word = body.trim_end();
        if word.eq_ignore_ascii_case("BEGIN") {
            self.push(TokenKind::Begin, open_line);
        } else if word.eq_ignore_ascii_case("END") {
            self.push(TokenKind::End, open_line);
        } else if word.len() > 2
            && word[..2].eq_ignore_ascii_case("IF")
            && word.as_bytes()[2].is_ascii_whitespace()
        {
            self.push(TokenKind::If(word[2..].trim()), open_line);
        } else {
            let expression = body.trim();
            let paren = self.consume_placeholder(expression, open_line, true)?;
            self.push(TokenKind::Bind { expression, paren }, open_line);
        }
        Ok(())
    }

    /// Consumes the sample placeholder immediately after a directive: a
    /// quoted string, a parenthesized list, or a bare token. Returns
    /// whether it was parenthesized.
    fn consume_placeholder(
        &mut self,
        expression: &str,
        line: usize,
        required: bool,
    ) -> Result<bool, ParseError> {
        let rest = &self.input[self.pos..];
        match rest.chars().next() {
            Some('(') => {
                let Some(i) = rest.find(')') else {
                    return Err(self.error_at(
                        line,
                        ParseErrorKind::UnterminatedPlaceholder {
                            expression: expression.to_string(),
                        },
                    ));
                };
                self.line += rest[..=i].matches('\n').count();
                self.pos += i + 1;
                Ok(true)
            }
            Some('\'') => {
                let Some(len) = quoted_len(rest) else {
                    return Err(self.error_at(
                        line,
                        ParseErrorKind::UnterminatedPlaceholder {
                            expression: expression.to_string(),
                        },
                    ));
                };
                self.line += rest[..len].matches('\n').count();
                self.pos += len;
                Ok(false)
            }
            _ => {
                let len = Self::bare_placeholder_len(rest);
                if len == 0 {
                    if required {
                        return Err(self.error_at(
                            line,
                            ParseErrorKind::MissingPlaceholder {
                                expression: expression.to_string(),
                            },
                        ));
                    }
                    return Ok(false);
                }
                self.pos += len;
                Ok(false)
            }
        }
    }

    /// Byte length of a bare placeholder token at the start of `s`: stops
    /// at whitespace, punctuation that can follow a value, a quote, or the
    /// start of a comment or `--`.
    fn bare_placeholder_len(s: &str) -> usize {
        let mut len = 0;
        for c in s.chars() {
            if c.is_ascii_whitespace() || matches!(c, ',' | '(' | ')' | ';' | '?' | '\'') {
                break;
            }
            let rest = &s[len..];
            if rest.starts_with("/*") || rest.starts_with("#*") || rest.starts_with("--") {
                break;
            }
            len += c.len_utf8();
        }
        len
    }
}
