//! Builds the node tree from the token stream, matching `IF` / `BEGIN`
//! blocks to their `END`s and attributing imbalances to useful lines.

use crate::ast::Node;
use crate::error::{ParseError, ParseErrorKind, source_line};
use crate::lexer::{Token, TokenKind};

type ParseResult<T> = Result<T, ParseError>;

/// Which construct the statement list being parsed belongs to. Decides
/// where an `--ELSE` or `/*END*/` is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    Root,
    IfTrue,
    IfFalse,
    Begin,
}

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    directive: &'static str,
    line: usize,
}

pub(crate) fn parse(input: &str, tokens: &[Token<'_>]) -> ParseResult<Node> {
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        open_blocks: Vec::new(),
        last_closed: None,
    };
    let children = parser.parse_statements(BranchKind::Root)?;
    Ok(Node::Root(children))
}

struct Parser<'a, 'b> {
    input: &'b str,
    tokens: &'b [Token<'a>],
    pos: usize,
    /// Innermost-last stack of blocks still waiting for their `END`.
    open_blocks: Vec<OpenBlock>,
    /// The block most recently closed, for attributing a stray `END`.
    last_closed: Option<OpenBlock>,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn peek(&self) -> Option<&'b Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn error_at(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line,
            context: source_line(self.input, line),
            kind,
        }
    }

    /// The line a block imbalance is pinned to: the innermost open block
    /// if there is one, otherwise the most recently closed block,
    /// otherwise the offending token itself.
    fn imbalance_line(&self, token_line: usize) -> usize {
        self.open_blocks
            .last()
            .or(self.last_closed.as_ref())
            .map_or(token_line, |block| block.line)
    }

    fn parse_statements(&mut self, branch: BranchKind) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                if branch == BranchKind::Root {
                    return Ok(nodes);
                }
                let (line, directive) = self
                    .open_blocks
                    .last()
                    .map_or((1, "IF"), |block| (block.line, block.directive));
                return Err(self.error_at(
                    line,
                    ParseErrorKind::UnclosedBlock {
                        directive: directive.to_string(),
                    },
                ));
            };
            match &token.kind {
                TokenKind::End => {
                    if branch == BranchKind::Root {
                        let line = self.imbalance_line(token.line);
                        return Err(self.error_at(line, ParseErrorKind::UnmatchedEnd));
                    }
                    // not consumed; the block owner closes it
                    return Ok(nodes);
                }
                TokenKind::Else => match branch {
                    BranchKind::IfTrue => return Ok(nodes),
                    BranchKind::Root => {
                        return Err(self.error_at(token.line, ParseErrorKind::UnexpectedElse));
                    }
                    BranchKind::IfFalse | BranchKind::Begin => {
                        let line = self.imbalance_line(token.line);
                        return Err(self.error_at(line, ParseErrorKind::UnexpectedElse));
                    }
                },
                TokenKind::If(condition) => {
                    let condition = (*condition).to_string();
                    let line = token.line;
                    self.pos += 1;
                    nodes.push(self.parse_if(condition, line)?);
                }
                TokenKind::Begin => {
                    let line = token.line;
                    self.pos += 1;
                    self.open_blocks.push(OpenBlock {
                        directive: "BEGIN",
                        line,
                    });
                    let body = self.parse_statements(BranchKind::Begin)?;
                    self.close_block()?;
                    nodes.push(Node::Begin { body });
                }
                TokenKind::Prefix(prefix) => {
                    let prefix = prefix.to_string();
                    self.pos += 1;
                    // the rest of this branch becomes the prefixed body
                    let body = self.parse_statements(branch)?;
                    nodes.push(Node::SubStatement { prefix, body });
                }
                TokenKind::Literal(text) => {
                    nodes.push(Node::Literal(text.to_string()));
                    self.pos += 1;
                }
                TokenKind::Eol => {
                    nodes.push(Node::Eol);
                    self.pos += 1;
                }
                TokenKind::Comment(text) => {
                    nodes.push(Node::Comment((*text).to_string()));
                    self.pos += 1;
                }
                TokenKind::Bind { expression, paren } => {
                    let expression = (*expression).to_string();
                    nodes.push(if *paren {
                        Node::ParenBindVariable(expression)
                    } else {
                        Node::BindVariable(expression)
                    });
                    self.pos += 1;
                }
                TokenKind::Embed(expression) => {
                    nodes.push(Node::EmbedVariable((*expression).to_string()));
                    self.pos += 1;
                }
                TokenKind::Question { index } => {
                    nodes.push(Node::Positional(*index));
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_if(&mut self, condition: String, line: usize) -> ParseResult<Node> {
        self.open_blocks.push(OpenBlock {
            directive: "IF",
            line,
        });
        let true_branch = self.parse_statements(BranchKind::IfTrue)?;
        let false_branch = if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Else)) {
            self.pos += 1;
            Some(self.parse_statements(BranchKind::IfFalse)?)
        } else {
            None
        };
        self.close_block()?;
        Ok(Node::If {
            condition,
            true_branch,
            false_branch,
        })
    }

    /// Consumes the `END` the just-finished branch stopped at.
    fn close_block(&mut self) -> ParseResult<()> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::End)) {
            self.pos += 1;
            if let Some(open) = self.open_blocks.pop() {
                self.last_closed = Some(open);
            }
            Ok(())
        } else {
            // branches only stop at END or fail first, so this is a
            // defensive path
            let (line, directive) = self
                .open_blocks
                .last()
                .map_or((1, "IF"), |block| (block.line, block.directive));
            Err(self.error_at(
                line,
                ParseErrorKind::UnclosedBlock {
                    directive: directive.to_string(),
                },
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::ParseOptions;
    use crate::lexer::tokenize;

    fn parse_sql(sql: &str) -> ParseResult<Node> {
        let tokens = tokenize(sql, ParseOptions::new())?;
        parse(sql, &tokens)
    }

    #[test]
    #[ntest::timeout(100)]
    fn flat_sql_parses_to_literals() {
        let root = parse_sql("SELECT 1").expect("parse failed");
        let Node::Root(children) = root else {
            panic!("not a root");
        };
        assert!(children
            .iter()
            .all(|n| matches!(n, Node::Literal(_) | Node::Eol)));
    }

    #[test]
    #[ntest::timeout(100)]
    fn if_with_else_builds_both_branches() {
        let root = parse_sql("/*IF ctx[:a]*/x--ELSE y/*END*/").expect("parse failed");
        let Node::Root(children) = root else {
            panic!("not a root");
        };
        let Some(Node::If {
            condition,
            true_branch,
            false_branch,
        }) = children.first()
        else {
            panic!("expected an IF, got {:?}", children);
        };
        assert_eq!(condition, "ctx[:a]");
        assert_eq!(true_branch, &[Node::Literal("x".to_string())]);
        assert_eq!(
            false_branch.as_deref(),
            Some(&[Node::Literal("y".to_string())][..])
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn prefix_wraps_the_rest_of_the_branch() {
        let root = parse_sql("/*IF ctx[:a]*/AND a = /*ctx[:a]*/1/*END*/").expect("parse failed");
        let Node::Root(children) = root else {
            panic!("not a root");
        };
        let Some(Node::If { true_branch, .. }) = children.first() else {
            panic!("expected an IF");
        };
        let Some(Node::SubStatement { prefix, body }) = true_branch.first() else {
            panic!("expected a sub-statement, got {:?}", true_branch);
        };
        assert_eq!(prefix, "AND ");
        assert!(body.contains(&Node::BindVariable("ctx[:a]".to_string())));
    }

    #[test]
    #[ntest::timeout(100)]
    fn lone_begin_is_unclosed() {
        let err = parse_sql("/*BEGIN*/").expect_err("should fail");
        assert_eq!(err.line, 1);
        assert_eq!(
            err.kind,
            ParseErrorKind::UnclosedBlock {
                directive: "BEGIN".to_string()
            }
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn unclosed_if_reports_the_innermost_block() {
        let err = parse_sql("/*BEGIN*/x\n/*IF ctx[:a]*/y").expect_err("should fail");
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            ParseErrorKind::UnclosedBlock {
                directive: "IF".to_string()
            }
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn stray_end_reports_the_recently_opened_block() {
        // the BEGIN opens on line 2; the second END on line 4 is stray
        let err = parse_sql("SELECT 1\n/*BEGIN*/\nWHERE /*IF ctx[:a]*/a=/*ctx[:a]*/1/*END*/\n/*END*//*END*/")
            .expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::UnmatchedEnd);
        assert_eq!(err.line, 2);
        assert_eq!(err.context.as_deref(), Some("/*BEGIN*/"));
    }

    #[test]
    #[ntest::timeout(100)]
    fn stray_end_with_no_blocks_reports_its_own_line() {
        let err = parse_sql("SELECT 1\n/*END*/").expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::UnmatchedEnd);
        assert_eq!(err.line, 2);
    }

    #[test]
    #[ntest::timeout(100)]
    fn else_outside_if_is_rejected() {
        let err = parse_sql("SELECT 1 --ELSE 2").expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedElse);
    }

    #[test]
    #[ntest::timeout(100)]
    fn else_inside_begin_is_rejected() {
        let err = parse_sql("/*BEGIN*/a--ELSE b/*END*/").expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedElse);
        assert_eq!(err.line, 1);
    }

    #[test]
    #[ntest::timeout(100)]
    fn second_else_is_rejected() {
        let err = parse_sql("/*IF ctx[:a]*/a--ELSE b--ELSE c/*END*/").expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedElse);
    }

    #[test]
    #[ntest::timeout(100)]
    fn nested_blocks_match_inside_out() {
        let root = parse_sql("/*BEGIN*/WHERE /*IF ctx[:a]*/a=/*ctx[:a]*/1/*END*//*END*/")
            .expect("parse failed");
        let Node::Root(children) = root else {
            panic!("not a root");
        };
        assert!(matches!(children.first(), Some(Node::Begin { .. })));
    }
}
