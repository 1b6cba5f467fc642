pub type TwoWaySqlResult<T> = std::result::Result<T, TwoWaySqlError>;

/// The text of the 1-indexed `line` of `input`, for error context.
pub(crate) fn source_line(input: &str, line: usize) -> Option<String> {
    input
        .lines()
        .nth(line.saturating_sub(1))
        .map(str::to_string)
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A `/*` or `#*` opener with no matching closer before end of input.
    UnterminatedComment,
    /// A bind or embed directive whose sample placeholder starts a quoted
    /// string or parenthesized list that never closes.
    UnterminatedPlaceholder {
        expression: String,
    },
    /// A bind directive with no sample placeholder immediately after it.
    MissingPlaceholder {
        expression: String,
    },
    /// An `/*END*/` with no open `/*IF*/` or `/*BEGIN*/` block.
    UnmatchedEnd,
    /// An `--ELSE` outside an `/*IF*/` block, or a second one inside it.
    UnexpectedElse,
    /// An `/*IF*/` or `/*BEGIN*/` block still open at end of input.
    UnclosedBlock {
        directive: String,
    },
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedComment => {
                write!(f, "comment opened but never closed")
            }
            Self::UnterminatedPlaceholder { expression } => {
                write!(f, "unterminated placeholder after '{}'", expression)
            }
            Self::MissingPlaceholder { expression } => {
                write!(
                    f,
                    "bind directive '{}' has no sample placeholder",
                    expression
                )
            }
            Self::UnmatchedEnd => {
                write!(f, "END with no matching IF or BEGIN")
            }
            Self::UnexpectedElse => {
                write!(f, "ELSE outside an IF block")
            }
            Self::UnclosedBlock { directive } => {
                write!(f, "{} block opened but never closed", directive)
            }
        }
    }
}

impl std::error::Error for ParseErrorKind {}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    /// 1-indexed line number the error is attributed to. For a block
    /// imbalance this is the line of the open block, not the line where
    /// scanning happened to stop.
    pub line: usize,
    /// The text of that source line, when the input has one.
    pub context: Option<String>,
    pub kind: ParseErrorKind,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "syntax error. line:[{}]. {}", self.line, self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " near: {}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    /// The expression does not start with `ctx[...]` or a boolean literal.
    UnknownIdentifier,
    /// The key between the brackets is not a symbol, quoted string, or
    /// integer.
    InvalidKey,
    /// A method other than `.size` / `.length` was applied.
    UnknownMethod {
        method: String,
    },
    /// `.size` / `.length` applied to a value that has no element count.
    InvalidSizeReceiver,
    /// Trailing garbage, or an unclosed bracket or quote.
    Malformed,
}

impl std::fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownIdentifier => {
                write!(f, "expected 'ctx[...]', 'true' or 'false'")
            }
            Self::InvalidKey => {
                write!(f, "key must be a symbol, quoted string, or integer")
            }
            Self::UnknownMethod { method } => {
                write!(f, "unknown method '.{}'", method)
            }
            Self::InvalidSizeReceiver => {
                write!(f, "size is only defined for sequences and text")
            }
            Self::Malformed => {
                write!(f, "malformed expression")
            }
        }
    }
}

impl std::error::Error for EvalErrorKind {}

/// An expression inside a directive could not be evaluated against the
/// merge parameters. Terminal for the merge that hit it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvalError {
    pub expression: String,
    pub kind: EvalErrorKind,
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot evaluate '{}': {}", self.expression, self.kind)
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TwoWaySqlError {
    Parse(ParseError),
    Eval(EvalError),
}

impl std::fmt::Display for TwoWaySqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(parse_error) => {
                write!(f, "{}", parse_error)
            }
            Self::Eval(eval_error) => {
                write!(f, "{}", eval_error)
            }
        }
    }
}

impl std::error::Error for TwoWaySqlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(parse_error) => Some(parse_error),
            Self::Eval(eval_error) => Some(eval_error),
        }
    }
}

impl From<ParseError> for TwoWaySqlError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<EvalError> for TwoWaySqlError {
    fn from(error: EvalError) -> Self {
        Self::Eval(error)
    }
}
