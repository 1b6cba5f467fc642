//! Two-way SQL templating.
//!
//! A two-way SQL template is runnable SQL: directives live inside comments
//! (`/*ctx[:job]*/`, `/*IF ...*/`, `/*BEGIN*/`, `--ELSE`) next to sample
//! values, so the same text works pasted into a SQL console and merged
//! with real parameters. Merging produces placeholder SQL plus the bound
//! values in placeholder order.
//!
//! See [`Template`] for usage examples.

mod ast;
mod error;
mod eval;
mod interface;
mod lexer;
mod merge;
mod parser;
mod template;
mod value;

// Public exports.
pub use error::{
    EvalError, EvalErrorKind, ParseError, ParseErrorKind, TwoWaySqlError, TwoWaySqlResult,
};
pub use interface::{ParamKey, Params, ParseOptions};
pub use merge::MergeResult;
pub use template::Template;
pub use value::Value;
