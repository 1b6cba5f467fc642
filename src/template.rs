use crate::ast::Node;
use crate::error::{EvalError, ParseError};
use crate::interface::{Params, ParseOptions};
use crate::lexer::tokenize;
use crate::merge::{MergeContext, MergeResult};
use crate::parser::parse;

/// A parsed two-way SQL template.
///
/// The template text is executable SQL as written: every directive hides
/// inside a comment, and the sample placeholders next to the directives
/// make the raw text runnable in a SQL console. Parsing happens once;
/// merging the immutable template with different parameters is cheap and
/// can happen from many threads at once.
///
/// # Examples
///
/// ```
/// use twoway_sql::{Params, Template};
///
/// let template = Template::parse(
///     "SELECT * FROM emp WHERE job = /*ctx[:job]*/'CLERK'",
/// )?;
///
/// let mut params = Params::new();
/// params.set("job", "MANAGER");
/// let result = template.merge(&params)?;
///
/// assert_eq!(result.sql(), "SELECT * FROM emp WHERE job = ?");
/// assert_eq!(result.bound_values().len(), 1);
/// # Ok::<(), twoway_sql::TwoWaySqlError>(())
/// ```
///
/// Conditional fragments collapse when their data is absent:
///
/// ```
/// use twoway_sql::{Params, Template};
///
/// let template = Template::parse(
///     "SELECT * FROM emp/*BEGIN*/ WHERE /*IF ctx[:job]*/job = /*ctx[:job]*/'CLERK'/*END*//*END*/",
/// )?;
///
/// let result = template.merge(&Params::new())?;
/// assert_eq!(result.sql(), "SELECT * FROM emp");
/// # Ok::<(), twoway_sql::TwoWaySqlError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Node,
}

impl Template {
    /// Parses template text with default [`ParseOptions`].
    pub fn parse(sql: &str) -> Result<Self, ParseError> {
        Self::parse_with(sql, ParseOptions::new())
    }

    /// Parses template text with explicit options.
    ///
    /// # Examples
    ///
    /// ```
    /// use twoway_sql::{Params, ParseOptions, Template};
    ///
    /// let template = Template::parse_with(
    ///     "SELECT *\n  FROM emp\n",
    ///     ParseOptions::new().compact_mode(true),
    /// )?;
    /// assert_eq!(template.merge(&Params::new())?.sql(), "SELECT * FROM emp");
    /// # Ok::<(), twoway_sql::TwoWaySqlError>(())
    /// ```
    pub fn parse_with(sql: &str, options: ParseOptions) -> Result<Self, ParseError> {
        let tokens = tokenize(sql, options)?;
        let root = parse(sql, &tokens)?;
        Ok(Self { root })
    }

    /// Merges the template with `params`, producing placeholder SQL and
    /// the values bound to it.
    ///
    /// Keys the template references but `params` lacks read as null: a
    /// dead `IF` condition, or a null bind where a placeholder fires
    /// unconditionally.
    pub fn merge(&self, params: &Params) -> Result<MergeResult, EvalError> {
        let mut ctx = MergeContext::new(params);
        self.root.evaluate(&mut ctx)?;
        Ok(ctx.into_result())
    }
}
