use crate::error::EvalError;
use crate::eval::evaluate;
use crate::interface::ParamKey;
use crate::merge::MergeContext;
use crate::value::Value;

/// A parsed template node. The tree is immutable after parsing; merging
/// only reads it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Root(Vec<Node>),
    /// Verbatim SQL text.
    Literal(String),
    /// A preserved newline.
    Eol,
    /// An ordinary comment. Emits nothing.
    Comment(String),
    /// `/*expr*/placeholder` - emits `?` and binds the value.
    BindVariable(String),
    /// `/*expr*/(...)` - emits a parenthesized `?` list for a sequence,
    /// a plain `?` for a scalar, and nothing at all for null or an empty
    /// sequence.
    ParenBindVariable(String),
    /// `/*$expr*/` - substitutes the value's display form as raw text.
    EmbedVariable(String),
    /// A bare `?`, bound from the n-th integer key.
    Positional(i64),
    If {
        condition: String,
        true_branch: Vec<Node>,
        false_branch: Option<Vec<Node>>,
    },
    Begin {
        body: Vec<Node>,
    },
    /// A branch body led by a detachable connective (`AND` / `OR` / `,`).
    /// The prefix is only emitted when the context is already active.
    SubStatement {
        prefix: String,
        body: Vec<Node>,
    },
}

impl Node {
    pub(crate) fn evaluate(&self, ctx: &mut MergeContext<'_>) -> Result<(), EvalError> {
        match self {
            Self::Root(children) => {
                for child in children {
                    child.evaluate(ctx)?;
                }
            }
            Self::Literal(text) => ctx.push_sql(text),
            Self::Eol => ctx.push_sql("\n"),
            Self::Comment(_) => {}
            Self::BindVariable(expression) => {
                let value = evaluate(expression, ctx.params())?;
                ctx.push_value(value);
            }
            Self::ParenBindVariable(expression) => {
                match evaluate(expression, ctx.params())? {
                    Value::Null => {}
                    Value::Seq(items) => {
                        if !items.is_empty() {
                            ctx.push_sql("(");
                            ctx.push_values(items);
                            ctx.push_sql(")");
                        }
                    }
                    scalar @ (Value::Bool(_)
                    | Value::Int(_)
                    | Value::Float(_)
                    | Value::Text(_)) => ctx.push_value(scalar),
                }
            }
            Self::EmbedVariable(expression) => {
                let value = evaluate(expression, ctx.params())?;
                if !value.is_null() {
                    ctx.push_sql(&value.to_string());
                }
            }
            Self::Positional(index) => {
                let value = ctx.params().lookup(&ParamKey::Index(*index));
                ctx.push_value(value);
            }
            Self::If {
                condition,
                true_branch,
                false_branch,
            } => {
                if evaluate(condition, ctx.params())?.is_truthy() {
                    for child in true_branch {
                        child.evaluate(ctx)?;
                    }
                    // activation happens after the branch so the branch's
                    // own prefix still sees the pre-branch state
                    ctx.activate();
                } else if let Some(false_branch) = false_branch {
                    for child in false_branch {
                        child.evaluate(ctx)?;
                    }
                    ctx.activate();
                }
            }
            Self::Begin { body } => {
                let mut child_ctx = ctx.fork_child();
                for child in body {
                    child.evaluate(&mut child_ctx)?;
                }
                if child_ctx.is_active() {
                    ctx.join_child(child_ctx);
                }
            }
            Self::SubStatement { prefix, body } => {
                if ctx.is_active() {
                    ctx.push_sql(prefix);
                }
                for child in body {
                    child.evaluate(ctx)?;
                }
            }
        }
        Ok(())
    }
}
