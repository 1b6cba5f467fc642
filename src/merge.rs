//! Output assembly for a merge.
//!
//! A [`MergeContext`] accumulates SQL text and bound values as the tree is
//! walked. `/*BEGIN*/` blocks run against a forked child context that
//! starts inactive; the child's output only splices into the parent if one
//! of its `IF` branches fired, which is what makes an all-dead `WHERE`
//! block vanish as a unit.

use crate::interface::Params;
use crate::value::Value;

/// The outcome of merging a template with parameters: SQL with `?`
/// placeholders and the values bound to them, in placeholder order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    sql: String,
    bound_values: Vec<Value>,
}

impl MergeResult {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bound_values(&self) -> &[Value] {
        &self.bound_values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.bound_values)
    }
}

pub(crate) struct MergeContext<'a> {
    params: &'a Params,
    sql: String,
    bound_values: Vec<Value>,
    active: bool,
}

impl<'a> MergeContext<'a> {
    /// The root context starts active: top-level connectives and prefixes
    /// are emitted as written.
    pub(crate) fn new(params: &'a Params) -> Self {
        Self {
            params,
            sql: String::new(),
            bound_values: Vec::new(),
            active: true,
        }
    }

    pub(crate) const fn params(&self) -> &'a Params {
        self.params
    }

    pub(crate) fn push_sql(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Emit one `?` and bind `value` to it.
    pub(crate) fn push_value(&mut self, value: Value) {
        self.sql.push('?');
        self.bound_values.push(value);
    }

    /// Emit `?, ?, ...` for `values`, binding each in order.
    pub(crate) fn push_values(&mut self, values: Vec<Value>) {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_value(value);
        }
    }

    pub(crate) const fn is_active(&self) -> bool {
        self.active
    }

    /// Mark the context live. An `IF` branch that ran calls this after its
    /// body, so the branch itself still sees the pre-branch state when
    /// deciding whether to emit its own connective prefix.
    pub(crate) const fn activate(&mut self) {
        self.active = true;
    }

    /// Child context for a `/*BEGIN*/` body. Starts inactive.
    pub(crate) fn fork_child(&self) -> Self {
        Self {
            params: self.params,
            sql: String::new(),
            bound_values: Vec::new(),
            active: false,
        }
    }

    /// Splice a finished child's output into this context.
    pub(crate) fn join_child(&mut self, child: Self) {
        self.sql.push_str(&child.sql);
        self.bound_values.extend(child.bound_values);
    }

    pub(crate) fn into_result(self) -> MergeResult {
        MergeResult {
            sql: self.sql,
            bound_values: self.bound_values,
        }
    }
}
