use std::collections::BTreeMap;

use crate::value::Value;

/// Options controlling how template text is tokenized.
///
/// # Examples
///
/// ```
/// use twoway_sql::ParseOptions;
///
/// let options = ParseOptions::new().compact_mode(true);
/// assert!(options.is_compact_mode());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseOptions {
    preserve_eol: bool,
    compact_mode: bool,
    preserve_comment: bool,
}

impl ParseOptions {
    /// Default options: newlines preserved, whitespace kept verbatim,
    /// ordinary comments dropped.
    pub const fn new() -> Self {
        Self {
            preserve_eol: true,
            compact_mode: false,
            preserve_comment: false,
        }
    }

    /// When `true` (the default) every newline in the template comes back
    /// out of a merge as `\n`. When `false`, newlines fold into the
    /// surrounding whitespace as a single space.
    #[must_use]
    pub const fn preserve_eol(mut self, preserve: bool) -> Self {
        self.preserve_eol = preserve;
        self
    }

    /// Collapse every maximal whitespace run (spaces, tabs, newlines) to a
    /// single space, dropping runs that touch the start or end of the
    /// input. Useful when the merged SQL is logged on one line.
    #[must_use]
    pub const fn compact_mode(mut self, compact: bool) -> Self {
        self.compact_mode = compact;
        self
    }

    /// Keep ordinary (non-directive) comments in the merged output instead
    /// of dropping them.
    #[must_use]
    pub const fn preserve_comment(mut self, preserve: bool) -> Self {
        self.preserve_comment = preserve;
        self
    }

    pub const fn is_preserve_eol(&self) -> bool {
        self.preserve_eol
    }

    pub const fn is_compact_mode(&self) -> bool {
        self.compact_mode
    }

    pub const fn is_preserve_comment(&self) -> bool {
        self.preserve_comment
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A key in the merge parameters.
///
/// `ctx[:job]`, `ctx['job']` and `ctx["job"]` all address `Name("job")`;
/// `ctx[1]` and the first bare `?` both address `Index(1)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Name(String),
    Index(i64),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for ParamKey {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

/// The data a template is merged against.
///
/// Keys that a template references but the caller never set look up as
/// [`Value::Null`]: a dead `/*IF*/` condition rather than an error, and a
/// null bind where a placeholder still fires.
///
/// # Examples
///
/// ```
/// use twoway_sql::{Params, Value};
///
/// let mut params = Params::new();
/// params.set("job", "CLERK").set("deptno", 20);
/// assert_eq!(params.get_name("job"), Some(&Value::from("CLERK")));
/// assert!(params.get_name("missing").is_none());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    data: BTreeMap<ParamKey, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Set a named parameter, as addressed by `ctx[:name]` / `ctx['name']`.
    /// Chainable.
    pub fn set<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) -> &mut Self {
        self.data.insert(ParamKey::Name(name.into()), value.into());
        self
    }

    /// Set an integer-keyed parameter, as addressed by `ctx[n]` or the
    /// n-th bare `?` (1-based). Chainable.
    pub fn set_index<V: Into<Value>>(&mut self, index: i64, value: V) -> &mut Self {
        self.data.insert(ParamKey::Index(index), value.into());
        self
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_name(&self, name: &str) -> Option<&Value> {
        self.data.get(&ParamKey::Name(name.to_string()))
    }

    pub fn get_index(&self, index: i64) -> Option<&Value> {
        self.data.get(&ParamKey::Index(index))
    }

    /// Lookup that applies the missing-key rule: absent keys are `Null`.
    pub(crate) fn lookup(&self, key: &ParamKey) -> Value {
        self.data.get(key).cloned().unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
