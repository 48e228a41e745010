//! Immutable SQL statements with positional parameters.

use std::borrow::Cow;

/// Advisory hint for prepared-statement reuse.
///
/// Drivers may use it to decide how long to cache a prepared handle; it
/// must never affect the result of executing the query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReuseHint {
    /// No reuse expected.
    #[default]
    None,
    /// The statement recurs within one transaction.
    PerTransaction,
    /// The statement recurs for the lifetime of the connection.
    PerConnection,
}

/// A scalar query parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Opaque driver-specific parameter type tag.
///
/// The engine never interprets it; it travels next to the parameter so the
/// driver can bind with an explicit type instead of inferring one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeTag(Cow<'static, str>);

impl TypeTag {
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    /// The empty tag: let the driver infer the bind type.
    pub const fn inferred() -> Self {
        Self(Cow::Borrowed(""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        Self::inferred()
    }
}

/// An immutable SQL statement with positional parameters and their type
/// tags (always the same arity; the builder pushes both together).
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
    types: Vec<TypeTag>,
    reuse_hint: ReuseHint,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            types: Vec::new(),
            reuse_hint: ReuseHint::None,
        }
    }

    /// Appends a parameter with an inferred bind type.
    pub fn param(self, value: impl Into<Value>) -> Self {
        self.param_typed(value, TypeTag::inferred())
    }

    /// Appends a parameter with an explicit driver type tag.
    pub fn param_typed(mut self, value: impl Into<Value>, tag: TypeTag) -> Self {
        self.params.push(value.into());
        self.types.push(tag);
        self
    }

    pub fn with_reuse_hint(mut self, hint: ReuseHint) -> Self {
        self.reuse_hint = hint;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn types(&self) -> &[TypeTag] {
        &self.types
    }

    pub fn reuse_hint(&self) -> ReuseHint {
        self.reuse_hint
    }
}
