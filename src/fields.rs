//! Partial-update field selection and `SET` clause construction.
//!
//! Every repository funnels its `update` path through [`build_set_clause`]:
//! the caller-supplied fields are checked against an explicit allow-list
//! mapping logical field names to physical column names, and rendered as a
//! parameterized fragment. Column names are never derived from caller input,
//! and unknown fields are rejected rather than ignored.

use rust_decimal::Decimal;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo};
use sqlx::{Encode, Postgres, Type};

use crate::error::{Result, StoreError};

/// A typed bind value for a partial update.
///
/// The route layer validates request shape before the core is invoked, so by
/// the time a value reaches a repository it is already one of these. Keeping
/// the type explicit keeps the Postgres parameter types correct.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Decimal(Decimal),
}

impl SqlValue {
    /// Coerce to a strict boolean.
    ///
    /// Checkbox-style inputs arrive as strings; `"true"` must persist as
    /// boolean `true`, not as a truthy string.
    pub fn truthy(&self) -> bool {
        match self {
            SqlValue::Bool(b) => *b,
            SqlValue::Text(s) => {
                let t = s.trim();
                !t.is_empty() && !t.eq_ignore_ascii_case("false")
            }
            SqlValue::Int(n) => *n != 0,
            SqlValue::Decimal(d) => !d.is_zero(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

/// A caller-supplied partial update, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    fields: Vec<(String, SqlValue)>,
}

impl FieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert a field, replacing any earlier value for the same field in
    /// place (the field keeps its original position).
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Remove a field, returning its value if present.
    pub fn remove(&mut self, field: &str) -> Option<SqlValue> {
        let idx = self.fields.iter().position(|(f, _)| f == field)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v))
    }
}

/// A rendered `SET` fragment plus its bind values, in matching order.
///
/// The fragment references `$1..$n`; the caller appends its own `WHERE` key
/// at [`SetClause::next_index`] and executes the statement itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub fragment: String,
    pub binds: Vec<SqlValue>,
}

impl SetClause {
    /// Positional index for the next bind after the update values,
    /// conventionally the `WHERE` key.
    pub fn next_index(&self) -> usize {
        self.binds.len() + 1
    }
}

/// Build a parameterized `SET` clause from a partial update.
///
/// `allowed` maps each updatable logical field to its physical column. Every
/// requested field must appear in `allowed`; an unknown field or an empty
/// update fails with [`StoreError::InvalidUpdate`]. Fields are rendered in
/// insertion order, each as `"<column>" = $<n>` with `n` counting from 1,
/// and `binds` carries the values in the same order.
pub fn build_set_clause(updates: &FieldUpdates, allowed: &[(&str, &str)]) -> Result<SetClause> {
    if updates.is_empty() {
        return Err(StoreError::InvalidUpdate("no fields to update".into()));
    }

    let mut fragment = String::new();
    let mut binds = Vec::with_capacity(updates.len());

    for (field, value) in updates.iter() {
        let column = allowed
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
            .ok_or_else(|| StoreError::InvalidUpdate(format!("field not updatable: {field}")))?;

        if !binds.is_empty() {
            fragment.push_str(", ");
        }
        fragment.push_str(&format!("\"{}\" = ${}", column, binds.len() + 1));
        binds.push(value.clone());
    }

    Ok(SetClause { fragment, binds })
}

/// A [`SqlValue`] binds as the wire type of its variant, so the rendered
/// clause can be fed to `query.bind(..)` value by value.
impl<'q> Encode<'q, Postgres> for SqlValue {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> std::result::Result<IsNull, BoxDynError> {
        match self {
            SqlValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf),
            SqlValue::Int(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            SqlValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            SqlValue::Decimal(d) => <Decimal as Encode<Postgres>>::encode_by_ref(d, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            SqlValue::Text(_) => <String as Type<Postgres>>::type_info(),
            SqlValue::Int(_) => <i64 as Type<Postgres>>::type_info(),
            SqlValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            SqlValue::Decimal(_) => <Decimal as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for SqlValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(_: &PgTypeInfo) -> bool {
        // the per-value type comes from `produces`
        true
    }
}
