//! Backend-neutral write operations and atomic mutation batches.
//!
//! Repositories never write anything themselves. They translate aggregates and
//! outbox events into [`WriteOp`]s, which the orchestration collects into one
//! [`MutationBatch`] and hands to a [`crate::committer::Committer`] to apply as a
//! single all-or-nothing unit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::store::StoreError;

/// Storage type of a column (needed to bind typed NULLs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Timestamp,
    Json,
}

/// Static description of a table: name, key column, and typed columns.
#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub key_column: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
}

impl TableSchema {
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| *kind)
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Text(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Int(value)
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(value: DateTime<Utc>) -> Self {
        ColumnValue::Timestamp(value)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ColumnValue::Null)
    }
}

/// Ordered column -> value map (a full row, or the changed subset of one).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<&'static str, ColumnValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<ColumnValue>) {
        self.columns.insert(column, value.into());
    }

    pub fn with(mut self, column: &'static str, value: impl Into<ColumnValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ColumnValue)> {
        self.columns.iter().map(|(k, v)| (*k, v))
    }

    /// Overwrite this row's columns with those of `changes`.
    pub fn merge(&mut self, changes: &Row) {
        for (column, value) in changes.iter() {
            self.columns.insert(column, value.clone());
        }
    }

    pub fn text(&self, column: &'static str) -> Result<&str, StoreError> {
        match self.get(column) {
            Some(ColumnValue::Text(v)) => Ok(v),
            other => Err(StoreError::column(column, "text", other)),
        }
    }

    pub fn int(&self, column: &'static str) -> Result<i64, StoreError> {
        match self.get(column) {
            Some(ColumnValue::Int(v)) => Ok(*v),
            other => Err(StoreError::column(column, "int", other)),
        }
    }

    pub fn timestamp(&self, column: &'static str) -> Result<DateTime<Utc>, StoreError> {
        match self.get(column) {
            Some(ColumnValue::Timestamp(v)) => Ok(*v),
            other => Err(StoreError::column(column, "timestamp", other)),
        }
    }

    pub fn json(&self, column: &'static str) -> Result<&JsonValue, StoreError> {
        match self.get(column) {
            Some(ColumnValue::Json(v)) => Ok(v),
            other => Err(StoreError::column(column, "json", other)),
        }
    }

    pub fn opt_int(&self, column: &'static str) -> Result<Option<i64>, StoreError> {
        match self.get(column) {
            None | Some(ColumnValue::Null) => Ok(None),
            Some(ColumnValue::Int(v)) => Ok(Some(*v)),
            other => Err(StoreError::column(column, "int or null", other)),
        }
    }

    pub fn opt_timestamp(&self, column: &'static str) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.get(column) {
            None | Some(ColumnValue::Null) => Ok(None),
            Some(ColumnValue::Timestamp(v)) => Ok(Some(*v)),
            other => Err(StoreError::column(column, "timestamp or null", other)),
        }
    }
}

/// One targeted write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a full row; fails the batch if the key already exists.
    Insert {
        table: &'static TableSchema,
        key: String,
        row: Row,
    },
    /// Overwrite the given columns of an existing row; fails the batch if the
    /// row does not exist.
    Update {
        table: &'static TableSchema,
        key: String,
        changes: Row,
    },
}

impl WriteOp {
    pub fn table(&self) -> &'static TableSchema {
        match self {
            WriteOp::Insert { table, .. } | WriteOp::Update { table, .. } => table,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            WriteOp::Insert { key, .. } | WriteOp::Update { key, .. } => key,
        }
    }
}

impl PartialEq for TableSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Ordered set of writes applied atomically by a committer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationBatch {
    ops: Vec<WriteOp>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
