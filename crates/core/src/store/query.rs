//! Parameterized statement execution with pluggable result shaping.
//!
//! A [`Query`] carries SQL text plus named bindings. List bindings are
//! expanded into one placeholder per value (`:ids` becomes `:ids__0, :ids__1`)
//! because SQLite has no array binding. Statements are prepared through the
//! connection's statement cache, keyed by the SQL text after expansion.
//!
//! Results are shaped by the method used to run the query:
//!
//! - [`Executor::for_each`] invokes a callback once per row
//! - [`Executor::rows`] returns a finite, single-pass [`Rows`] sequence
//! - [`Executor::column_array`] returns scalars for one column or records for many
//! - [`Executor::keyed`] maps a key column to its row, last row wins
//!
//! [`QueryExecutor`] runs the same operations on the shared async connection.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::types::{FromSql, Value, ValueRef};
use tokio_rusqlite::rusqlite::{self, ToSql, TransactionBehavior};

use super::connection::ArchiveDb;
use crate::Error;

/// A SQL statement with named parameter bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<(String, Value)>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), params: Vec::new() }
    }

    /// Bind a scalar value to `:name`.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.push((format!(":{}", bare_name(name)), value.into()));
        self
    }

    /// Bind a list of values to the `:name` placeholder.
    ///
    /// Every standalone occurrence of `:name` is rewritten to
    /// `:name__0, :name__1, ...` and each value is bound individually.
    /// Placeholders that merely share a prefix (`:names`, `:name_x`) and text
    /// inside string literals are left alone. An empty list expands to nothing,
    /// which SQLite accepts as `IN ()`.
    pub fn bind_list<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let name = bare_name(name);
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let placeholders: Vec<String> = (0..values.len()).map(|i| format!(":{name}__{i}")).collect();

        self.sql = expand_placeholder(&self.sql, name, &placeholders.join(", "));
        self.params.extend(placeholders.into_iter().zip(values));
        self
    }

    /// SQL text as it will be prepared.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters in binding order.
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    fn named_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

fn bare_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace each standalone `:name` token.
///
/// String literals, quoted identifiers and comments are copied through
/// untouched, so a quote inside a comment cannot hide later placeholders.
fn expand_placeholder(sql: &str, name: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(sql.len() + replacement.len());
    let mut rest = sql;

    while let Some(ch) = rest.chars().next() {
        let skip = match ch {
            '\'' | '"' | '`' => quoted_len(rest, ch),
            '-' if rest.starts_with("--") => rest.find('\n').map_or(rest.len(), |i| i + 1),
            '/' if rest.starts_with("/*") => rest[2..].find("*/").map_or(rest.len(), |i| i + 4),
            ':' => {
                if let Some(tail) = rest[1..].strip_prefix(name)
                    && !tail.starts_with(is_ident_char)
                {
                    out.push_str(replacement);
                    rest = tail;
                    continue;
                }
                1
            }
            _ => ch.len_utf8(),
        };
        out.push_str(&rest[..skip]);
        rest = &rest[skip..];
    }

    out
}

/// Byte length of the quoted token at the start of `rest`, quotes included.
///
/// A doubled quote inside the token is an escaped quote. An unterminated
/// token runs to the end of the text.
fn quoted_len(rest: &str, quote: char) -> usize {
    let mut chars = rest.char_indices().skip(1).peekable();
    while let Some((index, ch)) = chars.next() {
        if ch != quote {
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| *next == quote) {
            chars.next();
            continue;
        }
        return index + ch.len_utf8();
    }
    rest.len()
}

/// One materialized result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value of `column`, if the row has it.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|index| &self.values[index])
    }

    /// Typed value of `column`.
    pub fn get<T: FromSql>(&self, column: &str) -> Result<T, Error> {
        let value = self
            .value(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        T::column_result(ValueRef::from(value)).map_err(|e| Error::Decode(format!("{column}: {e}")))
    }

    fn project(&self, names: &Arc<[String]>) -> Result<Record, Error> {
        let values = names
            .iter()
            .map(|name| {
                self.value(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownColumn(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Record { columns: Arc::clone(names), values })
    }
}

/// Finite, single-pass sequence of result rows.
///
/// Iterating consumes the rows; running the query again is the only way to
/// observe them a second time.
#[derive(Debug)]
pub struct Rows {
    inner: std::vec::IntoIter<Record>,
}

impl Iterator for Rows {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Rows {}

/// Result of [`Executor::column_array`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnArray {
    /// One value per row when a single column was requested.
    Scalars(Vec<Value>),
    /// One record per row, restricted to the requested columns.
    Records(Vec<Record>),
}

impl ColumnArray {
    pub fn len(&self) -> usize {
        match self {
            ColumnArray::Scalars(values) => values.len(),
            ColumnArray::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key of a row in [`Executor::keyed`] results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Integer(i64),
    Text(String),
}

impl TryFrom<&Value> for RowKey {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(i) => Ok(RowKey::Integer(*i)),
            Value::Text(s) => Ok(RowKey::Text(s.clone())),
            other => Err(Error::InvalidInput(format!("cannot key rows by {other:?}"))),
        }
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        RowKey::Integer(value)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Text(value.to_string())
    }
}

/// Synchronous query runner bound to a connection or an open transaction.
///
/// Used on the database thread, either directly through
/// [`QueryExecutor::run`] or inside [`QueryExecutor::transaction`].
pub struct Executor<'c> {
    conn: &'c rusqlite::Connection,
}

impl<'c> Executor<'c> {
    pub fn new(conn: &'c rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Run a statement and return the number of affected rows.
    pub fn execute(&self, query: &Query) -> Result<usize, Error> {
        let mut stmt = self.conn.prepare_cached(query.sql())?;
        let changed = stmt.execute(query.named_params().as_slice())?;
        Ok(changed)
    }

    /// Invoke `f` once per result row, in result order.
    pub fn for_each<F>(&self, query: &Query, mut f: F) -> Result<(), Error>
    where
        F: FnMut(Record),
    {
        let mut stmt = self.conn.prepare_cached(query.sql())?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
        let params = query.named_params();
        let mut rows = stmt.query(params.as_slice())?;

        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|index| row.get::<_, Value>(index))
                .collect::<Result<Vec<_>, _>>()?;
            f(Record { columns: Arc::clone(&columns), values });
        }

        Ok(())
    }

    /// Materialize all rows into a single-pass sequence.
    pub fn rows(&self, query: &Query) -> Result<Rows, Error> {
        let mut records = Vec::new();
        self.for_each(query, |record| records.push(record))?;
        Ok(Rows { inner: records.into_iter() })
    }

    /// Return the named columns of every row, in result order.
    ///
    /// A single column yields [`ColumnArray::Scalars`]; several yield
    /// [`ColumnArray::Records`] containing just those columns.
    pub fn column_array(&self, query: &Query, columns: &[&str]) -> Result<ColumnArray, Error> {
        match columns {
            [] => Err(Error::InvalidInput("column_array needs at least one column".into())),
            [column] => {
                let mut values = Vec::new();
                let mut failure = None;
                self.for_each(query, |record| {
                    if failure.is_some() {
                        return;
                    }
                    match record.value(column) {
                        Some(value) => values.push(value.clone()),
                        None => failure = Some(Error::UnknownColumn(column.to_string())),
                    }
                })?;
                match failure {
                    Some(e) => Err(e),
                    None => Ok(ColumnArray::Scalars(values)),
                }
            }
            many => {
                let names: Arc<[String]> = many.iter().map(|c| c.to_string()).collect();
                let records = self
                    .rows(query)?
                    .map(|record| record.project(&names))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ColumnArray::Records(records))
            }
        }
    }

    /// Map each row by the value of `key_column`; later rows replace earlier
    /// rows with the same key.
    pub fn keyed(&self, query: &Query, key_column: &str) -> Result<HashMap<RowKey, Record>, Error> {
        let mut keyed = HashMap::new();
        for record in self.rows(query)? {
            let key = record
                .value(key_column)
                .ok_or_else(|| Error::UnknownColumn(key_column.to_string()))
                .and_then(RowKey::try_from)?;
            keyed.insert(key, record);
        }
        Ok(keyed)
    }

    /// First column of the first row, if any row matched.
    pub fn scalar<T: FromSql>(&self, query: &Query) -> Result<Option<T>, Error> {
        let mut stmt = self.conn.prepare_cached(query.sql())?;
        let params = query.named_params();
        let mut rows = stmt.query(params.as_slice())?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

/// Async query runner over the shared archive connection.
#[derive(Clone, Debug)]
pub struct QueryExecutor {
    conn: Connection,
}

impl QueryExecutor {
    pub fn new(db: &ArchiveDb) -> Self {
        Self { conn: db.conn.clone() }
    }

    /// Run `f` with a synchronous executor on the database thread.
    pub async fn run<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Executor<'_>) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| -> Result<T, Error> { f(&Executor::new(conn)) })
            .await
            .map_err(Error::from)
    }

    /// Run `f` inside one immediate transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Executor<'_>) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| -> Result<T, Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let value = f(&Executor::new(&tx))?;
                tx.commit()?;
                Ok(value)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn execute(&self, query: Query) -> Result<usize, Error> {
        self.run(move |ex| ex.execute(&query)).await
    }

    /// Invoke `f` once per row; the callback runs on the database thread.
    pub async fn for_each<F>(&self, query: Query, f: F) -> Result<(), Error>
    where
        F: FnMut(Record) + Send + 'static,
    {
        self.run(move |ex| ex.for_each(&query, f)).await
    }

    pub async fn rows(&self, query: Query) -> Result<Rows, Error> {
        self.run(move |ex| ex.rows(&query)).await
    }

    pub async fn column_array(&self, query: Query, columns: &[&str]) -> Result<ColumnArray, Error> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.run(move |ex| {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            ex.column_array(&query, &columns)
        })
        .await
    }

    pub async fn keyed(&self, query: Query, key_column: &str) -> Result<HashMap<RowKey, Record>, Error> {
        let key_column = key_column.to_string();
        self.run(move |ex| ex.keyed(&query, &key_column)).await
    }

    pub async fn scalar<T>(&self, query: Query) -> Result<Option<T>, Error>
    where
        T: FromSql + Send + 'static,
    {
        self.run(move |ex| ex.scalar(&query)).await
    }
}
