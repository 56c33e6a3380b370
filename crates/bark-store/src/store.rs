use rusqlite::{params_from_iter, types::Value, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::error::{Result, StoreError};

/// Column definition: name plus its type and constraint spec, e.g. `("title", "TEXT NOT NULL")`
pub type Column<'a> = (&'a str, &'a str);

/// One selected row, values in declared column order
pub type Row = Vec<Value>;

/// Generic CRUD over named SQLite tables
///
/// One connection lives for as long as the store does. Every mutating call
/// runs in SQLite's autocommit mode, so it is durable as soon as it returns.
/// The mutex only exists so the store can be shared behind an `Arc`; there
/// is never more than one caller at a time.
pub struct TableStore {
    conn: Mutex<Connection>,
}

impl TableStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let started_at = Instant::now();
        let path = path.as_ref();

        let conn = Connection::open(path).map_err(|err| {
            error!(
                path = %path.display(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                "Failed to open database: {}",
                err
            );
            StoreError::from(err)
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;

        info!(
            path = %path.display(),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "Opened database"
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Throwaway database, handy for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// `CREATE TABLE IF NOT EXISTS`, so calling it on every startup is fine
    pub fn create_table(&self, table: &str, columns: &[Column<'_>]) -> Result<()> {
        check_identifier(table)?;

        let mut definitions = Vec::with_capacity(columns.len());
        for (name, spec) in columns {
            check_identifier(name)?;
            definitions.push(format!("{} {}", name, spec));
        }

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            definitions.join(", ")
        );
        self.connection().execute(&sql, [])?;

        debug!(table, "Ensured table exists");
        Ok(())
    }

    /// Insert exactly the supplied columns; anything left out gets the column default
    ///
    /// Returns the rowid of the new row.
    pub fn insert(&self, table: &str, row: &[(&str, Value)]) -> Result<i64> {
        check_identifier(table)?;
        if row.is_empty() {
            return Err(StoreError::EmptyCriteria("insert a row"));
        }

        let mut names = Vec::with_capacity(row.len());
        for (name, _) in row {
            check_identifier(name)?;
            names.push(*name);
        }
        let placeholders = vec!["?"; row.len()].join(", ");

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders
        );

        let conn = self.connection();
        conn.execute(&sql, params_from_iter(row.iter().map(|(_, value)| value)))?;
        let rowid = conn.last_insert_rowid();

        debug!(table, rowid, "Inserted row");
        Ok(rowid)
    }

    /// Delete every row matching all the criteria
    ///
    /// Matching nothing is not an error. Returns how many rows went away.
    pub fn delete(&self, table: &str, criteria: &[(&str, Value)]) -> Result<usize> {
        check_identifier(table)?;
        if criteria.is_empty() {
            return Err(StoreError::EmptyCriteria("delete"));
        }

        let sql = format!("DELETE FROM {} WHERE {}", table, where_clause(criteria)?);
        let removed = self.connection().execute(
            &sql,
            params_from_iter(criteria.iter().map(|(_, value)| value)),
        )?;

        debug!(table, removed, "Deleted rows");
        Ok(removed)
    }

    /// Rows matching all the criteria (every row when `criteria` is empty)
    ///
    /// Sorted ascending by `order_by` when given, otherwise in insertion order.
    pub fn select(
        &self,
        table: &str,
        criteria: &[(&str, Value)],
        order_by: Option<&str>,
    ) -> Result<Vec<Row>> {
        check_identifier(table)?;

        let mut sql = format!("SELECT * FROM {}", table);
        if !criteria.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause(criteria)?);
        }
        match order_by {
            Some(column) => {
                check_identifier(column)?;
                // rowid breaks ties so equal keys keep insertion order
                sql.push_str(&format!(" ORDER BY {}, rowid", column));
            }
            None => sql.push_str(" ORDER BY rowid"),
        }

        let conn = self.connection();
        let mut stmt = conn.prepare(&sql)?;
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map(
                params_from_iter(criteria.iter().map(|(_, value)| value)),
                |row| {
                    (0..column_count)
                        .map(|idx| row.get::<_, Value>(idx))
                        .collect::<rusqlite::Result<Row>>()
                },
            )?
            .collect::<rusqlite::Result<Vec<Row>>>()?;

        Ok(rows)
    }

    /// Total number of rows in a table
    pub fn count(&self, table: &str) -> Result<u64> {
        check_identifier(table)?;

        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.connection().query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock can't leave the connection half-written:
        // every statement either committed or didn't.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn where_clause(criteria: &[(&str, Value)]) -> Result<String> {
    let mut clauses = Vec::with_capacity(criteria.len());
    for (column, _) in criteria {
        check_identifier(column)?;
        clauses.push(format!("{} = ?", column));
    }
    Ok(clauses.join(" AND "))
}

/// Table and column names can't be bound as parameters, so they have to be
/// plain identifiers before they go anywhere near the SQL text
fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
