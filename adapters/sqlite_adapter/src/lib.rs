use booking_core::ports::{is_valid_table_name, CellValue, RowSet, StorageBackend, StorageSession};
use booking_core::StoreError;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// SQLite implementation of the StorageBackend trait
pub struct SqliteBackend {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteBackend {
    /// Creates a new SqliteBackend for an existing database file
    pub fn new(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Creates the database file and the bookings table if they are missing.
    /// One-shot bootstrap; existing tables are left untouched.
    pub fn initialize(&self, table: &str) -> Result<(), StoreError> {
        check_table(table)?;
        let conn = Connection::open(&self.db_path).map_err(StoreError::connection)?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                booking_date      TEXT    NOT NULL,
                hotel_name        TEXT    NOT NULL,
                room_type         TEXT    NOT NULL,
                occupancy_rate    REAL    NOT NULL,
                revenue           REAL    NOT NULL,
                guest_nationality TEXT    NOT NULL,
                booking_channel   TEXT    NOT NULL,
                is_cancelled      INTEGER NOT NULL CHECK (is_cancelled IN (0, 1))
            );
            "#
        ))
        .map_err(StoreError::connection)?;
        info!(path = %self.db_path.display(), table, "SQLite bookings table ready");
        Ok(())
    }
}

impl StorageBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn connect(&self) -> Result<Box<dyn StorageSession + '_>, StoreError> {
        // No SQLITE_OPEN_CREATE: a missing file is a connection failure, not a new empty store
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::Connection(format!("{}: {e}", self.db_path.display())))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(StoreError::connection)?;
        debug!(path = %self.db_path.display(), "SQLite connection opened");
        Ok(Box::new(SqliteSession { conn }))
    }
}

/// An open connection; dropping it closes the handle.
struct SqliteSession {
    conn: Connection,
}

impl StorageSession for SqliteSession {
    fn fetch_all(&mut self, table: &str) -> Result<RowSet, StoreError> {
        check_table(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!(r#"SELECT * FROM "{table}""#))
            .map_err(StoreError::connection)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|idx| row.get_ref(idx).map(to_cell))
                    .collect::<rusqlite::Result<Vec<CellValue>>>()
            })
            .map_err(StoreError::connection)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::connection)?;

        Ok(RowSet { columns, rows })
    }

    fn append(
        &mut self,
        table: &str,
        columns: &[&str],
        values: &[CellValue],
    ) -> Result<(), StoreError> {
        check_table(table)?;
        if columns.len() != values.len() {
            return Err(StoreError::Write(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        let column_list = columns
            .iter()
            .map(|c| format!(r#""{c}""#))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(r#"INSERT INTO "{table}" ({column_list}) VALUES ({placeholders})"#);

        self.conn
            .execute(&sql, params_from_iter(values.iter().map(to_value)))
            .map_err(StoreError::write)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::connection(e))
    }
}

fn check_table(table: &str) -> Result<(), StoreError> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(StoreError::Connection(format!("invalid table name '{table}'")))
    }
}

fn to_cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(f) => CellValue::Real(f),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn to_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Integer(i) => Value::Integer(*i),
        CellValue::Real(f) => Value::Real(*f),
        CellValue::Text(text) => Value::Text(text.clone()),
    }
}
