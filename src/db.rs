use std::path::Path;

use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::Result;
use crate::normalize::table::{Cell, Table};

/// Where finished tables go. Called only once every table has been built.
pub trait TableSink {
    fn store_table(&mut self, table: &Table) -> Result<()>;

    fn store_tables(&mut self, tables: &[Table]) -> Result<()> {
        for table in tables {
            self.store_table(table)?;
        }
        Ok(())
    }
}

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS table_loads (
            id          INTEGER PRIMARY KEY,
            run_id      TEXT NOT NULL,
            category_id TEXT NOT NULL,
            table_name  TEXT NOT NULL,
            row_count   INTEGER NOT NULL,
            loaded_at   TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(run_id, table_name)
        );
        CREATE INDEX IF NOT EXISTS idx_table_loads_run ON table_loads(run_id);
        ",
    )?;
    Ok(())
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::from(rusqlite::types::Null),
            Cell::Int(n) => ToSqlOutput::from(*n),
            Cell::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replace `table` wholesale: each run is a full re-extract.
fn write_table(conn: &Connection, table: &Table) -> Result<()> {
    let name = quote_ident(table.name);
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let pk = if table.key == Some(*c) { " PRIMARY KEY" } else { "" };
            format!("{} {}{}", quote_ident(c.name), c.kind.sql(), pk)
        })
        .collect();

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {name}; CREATE TABLE {name} ({});",
        columns.join(", ")
    ))?;

    let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{}", i)).collect();
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} VALUES ({})",
        name,
        placeholders.join(", ")
    ))?;
    for row in &table.rows {
        stmt.execute(rusqlite::params_from_iter(row.iter()))?;
    }
    Ok(())
}

/// SQLite sink. Stores every table of a run in one transaction and records
/// each in the `table_loads` ledger.
pub struct SqliteSink {
    conn: Connection,
    run_id: String,
    category_id: String,
}

impl SqliteSink {
    pub fn new(conn: Connection, run_id: impl Into<String>, category_id: impl Into<String>) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn,
            run_id: run_id.into(),
            category_id: category_id.into(),
        })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn write_with_ledger(&self, conn: &Connection, table: &Table) -> Result<()> {
        info!("Saving table {} ({} rows)", table.name, table.len());
        write_table(conn, table)?;
        conn.execute(
            "INSERT OR REPLACE INTO table_loads (run_id, category_id, table_name, row_count)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![self.run_id, self.category_id, table.name, table.len() as i64],
        )?;
        Ok(())
    }
}

impl TableSink for SqliteSink {
    fn store_table(&mut self, table: &Table) -> Result<()> {
        self.store_tables(std::slice::from_ref(table))
    }

    fn store_tables(&mut self, tables: &[Table]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for table in tables {
            self.write_with_ledger(&tx, table)?;
        }
        tx.commit()?;
        Ok(())
    }
}

// ── Stats ──

pub struct LoadRow {
    pub table_name: String,
    pub row_count: i64,
}

pub struct LatestRun {
    pub run_id: String,
    pub category_id: String,
    pub loaded_at: String,
    pub tables: Vec<LoadRow>,
}

pub fn latest_run(conn: &Connection) -> Result<Option<LatestRun>> {
    init_schema(conn)?;
    let head: Option<(String, String, String)> = conn
        .query_row(
            "SELECT run_id, category_id, MAX(loaded_at) FROM table_loads
             GROUP BY run_id ORDER BY MAX(id) DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;

    let Some((run_id, category_id, loaded_at)) = head else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT table_name, row_count FROM table_loads WHERE run_id = ?1 ORDER BY id",
    )?;
    let tables = stmt
        .query_map([&run_id], |row| {
            Ok(LoadRow {
                table_name: row.get(0)?,
                row_count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(LatestRun {
        run_id,
        category_id,
        loaded_at,
        tables,
    }))
}
