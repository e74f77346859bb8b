use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use kernel::{FileRecord, FileSummary};
use rusqlite::{params, Connection, Error, OpenFlags, OptionalExtension};

use crate::domain::{NewFileRecord, Storage};

const CACHE_SIZE: &str = "4096";

pub enum Mode {
    ReadWrite,
    ReadOnly,
}

pub struct Sqlite {
    conn: Connection,
}

impl Storage for Sqlite {
    type Err = Error;

    fn new_database(&self) -> Result<(), Self::Err> {
        self.pragma_update("encoding", "UTF-8")?;

        self.conn.execute(
            "CREATE TABLE files (
                  id             INTEGER PRIMARY KEY AUTOINCREMENT,
                  original_name  TEXT NOT NULL,
                  stored_name    TEXT NOT NULL,
                  mime_type      TEXT NOT NULL,
                  size           INTEGER NOT NULL,
                  path           TEXT NOT NULL,
                  uploaded_at    TEXT NOT NULL
                  )",
            [],
        )?;

        Ok(())
    }

    fn insert_record(&mut self, record: &NewFileRecord) -> Result<i64, Self::Err> {
        self.assign_cache_size()?;
        self.pragma_update("synchronous", "FULL")?;

        self.conn
            .prepare_cached(
                "INSERT INTO files (original_name, stored_name, mime_type, size, path, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?
            .execute(params![
                record.original_name,
                record.stored_name,
                record.mime_type,
                record.size,
                record.path,
                Utc::now(),
            ])?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_records(&mut self) -> Result<Vec<FileSummary>, Self::Err> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, original_name, mime_type, size, uploaded_at
             FROM files
             ORDER BY uploaded_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FileSummary {
                id: row.get(0)?,
                original_name: row.get(1)?,
                mime_type: row.get(2)?,
                size: row.get(3)?,
                uploaded_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    fn get_record(&mut self, id: i64) -> Result<Option<FileRecord>, Self::Err> {
        self.conn
            .prepare_cached(
                "SELECT id, original_name, stored_name, mime_type, size, path, uploaded_at
                 FROM files
                 WHERE id = ?1",
            )?
            .query_row(params![id], |row| {
                Ok(FileRecord {
                    id: row.get(0)?,
                    original_name: row.get(1)?,
                    stored_name: row.get(2)?,
                    mime_type: row.get(3)?,
                    size: row.get(4)?,
                    path: row.get(5)?,
                    uploaded_at: row.get(6)?,
                })
            })
            .optional()
    }

    fn delete_record(&mut self, id: i64) -> Result<usize, Self::Err> {
        self.conn
            .prepare_cached("DELETE FROM files WHERE id = ?1")?
            .execute(params![id])
    }
}

impl Sqlite {
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Self, Error> {
        let c = match mode {
            Mode::ReadWrite => Connection::open(path),
            Mode::ReadOnly => Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY),
        };
        let conn = c?;
        // One connection per request, so concurrent writers wait on the
        // file lock instead of failing with SQLITE_BUSY.
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    fn assign_cache_size(&self) -> Result<(), Error> {
        self.pragma_update("cache_size", CACHE_SIZE)
    }

    fn pragma_update(&self, name: &str, value: &str) -> Result<(), Error> {
        self.conn.pragma_update(None, name, value)
    }
}
