use std::fmt::{Debug, Display};

use kernel::{FileRecord, FileSummary};

/// Row data captured at upload time, before an id exists.
pub struct NewFileRecord {
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
}

pub trait Storage {
    type Err: Debug + Display;

    fn new_database(&self) -> Result<(), Self::Err>;

    fn insert_record(&mut self, record: &NewFileRecord) -> Result<i64, Self::Err>;

    fn list_records(&mut self) -> Result<Vec<FileSummary>, Self::Err>;

    fn get_record(&mut self, id: i64) -> Result<Option<FileRecord>, Self::Err>;

    fn delete_record(&mut self, id: i64) -> Result<usize, Self::Err>;
}
