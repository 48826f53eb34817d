use super::{Grid, TableHandle, TabularStore, Workbook};
use crate::error::{OrmError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A store backed by a single JSON workbook file.
///
/// Writes are staged in memory; `commit` replaces the file atomically by
/// writing a sibling temp file and renaming it over the target.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    workbook: RefCell<Workbook>,
}

impl FileStore {
    /// Open the workbook at `path`. A missing file is an empty workbook.
    pub fn open(path: &Path) -> Result<Self> {
        let workbook = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Workbook::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Workbook::default()
        };

        Ok(FileStore {
            path: path.to_path_buf(),
            workbook: RefCell::new(workbook),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_names(&self) -> Vec<String> {
        self.workbook
            .borrow()
            .table_names()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl TabularStore for FileStore {
    fn get_table(&self, name: &str) -> Result<Option<TableHandle>> {
        Ok(self
            .workbook
            .borrow()
            .has_table(name)
            .then(|| TableHandle::new(name)))
    }

    fn create_table(&self, name: &str) -> Result<TableHandle> {
        self.workbook.borrow_mut().create_table(name);
        Ok(TableHandle::new(name))
    }

    fn append_row(&self, table: &TableHandle, values: &[Value]) -> Result<()> {
        self.workbook.borrow_mut().append_row(table, values)
    }

    fn read_range(
        &self,
        table: &TableHandle,
        row_start: usize,
        col_start: usize,
        num_rows: usize,
        num_cols: usize,
    ) -> Result<Grid> {
        self.workbook
            .borrow()
            .read_range(table, row_start, col_start, num_rows, num_cols)
    }

    fn write_row(&self, table: &TableHandle, row: usize, values: &[Value]) -> Result<()> {
        self.workbook.borrow_mut().write_row(table, row, values)
    }

    fn delete_column(&self, table: &TableHandle, col: usize) -> Result<()> {
        self.workbook.borrow_mut().delete_column(table, col)
    }

    fn delete_row(&self, table: &TableHandle, row: usize) -> Result<()> {
        self.workbook.borrow_mut().delete_row(table, row)
    }

    fn last_row_index(&self, table: &TableHandle) -> Result<usize> {
        self.workbook.borrow().last_row_index(table)
    }

    fn last_column_index(&self, table: &TableHandle) -> Result<usize> {
        self.workbook.borrow().last_column_index(table)
    }

    fn commit(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_vec_pretty(&*self.workbook.borrow())?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| OrmError::Io(e.error))?;

        log::debug!("Committed workbook to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(&tmp.path().join("workbook.json")).unwrap();
        assert!(store.table_names().is_empty());
    }

    #[test]
    fn test_commit_makes_writes_visible_to_new_readers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("workbook.json");

        let store = FileStore::open(&path).unwrap();
        let table = store.create_table("Item").unwrap();
        store.append_row(&table, &[Value::from("name"), Value::from("qty")]).unwrap();
        store.append_row(&table, &[Value::from("widget"), Value::from(5)]).unwrap();

        // Nothing on disk before the barrier
        assert!(FileStore::open(&path).unwrap().table_names().is_empty());

        store.commit().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.table_names(), vec!["Item".to_string()]);
        let grid = reopened.read_range(&table, 2, 1, 1, 2).unwrap();
        assert_eq!(grid, vec![vec![Value::from("widget"), Value::Number(5.0)]]);
    }

    #[test]
    fn test_commit_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("workbook.json");
        let store = FileStore::open(&path).unwrap();
        store.create_table("Item").unwrap();
        store.commit().unwrap();
        assert!(path.exists());
    }
}
