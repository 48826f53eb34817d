// Tabular store interface - the spreadsheet-like backend the engine writes to

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{OrmError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows of cells. Row 1 of a table is its header row.
pub type Grid = Vec<Vec<Value>>;

/// Opaque reference to a table inside a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    pub fn new(name: &str) -> Self {
        TableHandle {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A spreadsheet-like store of named tables. All row and column indices
/// are 1-based.
///
/// Methods take `&self`; implementations own their interior mutability.
/// Writes only need to become visible to other readers after `commit`.
pub trait TabularStore {
    fn get_table(&self, name: &str) -> Result<Option<TableHandle>>;

    fn create_table(&self, name: &str) -> Result<TableHandle>;

    /// Append a row after the last row holding any content.
    fn append_row(&self, table: &TableHandle, values: &[Value]) -> Result<()>;

    /// Read a rectangle of cells. Cells outside the stored data read as `Empty`.
    fn read_range(
        &self,
        table: &TableHandle,
        row_start: usize,
        col_start: usize,
        num_rows: usize,
        num_cols: usize,
    ) -> Result<Grid>;

    /// Overwrite the first `values.len()` cells of a row.
    fn write_row(&self, table: &TableHandle, row: usize, values: &[Value]) -> Result<()>;

    /// Delete a column; columns to its right shift left by one.
    fn delete_column(&self, table: &TableHandle, col: usize) -> Result<()>;

    /// Delete a row; rows below it shift up by one.
    fn delete_row(&self, table: &TableHandle, row: usize) -> Result<()>;

    /// Index of the last row holding content, 0 for an empty table.
    fn last_row_index(&self, table: &TableHandle) -> Result<usize>;

    /// Index of the last column holding content, 0 for an empty table.
    fn last_column_index(&self, table: &TableHandle) -> Result<usize>;

    /// Make every prior write durable and visible.
    fn commit(&self) -> Result<()>;
}

/// In-memory table data shared by the bundled store implementations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    tables: BTreeMap<String, Grid>,
}

impl Workbook {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn create_table(&mut self, name: &str) {
        self.tables.entry(name.to_string()).or_default();
    }

    fn rows(&self, table: &TableHandle) -> Result<&Grid> {
        self.tables
            .get(table.name())
            .ok_or_else(|| OrmError::Store(format!("Table '{}' does not exist", table.name())))
    }

    fn rows_mut(&mut self, table: &TableHandle) -> Result<&mut Grid> {
        self.tables
            .get_mut(table.name())
            .ok_or_else(|| OrmError::Store(format!("Table '{}' does not exist", table.name())))
    }

    pub fn append_row(&mut self, table: &TableHandle, values: &[Value]) -> Result<()> {
        let last = self.last_row_index(table)?;
        let rows = self.rows_mut(table)?;
        rows.truncate(last);
        rows.push(values.to_vec());
        Ok(())
    }

    pub fn read_range(
        &self,
        table: &TableHandle,
        row_start: usize,
        col_start: usize,
        num_rows: usize,
        num_cols: usize,
    ) -> Result<Grid> {
        if row_start == 0 || col_start == 0 {
            return Err(OrmError::Store(format!(
                "Range start ({row_start}, {col_start}) is out of bounds; indices are 1-based"
            )));
        }
        let rows = self.rows(table)?;
        let grid = (row_start..row_start + num_rows)
            .map(|r| {
                let row = rows.get(r - 1);
                (col_start..col_start + num_cols)
                    .map(|c| row.and_then(|cells| cells.get(c - 1)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(grid)
    }

    pub fn write_row(&mut self, table: &TableHandle, row: usize, values: &[Value]) -> Result<()> {
        if row == 0 {
            return Err(OrmError::Store("Row 0 is out of bounds; indices are 1-based".into()));
        }
        let rows = self.rows_mut(table)?;
        if rows.len() < row {
            rows.resize(row, Vec::new());
        }
        let cells = &mut rows[row - 1];
        if cells.len() < values.len() {
            cells.resize(values.len(), Value::Empty);
        }
        cells[..values.len()].clone_from_slice(values);
        Ok(())
    }

    pub fn delete_column(&mut self, table: &TableHandle, col: usize) -> Result<()> {
        let last = self.last_column_index(table)?;
        if col == 0 || col > last {
            return Err(OrmError::Store(format!(
                "Column {col} is out of bounds for table '{}' (last column {last})",
                table.name()
            )));
        }
        for cells in self.rows_mut(table)? {
            if cells.len() >= col {
                cells.remove(col - 1);
            }
        }
        Ok(())
    }

    pub fn delete_row(&mut self, table: &TableHandle, row: usize) -> Result<()> {
        let rows = self.rows_mut(table)?;
        if row == 0 || row > rows.len() {
            return Err(OrmError::Store(format!(
                "Row {row} is out of bounds for table '{}'",
                table.name()
            )));
        }
        rows.remove(row - 1);
        Ok(())
    }

    pub fn last_row_index(&self, table: &TableHandle) -> Result<usize> {
        let rows = self.rows(table)?;
        Ok(rows
            .iter()
            .rposition(|cells| cells.iter().any(|c| *c != Value::Empty))
            .map_or(0, |i| i + 1))
    }

    pub fn last_column_index(&self, table: &TableHandle) -> Result<usize> {
        let rows = self.rows(table)?;
        Ok(rows
            .iter()
            .filter_map(|cells| cells.iter().rposition(|c| *c != Value::Empty))
            .max()
            .map_or(0, |i| i + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn workbook_with_rows() -> (Workbook, TableHandle) {
        let mut workbook = Workbook::default();
        workbook.create_table("Item");
        let table = TableHandle::new("Item");
        workbook.append_row(&table, &[text("a"), text("b"), text("c")]).unwrap();
        workbook.append_row(&table, &[text("1"), text("2"), text("3")]).unwrap();
        workbook.append_row(&table, &[text("4"), text("5"), text("6")]).unwrap();
        (workbook, table)
    }

    #[test]
    fn test_read_range_pads_with_empty() {
        let (workbook, table) = workbook_with_rows();
        let grid = workbook.read_range(&table, 3, 2, 2, 3).unwrap();
        assert_eq!(
            grid,
            vec![
                vec![text("5"), text("6"), Value::Empty],
                vec![Value::Empty, Value::Empty, Value::Empty],
            ]
        );
    }

    #[test]
    fn test_read_range_rejects_zero_index() {
        let (workbook, table) = workbook_with_rows();
        assert!(workbook.read_range(&table, 0, 1, 1, 1).is_err());
    }

    #[test]
    fn test_delete_column_shifts_left() {
        let (mut workbook, table) = workbook_with_rows();
        workbook.delete_column(&table, 2).unwrap();
        assert_eq!(
            workbook.read_range(&table, 1, 1, 1, 2).unwrap(),
            vec![vec![text("a"), text("c")]]
        );
        assert_eq!(workbook.last_column_index(&table).unwrap(), 2);
    }

    #[test]
    fn test_delete_row_shifts_up() {
        let (mut workbook, table) = workbook_with_rows();
        workbook.delete_row(&table, 2).unwrap();
        assert_eq!(workbook.last_row_index(&table).unwrap(), 2);
        assert_eq!(
            workbook.read_range(&table, 2, 1, 1, 1).unwrap(),
            vec![vec![text("4")]]
        );
        assert!(workbook.delete_row(&table, 5).is_err());
    }

    #[test]
    fn test_write_row_overwrites_prefix() {
        let (mut workbook, table) = workbook_with_rows();
        workbook.write_row(&table, 1, &[text("x"), text("y"), text("z"), text("w")]).unwrap();
        assert_eq!(workbook.last_column_index(&table).unwrap(), 4);
        workbook.write_row(&table, 2, &[text("9")]).unwrap();
        assert_eq!(
            workbook.read_range(&table, 2, 1, 1, 3).unwrap(),
            vec![vec![text("9"), text("2"), text("3")]]
        );
    }

    #[test]
    fn test_append_follows_last_content_row() {
        let (mut workbook, table) = workbook_with_rows();
        workbook.write_row(&table, 6, &[Value::Empty]).unwrap();
        workbook.append_row(&table, &[text("7")]).unwrap();
        assert_eq!(workbook.last_row_index(&table).unwrap(), 4);
    }

    #[test]
    fn test_missing_table() {
        let workbook = Workbook::default();
        assert!(matches!(
            workbook.last_row_index(&TableHandle::new("Ghost")),
            Err(OrmError::Store(_))
        ));
    }
}
