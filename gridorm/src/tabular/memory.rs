use super::{Grid, TableHandle, TabularStore, Workbook};
use crate::error::Result;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A store that lives only in memory. Clones share the same tables, so a
/// test can keep one handle while an [`crate::Orm`] owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    workbook: Rc<RefCell<Workbook>>,
    commits: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commit barriers issued so far.
    pub fn commit_count(&self) -> usize {
        self.commits.get()
    }

    /// A copy of the current table data.
    pub fn snapshot(&self) -> Workbook {
        self.workbook.borrow().clone()
    }
}

impl TabularStore for MemoryStore {
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
        self.commits.set(self.commits.get() + 1);
        Ok(())
    }
}
