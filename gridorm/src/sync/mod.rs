// Schema synchronization - reconcile a table's header row with its record type

use crate::error::Result;
use crate::schema::RecordSchema;
use crate::tabular::{TableHandle, TabularStore};
use crate::value::Value;
use std::collections::HashSet;

/// Header changes needed to bring a table in line with its record type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderDiff {
    /// Declared columns missing from the table, in declaration order.
    pub added: Vec<String>,
    /// Table headers that are not declared (or repeat an earlier header),
    /// in table order.
    pub removed: Vec<String>,
}

impl HeaderDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Human-readable description of each change.
    pub fn describe(&self, table: &str) -> Vec<String> {
        let added = self
            .added
            .iter()
            .map(|name| format!("Column '{table}.{name}' added"));
        let removed = self
            .removed
            .iter()
            .map(|name| format!("Column '{table}.{name}' removed"));
        added.chain(removed).collect()
    }
}

/// Compare the headers a table has with the columns a record type declares.
pub fn diff_headers(existing: &[String], declared: &[String]) -> HeaderDiff {
    let declared_set: HashSet<&str> = declared.iter().map(String::as_str).collect();
    let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();

    let added = declared
        .iter()
        .filter(|name| !existing_set.contains(name.as_str()))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let removed = existing
        .iter()
        .filter(|name| !declared_set.contains(name.as_str()) || !seen.insert(name.as_str()))
        .cloned()
        .collect();

    HeaderDiff { added, removed }
}

/// A table handle together with the header order every row follows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub table: TableHandle,
    pub headers: Vec<String>,
}

impl ResolvedTable {
    pub fn header_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Find or create the table backing `schema` and make its header row match
/// the declared columns. Returns the final header order after a commit.
pub fn resolve_table(store: &dyn TabularStore, schema: &RecordSchema) -> Result<ResolvedTable> {
    let declared = schema.column_names();

    let table = match store.get_table(schema.name())? {
        None => {
            let table = store.create_table(schema.name())?;
            store.append_row(&table, &to_cells(&declared))?;
            log::info!(
                "Created table '{}' with {} columns",
                schema.name(),
                declared.len()
            );
            table
        }
        Some(table) => {
            let existing = read_headers(store, &table)?;
            let diff = diff_headers(&existing, &declared);
            apply_diff(store, &table, existing, &diff)?;
            for change in diff.describe(schema.name()) {
                log::debug!("{change}");
            }
            table
        }
    };

    let headers = read_headers(store, &table)?;
    store.commit()?;
    Ok(ResolvedTable { table, headers })
}

fn apply_diff(
    store: &dyn TabularStore,
    table: &TableHandle,
    existing: Vec<String>,
    diff: &HeaderDiff,
) -> Result<()> {
    let mut current = existing;

    if !diff.added.is_empty() {
        // Cells right of the last header belong to no column. Drop them so
        // they don't surface under the headers about to be appended.
        let width = store.last_column_index(table)?;
        if width > current.len() {
            log::warn!(
                "Dropping {} unlabelled column(s) from '{}'",
                width - current.len(),
                table.name()
            );
            let mut last = width;
            while last > current.len() {
                store.delete_column(table, last)?;
                last = store.last_column_index(table)?;
            }
        }

        current.extend(diff.added.iter().cloned());
        store.write_row(table, 1, &to_cells(&current))?;
    }

    // Each deletion shifts later columns left, so look the position up in
    // the current header list right before deleting.
    for name in &diff.removed {
        if let Some(pos) = current.iter().rposition(|h| h == name) {
            store.delete_column(table, pos + 1)?;
            current.remove(pos);
        }
    }

    Ok(())
}

/// Read row 1 as header names. Trailing blank cells are dropped.
pub fn read_headers(store: &dyn TabularStore, table: &TableHandle) -> Result<Vec<String>> {
    let last_col = store.last_column_index(table)?;
    if last_col == 0 || store.last_row_index(table)? == 0 {
        return Ok(Vec::new());
    }

    let grid = store.read_range(table, 1, 1, 1, last_col)?;
    let mut headers: Vec<String> = grid
        .into_iter()
        .next()
        .unwrap_or_default()
        .iter()
        .map(header_name)
        .collect();

    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }
    Ok(headers)
}

pub(crate) fn header_name(cell: &Value) -> String {
    match cell {
        Value::Empty => String::new(),
        Value::Text(s) => s.clone(),
        other => match other.to_json() {
            serde_json::Value::String(s) => s,
            json => json.to_string(),
        },
    }
}

fn to_cells(names: &[String]) -> Vec<Value> {
    names.iter().map(|n| Value::Text(n.clone())).collect()
}
