pub mod partition;
pub mod types;

use crate::catalog::partition::PartitionBy;
use crate::catalog::types::{ColumnSpec, ColumnType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub column_type: ColumnType,
    pub symbol_capacity: i32,
    pub symbol_cache: bool,
    pub indexed: bool,
    pub index_value_block_capacity: i32,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, spec: &ColumnSpec) -> Self {
        Self {
            name: name.into(),
            column_type: spec.column_type,
            symbol_capacity: spec.symbol_capacity,
            symbol_cache: spec.symbol_cache,
            indexed: spec.indexed,
            index_value_block_capacity: spec.index_value_block_capacity,
        }
    }
}

/// Structure and tuning parameters of one table, as seen by its writer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableMetadata {
    pub table_name: String,
    pub table_id: i32,
    pub partition_by: PartitionBy,
    pub columns: Vec<ColumnMeta>,
    #[serde(default)]
    pub commit_lag_micros: i64,
    #[serde(default)]
    pub max_uncommitted_rows: i32,
}

impl TableMetadata {
    pub fn new(table_name: impl Into<String>, table_id: i32, partition_by: PartitionBy) -> Self {
        Self {
            table_name: table_name.into(),
            table_id,
            partition_by,
            columns: Vec::new(),
            commit_lag_micros: 0,
            max_uncommitted_rows: 0,
        }
    }

    /// Column names compare case-insensitively, as they do in SQL.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_symbol_columns(&self) -> bool {
        self.columns.iter().any(|c| c.column_type.is_symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnMeta, TableMetadata};
    use crate::catalog::partition::PartitionBy;
    use crate::catalog::types::{ColumnSpec, ColumnType};

    #[test]
    fn column_lookup_ignores_ascii_case() {
        let mut meta = TableMetadata::new("trades", 7, PartitionBy::Day);
        meta.columns
            .push(ColumnMeta::new("Price", &ColumnSpec::new(ColumnType::Double)));
        meta.columns
            .push(ColumnMeta::new("sym", &ColumnSpec::symbol(256, true)));
        assert_eq!(meta.column_index("price"), Some(0));
        assert_eq!(meta.column_index("SYM"), Some(1));
        assert_eq!(meta.column_index("qty"), None);
        assert!(meta.has_symbol_columns());
        assert_eq!(meta.column_names().collect::<Vec<_>>(), vec!["Price", "sym"]);
    }
}
