use serde::{Deserialize, Serialize};

/// Column storage type. The discriminant is the code carried on the wire by
/// ADD_COLUMN commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ColumnType {
    Boolean = 1,
    Byte = 2,
    Short = 3,
    Char = 4,
    Int = 5,
    Long = 6,
    Date = 7,
    Timestamp = 8,
    Float = 9,
    Double = 10,
    String = 11,
    Symbol = 12,
    Long256 = 13,
    Binary = 18,
}

impl ColumnType {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => ColumnType::Boolean,
            2 => ColumnType::Byte,
            3 => ColumnType::Short,
            4 => ColumnType::Char,
            5 => ColumnType::Int,
            6 => ColumnType::Long,
            7 => ColumnType::Date,
            8 => ColumnType::Timestamp,
            9 => ColumnType::Float,
            10 => ColumnType::Double,
            11 => ColumnType::String,
            12 => ColumnType::Symbol,
            13 => ColumnType::Long256,
            18 => ColumnType::Binary,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Byte => "BYTE",
            ColumnType::Short => "SHORT",
            ColumnType::Char => "CHAR",
            ColumnType::Int => "INT",
            ColumnType::Long => "LONG",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::String => "STRING",
            ColumnType::Symbol => "SYMBOL",
            ColumnType::Long256 => "LONG256",
            ColumnType::Binary => "BINARY",
        }
    }

    pub fn is_symbol(self) -> bool {
        matches!(self, ColumnType::Symbol)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything ADD_COLUMN needs besides the column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub column_type: ColumnType,
    pub symbol_capacity: i32,
    pub symbol_cache: bool,
    pub indexed: bool,
    pub index_value_block_capacity: i32,
}

impl ColumnSpec {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            symbol_capacity: 0,
            symbol_cache: false,
            indexed: false,
            index_value_block_capacity: 0,
        }
    }

    pub fn symbol(symbol_capacity: i32, symbol_cache: bool) -> Self {
        Self {
            symbol_capacity,
            symbol_cache,
            ..Self::new(ColumnType::Symbol)
        }
    }

    pub fn with_index(mut self, index_value_block_capacity: i32) -> Self {
        self.indexed = true;
        self.index_value_block_capacity = index_value_block_capacity;
        self
    }
}
