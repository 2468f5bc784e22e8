pub mod connect;
pub mod oracle;

use crate::error::Result;
use std::fmt;

pub use connect::ConnectParams;

pub trait Database {
    fn connect(&mut self) -> Result<()>;
    fn execute_query(&mut self, query: &str) -> Result<QueryResult>;
    fn close(&mut self) -> Result<()>;
}

/// A single fetched value. Every column comes back through the driver's
/// string conversion.
#[derive(Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Null,
}

impl fmt::Debug for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{:?}", s),
            CellValue::Null => f.write_str("NULL"),
        }
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => CellValue::Text(s),
            None => CellValue::Null,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }
}
