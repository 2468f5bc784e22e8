use crate::db::{CellValue, ConnectParams, Database, QueryResult};
use crate::error::{Result, RunError};
use oracle::{Connection, Row};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

pub const DEFAULT_FETCH_SIZE: u32 = 100;

pub struct OracleDatabase {
    params: ConnectParams,
    fetch_size: u32,
    connection: Option<Connection>,
}

impl OracleDatabase {
    pub fn new(params: ConnectParams, fetch_size: u32) -> Self {
        Self {
            params,
            fetch_size: fetch_size.max(1),
            connection: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn row_to_cells(row: &Row, col_count: usize) -> Result<Vec<CellValue>> {
        let mut values = Vec::with_capacity(col_count);

        for i in 0..col_count {
            let value: Option<String> = row.get(i).map_err(|e| RunError::Fetch {
                message: format!("column {}: {}", i + 1, e),
            })?;
            values.push(CellValue::from(value));
        }

        Ok(values)
    }
}

impl Database for OracleDatabase {
    fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let descriptor = self.params.descriptor();
        debug!(connect = %self.params.connect_string(false), "opening session");
        let conn = Connection::connect(
            &self.params.username,
            self.params.password.expose_secret(),
            &descriptor,
        )
        .map_err(|e| RunError::Connection {
            message: format!("{}@{}: {}", self.params.username, descriptor, e),
        })?;

        info!("connected to {} as {}", descriptor, self.params.username);
        self.connection = Some(conn);
        Ok(())
    }

    fn execute_query(&mut self, query: &str) -> Result<QueryResult> {
        let conn = self.connection.as_ref().ok_or(RunError::NotConnected)?;

        let statement_err = |e: oracle::Error| RunError::Statement {
            sql: query.to_string(),
            message: e.to_string(),
        };

        let mut stmt = conn
            .statement(query)
            .fetch_array_size(self.fetch_size)
            .build()
            .map_err(statement_err)?;
        let rows = stmt.query(&[]).map_err(statement_err)?;

        let columns: Vec<String> = rows
            .column_info()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        let col_count = columns.len();

        let mut result = QueryResult::new();
        result.columns = columns;

        for row_result in rows {
            let row = row_result.map_err(|e| RunError::Fetch {
                message: e.to_string(),
            })?;
            result.rows.push(Self::row_to_cells(&row, col_count)?);
        }

        debug!(rows = result.rows.len(), sql = query, "query fetched");
        Ok(result)
    }

    fn close(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(conn) => {
                conn.close().map_err(|e| RunError::Connection {
                    message: format!("close failed: {}", e),
                })?;
                debug!("session closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for OracleDatabase {
    fn drop(&mut self) {
        if self.connection.is_some() {
            if let Err(e) = self.close() {
                warn!("{}", e);
            }
        }
    }
}
