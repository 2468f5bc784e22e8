use crate::db::Database;
use crate::error::Result;
use crate::output;
use std::io::Write;
use std::time::Instant;
use tracing::{info, warn};

pub const SYSDATE_QUERY: &str = "SELECT TO_CHAR(SYSDATE,'DD-MON-YYYY') FROM DUAL";
pub const EMPLOYEES_QUERY: &str = "select * from employees";

pub fn default_queries() -> Vec<String> {
    vec![SYSDATE_QUERY.to_string(), EMPLOYEES_QUERY.to_string()]
}

pub struct QueryRunner {
    queries: Vec<String>,
}

impl QueryRunner {
    pub fn new(queries: Vec<String>) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Connect, run every query in order printing each result set as soon as
    /// it is fetched, then close. The first failure stops the sequence; the
    /// connection is closed on every path.
    pub fn run<D, W>(&self, db: &mut D, out: &mut W) -> Result<RunStats>
    where
        D: Database,
        W: Write,
    {
        let start_time = Instant::now();
        db.connect()?;

        let executed = self.execute_all(db, out);

        match executed {
            Ok(queries) => {
                db.close()?;
                Ok(RunStats {
                    queries,
                    duration_secs: start_time.elapsed().as_secs_f64(),
                })
            }
            Err(e) => {
                if let Err(close_err) = db.close() {
                    warn!("{}", close_err);
                }
                Err(e)
            }
        }
    }

    fn execute_all<D, W>(&self, db: &mut D, out: &mut W) -> Result<Vec<QueryStats>>
    where
        D: Database,
        W: Write,
    {
        let mut stats = Vec::with_capacity(self.queries.len());

        for query in &self.queries {
            let query_start = Instant::now();
            let result = db.execute_query(query)?;
            output::write_rows(out, &result)?;

            stats.push(QueryStats {
                sql: query.clone(),
                rows: result.rows.len(),
                columns: result.columns.len(),
                elapsed_secs: query_start.elapsed().as_secs_f64(),
            });
        }

        Ok(stats)
    }
}

#[derive(Debug, Clone)]
pub struct QueryStats {
    pub sql: String,
    pub rows: usize,
    pub columns: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone)]
pub struct RunStats {
    pub queries: Vec<QueryStats>,
    pub duration_secs: f64,
}

impl RunStats {
    pub fn total_rows(&self) -> usize {
        self.queries.iter().map(|q| q.rows).sum()
    }

    pub fn log_summary(&self) {
        info!("Run Summary:");
        for q in &self.queries {
            info!(
                "  {} rows x {} columns in {:.3}s: {}",
                q.rows, q.columns, q.elapsed_secs, q.sql
            );
        }
        info!("  Total rows: {}", self.total_rows());
        info!("  Duration: {:.3} seconds", self.duration_secs);
    }
}
