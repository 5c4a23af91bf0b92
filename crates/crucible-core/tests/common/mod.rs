#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use crucible_core::{Driver, Result, Row, SqlValue};

/// A driver that records every statement it receives and plays back
/// scripted responses, so tests can assert on the exact SQL and binding
/// lists the builders produce.
pub struct RecordingDriver {
    pub calls: Mutex<Vec<(String, Vec<SqlValue>)>>,
    results: Mutex<VecDeque<Vec<Row>>>,
    affected: Mutex<VecDeque<u64>>,
    last_id: Mutex<u64>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
            affected: Mutex::new(VecDeque::new()),
            last_id: Mutex::new(0),
        }
    }

    /// Queues a row set for the next `statement` call.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.results.lock().unwrap().push_back(rows);
    }

    /// Queues an affected-row count for the next `execute` call.
    pub fn push_affected(&self, count: u64) {
        self.affected.lock().unwrap().push_back(count);
    }

    pub fn set_last_insert_id(&self, id: u64) {
        *self.last_id.lock().unwrap() = id;
    }

    /// Returns the recorded calls, oldest first.
    pub fn recorded(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns just the SQL strings, oldest first.
    pub fn sql_log(&self) -> Vec<String> {
        self.recorded().into_iter().map(|(sql, _)| sql).collect()
    }
}

impl Driver for RecordingDriver {
    async fn statement(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((String::from(sql), bindings.to_vec()));
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.calls
            .lock()
            .unwrap()
            .push((String::from(sql), bindings.to_vec()));
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(0))
    }

    async fn last_insert_id(&self) -> Result<u64> {
        Ok(*self.last_id.lock().unwrap())
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((String::from("START TRANSACTION"), Vec::new()));
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((String::from("COMMIT"), Vec::new()));
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((String::from("ROLLBACK"), Vec::new()));
        Ok(())
    }

    async fn close(&self) {}
}

/// Builds a row from column/value pairs.
pub fn row(pairs: &[(&str, SqlValue)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (String::from(*k), v.clone()))
        .collect::<BTreeMap<String, SqlValue>>()
}
