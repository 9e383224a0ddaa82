use std::collections::HashMap;
use std::io::Write;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use rusqlite::types::Value;
use rusqlite::Connection;
use tempfile::NamedTempFile;

use crate::error::CoreError;

/// One result set from a query: column names plus dynamically typed rows.
/// Rows are decoded into typed structs at the pipeline boundary; nothing past
/// the decode step touches `Value` again.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug)]
pub enum EngineRequest {
    Init { name: String, data: Vec<u8> },
    Query { name: String, sql: String },
    Delete { name: String },
}

#[derive(Debug)]
pub enum EngineResponse {
    Ready,
    Results(Vec<QueryResult>),
    Deleted,
    Failed(String),
}

struct Envelope {
    request: EngineRequest,
    reply: mpsc::Sender<EngineResponse>,
}

/// Handle to the query-execution actor: a dedicated thread owning engine
/// instances by name, reachable only through typed request/response messages.
/// Every request posted yields exactly one response; engine-side failures come
/// back as `CoreError::Engine`, the single fatal error class of the pipeline.
pub struct QueryEngine {
    tx: Option<mpsc::Sender<Envelope>>,
    handle: Option<JoinHandle<()>>,
}

impl QueryEngine {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || run_worker(rx));
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Loads a named engine instance from raw export bytes.
    pub fn init(&self, name: &str, data: Vec<u8>) -> Result<(), CoreError> {
        match self.request(EngineRequest::Init {
            name: name.to_string(),
            data,
        })? {
            EngineResponse::Ready => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    pub fn query(&self, name: &str, sql: &str) -> Result<Vec<QueryResult>, CoreError> {
        match self.request(EngineRequest::Query {
            name: name.to_string(),
            sql: sql.to_string(),
        })? {
            EngineResponse::Results(results) => Ok(results),
            other => Err(unexpected(&other)),
        }
    }

    /// Releases a named instance. Deleting a name that was never loaded is
    /// acknowledged the same way.
    pub fn delete(&self, name: &str) -> Result<(), CoreError> {
        match self.request(EngineRequest::Delete {
            name: name.to_string(),
        })? {
            EngineResponse::Deleted => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    fn request(&self, request: EngineRequest) -> Result<EngineResponse, CoreError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| CoreError::Engine("query engine stopped".to_string()))?;
        let (reply, response_rx) = mpsc::channel();
        tx.send(Envelope { request, reply })
            .map_err(|_| CoreError::Engine("query engine unavailable".to_string()))?;
        match response_rx.recv() {
            Ok(EngineResponse::Failed(message)) => Err(CoreError::Engine(message)),
            Ok(response) => Ok(response),
            Err(_) => Err(CoreError::Engine("query engine did not respond".to_string())),
        }
    }
}

impl Drop for QueryEngine {
    fn drop(&mut self) {
        // closing the channel ends the worker loop
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn unexpected(response: &EngineResponse) -> CoreError {
    CoreError::Engine(format!("unexpected engine response: {:?}", response))
}

struct LoadedDb {
    conn: Connection,
    // keeps the backing file alive for as long as the connection reads it
    _backing: NamedTempFile,
}

fn run_worker(rx: mpsc::Receiver<Envelope>) {
    let mut dbs: HashMap<String, LoadedDb> = HashMap::new();
    while let Ok(envelope) = rx.recv() {
        let response = handle_request(&mut dbs, envelope.request);
        let _ = envelope.reply.send(response);
    }
}

fn handle_request(dbs: &mut HashMap<String, LoadedDb>, request: EngineRequest) -> EngineResponse {
    match request {
        EngineRequest::Init { name, data } => match load_db(&data) {
            Ok(db) => {
                dbs.insert(name, db);
                EngineResponse::Ready
            }
            Err(err) => EngineResponse::Failed(err.to_string()),
        },
        EngineRequest::Query { name, sql } => {
            let Some(db) = dbs.get(&name) else {
                return EngineResponse::Failed(format!("no database loaded as '{}'", name));
            };
            match exec_query(&db.conn, &sql) {
                Ok(results) => EngineResponse::Results(results),
                Err(err) => EngineResponse::Failed(err.to_string()),
            }
        }
        EngineRequest::Delete { name } => {
            dbs.remove(&name);
            EngineResponse::Deleted
        }
    }
}

fn load_db(data: &[u8]) -> Result<LoadedDb, CoreError> {
    let mut backing = NamedTempFile::new()
        .map_err(|e| CoreError::Engine(format!("engine temp file failed: {}", e)))?;
    backing
        .write_all(data)
        .and_then(|_| backing.flush())
        .map_err(|e| CoreError::Engine(format!("engine temp write failed: {}", e)))?;
    let conn = Connection::open(backing.path())?;
    // force a header read so malformed bytes fail at init, not mid-import
    conn.query_row("SELECT COUNT(1) FROM sqlite_master;", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(LoadedDb {
        conn,
        _backing: backing,
    })
}

fn exec_query(conn: &Connection, sql: &str) -> Result<Vec<QueryResult>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|name| name.to_string()).collect();
    let column_count = columns.len();
    let mut rows = stmt.query([])?;
    let mut values: Vec<Vec<Value>> = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            record.push(row.get::<_, Value>(idx)?);
        }
        values.push(record);
    }
    Ok(vec![QueryResult {
        columns,
        rows: values,
    }])
}

// Cell accessors used by the boundary decoders. Missing cells and type
// mismatches degrade to empty/zero values; rows are never rejected.

pub(crate) fn text_at(row: &[Value], idx: usize) -> String {
    opt_text_at(row, idx).unwrap_or_default()
}

pub(crate) fn opt_text_at(row: &[Value], idx: usize) -> Option<String> {
    match row.get(idx)? {
        Value::Text(text) => Some(text.clone()),
        Value::Integer(value) => Some(value.to_string()),
        Value::Real(value) => Some(value.to_string()),
        _ => None,
    }
}

pub(crate) fn i64_at(row: &[Value], idx: usize) -> i64 {
    opt_i64_at(row, idx).unwrap_or(0)
}

pub(crate) fn opt_i64_at(row: &[Value], idx: usize) -> Option<i64> {
    match row.get(idx)? {
        Value::Integer(value) => Some(*value),
        Value::Real(value) => Some(*value as i64),
        Value::Text(text) => text.parse().ok(),
        _ => None,
    }
}

pub(crate) fn blob_at(row: &[Value], idx: usize) -> Option<Vec<u8>> {
    match row.get(idx)? {
        Value::Blob(bytes) => Some(bytes.clone()),
        _ => None,
    }
}
