//! In-process PostgREST stand-in for exercising the remote adapter.
//!
//! Tables are JSON rows held in memory. Only the subset of the query grammar
//! the adapter emits is understood: `eq.`/`neq.` filters, `order=col.dir`,
//! `limit` and `select`. Inserts assign ascending `id` and `created_at`
//! values, and transaction rows pick up default `date`/`time` columns when
//! the client omits them.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex, MutexGuard};

use actix_web::dev::ServerHandle;
use actix_web::http::{Method, StatusCode};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Map, Value, json};

type Row = Map<String, Value>;

const DEFAULT_DATE: &str = "2026-05-04";
const DEFAULT_TIME: &str = "09:00:00";

/// Headers and target of one request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub table: String,
    pub query: String,
    pub api_key: Option<String>,
    pub authorization: Option<String>,
    pub prefer: Option<String>,
}

#[derive(Default)]
struct FakeState {
    tables: HashMap<String, Vec<Row>>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
    failures: HashMap<String, u16>,
}

/// Shared handle onto the fake's tables; clones see the same state.
#[derive(Clone, Default)]
pub struct FakePostgrest {
    state: Arc<Mutex<FakeState>>,
}

impl FakePostgrest {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock")
    }

    /// Insert `rows` into `table` as if a client had posted them.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.lock();
        for row in rows {
            let Value::Object(row) = row else {
                panic!("seed rows must be JSON objects");
            };
            state.insert_row(table, row);
        }
    }

    /// Current contents of `table` in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Answer every request against `table` with `status`.
    pub fn fail_table(&self, table: &str, status: u16) {
        self.lock().failures.insert(table.to_owned(), status);
    }

    /// Bind to an ephemeral port and serve until the handle is stopped.
    ///
    /// Returns the base URL to hand to the client.
    pub fn start(&self) -> std::io::Result<(String, ServerHandle)> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let data = web::Data::new(self.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .app_data(web::PayloadConfig::new(1 << 20))
                .route("/rest/v1/{table}", web::route().to(handle))
        })
        .disable_signals()
        .workers(1)
        .listen(listener)?
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Ok((format!("http://{addr}"), handle))
    }
}

impl FakeState {
    fn insert_row(&mut self, table: &str, mut row: Row) -> Row {
        self.next_id += 1;
        let seq = self.next_id;
        row.entry("id").or_insert_with(|| json!(seq));
        row.entry("created_at").or_insert_with(|| json!(seq));
        if table == "transactions" {
            row.entry("date").or_insert_with(|| json!(DEFAULT_DATE));
            row.entry("time").or_insert_with(|| json!(DEFAULT_TIME));
        }
        self.tables
            .entry(table.to_owned())
            .or_default()
            .push(row.clone());
        row
    }
}

#[derive(Debug)]
enum Filter {
    Eq(String, String),
    Neq(String, String),
}

impl Filter {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq(column, value) => cell_text(row.get(column)) == *value,
            Self::Neq(column, value) => cell_text(row.get(column)) != *value,
        }
    }
}

#[derive(Debug, Default)]
struct ParsedQuery {
    filters: Vec<Filter>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
}

impl ParsedQuery {
    fn parse(raw: &str) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "select" => {}
                "order" => {
                    let (column, direction) =
                        value.rsplit_once('.').unwrap_or((value.as_ref(), "asc"));
                    parsed.order = Some((column.to_owned(), direction == "desc"));
                }
                "limit" => parsed.limit = value.parse().ok(),
                column => {
                    if let Some(expected) = value.strip_prefix("eq.") {
                        parsed
                            .filters
                            .push(Filter::Eq(column.to_owned(), expected.to_owned()));
                    } else if let Some(expected) = value.strip_prefix("neq.") {
                        parsed
                            .filters
                            .push(Filter::Neq(column.to_owned(), expected.to_owned()));
                    }
                }
            }
        }
        parsed
    }

    fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "null".to_owned(),
    }
}

fn compare_cells(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (
        left.and_then(Value::as_f64),
        right.and_then(Value::as_f64),
    ) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => cell_text(left).cmp(&cell_text(right)),
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn handle(req: HttpRequest, body: web::Bytes, fake: web::Data<FakePostgrest>) -> HttpResponse {
    let table = req.match_info().get("table").unwrap_or_default().to_owned();
    let mut state = fake.lock();
    state.requests.push(RecordedRequest {
        method: req.method().to_string(),
        table: table.clone(),
        query: req.query_string().to_owned(),
        api_key: header(&req, "apikey"),
        authorization: header(&req, "authorization"),
        prefer: header(&req, "prefer"),
    });

    if let Some(code) = state.failures.get(&table).copied() {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return HttpResponse::build(status)
            .json(json!({ "message": format!("{table} is unavailable") }));
    }

    let query = ParsedQuery::parse(req.query_string());
    let payload: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(err) => {
                return HttpResponse::BadRequest().json(json!({ "message": err.to_string() }));
            }
        }
    };

    match *req.method() {
        Method::GET => {
            let mut rows: Vec<Row> = state
                .tables
                .get(&table)
                .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
                .unwrap_or_default();
            if let Some((column, descending)) = &query.order {
                rows.sort_by(|a, b| {
                    let ordering = compare_cells(a.get(column), b.get(column));
                    if *descending { ordering.reverse() } else { ordering }
                });
            }
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            HttpResponse::Ok().json(rows)
        }
        Method::POST => {
            let incoming = match payload {
                Value::Array(items) => items,
                Value::Object(row) => vec![Value::Object(row)],
                _ => return HttpResponse::BadRequest().json(json!({ "message": "expected rows" })),
            };
            let mut inserted = Vec::with_capacity(incoming.len());
            for item in incoming {
                let Value::Object(row) = item else {
                    return HttpResponse::BadRequest().json(json!({ "message": "expected object" }));
                };
                inserted.push(state.insert_row(&table, row));
            }
            HttpResponse::Created().json(inserted)
        }
        Method::PATCH => {
            let Value::Object(patch) = payload else {
                return HttpResponse::BadRequest().json(json!({ "message": "expected object" }));
            };
            let mut updated = Vec::new();
            if let Some(rows) = state.tables.get_mut(&table) {
                for row in rows.iter_mut().filter(|row| query.matches(row)) {
                    for (column, value) in &patch {
                        row.insert(column.clone(), value.clone());
                    }
                    updated.push(row.clone());
                }
            }
            HttpResponse::Ok().json(updated)
        }
        Method::DELETE => {
            let mut removed = Vec::new();
            if let Some(rows) = state.tables.get_mut(&table) {
                rows.retain(|row| {
                    if query.matches(row) {
                        removed.push(row.clone());
                        false
                    } else {
                        true
                    }
                });
            }
            HttpResponse::Ok().json(removed)
        }
        _ => HttpResponse::MethodNotAllowed().finish(),
    }
}
