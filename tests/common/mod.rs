//! In-process fake of the document API for integration tests.
//!
//! Every request is recorded with its query and tagging headers so tests can
//! assert on the exact calls the client made.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Notify;

use docdash::cache::QueryCache;
use docdash::models::SessionId;
use docdash::{ApiClient, Dashboard, SessionStore};

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub session_header: Option<String>,
    pub user_header: Option<String>,
    pub cache_control: Option<String>,
    pub body: Option<Value>,
}

impl Call {
    pub fn session_param(&self) -> Option<&str> {
        self.query.get("session_id").map(String::as_str)
    }
}

#[derive(Default)]
pub struct Backend {
    pub calls: Vec<Call>,
    pub sessions: Vec<Value>,
    pub documents: Vec<Value>,
    pub categories: BTreeMap<String, (Option<String>, bool)>,
    next_session_id: u64,
    next_document_id: i64,
    /// Chart requests for these sessions wait until notified.
    pub gates: HashMap<u64, Arc<Notify>>,
    /// Like `gates`, but only the next chart request for the session waits.
    pub next_gates: HashMap<u64, Arc<Notify>>,
    pub fail_charts: bool,
    pub fail_create: bool,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Mutex<Backend>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        {
            let mut state = api.lock();
            state.next_session_id = 1;
            state.next_document_id = 100;
        }
        api
    }

    pub fn lock(&self) -> MutexGuard<'_, Backend> {
        self.inner.lock().unwrap()
    }

    /// Seed a session owned by `owner`.
    pub fn seed_session(&self, id: u64, name: &str, owner: &str) {
        let mut state = self.lock();
        state.sessions.push(json!({
            "id": id,
            "name": name,
            "created_at": "2024-03-01T10:00:00",
            "created_by": owner,
            "document_ids": [],
            "user_emails": [owner],
        }));
        state.next_session_id = state.next_session_id.max(id + 1);
    }

    pub fn seed_category(&self, product: &str, category: &str, manual: bool) {
        self.lock()
            .categories
            .insert(product.to_string(), (Some(category.to_string()), manual));
    }

    /// Hold chart responses for `session` until the returned handle is notified.
    pub fn gate(&self, session: u64) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().gates.insert(session, notify.clone());
        notify
    }

    /// Hold only the next chart response for `session`.
    pub fn gate_next(&self, session: u64) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().next_gates.insert(session, notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn record(&self, method: Method, path: &str, query: HashMap<String, String>, headers: &HeaderMap, body: Option<Value>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let call = Call {
            method,
            path: path.to_string(),
            query,
            session_header: header("x-session-id"),
            user_header: header("x-user-email"),
            cache_control: header("cache-control"),
            body,
        };
        self.lock().calls.push(call);
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/sessions", get(list_sessions).post(create_session))
            .route("/api/sessions/:id", delete(delete_session))
            .route("/api/sessions/:id/documents", get(session_documents))
            .route("/api/sessions/:id/add_documents", post(add_documents))
            .route("/api/documents", get(list_documents).post(upload_document))
            .route("/api/documents/delete_all", delete(delete_all))
            .route("/api/documents/:id", get(get_document))
            .route("/api/documents/:id/download", get(download_document))
            .route("/api/analytics/products/chart", get(product_chart))
            .route("/api/analytics/categories", get(category_chart))
            .route("/api/analytics/ai", get(insights))
            .route("/api/analytics/products/export", get(export_products))
            .route("/api/products/categorization", get(categorizations))
            .route("/api/products/categorization/apply_ml", post(apply_ml))
            .route("/api/manual_categories", post(manual_category))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral local port and return the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

/// Build a dashboard against `base` with an in-memory store.
pub fn dashboard(base: &str) -> Dashboard {
    dashboard_with_store(base, SessionStore::in_memory())
}

pub fn dashboard_with_store(base: &str, store: SessionStore) -> Dashboard {
    let api = ApiClient::new(base, Duration::from_secs(5), store).unwrap();
    Dashboard::new(api, Arc::new(QueryCache::new()))
}

pub fn sid(n: u64) -> Option<SessionId> {
    SessionId::new(n)
}

/// Poll until `check` holds, failing after a few seconds.
pub async fn wait_for(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn session_of(query: &HashMap<String, String>) -> Option<u64> {
    query.get("session_id").and_then(|s| s.parse().ok())
}

async fn list_sessions(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, "/api/sessions", query, &headers, None);
    let sessions = api.lock().sessions.clone();
    Json(json!({ "sessions": sessions })).into_response()
}

async fn create_session(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(Method::POST, "/api/sessions", query, &headers, Some(body.clone()));
    let owner = headers
        .get("x-user-email")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    let mut state = api.lock();
    if state.fail_create {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let id = state.next_session_id;
    state.next_session_id += 1;
    let session = json!({
        "id": id,
        "name": body["name"],
        "created_at": "2024-03-05T09:30:00",
        "created_by": owner,
        "document_ids": body["document_ids"],
        "user_emails": body["user_emails"],
    });
    state.sessions.push(session.clone());
    (StatusCode::CREATED, Json(session)).into_response()
}

async fn delete_session(
    State(api): State<FakeApi>,
    UrlPath(id): UrlPath<u64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::DELETE, &format!("/api/sessions/{}", id), query, &headers, None);
    let mut state = api.lock();
    let before = state.sessions.len();
    state.sessions.retain(|s| s["id"] != json!(id));
    if state.sessions.len() == before {
        return error(StatusCode::NOT_FOUND, "session not found");
    }
    Json(json!({ "success": true })).into_response()
}

async fn session_documents(
    State(api): State<FakeApi>,
    UrlPath(id): UrlPath<u64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, &format!("/api/sessions/{}/documents", id), query, &headers, None);
    let state = api.lock();
    let Some(session) = state.sessions.iter().find(|s| s["id"] == json!(id)) else {
        return error(StatusCode::NOT_FOUND, "session not found");
    };
    let ids: Vec<Value> = session["document_ids"].as_array().cloned().unwrap_or_default();
    let documents: Vec<Value> = state
        .documents
        .iter()
        .filter(|d| ids.contains(&d["id"]))
        .cloned()
        .collect();
    Json(json!({ "documents": documents })).into_response()
}

async fn add_documents(
    State(api): State<FakeApi>,
    UrlPath(id): UrlPath<u64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(
        Method::POST,
        &format!("/api/sessions/{}/add_documents", id),
        query,
        &headers,
        Some(body.clone()),
    );
    let mut state = api.lock();
    let Some(session) = state.sessions.iter_mut().find(|s| s["id"] == json!(id)) else {
        return error(StatusCode::NOT_FOUND, "session not found");
    };
    let mut ids = session["document_ids"].as_array().cloned().unwrap_or_default();
    for id in body["document_ids"].as_array().cloned().unwrap_or_default() {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    session["document_ids"] = Value::Array(ids);
    Json(json!({ "success": true })).into_response()
}

async fn list_documents(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, "/api/documents", query.clone(), &headers, None);
    let state = api.lock();
    let documents: Vec<Value> = state
        .documents
        .iter()
        .filter(|d| match query.get("supplier") {
            Some(supplier) => d["supplier_name"] == json!(supplier),
            None => true,
        })
        .cloned()
        .collect();
    Json(json!({ "documents": documents })).into_response()
}

async fn upload_document(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut filename = None;
    let mut size = 0u64;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            size = field.bytes().await.map(|b| b.len() as u64).unwrap_or(0);
        }
    }
    api.record(
        Method::POST,
        "/api/documents",
        query,
        &headers,
        filename.as_ref().map(|f| json!({ "file": f })),
    );

    let Some(filename) = filename else {
        return error(StatusCode::BAD_REQUEST, "no file part");
    };
    let filetype = filename.rsplit('.').next().unwrap_or_default().to_lowercase();
    let mut state = api.lock();
    let id = state.next_document_id;
    state.next_document_id += 1;
    let document = json!({
        "id": id,
        "filename": filename,
        "filetype": filetype,
        "size_bytes": size,
        "upload_date": "2024-03-05T10:00:00",
        "doc_date": "2024-02-28",
        "invoice_number": format!("F-{}", id),
        "supplier_name": "Distribuidora Sur",
        "invoice_total": 1000.0,
    });
    state.documents.push(document.clone());
    (StatusCode::CREATED, Json(document)).into_response()
}

async fn get_document(
    State(api): State<FakeApi>,
    UrlPath(id): UrlPath<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, &format!("/api/documents/{}", id), query, &headers, None);
    let state = api.lock();
    match state.documents.iter().find(|d| d["id"] == json!(id)) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "document not found"),
    }
}

async fn download_document(
    State(api): State<FakeApi>,
    UrlPath(id): UrlPath<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, &format!("/api/documents/{}/download", id), query, &headers, None);
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"documento_{}_resumen.pdf\"", id),
            ),
        ],
        b"%PDF-1.4 summary".to_vec(),
    )
        .into_response()
}

async fn delete_all(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::DELETE, "/api/documents/delete_all", query, &headers, None);
    let mut state = api.lock();
    let count = state.documents.len();
    state.documents.clear();
    Json(json!({ "message": format!("Deleted {} documents", count) })).into_response()
}

/// Chart body labelled with the session it was computed for. The second
/// series holds the number of documents when the request arrived.
async fn chart(api: FakeApi, path: &str, query: HashMap<String, String>, headers: HeaderMap) -> Response {
    let session = session_of(&query);
    api.record(Method::GET, path, query, &headers, None);

    let (gate, fail, documents) = {
        let mut state = api.lock();
        let gate = match session {
            Some(s) => match state.next_gates.remove(&s) {
                Some(gate) => Some(gate),
                None => state.gates.get(&s).cloned(),
            },
            None => None,
        };
        (gate, state.fail_charts, state.documents.len())
    };
    if let Some(gate) = gate {
        gate.notified().await;
    }
    if fail {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "chart backend failed");
    }

    match session {
        Some(id) => Json(json!({
            "labels": [format!("session-{}", id)],
            "series": [
                { "name": "total", "data": [id as f64 * 100.0] },
                { "name": "documents", "data": [documents as f64] },
            ],
        }))
        .into_response(),
        None => Json(json!({ "labels": [], "series": [] })).into_response(),
    }
}

async fn product_chart(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    chart(api, "/api/analytics/products/chart", query, headers).await
}

async fn category_chart(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    chart(api, "/api/analytics/categories", query, headers).await
}

async fn insights(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, "/api/analytics/ai", query, &headers, None);
    Json(json!({
        "suggestions": ["Negotiate volume pricing with Distribuidora Sur"],
        "projections": { "next_month_total": 12500.0 },
    }))
    .into_response()
}

async fn export_products(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, "/api/analytics/products/export", query, &headers, None);
    (
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=resumen_productos.xlsx",
        )],
        b"PK\x03\x04".to_vec(),
    )
        .into_response()
}

fn category_listing(state: &Backend) -> Vec<Value> {
    state
        .categories
        .iter()
        .map(|(product, (category, manual))| {
            json!({ "product": product, "category": category, "manual": manual })
        })
        .collect()
}

async fn categorizations(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.record(Method::GET, "/api/products/categorization", query, &headers, None);
    let products = category_listing(&api.lock());
    Json(json!({ "products": products })).into_response()
}

async fn manual_category(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(Method::POST, "/api/manual_categories", query, &headers, Some(body.clone()));
    let (Some(product), Some(category)) = (body["product"].as_str(), body["category"].as_str())
    else {
        return error(StatusCode::BAD_REQUEST, "product and category are required");
    };
    api.lock()
        .categories
        .insert(product.to_string(), (Some(category.to_string()), true));
    Json(json!({ "success": true })).into_response()
}

async fn apply_ml(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(
        Method::POST,
        "/api/products/categorization/apply_ml",
        query,
        &headers,
        Some(body.clone()),
    );
    let requested: Option<Vec<String>> = body["products"].as_array().map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });

    let mut state = api.lock();
    let mut updated = Vec::new();
    for (product, (category, manual)) in state.categories.iter_mut() {
        if *manual {
            continue;
        }
        if let Some(ref wanted) = requested {
            if !wanted.contains(product) {
                continue;
            }
        }
        *category = Some("Abarrotes".to_string());
        updated.push(json!({ "product": product, "category": "Abarrotes", "manual": false }));
    }
    Json(json!({ "updated": updated.len(), "products": updated })).into_response()
}
