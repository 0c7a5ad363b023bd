//! In-memory stand-in for the Formstack v2 API.
//!
//! Serves the same paths under `/api/v2/`, checks the bearer token on every
//! call (HTTP 401 on mismatch), and reports unknown forms or submissions the
//! way the real service does: HTTP 200 with `{"status":"error","error":...}`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const TEST_FORM_ID: i64 = 1001;
pub const INACCESSIBLE_FORM_ID: i64 = 1002;
pub const NAME_FIELD_ID: i64 = 101;
pub const EMAIL_FIELD_ID: i64 = 102;

const FORM_NOT_FOUND: &str = "The form was not found";
const FORM_FORBIDDEN: &str = "You do not have high enough permissions for this form.";
const INVALID_FORM_ID: &str = "A valid form id was not supplied";
const SUBMISSION_NOT_FOUND: &str = "The submission was not found";

#[derive(Clone, Debug)]
pub struct FormRecord {
    pub id: i64,
    pub name: String,
    pub folder: String,
    pub restricted: bool,
    pub fields: Vec<Value>,
}

#[derive(Clone, Debug)]
pub struct Submission {
    pub id: i64,
    pub form: i64,
    pub timestamp: String,
    pub read: bool,
    pub remote_addr: String,
    pub user_agent: String,
    pub payment_status: String,
    pub data: BTreeMap<i64, Value>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub forms: BTreeMap<i64, FormRecord>,
    pub submissions: BTreeMap<i64, Submission>,
    next_id: i64,
}

impl Store {
    /// One accessible form with a name and an email field, and one form the
    /// token may not read.
    pub fn seeded() -> Self {
        let mut store = Store {
            next_id: 5000,
            ..Store::default()
        };
        store.forms.insert(
            TEST_FORM_ID,
            FormRecord {
                id: TEST_FORM_ID,
                name: "Test Form".to_string(),
                folder: "Uncategorized".to_string(),
                restricted: false,
                fields: vec![
                    json!({"id": NAME_FIELD_ID.to_string(), "type": "name", "label": "Name"}),
                    json!({"id": EMAIL_FIELD_ID.to_string(), "type": "email", "label": "Email"}),
                ],
            },
        );
        store.forms.insert(
            INACCESSIBLE_FORM_ID,
            FormRecord {
                id: INACCESSIBLE_FORM_ID,
                name: "Restricted".to_string(),
                folder: "Private".to_string(),
                restricted: true,
                fields: Vec::new(),
            },
        );
        store
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn submission_count(&self, form: i64) -> usize {
        self.submissions.values().filter(|s| s.form == form).count()
    }
}

#[derive(Clone)]
pub struct AppState {
    token: Arc<String>,
    db: Arc<RwLock<Store>>,
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::new(token.to_string()),
        db: Arc::new(RwLock::new(Store::seeded())),
    };
    Router::new()
        .route("/api/v2/form.json", get(list_forms))
        .route("/api/v2/form/{id}", get(form_details))
        .route("/api/v2/form/{id}/copy", post(copy_form))
        .route(
            "/api/v2/form/{id}/submission.json",
            get(list_submissions).post(create_submission),
        )
        .route("/api/v2/form/{id}/field", post(create_field))
        .route(
            "/api/v2/submission/{id}",
            get(get_submission).put(edit_submission).delete(delete_submission),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let expected = format!("Bearer {}", state.token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        _ => {
            tracing::warn!("rejected request with bad bearer token");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid_token", "error_description": "The access token provided is invalid."})),
            ))
        }
    }
}

fn in_band_error(message: &str) -> Json<Value> {
    Json(json!({"status": "error", "error": message}))
}

/// Accepts `"5"`, `"5.json"`.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim_end_matches(".json").parse().ok()
}

fn lookup(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

/// Rebuild nested values from bracketed form keys: `a[b]=1` becomes
/// `{"a": {"b": "1"}}` and `a[]=x&a[]=y` becomes `{"a": ["x", "y"]}`.
pub fn unflatten(pairs: &[(String, String)]) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in pairs {
        let (root, rest) = match key.find('[') {
            Some(idx) => (&key[..idx], &key[idx..]),
            None => (key.as_str(), ""),
        };
        let value = Value::String(value.clone());
        if rest.is_empty() {
            out.insert(root.to_string(), value);
        } else if rest == "[]" {
            let entry = out.entry(root.to_string()).or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(value);
            }
        } else {
            let sub = rest.trim_start_matches('[').trim_end_matches(']').to_string();
            let entry = out.entry(root.to_string()).or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = entry {
                map.insert(sub, value);
            }
        }
    }
    out
}

fn form_json(form: &FormRecord, submissions: usize) -> Value {
    json!({
        "id": form.id.to_string(),
        "name": form.name,
        "folder": form.folder,
        "submissions": submissions.to_string(),
        "fields": form.fields,
    })
}

fn submission_json(sub: &Submission, with_data: bool) -> Value {
    let mut value = json!({
        "id": sub.id.to_string(),
        "form": sub.form.to_string(),
        "timestamp": sub.timestamp,
        "read": if sub.read { "1" } else { "0" },
        "remote_addr": sub.remote_addr,
        "user_agent": sub.user_agent,
        "payment_status": sub.payment_status,
    });
    if with_data {
        let data: Vec<Value> = sub
            .data
            .iter()
            .map(|(field, value)| json!({"field": field.to_string(), "value": value}))
            .collect();
        value["data"] = Value::Array(data);
    }
    value
}

/// Apply `field_<id>` entries and submission metadata from a form body.
fn apply_submission_body(sub: &mut Submission, body: &Map<String, Value>) {
    for (key, value) in body {
        if let Some(field) = key.strip_prefix("field_").and_then(|id| id.parse::<i64>().ok()) {
            sub.data.insert(field, value.clone());
            continue;
        }
        let text = value.as_str().unwrap_or_default().to_string();
        match key.as_str() {
            "timestamp" => sub.timestamp = text,
            "read" => sub.read = text == "1",
            "remote_addr" => sub.remote_addr = text,
            "user_agent" => sub.user_agent = text,
            "payment_status" => sub.payment_status = text,
            _ => {}
        }
    }
}

async fn list_forms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Reply {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let visible: Vec<&FormRecord> = db.forms.values().filter(|f| !f.restricted).collect();
    let total = visible.len();

    let forms = if lookup(&query, "folders").as_deref() == Some("1") {
        let mut folders = Map::new();
        for form in visible {
            let entry = folders
                .entry(form.folder.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(form_json(form, db.submission_count(form.id)));
            }
        }
        Value::Object(folders)
    } else {
        Value::Array(
            visible
                .into_iter()
                .map(|f| form_json(f, db.submission_count(f.id)))
                .collect(),
        )
    };
    Ok(Json(json!({"forms": forms, "total": total})))
}

async fn form_details(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    match parse_id(&id).and_then(|id| db.forms.get(&id)) {
        None => Ok(in_band_error(FORM_NOT_FOUND)),
        Some(form) if form.restricted => Ok(in_band_error(FORM_FORBIDDEN)),
        Some(form) => Ok(Json(form_json(form, db.submission_count(form.id)))),
    }
}

async fn copy_form(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let Some(original) = parse_id(&id).and_then(|id| db.forms.get(&id)).filter(|f| !f.restricted).cloned()
    else {
        return Ok(in_band_error(INVALID_FORM_ID));
    };
    let copy = FormRecord {
        id: db.next_id(),
        name: format!("{} - COPY", original.name),
        ..original
    };
    tracing::info!(id = copy.id, name = %copy.name, "copied form");
    let body = form_json(&copy, 0);
    db.forms.insert(copy.id, copy);
    Ok(Json(body))
}

async fn list_submissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Reply {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let form_id = match parse_id(&id).and_then(|id| db.forms.get(&id)) {
        None => return Ok(in_band_error(FORM_NOT_FOUND)),
        Some(form) if form.restricted => return Ok(in_band_error(FORM_FORBIDDEN)),
        Some(form) => form.id,
    };

    let page: usize = lookup(&query, "page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let per_page: usize = lookup(&query, "per_page").and_then(|p| p.parse().ok()).unwrap_or(25);
    let with_data = lookup(&query, "data").as_deref() == Some("1");

    let mut criteria = Vec::new();
    for idx in 0.. {
        let (Some(field), Some(value)) = (
            lookup(&query, &format!("search_field_{idx}")),
            lookup(&query, &format!("search_value_{idx}")),
        ) else {
            break;
        };
        if let Ok(field) = field.parse::<i64>() {
            criteria.push((field, value));
        }
    }

    let mut matching: Vec<&Submission> = db
        .submissions
        .values()
        .filter(|s| s.form == form_id)
        .filter(|s| {
            criteria
                .iter()
                .all(|(field, value)| s.data.get(field).and_then(Value::as_str) == Some(value.as_str()))
        })
        .collect();
    if lookup(&query, "sort").as_deref() != Some("ASC") {
        matching.reverse();
    }

    let total = matching.len();
    let pages = total.div_ceil(per_page.max(1));
    let submissions: Vec<Value> = matching
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .map(|s| submission_json(s, with_data))
        .collect();
    Ok(Json(json!({"submissions": submissions, "total": total, "pages": pages})))
}

async fn create_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let form_id = match parse_id(&id).and_then(|id| db.forms.get(&id)) {
        None => return Ok(in_band_error(FORM_NOT_FOUND)),
        Some(form) if form.restricted => return Ok(in_band_error(FORM_FORBIDDEN)),
        Some(form) => form.id,
    };
    let mut sub = Submission {
        id: db.next_id(),
        form: form_id,
        timestamp: "2024-01-01 00:00:00".to_string(),
        read: false,
        remote_addr: String::new(),
        user_agent: String::new(),
        payment_status: String::new(),
        data: BTreeMap::new(),
    };
    apply_submission_body(&mut sub, &unflatten(&pairs));
    tracing::info!(form = form_id, submission = sub.id, "created submission");
    let body = submission_json(&sub, true);
    db.submissions.insert(sub.id, sub);
    Ok(Json(body))
}

async fn get_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    match parse_id(&id).and_then(|id| db.submissions.get(&id)) {
        Some(sub) => Ok(Json(submission_json(sub, true))),
        None => Ok(in_band_error(SUBMISSION_NOT_FOUND)),
    }
}

async fn edit_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Reply {
    authorize(&state, &headers)?;
    let Some(id) = parse_id(&id) else {
        return Ok(in_band_error(SUBMISSION_NOT_FOUND));
    };
    let mut db = state.db.write().await;
    match db.submissions.get_mut(&id) {
        Some(sub) => {
            apply_submission_body(sub, &unflatten(&pairs));
            Ok(Json(json!({"success": "1", "id": sub.id.to_string()})))
        }
        None => Ok(in_band_error(SUBMISSION_NOT_FOUND)),
    }
}

async fn delete_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    match parse_id(&id).and_then(|id| db.submissions.remove(&id)) {
        Some(sub) => Ok(Json(json!({"success": "1", "id": sub.id.to_string()}))),
        None => Ok(in_band_error(SUBMISSION_NOT_FOUND)),
    }
}

async fn create_field(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let Some(form_id) = parse_id(&id)
        .and_then(|id| db.forms.get(&id))
        .filter(|f| !f.restricted)
        .map(|f| f.id)
    else {
        return Ok(in_band_error(INVALID_FORM_ID));
    };
    let mut field = unflatten(&pairs);
    field.insert("id".to_string(), Value::String(db.next_id().to_string()));
    let field = Value::Object(field);
    if let Some(form) = db.forms.get_mut(&form_id) {
        form.fields.push(field.clone());
    }
    Ok(Json(field))
}
