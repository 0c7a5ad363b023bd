//! End-to-end tests against the in-memory Formstack mock.
//!
//! # Design
//! Starts the mock on a random port in a background runtime, then drives
//! every client operation over real HTTP through `UreqTransport`. This
//! checks that request encoding (query strings, bracketed form bodies,
//! bearer header) is understood by a server, not just by our own tests.

use formstack_core::{
    ApiError, ClientConfig, FieldSpec, FieldType, FormListing, FormstackClient, Params,
    SubmissionInput, SubmissionQuery, UreqTransport,
};
use formstack_mock::{EMAIL_FIELD_ID, INACCESSIBLE_FORM_ID, NAME_FIELD_ID, TEST_FORM_ID};
use serde_json::{json, Value};

const TOKEN: &str = "integration-token";

/// Spawn a fresh mock server and return its `/api/v2/` base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            formstack_mock::run(listener, TOKEN).await
        })
        .unwrap();
    });

    format!("http://{addr}/api/v2/")
}

fn client(base_url: &str, token: &str) -> FormstackClient<UreqTransport> {
    FormstackClient::from_config(ClientConfig::new(token).with_base_url(base_url))
}

/// The `value` of `field` in a submission detail's `data` list.
fn field_value<'a>(submission: &'a Value, field: i64) -> Option<&'a Value> {
    submission["data"]
        .as_array()?
        .iter()
        .find(|entry| entry["field"] == field.to_string())
        .map(|entry| &entry["value"])
}

#[test]
fn bad_token_is_raised() {
    let base = start_server();
    let client = client(&base, "fail");
    let err = client.request("form.json", "GET", &Params::new()).unwrap_err();
    assert!(matches!(err, ApiError::BadToken { status: 401, .. }));
    assert_eq!(err.to_string(), "Bad token");
}

#[test]
fn forms_shapes() {
    let base = start_server();
    let client = client(&base, TOKEN);

    let flat = client.forms(false).unwrap();
    assert!(matches!(flat, FormListing::Flat(ref forms) if !forms.is_empty()));

    let grouped = client.forms(true).unwrap();
    match grouped {
        FormListing::ByFolder(folders) => assert!(folders.contains_key("Uncategorized")),
        other => panic!("expected folders, got {other:?}"),
    }
}

#[test]
fn form_details_and_in_band_errors() {
    let base = start_server();
    let client = client(&base, TOKEN);

    let form = client.form_details(TEST_FORM_ID).unwrap();
    assert_eq!(form["name"], "Test Form");

    let missing = client.form_details(1234).unwrap();
    assert_eq!(missing["status"], "error");
    assert_eq!(missing["error"], "The form was not found");

    let restricted = client.form_details(INACCESSIBLE_FORM_ID).unwrap();
    assert_eq!(restricted["status"], "error");
    assert_eq!(
        restricted["error"],
        "You do not have high enough permissions for this form."
    );
}

#[test]
fn copy_form_appends_copy() {
    let base = start_server();
    let client = client(&base, TOKEN);

    let form = client.form_details(TEST_FORM_ID).unwrap();
    let copied = client.copy_form(TEST_FORM_ID).unwrap();
    let name = form["name"].as_str().unwrap();
    assert!(copied["name"].as_str().unwrap().starts_with(&format!("{name} - COPY")));

    let invalid = client.copy_form(1234).unwrap();
    assert_eq!(invalid["error"], "A valid form id was not supplied");
}

#[test]
fn submission_round_trip() {
    // Step 1: start server.
    let base = start_server();
    let client = client(&base, TOKEN);

    // Step 2: submit a structured and a scalar value.
    let name = json!({"first": "Jane", "last": "Doe"});
    let input = SubmissionInput::default()
        .field(NAME_FIELD_ID, name.clone())
        .field(EMAIL_FIELD_ID, "jane@example.com");
    let created = client.submit_form(TEST_FORM_ID, &input).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    // Step 3: read it back.
    let details = client.get_submission_details(id.as_str(), "").unwrap();
    assert_eq!(field_value(&details, NAME_FIELD_ID), Some(&name));
    assert_eq!(
        field_value(&details, EMAIL_FIELD_ID),
        Some(&json!("jane@example.com"))
    );
    assert_eq!(details["read"], "0");

    // Step 4: edit.
    let edit = SubmissionInput {
        read: true,
        ..SubmissionInput::default()
    }
    .field(EMAIL_FIELD_ID, "doe@example.com");
    let edited = client.edit_submission_data(id.as_str(), &edit).unwrap();
    assert_eq!(edited["success"], "1");
    let details = client.get_submission_details(id.as_str(), "").unwrap();
    assert_eq!(field_value(&details, EMAIL_FIELD_ID), Some(&json!("doe@example.com")));
    assert_eq!(details["read"], "1");

    // Step 5: list and search.
    let query = SubmissionQuery {
        include_data: true,
        ..SubmissionQuery::default()
    }
    .search(EMAIL_FIELD_ID, "doe@example.com");
    let found = client.form_submissions(TEST_FORM_ID, &query).unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);

    let query = SubmissionQuery::default().search(EMAIL_FIELD_ID, "nobody@example.com");
    let none = client.form_submissions(TEST_FORM_ID, &query).unwrap();
    assert!(none.as_array().unwrap().is_empty());

    // Step 6: delete, then delete again.
    let deleted = client.delete_submission(id.as_str()).unwrap();
    assert_eq!(deleted["success"], "1");
    let again = client.delete_submission(id.as_str()).unwrap();
    assert_eq!(again["status"], "error");
}

#[test]
fn default_listing_is_capped_at_page_size() {
    let base = start_server();
    let client = client(&base, TOKEN);

    for i in 0..30 {
        let input = SubmissionInput::default().field(EMAIL_FIELD_ID, format!("user{i}@example.com"));
        client.submit_form(TEST_FORM_ID, &input).unwrap();
    }

    let form = client.form_details(TEST_FORM_ID).unwrap();
    let total: usize = form["submissions"].as_str().unwrap().parse().unwrap();
    let page = client.form_submissions(TEST_FORM_ID, &SubmissionQuery::default()).unwrap();
    assert_eq!(page.as_array().unwrap().len(), total.min(25));
}

#[test]
fn create_field_on_form() {
    let base = start_server();
    let client = client(&base, TOKEN);

    let spec = FieldSpec {
        options: vec!["Red".to_string(), "Blue".to_string()],
        required: true,
        ..FieldSpec::new(FieldType::Select).label("Colour")
    };
    let field = client.create_field(TEST_FORM_ID, &spec).unwrap();
    assert_eq!(field["field_type"], "select");
    assert_eq!(field["label"], "Colour");
    assert_eq!(field["options"], json!(["Red", "Blue"]));
    assert_eq!(field["required"], "1");
}

#[test]
fn validation_fails_without_a_server() {
    // Nothing listens here; validation must fail before any connection.
    let client = client("http://127.0.0.1:9/api/v2/", TOKEN);
    let err = client.form_details("TEXT").unwrap_err();
    assert_eq!(err.invalid_argument(), Some("Form ID must be numeric"));
    let err = client.delete_submission("TEXT").unwrap_err();
    assert_eq!(err.invalid_argument(), Some("Submission ID must be numeric"));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let client = client("http://127.0.0.1:9/api/v2/", TOKEN);
    let err = client.request("form.json", "GET", &Params::new()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    assert!(!matches!(err, ApiError::BadToken { .. }));
    assert_eq!(err.invalid_argument(), None);
}
