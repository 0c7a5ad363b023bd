//! Request builders, response parsing, and the operations of the Formstack
//! API.
//!
//! # Design
//! `FormstackClient` holds the access token, the base URL, and a transport,
//! none of which change after construction. Every operation is split into a
//! `build_*` method that validates input and produces an `HttpRequest`, and a
//! parse step that consumes the `HttpResponse`. The convenience methods
//! (`forms`, `submit_form`, ...) run build, `Transport::send`, then parse.
//!
//! Validation always happens inside `build_*`, so a caller error never
//! reaches the transport. Responses outside [200, 300) become
//! `ApiError::BadToken`; 2xx bodies are returned as JSON even when they
//! carry `"status": "error"`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::Params;
use crate::transport::Transport;
use crate::types::{FieldSpec, FieldType, FormListing, Numeric, SubmissionInput, SubmissionQuery};
use crate::validate;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Client for the Formstack v2 REST API.
///
/// `T` is the transport. Use `FormstackClient::new` for the bundled ureq
/// transport, `with_transport` for your own, or `detached` to only build
/// requests and parse responses while performing the I/O yourself.
#[derive(Clone)]
pub struct FormstackClient<T> {
    access_token: String,
    base_url: String,
    transport: T,
}

impl<T> std::fmt::Debug for FormstackClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormstackClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "ureq")]
impl FormstackClient<crate::transport::UreqTransport> {
    /// Client for the public API using the bundled blocking transport.
    pub fn new(access_token: &str) -> Self {
        Self::from_config(ClientConfig::new(access_token))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = crate::transport::UreqTransport::with_timeout(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl FormstackClient<()> {
    /// A client without a transport: only `build_*` and `parse_*` are
    /// available.
    pub fn detached(config: ClientConfig) -> Self {
        Self::with_transport(config, ())
    }
}

impl<T> FormstackClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let base_url = format!("{}/", config.base_url.trim_end_matches('/'));
        Self {
            access_token: config.access_token,
            base_url,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // --- Low level ---

    /// Build a request for `endpoint` (relative to the base URL) with a verb
    /// given as text. Fails with "Missing End Point" for an empty endpoint
    /// and "Wrong verb" for anything but GET, PUT, POST or DELETE in any
    /// case.
    pub fn build_request(
        &self,
        endpoint: &str,
        verb: &str,
        params: &Params,
    ) -> Result<HttpRequest, ApiError> {
        validate::endpoint(endpoint)?;
        let method: HttpMethod = verb.parse()?;
        self.build(endpoint, method, params)
    }

    fn build(&self, endpoint: &str, method: HttpMethod, params: &Params) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.access_token),
        )];
        let mut body = None;

        if !params.is_empty() {
            let encoded = params.encode()?;
            if method.carries_body() {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                body = Some(encoded);
            } else {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&encoded);
            }
        }

        // Query strings can carry an encryption password.
        let path = url.split('?').next().unwrap_or("");
        debug!(method = %method, path = %path, params = params.len(), "built formstack request");

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Apply the status check and parse the body as JSON. An empty 2xx body
    /// parses as `null`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            warn!(status = response.status, "formstack request rejected");
            return Err(ApiError::BadToken {
                status: response.status,
                body: response.body,
            });
        }
        debug!(status = response.status, bytes = response.body.len(), "formstack response");
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    // --- Forms ---

    pub fn build_forms(&self, organized_by_folders: bool) -> Result<HttpRequest, ApiError> {
        let mut params = Params::new();
        params.insert("folders", if organized_by_folders { 1 } else { 0 });
        self.build("form.json", HttpMethod::Get, &params)
    }

    pub fn parse_forms(&self, response: HttpResponse) -> Result<FormListing, ApiError> {
        self.parse_response(response).map(FormListing::from_body)
    }

    pub fn build_form_details(&self, form_id: impl Into<Numeric>) -> Result<HttpRequest, ApiError> {
        let id = validate::form_id(&form_id.into())?;
        self.build(&format!("form/{id}"), HttpMethod::Get, &Params::new())
    }

    pub fn build_copy_form(&self, form_id: impl Into<Numeric>) -> Result<HttpRequest, ApiError> {
        let id = validate::form_id(&form_id.into())?;
        self.build(&format!("form/{id}/copy"), HttpMethod::Post, &Params::new())
    }

    // --- Submissions ---

    pub fn build_form_submissions(
        &self,
        form_id: impl Into<Numeric>,
        query: &SubmissionQuery,
    ) -> Result<HttpRequest, ApiError> {
        let id = validate::form_id(&form_id.into())?;
        validate::time_bound(&query.min_time, validate::INVALID_MIN_TIME)?;
        validate::time_bound(&query.max_time, validate::INVALID_MAX_TIME)?;
        validate::one_to_one(
            query.search_field_ids.len(),
            query.search_field_values.len(),
            validate::SEARCH_MISMATCH,
        )?;
        let search_ids = validate::field_ids(&query.search_field_ids)?;
        let per_page = validate::per_page(&query.per_page)?;
        let page = validate::page_number(&query.page_number)?;
        validate::sort(&query.sort)?;

        let mut params = Params::new();
        params.insert("encryption_password", query.encryption_password.as_str());
        params.insert("min_time", query.min_time.as_str());
        params.insert("max_time", query.max_time.as_str());
        params.insert("page", page.to_string());
        params.insert("per_page", per_page);
        params.insert("sort", query.sort.as_str());
        params.insert_flag("data", query.include_data);
        params.insert_flag("expand_data", query.expand_data);
        let mut params = params.clean();

        for (idx, (field, value)) in search_ids.iter().zip(&query.search_field_values).enumerate() {
            params.insert(format!("search_field_{idx}"), field.to_string());
            params.insert(format!("search_value_{idx}"), value.as_str());
        }

        self.build(&format!("form/{id}/submission.json"), HttpMethod::Get, &params)
    }

    /// The `submissions` field of the response, or the whole body when the
    /// service answered without one (an in-band error).
    pub fn parse_form_submissions(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let mut body = self.parse_response(response)?;
        match body.as_object_mut().and_then(|map| map.remove("submissions")) {
            Some(submissions) => Ok(submissions),
            None => Ok(body),
        }
    }

    pub fn build_submit_form(
        &self,
        form_id: impl Into<Numeric>,
        input: &SubmissionInput,
    ) -> Result<HttpRequest, ApiError> {
        let id = validate::form_id(&form_id.into())?;
        let params = submission_params(input)?;
        self.build(&format!("form/{id}/submission.json"), HttpMethod::Post, &params)
    }

    pub fn build_submission_details(
        &self,
        submission_id: impl Into<Numeric>,
        encryption_password: &str,
    ) -> Result<HttpRequest, ApiError> {
        let id = validate::submission_id(&submission_id.into())?;
        let mut params = Params::new();
        params.insert_non_empty("encryption_password", encryption_password);
        self.build(&format!("submission/{id}.json"), HttpMethod::Get, &params)
    }

    pub fn build_edit_submission(
        &self,
        submission_id: impl Into<Numeric>,
        input: &SubmissionInput,
    ) -> Result<HttpRequest, ApiError> {
        let id = validate::submission_id(&submission_id.into())?;
        let params = submission_params(input)?;
        self.build(&format!("submission/{id}.json"), HttpMethod::Put, &params)
    }

    pub fn build_delete_submission(&self, submission_id: impl Into<Numeric>) -> Result<HttpRequest, ApiError> {
        let id = validate::submission_id(&submission_id.into())?;
        self.build(&format!("submission/{id}"), HttpMethod::Delete, &Params::new())
    }

    // --- Fields ---

    pub fn build_create_field(
        &self,
        form_id: impl Into<Numeric>,
        spec: &FieldSpec,
    ) -> Result<HttpRequest, ApiError> {
        let id = validate::form_id(&form_id.into())?;
        let field_type: FieldType = spec.field_type.parse()?;

        let mut params = Params::new();
        params.insert("field_type", field_type.as_str());
        params.insert_non_empty("label", &spec.label);
        params.insert_flag("hide_label", spec.hide_label);
        params.insert_non_empty("description", &spec.description);
        params.insert_flag("description_callout", spec.use_callout);
        if !spec.attributes.is_empty() {
            params.insert("attributes", Value::Object(spec.attributes.clone()));
        }
        params.insert_non_empty("default_value", &spec.default_value);
        if !spec.options.is_empty() {
            params.insert("options", spec.options.clone());
        }
        if !spec.option_values.is_empty() {
            params.insert("options_values", spec.option_values.clone());
        }
        params.insert_flag("required", spec.required);
        params.insert_flag("read_only", spec.read_only);
        params.insert_flag("hidden", spec.hidden);
        params.insert_flag("unique", spec.unique);
        if let Some(span) = spec.column_span {
            params.insert("colspan", span);
        }
        if let Some(sort) = spec.sort {
            params.insert("sort", sort);
        }

        self.build(&format!("form/{id}/field"), HttpMethod::Post, &params)
    }
}

/// Shared by create and edit: metadata first, cleaned of empty strings, then
/// one `field_<id>` entry per value.
fn submission_params(input: &SubmissionInput) -> Result<Params, ApiError> {
    validate::timestamp(&input.timestamp)?;
    validate::one_to_one(
        input.field_ids.len(),
        input.field_values.len(),
        validate::FIELD_MISMATCH,
    )?;
    let ids = validate::field_ids(&input.field_ids)?;

    let mut params = Params::new();
    params.insert("timestamp", input.timestamp.as_str());
    params.insert("user_agent", input.user_agent.as_str());
    params.insert("remote_addr", input.ip_address.as_str());
    params.insert("payment_status", input.payment_status.as_str());
    params.insert("read", if input.read { 1 } else { 0 });
    let mut params = params.clean();

    for (id, value) in ids.iter().zip(&input.field_values) {
        params.insert(format!("field_{id}"), value.clone());
    }
    Ok(params)
}

impl<T: Transport> FormstackClient<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.send(&request)
    }

    /// Issue an arbitrary call and return the parsed JSON body.
    pub fn request(&self, endpoint: &str, verb: &str, params: &Params) -> Result<Value, ApiError> {
        let request = self.build_request(endpoint, verb, params)?;
        self.parse_response(self.execute(request)?)
    }

    /// All forms; grouped by folder when `organized_by_folders` is set.
    pub fn forms(&self, organized_by_folders: bool) -> Result<FormListing, ApiError> {
        let request = self.build_forms(organized_by_folders)?;
        self.parse_forms(self.execute(request)?)
    }

    pub fn form_details(&self, form_id: impl Into<Numeric>) -> Result<Value, ApiError> {
        let request = self.build_form_details(form_id)?;
        self.parse_response(self.execute(request)?)
    }

    pub fn copy_form(&self, form_id: impl Into<Numeric>) -> Result<Value, ApiError> {
        let request = self.build_copy_form(form_id)?;
        self.parse_response(self.execute(request)?)
    }

    pub fn form_submissions(
        &self,
        form_id: impl Into<Numeric>,
        query: &SubmissionQuery,
    ) -> Result<Value, ApiError> {
        let request = self.build_form_submissions(form_id, query)?;
        self.parse_form_submissions(self.execute(request)?)
    }

    pub fn submit_form(&self, form_id: impl Into<Numeric>, input: &SubmissionInput) -> Result<Value, ApiError> {
        let request = self.build_submit_form(form_id, input)?;
        self.parse_response(self.execute(request)?)
    }

    pub fn get_submission_details(
        &self,
        submission_id: impl Into<Numeric>,
        encryption_password: &str,
    ) -> Result<Value, ApiError> {
        let request = self.build_submission_details(submission_id, encryption_password)?;
        self.parse_response(self.execute(request)?)
    }

    pub fn edit_submission_data(
        &self,
        submission_id: impl Into<Numeric>,
        input: &SubmissionInput,
    ) -> Result<Value, ApiError> {
        let request = self.build_edit_submission(submission_id, input)?;
        self.parse_response(self.execute(request)?)
    }

    pub fn delete_submission(&self, submission_id: impl Into<Numeric>) -> Result<Value, ApiError> {
        let request = self.build_delete_submission(submission_id)?;
        self.parse_response(self.execute(request)?)
    }

    pub fn create_field(&self, form_id: impl Into<Numeric>, spec: &FieldSpec) -> Result<Value, ApiError> {
        let request = self.build_create_field(form_id, spec)?;
        self.parse_response(self.execute(request)?)
    }
}
