//! Caller-facing inputs and outputs for the Formstack API.
//!
//! # Design
//! Every operation with optional arguments takes one options struct whose
//! `Default` matches the API's defaults (page 1, 25 per page, `DESC`, flags
//! off, strings empty). Identifiers and paging values are `Numeric` rather
//! than integers so that a non-numeric value coming from user input, a
//! config file, or a JSON test vector is reported with the API's own
//! validation message instead of failing somewhere upstream.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A caller-supplied value that must turn out to be an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    /// Only produced for values above `i64::MAX`.
    UInt(u64),
    Text(String),
}

impl Numeric {
    /// The integer value, if there is one. Text is accepted when it parses
    /// as a base-10 integer. Both the signed and the unsigned 64-bit ranges
    /// fit, so any ID the API can hand out is numeric.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Numeric::Int(n) => Some(i128::from(*n)),
            Numeric::UInt(n) => Some(i128::from(*n)),
            Numeric::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(n) => write!(f, "{n}"),
            Numeric::UInt(n) => write!(f, "{n}"),
            Numeric::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! numeric_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Numeric {
            fn from(n: $t) -> Self {
                Numeric::Int(i64::from(n))
            }
        })*
    };
}

numeric_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Numeric {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(v) => Numeric::Int(v),
            Err(_) => Numeric::UInt(n),
        }
    }
}

impl From<usize> for Numeric {
    fn from(n: usize) -> Self {
        Numeric::from(n as u64)
    }
}

impl From<&str> for Numeric {
    fn from(s: &str) -> Self {
        Numeric::Text(s.to_string())
    }
}

impl From<String> for Numeric {
    fn from(s: String) -> Self {
        Numeric::Text(s)
    }
}

/// Field types the API knows how to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Textarea,
    Name,
    Address,
    Email,
    Phone,
    CreditCard,
    DateTime,
    File,
    Number,
    Select,
    Radio,
    Checkbox,
    Matrix,
    RichText,
    Embed,
    Product,
    Section,
}

impl FieldType {
    pub const ALL: [FieldType; 18] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Name,
        FieldType::Address,
        FieldType::Email,
        FieldType::Phone,
        FieldType::CreditCard,
        FieldType::DateTime,
        FieldType::File,
        FieldType::Number,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Matrix,
        FieldType::RichText,
        FieldType::Embed,
        FieldType::Product,
        FieldType::Section,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Name => "name",
            FieldType::Address => "address",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::CreditCard => "creditcard",
            FieldType::DateTime => "datetime",
            FieldType::File => "file",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Matrix => "matrix",
            FieldType::RichText => "richtext",
            FieldType::Embed => "embed",
            FieldType::Product => "product",
            FieldType::Section => "section",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the wire names.
impl FromStr for FieldType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ApiError::invalid("Provided Field Type is not in the list of known Field types"))
    }
}

/// Encode a file for upload as a submission field value:
/// `"<filename>;<base64 contents>"`.
pub fn file_field_value(filename: &str, contents: &[u8]) -> Value {
    let encoded = base64::engine::general_purpose::STANDARD.encode(contents);
    Value::String(format!("{filename};{encoded}"))
}

/// The `forms` listing, whose shape depends on whether folders were
/// requested.
#[derive(Debug, Clone, PartialEq)]
pub enum FormListing {
    /// `forms(false)`: every form in one sequence.
    Flat(Vec<Value>),
    /// `forms(true)`: forms grouped under their folder name.
    ByFolder(Map<String, Value>),
    /// A 2xx response without a usable `forms` field, usually
    /// `{"status":"error","error":...}`. Passed through untouched.
    Rejected(Value),
}

impl FormListing {
    pub fn from_body(body: Value) -> Self {
        let Value::Object(mut map) = body else {
            return FormListing::Rejected(body);
        };
        match map.remove("forms") {
            Some(Value::Array(items)) => FormListing::Flat(items),
            Some(Value::Object(folders)) => FormListing::ByFolder(folders),
            other => {
                if let Some(forms) = other {
                    map.insert("forms".to_string(), forms);
                }
                FormListing::Rejected(Value::Object(map))
            }
        }
    }

    /// Number of forms across all folders.
    pub fn form_count(&self) -> usize {
        match self {
            FormListing::Flat(items) => items.len(),
            FormListing::ByFolder(map) => map
                .values()
                .map(|v| v.as_array().map_or(0, Vec::len))
                .sum(),
            FormListing::Rejected(_) => 0,
        }
    }
}

/// Options for listing the submissions of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionQuery {
    pub encryption_password: String,
    /// Only submissions at or after this date/time.
    pub min_time: String,
    /// Only submissions at or before this date/time.
    pub max_time: String,
    pub search_field_ids: Vec<Numeric>,
    pub search_field_values: Vec<String>,
    pub page_number: Numeric,
    pub per_page: Numeric,
    /// `ASC` or `DESC`, exactly.
    pub sort: String,
    /// Include field data with each submission.
    pub include_data: bool,
    /// Expand field data into labelled values.
    pub expand_data: bool,
}

impl Default for SubmissionQuery {
    fn default() -> Self {
        Self {
            encryption_password: String::new(),
            min_time: String::new(),
            max_time: String::new(),
            search_field_ids: Vec::new(),
            search_field_values: Vec::new(),
            page_number: Numeric::Int(1),
            per_page: Numeric::Int(25),
            sort: "DESC".to_string(),
            include_data: false,
            expand_data: false,
        }
    }
}

impl SubmissionQuery {
    pub fn search(mut self, field_id: impl Into<Numeric>, value: impl Into<String>) -> Self {
        self.search_field_ids.push(field_id.into());
        self.search_field_values.push(value.into());
        self
    }
}

/// Field data plus metadata for creating or editing a submission.
///
/// Values are sent as given: scalars, key/value objects for composite
/// fields such as `name` or `address`, or `file_field_value` strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionInput {
    pub field_ids: Vec<Numeric>,
    pub field_values: Vec<Value>,
    /// `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub user_agent: String,
    pub ip_address: String,
    pub payment_status: String,
    pub read: bool,
}

impl SubmissionInput {
    pub fn field(mut self, id: impl Into<Numeric>, value: impl Into<Value>) -> Self {
        self.field_ids.push(id.into());
        self.field_values.push(value.into());
        self
    }
}

/// Definition of a new form field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// One of the `FieldType` wire names.
    pub field_type: String,
    pub label: String,
    pub hide_label: bool,
    pub description: String,
    /// Show the description as a callout.
    pub use_callout: bool,
    /// Type-specific attributes, sent as `attributes[<key>]`.
    pub attributes: Map<String, Value>,
    pub default_value: String,
    pub options: Vec<String>,
    pub option_values: Vec<String>,
    pub required: bool,
    pub read_only: bool,
    pub hidden: bool,
    pub unique: bool,
    pub column_span: Option<u32>,
    pub sort: Option<u32>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: field_type.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
