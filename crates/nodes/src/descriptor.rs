//! Declarative node and credential descriptions.
//!
//! A description is plain data: field names, kinds, defaults, display
//! conditions and validation rules. It serializes to JSON for whatever
//! renders the configuration form, and [`NodeDescription::resolve`] applies
//! the same rules to a raw parameter bag before a node runs.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::params::{LocatorMode, Parameters, ResourceLocator};
use crate::NodeError;

// ---------------------------------------------------------------------------
// NodeDescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Machine name, e.g. `cloudCli`.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: u32,
    /// Names of the credential types the node requires.
    pub credentials: Vec<String>,
    pub properties: Vec<FieldDefinition>,
}

impl NodeDescription {
    /// Resolve an item's raw parameters against the declared fields.
    ///
    /// Fields are processed in declaration order. A field whose display
    /// condition does not hold for the values resolved so far is skipped, so
    /// the result contains only fields that apply to the selected resource
    /// and operation. Absent values take the field default.
    ///
    /// # Errors
    /// - [`NodeError::MissingParameter`] for an empty required field.
    /// - [`NodeError::InvalidParameter`] for a type, option or pattern mismatch.
    pub fn resolve(&self, raw: &Parameters) -> Result<Parameters, NodeError> {
        let mut resolved = Parameters::default();

        for field in &self.properties {
            if !field.is_visible(&resolved) {
                continue;
            }
            let value = raw
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| field.default.clone());
            field.validate(&value)?;
            resolved.insert(field.name.clone(), value);
        }

        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// FieldDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub display_name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    String {
        #[serde(skip_serializing_if = "is_false")]
        password: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        rows: Option<u32>,
    },
    Boolean,
    Options {
        options: Vec<FieldOption>,
    },
    ResourceLocator {
        modes: Vec<LocatorModeDefinition>,
    },
    Collection {
        options: Vec<FieldDefinition>,
    },
}

/// One selectable value of an options field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldOption {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl FieldOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
            action: None,
        }
    }

    pub fn describe(mut self, description: &str, action: &str) -> Self {
        self.description = Some(description.to_owned());
        self.action = Some(action.to_owned());
        self
    }
}

/// One way of entering a resource locator value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorModeDefinition {
    pub name: LocatorMode,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// List-search method backing `list` mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_list_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<RegexValidation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexValidation {
    pub regex: String,
    pub error_message: String,
    #[serde(skip)]
    compiled: OnceLock<Result<Regex, regex::Error>>,
}

impl RegexValidation {
    pub fn new(regex: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            error_message: error_message.into(),
            compiled: OnceLock::new(),
        }
    }

    /// The pattern, compiled on first use.
    fn matcher(&self) -> Result<&Regex, &regex::Error> {
        self.compiled
            .get_or_init(|| Regex::new(&self.regex))
            .as_ref()
    }
}

/// `show` conditions: the field is visible when, for every listed parameter,
/// the resolved value is one of the listed strings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayOptions {
    pub show: BTreeMap<String, Vec<String>>,
}

impl FieldDefinition {
    fn new(name: &str, display_name: &str, kind: FieldKind, default: Value) -> Self {
        Self {
            name: name.to_owned(),
            display_name: display_name.to_owned(),
            kind,
            required: false,
            default,
            description: None,
            placeholder: None,
            display_options: None,
        }
    }

    pub fn string(name: &str, display_name: &str) -> Self {
        Self::new(
            name,
            display_name,
            FieldKind::String { password: false, rows: None },
            json!(""),
        )
    }

    /// A string whose value is masked in forms.
    pub fn secret(name: &str, display_name: &str) -> Self {
        Self::new(
            name,
            display_name,
            FieldKind::String { password: true, rows: None },
            json!(""),
        )
    }

    pub fn boolean(name: &str, display_name: &str) -> Self {
        Self::new(name, display_name, FieldKind::Boolean, json!(false))
    }

    pub fn options(name: &str, display_name: &str, options: Vec<FieldOption>, default: &str) -> Self {
        Self::new(name, display_name, FieldKind::Options { options }, json!(default))
    }

    pub fn resource_locator(name: &str, display_name: &str, modes: Vec<LocatorModeDefinition>) -> Self {
        Self::new(
            name,
            display_name,
            FieldKind::ResourceLocator { modes },
            json!({ "mode": "list", "value": "" }),
        )
    }

    pub fn collection(name: &str, display_name: &str, options: Vec<FieldDefinition>) -> Self {
        Self::new(name, display_name, FieldKind::Collection { options }, json!({}))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_str(mut self, value: &str) -> Self {
        self.default = json!(value);
        self
    }

    pub fn rows(mut self, rows: u32) -> Self {
        if let FieldKind::String { rows: r, .. } = &mut self.kind {
            *r = Some(rows);
        }
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_owned());
        self
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.to_owned());
        self
    }

    pub fn show_when(mut self, parameter: &str, values: &[&str]) -> Self {
        self.display_options
            .get_or_insert_with(DisplayOptions::default)
            .show
            .insert(
                parameter.to_owned(),
                values.iter().map(|v| (*v).to_owned()).collect(),
            );
        self
    }

    fn is_visible(&self, resolved: &Parameters) -> bool {
        let Some(display) = &self.display_options else {
            return true;
        };
        display.show.iter().all(|(param, allowed)| {
            resolved
                .get(param)
                .and_then(Value::as_str)
                .is_some_and(|v| allowed.iter().any(|a| a == v))
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    fn validate(&self, value: &Value) -> Result<(), NodeError> {
        if self.required && is_blank(value) {
            return Err(NodeError::MissingParameter(self.name.clone()));
        }
        if value.is_null() {
            return Ok(());
        }

        match &self.kind {
            FieldKind::String { .. } => {
                if !value.is_string() {
                    return Err(NodeError::invalid(&self.name, "expected a string"));
                }
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    return Err(NodeError::invalid(&self.name, "expected a boolean"));
                }
            }
            FieldKind::Options { options } => {
                let chosen = value
                    .as_str()
                    .ok_or_else(|| NodeError::invalid(&self.name, "expected a string"))?;
                if !options.iter().any(|o| o.value == chosen) {
                    let allowed: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
                    return Err(NodeError::invalid(
                        &self.name,
                        format!("'{chosen}' is not one of: {}", allowed.join(", ")),
                    ));
                }
            }
            FieldKind::ResourceLocator { modes } => self.validate_locator(modes, value)?,
            FieldKind::Collection { options } => {
                let map = value
                    .as_object()
                    .ok_or_else(|| NodeError::invalid(&self.name, "expected an object"))?;
                for (key, sub_value) in map {
                    if let Some(sub_field) = options.iter().find(|f| &f.name == key) {
                        sub_field.validate(sub_value)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_locator(&self, modes: &[LocatorModeDefinition], value: &Value) -> Result<(), NodeError> {
        let locator = ResourceLocator::from_value(value)
            .ok_or_else(|| NodeError::invalid(&self.name, "not a resource locator"))?;

        let mode = modes
            .iter()
            .find(|m| m.name == locator.mode)
            .ok_or_else(|| {
                NodeError::invalid(&self.name, format!("mode '{}' is not supported", locator.mode))
            })?;

        if let (Some(rule), false) = (&mode.validation, locator.value.is_empty()) {
            let re = rule
                .matcher()
                .map_err(|e| NodeError::invalid(&self.name, format!("bad pattern: {e}")))?;
            if !re.is_match(&locator.value) {
                return Err(NodeError::invalid(&self.name, rule.error_message.clone()));
            }
        }

        Ok(())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(_) if value.get("value").is_some() => {
            ResourceLocator::from_value(value).map_or(true, |l| l.value.is_empty())
        }
        _ => false,
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ---------------------------------------------------------------------------
// CredentialDescription
// ---------------------------------------------------------------------------

/// Declares a credential type: its fields, how it authenticates requests and
/// how to test it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescription {
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    pub properties: Vec<FieldDefinition>,
    /// Headers injected into every request; `{field}` is replaced by the
    /// credential value of that field.
    pub authenticate_headers: BTreeMap<String, String>,
    pub test_request: TestRequest,
}

/// Request issued to verify a credential; any 2xx answer means valid.
#[derive(Debug, Clone, Serialize)]
pub struct TestRequest {
    pub method: String,
    pub url: String,
}
