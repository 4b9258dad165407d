//! Per-item parameter bags and resource-locator values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::NodeError;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameter values of one input item, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    /// Wrap an item's JSON. `null` is an empty bag; anything but an object
    /// is rejected.
    pub fn from_value(value: Value) -> Result<Self, NodeError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(NodeError::invalid(
                "<item>",
                format!("expected a JSON object of parameters, got {other}"),
            )),
        }
    }

    /// Raw value; `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Non-empty string value.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn required_str(&self, name: &str) -> Result<&str, NodeError> {
        self.str(name)
            .ok_or_else(|| NodeError::MissingParameter(name.to_owned()))
    }

    /// `true` only for a JSON `true`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Nested collection (e.g. `additionalOptions`); empty when absent.
    pub fn collection(&self, name: &str) -> Parameters {
        match self.get(name) {
            Some(Value::Object(map)) => Parameters(map.clone()),
            _ => Parameters::default(),
        }
    }

    /// Resource locator whose `value` must be non-empty.
    pub fn locator(&self, name: &str) -> Result<ResourceLocator, NodeError> {
        let raw = self
            .get(name)
            .ok_or_else(|| NodeError::MissingParameter(name.to_owned()))?;
        let locator = ResourceLocator::from_value(raw)
            .ok_or_else(|| NodeError::invalid(name, "not a resource locator"))?;
        if locator.value.is_empty() {
            return Err(NodeError::MissingParameter(name.to_owned()));
        }
        Ok(locator)
    }
}

// ---------------------------------------------------------------------------
// ResourceLocator
// ---------------------------------------------------------------------------

/// How a resource locator value was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LocatorMode {
    /// Picked from a searchable list.
    List,
    /// Typed in as a raw identifier.
    Id,
}

/// A resource reference: `{mode, value, cachedResultName?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLocator {
    #[serde(default = "default_mode")]
    pub mode: LocatorMode,
    #[serde(default)]
    pub value: String,
    /// Label of the list entry the user picked, e.g. `"backend (running)"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_result_name: Option<String>,
}

fn default_mode() -> LocatorMode {
    LocatorMode::List
}

impl ResourceLocator {
    pub fn by_id(value: impl Into<String>) -> Self {
        Self {
            mode: LocatorMode::Id,
            value: value.into(),
            cached_result_name: None,
        }
    }

    /// Accepts the object form or a bare string, which is read as an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::by_id(s.clone())),
            Value::Object(_) => ResourceLocator::deserialize(value).ok(),
            _ => None,
        }
    }
}
