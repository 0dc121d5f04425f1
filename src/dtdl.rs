//! Digital Twin interface model produced by the converter.
//!
//! Field order of every struct is the member order of the rendered JSON.

use serde::Serialize;

use crate::types::InterfaceKind;

/// `displayName` of an interface, content entry or enum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayName {
    Localized {
        #[serde(skip_serializing_if = "Option::is_none")]
        en: Option<String>,
        ja: String,
    },
    Plain(String),
}

impl DisplayName {
    /// Bilingual when a Japanese label exists, plain English otherwise.
    pub fn from_labels(ja: Option<&str>, en: Option<&str>) -> Option<Self> {
        match (ja, en) {
            (Some(ja), en) => Some(DisplayName::Localized {
                en: en.map(str::to_string),
                ja: ja.to_string(),
            }),
            (None, Some(en)) => Some(DisplayName::Plain(en.to_string())),
            (None, None) => None,
        }
    }
}

/// Primitive schema aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Integer,
    Long,
    Datetime,
    Time,
    String,
}

/// Value schema of a content entry or object field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Schema {
    Primitive(Primitive),
    Complex(ComplexSchema),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@type")]
pub enum ComplexSchema {
    Enum {
        #[serde(rename = "valueSchema")]
        value_schema: Primitive,
        #[serde(rename = "enumValues")]
        enum_values: Vec<EnumValue>,
    },
    Object {
        fields: Vec<SchemaField>,
    },
    /// Element schemas are not expanded.
    Array {},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(rename = "enumValue")]
    pub enum_value: i32,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<DisplayName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub schema: Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Synchronous,
}

/// Request or response of a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandPayload {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    pub schema: Schema,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<DisplayName>,
    #[serde(rename = "displayUnit", skip_serializing_if = "Option::is_none")]
    pub display_unit: Option<String>,
}

/// One entry of an interface's `contents`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    /// Absent on the per-state commands of a state-typed command.
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@type")]
    pub kind: InterfaceKind,
    #[serde(rename = "@context")]
    pub context: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<DisplayName>,
    #[serde(rename = "commandType", skip_serializing_if = "Option::is_none")]
    pub command_type: Option<CommandType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<CommandPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CommandPayload>,
    #[serde(rename = "displayUnit", skip_serializing_if = "Option::is_none")]
    pub display_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
}

/// Interface document for one device class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInterface {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "displayName")]
    pub display_name: DisplayName,
    pub contents: Vec<Content>,
}
