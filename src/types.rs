//! Core types shared by the normalizer, classifier and emitter.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Namespace used in every `urn:` identifier unless overridden.
pub const DEFAULT_NAMESPACE: &str = "EchonetLite";

/// `@context` written on interfaces and their contents unless overridden.
pub const DEFAULT_CONTEXT: &str = "http://azureiot.com/v1/contexts/IoTModel.json";

/// Buffer length for content, enum and command names (64 usable characters).
pub const NAME_LEN: usize = 65;

/// Buffer length for device class names (237 usable characters).
pub const DEVICE_NAME_LEN: usize = 238;

/// Default cap on descriptor nesting inside the normalizer.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Access rule for one of the get/set/inf operations of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessRule {
    /// Unrecognized rule string.
    #[default]
    None,
    Required,
    /// `required_c`: required depending on the device configuration.
    RequiredByCase,
    Optional,
    NotApplicable,
}

impl AccessRule {
    /// Parse a rule string. Anything unrecognized maps to `None`.
    pub fn parse(s: &str) -> Self {
        match s {
            "required" => AccessRule::Required,
            "required_c" => AccessRule::RequiredByCase,
            "optional" => AccessRule::Optional,
            "notApplicable" => AccessRule::NotApplicable,
            _ => AccessRule::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRule::None => "none",
            AccessRule::Required => "required",
            AccessRule::RequiredByCase => "required_c",
            AccessRule::Optional => "optional",
            AccessRule::NotApplicable => "notApplicable",
        }
    }
}

impl fmt::Display for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (get, set, notify) rules of a property.
///
/// A rule missing from the `accessRule` block is `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessTriple {
    pub get: AccessRule,
    pub set: AccessRule,
    pub notify: AccessRule,
}

impl AccessTriple {
    pub fn new(get: AccessRule, set: AccessRule, notify: AccessRule) -> Self {
        Self { get, set, notify }
    }
}

impl Default for AccessTriple {
    fn default() -> Self {
        Self::new(
            AccessRule::NotApplicable,
            AccessRule::NotApplicable,
            AccessRule::NotApplicable,
        )
    }
}

impl fmt::Display for AccessTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "get={} set={} inf={}", self.get, self.set, self.notify)
    }
}

/// Fixed width of a `number` data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
}

impl NumberFormat {
    /// Returns `None` for unknown formats (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int8" => Some(NumberFormat::Int8),
            "int16" => Some(NumberFormat::Int16),
            "int32" => Some(NumberFormat::Int32),
            "uint8" => Some(NumberFormat::Uint8),
            "uint16" => Some(NumberFormat::Uint16),
            "uint32" => Some(NumberFormat::Uint32),
            _ => None,
        }
    }
}

/// Kind of a Digital Twin interface content entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InterfaceKind {
    Command,
    Telemetry,
    Property,
}

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// `<Namespace>` segment of every generated `urn:` identifier.
    pub namespace: String,
    /// Value of every `@context` member.
    pub context: String,
    /// Maximum nesting of type descriptors, `$ref` hops included.
    pub max_depth: usize,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build `urn:<namespace>:<name>:1`.
    pub fn urn(&self, name: &str) -> String {
        format!("urn:{}:{}:1", self.namespace, name)
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            context: DEFAULT_CONTEXT.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_rule_parse() {
        assert_eq!(AccessRule::parse("required"), AccessRule::Required);
        assert_eq!(AccessRule::parse("required_c"), AccessRule::RequiredByCase);
        assert_eq!(AccessRule::parse("optional"), AccessRule::Optional);
        assert_eq!(AccessRule::parse("notApplicable"), AccessRule::NotApplicable);
    }

    #[test]
    fn access_rule_parse_unknown_is_none() {
        assert_eq!(AccessRule::parse("Required"), AccessRule::None);
        assert_eq!(AccessRule::parse(""), AccessRule::None);
        assert_eq!(AccessRule::parse("na"), AccessRule::None);
    }

    #[test]
    fn access_triple_defaults_to_not_applicable() {
        let access = AccessTriple::default();
        assert_eq!(access.get, AccessRule::NotApplicable);
        assert_eq!(access.set, AccessRule::NotApplicable);
        assert_eq!(access.notify, AccessRule::NotApplicable);
        assert_eq!(
            access.to_string(),
            "get=notApplicable set=notApplicable inf=notApplicable"
        );
    }

    #[test]
    fn number_format_parse() {
        assert_eq!(NumberFormat::parse("int8"), Some(NumberFormat::Int8));
        assert_eq!(NumberFormat::parse("uint32"), Some(NumberFormat::Uint32));
        assert_eq!(NumberFormat::parse("int64"), None);
        assert_eq!(NumberFormat::parse("float"), None);
    }

    #[test]
    fn options_urn_uses_namespace() {
        let opts = ConvertOptions::new();
        assert_eq!(opts.urn("operationStatus"), "urn:EchonetLite:operationStatus:1");

        let opts = ConvertOptions::new().namespace("Acme");
        assert_eq!(opts.urn("x"), "urn:Acme:x:1");
    }

    #[test]
    fn options_defaults() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.context, DEFAULT_CONTEXT);
        assert_eq!(opts.max_depth, DEFAULT_MAX_DEPTH);
    }
}
