//! ECHONET Lite to Digital Twin interface converter
//!
//! Compiles an ECHONET Lite device description (a JSON dialect with a shared
//! `definitions` table and a `devices` map) into Digital Twin interface
//! documents, one per device class.
//!
//! # Example
//!
//! ```
//! use echonet_dtdl::{convert, ConvertOptions};
//! use serde_json::json;
//!
//! let document = json!({
//!     "definitions": {
//!         "state_ON_OFF": {
//!             "type": "state",
//!             "enum": [
//!                 { "edt": "0x30", "state": { "ja": "ON", "en": "true" } },
//!                 { "edt": "0x31", "state": { "ja": "OFF", "en": "false" } }
//!             ]
//!         }
//!     },
//!     "devices": {
//!         "0x0130": {
//!             "className": { "ja": "家庭用エアコン", "en": "Home air conditioner" },
//!             "elProperties": {
//!                 "0x80": {
//!                     "propertyName": { "ja": "動作状態", "en": "Operation status" },
//!                     "accessRule": { "get": "required", "set": "required", "inf": "required" },
//!                     "data": { "$ref": "#/definitions/state_ON_OFF" }
//!                 }
//!             }
//!         }
//!     }
//! });
//!
//! let conversion = convert(&document, &ConvertOptions::default()).unwrap();
//! assert!(conversion.is_clean());
//!
//! let device = &conversion.interfaces[0];
//! assert_eq!(device.id, "urn:EchonetLite:Home_air_conditioner:1");
//! assert_eq!(device.contents[0].name, "Operation_status");
//! assert_eq!(device.contents[0].writable, Some(true));
//! ```
//!
//! # Access Rules
//!
//! | get | set | inf | Content |
//! |-----|-----|-----|---------|
//! | notApplicable | optional / required | notApplicable / optional | Command |
//! | any | notApplicable | required | Telemetry |
//! | any | notApplicable | optional | Telemetry (state data) or read-only Property |
//! | any | optional / required | any | writable Property |
//!
//! See [`classify`] for the exact supported combinations. Anything else is
//! reported as a diagnostic and the property is skipped.

mod classify;
mod convert;
mod datatype;
mod diagnostics;
mod dtdl;
mod emit;
mod error;
mod interface;
mod loader;
mod normalize;
mod sanitize;
mod types;

pub use classify::{classify, Classification};
pub use convert::{convert, Conversion, ConversionStats};
pub use datatype::{
    BitmapField, DataType, EnumEntry, KindTag, Member, NumericEnumeration, ScalarMeta,
    TypeBuilder, TypeKind,
};
pub use diagnostics::{join_path, Diagnostic, Diagnostics};
pub use dtdl::{
    CommandPayload, CommandType, ComplexSchema, Content, DeviceInterface, DisplayName, EnumValue,
    Primitive, Schema, SchemaField,
};
pub use emit::{emit_command_payload, emit_schema, enum_entry_name};
pub use error::{ConvertError, Violation, ViolationCategory};
pub use interface::{make_interface, PropertyDescriptor};
pub use loader::{is_url, load_document, load_document_auto, load_document_str};
pub use normalize::Normalizer;
pub use sanitize::sanitize_identifier;
pub use types::{
    json_type_name, AccessRule, AccessTriple, ConvertOptions, InterfaceKind, NumberFormat,
    DEFAULT_CONTEXT, DEFAULT_MAX_DEPTH, DEFAULT_NAMESPACE, DEVICE_NAME_LEN, NAME_LEN,
};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
