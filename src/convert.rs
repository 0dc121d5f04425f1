//! Device description conversion.
//!
//! Walks `devices` in document order and turns every device, and every
//! `oneOf` variant of a device, that has an English class name into one
//! [`DeviceInterface`]. Those without one are dropped together with the
//! contents collected for them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::{join_path, Diagnostic, Diagnostics};
use crate::dtdl::{Content, DeviceInterface, DisplayName};
use crate::error::{ConvertError, Violation};
use crate::interface::parse_property;
use crate::normalize::{expect_array, expect_object, expect_str, localized_text, Normalizer};
use crate::sanitize::sanitize_identifier;
use crate::types::{ConvertOptions, DEVICE_NAME_LEN};

/// State shared by one conversion run.
pub(crate) struct Session<'a> {
    pub(crate) options: &'a ConvertOptions,
    pub(crate) normalizer: Normalizer<'a>,
    pub(crate) diagnostics: Diagnostics,
}

/// Counters for a conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Entries of `devices` that were objects.
    pub devices: usize,
    /// Device interfaces written to the output.
    pub devices_emitted: usize,
    /// Entries of `devices` that produced no interface.
    pub devices_dropped: usize,
    /// Content entries across all emitted devices.
    pub interfaces: usize,
}

/// Output of a conversion run.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub interfaces: Vec<DeviceInterface>,
    /// Every violation recorded, in traversal order.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ConversionStats,
}

impl Conversion {
    /// Returns true if no violation was recorded.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn to_value(&self) -> Result<Value, ConvertError> {
        serde_json::to_value(&self.interfaces).map_err(|source| ConvertError::Serialize { source })
    }

    /// Render the root array on a single line.
    pub fn to_json(&self) -> Result<String, ConvertError> {
        serde_json::to_string(&self.interfaces).map_err(|source| ConvertError::Serialize { source })
    }

    /// Render the root array with four-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, ConvertError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.interfaces
            .serialize(&mut serializer)
            .map_err(|source| ConvertError::Serialize { source })?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Convert a parsed device description document.
///
/// Violations are recorded in [`Conversion::diagnostics`] and skip only the
/// member, property, interface or device they were found in.
///
/// # Errors
///
/// Returns `ConvertError::MissingMember` if the document has no `definitions`
/// or `devices` object.
pub fn convert(document: &Value, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
    let definitions = root_member(document, "definitions")?;
    let devices = root_member(document, "devices")?;

    let mut session = Session {
        options,
        normalizer: Normalizer::new(definitions, options.max_depth),
        diagnostics: Diagnostics::new(),
    };
    let mut interfaces = Vec::new();
    let mut stats = ConversionStats::default();

    for (code, device) in devices {
        let path = join_path("/devices", code);
        if let Err(violation) = expect_object(device) {
            session.diagnostics.push(&path, violation);
            continue;
        }
        stats.devices += 1;

        let mut assembly = DeviceAssembly::default();
        collect_device(&mut session, device, &path, &mut assembly);

        if assembly.interfaces.is_empty() {
            stats.devices_dropped += 1;
        }
        for interface in assembly.interfaces {
            stats.devices_emitted += 1;
            stats.interfaces += interface.contents.len();
            interfaces.push(interface);
        }
    }

    tracing::info!(
        devices = stats.devices,
        emitted = stats.devices_emitted,
        dropped = stats.devices_dropped,
        interfaces = stats.interfaces,
        diagnostics = session.diagnostics.len(),
        "conversion finished"
    );

    Ok(Conversion {
        interfaces,
        diagnostics: session.diagnostics.into_vec(),
        stats,
    })
}

fn root_member<'a>(document: &'a Value, member: &str) -> Result<&'a Map<String, Value>, ConvertError> {
    document
        .get(member)
        .and_then(Value::as_object)
        .ok_or_else(|| ConvertError::MissingMember {
            member: member.to_string(),
        })
}

/// Interfaces finished for one entry of `devices`, and the contents that
/// the next finished device or variant will take.
#[derive(Debug, Default)]
struct DeviceAssembly {
    /// Created on the first property, taken by the next finished device.
    contents: Option<Vec<Content>>,
    interfaces: Vec<DeviceInterface>,
}

impl DeviceAssembly {
    /// Close a device or variant. Its contents are consumed either way and
    /// become an interface only when an English class name is known.
    fn finish(
        &mut self,
        class_ja: Option<String>,
        class_en: Option<String>,
        options: &ConvertOptions,
        path: &str,
    ) {
        let contents = self.contents.take().unwrap_or_default();
        let Some(class_en) = class_en else {
            tracing::debug!(
                device = path,
                dropped = contents.len(),
                "dropping device without English class name"
            );
            return;
        };

        let display_name = match class_ja {
            Some(ja) => DisplayName::Localized {
                en: Some(class_en.clone()),
                ja,
            },
            None => DisplayName::Plain(class_en.clone()),
        };
        self.interfaces.push(DeviceInterface {
            id: options.urn(&sanitize_identifier(&class_en, DEVICE_NAME_LEN)),
            kind: "Interface",
            context: options.context.clone(),
            display_name,
            contents,
        });
    }
}

/// Read a device, or one of its `oneOf` variants, and finish it.
///
/// A variant is a device of its own: it finishes with its own class name
/// before the enclosing device continues. Properties read so far, including
/// those of the enclosing device, go to the next device that finishes.
fn collect_device<'a>(
    session: &mut Session<'a>,
    device: &'a Value,
    path: &str,
    assembly: &mut DeviceAssembly,
) {
    let map = match expect_object(device) {
        Ok(map) => map,
        Err(violation) => {
            session.diagnostics.push(path, violation);
            return;
        }
    };

    let mut class_ja = None;
    let mut class_en = None;
    for (key, value) in map {
        let member_path = join_path(path, key);
        let applied = match key.as_str() {
            "className" => localized_text(value).map(|(ja, en)| {
                class_ja = ja;
                class_en = en;
            }),
            "elProperties" => match expect_object(value) {
                Ok(properties) => {
                    for (code, property) in properties {
                        let property_path = join_path(&member_path, code);
                        let contents = assembly.contents.get_or_insert_with(Vec::new);
                        parse_property(session, property, &property_path, contents);
                    }
                    Ok(())
                }
                Err(violation) => Err(violation),
            },
            "oneOf" => match expect_array(value) {
                Ok(variants) => {
                    for (i, variant) in variants.iter().enumerate() {
                        let variant_path = join_path(&member_path, &i.to_string());
                        collect_device(session, variant, &variant_path, assembly);
                    }
                    Ok(())
                }
                Err(violation) => Err(violation),
            },
            "validRelease" => expect_object(value).map(|_| ()),
            "firstRelease" => expect_str(value).map(|_| ()),
            _ => Err(Violation::UnknownMember {
                member: key.clone(),
            }),
        };
        if let Err(violation) = applied {
            session.diagnostics.push(&member_path, violation);
        }
    }

    assembly.finish(class_ja, class_en, session.options, path);
}
