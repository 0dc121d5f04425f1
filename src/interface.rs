//! Interface content construction for device properties.

use serde_json::Value;

use crate::classify::classify;
use crate::convert::Session;
use crate::datatype::{DataType, TypeKind};
use crate::diagnostics::{join_path, Diagnostics};
use crate::dtdl::{CommandType, Content, DisplayName};
use crate::emit::{emit_command_payload, emit_schema, enum_entry_name};
use crate::error::Violation;
use crate::normalize::{expect_array, expect_object, expect_str, localized_text};
use crate::sanitize::sanitize_identifier;
use crate::types::{AccessRule, AccessTriple, ConvertOptions, InterfaceKind, NAME_LEN};

/// A property read from the device description, ready for classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyDescriptor {
    pub name_ja: Option<String>,
    pub name_en: Option<String>,
    pub access: AccessTriple,
    pub shape: DataType,
}

impl PropertyDescriptor {
    /// Build the content entries of this property.
    ///
    /// `oneOf` data yields one interface per alternative, indexed from 1, all
    /// sharing this property's names and access rules. A violation skips only
    /// the interface it was raised for and is recorded at `path`.
    pub fn contents(
        &self,
        options: &ConvertOptions,
        path: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Content> {
        let mut contents = Vec::new();
        let mut push = |index: usize, shape: &DataType, path: &str| {
            match make_interface(
                index,
                self.access,
                self.name_ja.as_deref(),
                self.name_en.as_deref(),
                shape,
                options,
            ) {
                Ok(made) => contents.extend(made),
                Err(violation) => diagnostics.push(path, violation),
            }
        };

        match &self.shape.kind {
            TypeKind::OneOf(alternatives) => {
                let base = join_path(&join_path(path, "data"), "oneOf");
                for (i, alternative) in alternatives.iter().enumerate() {
                    push(i + 1, alternative, &join_path(&base, &i.to_string()));
                }
            }
            _ => push(0, &self.shape, path),
        }
        contents
    }
}

/// Build the content entries for one property or `oneOf` alternative.
///
/// Returns nothing when the property has no English name. A command on state
/// data becomes one schemaless command per state instead of a single entry.
///
/// # Errors
///
/// Returns `Violation::UnsupportedAccess` for unsupported access rules and
/// `Violation::UnsupportedShape` when the data has no schema mapping.
pub fn make_interface(
    index: usize,
    access: AccessTriple,
    name_ja: Option<&str>,
    name_en: Option<&str>,
    shape: &DataType,
    options: &ConvertOptions,
) -> Result<Vec<Content>, Violation> {
    let Some(name_en) = name_en else {
        tracing::debug!(?name_ja, "dropping property without English name");
        return Ok(Vec::new());
    };

    let classification = classify(access, shape)?;

    if classification.kind == InterfaceKind::Command {
        if let TypeKind::State(entries) = &shape.kind {
            return Ok(entries
                .iter()
                .map(|entry| Content {
                    command_type: Some(CommandType::Synchronous),
                    ..content(
                        None,
                        InterfaceKind::Command,
                        enum_entry_name(entry),
                        DisplayName::from_labels(
                            entry.label_ja.as_deref(),
                            entry.label_en.as_deref(),
                        ),
                        options,
                    )
                })
                .collect());
        }
    }

    let name = sanitize_identifier(name_en, NAME_LEN);
    let id = if index == 0 {
        options.urn(&name)
    } else {
        options.urn(&format!("{}{}", name, index + 1))
    };
    let mut entry = content(
        Some(id),
        classification.kind,
        name,
        DisplayName::from_labels(name_ja, Some(name_en)),
        options,
    );

    match classification.kind {
        InterfaceKind::Command => {
            entry.command_type = Some(CommandType::Synchronous);
            // Requests and responses share the property's data shape.
            entry.request = Some(emit_command_payload(name_ja, name_en, shape, options)?);
            entry.response = Some(emit_command_payload(name_ja, name_en, shape, options)?);
        }
        InterfaceKind::Telemetry => {
            entry.schema = Some(emit_schema(shape)?);
            entry.display_unit = shape.unit().map(str::to_string);
        }
        InterfaceKind::Property => {
            entry.schema = Some(emit_schema(shape)?);
            entry.display_unit = shape.unit().map(str::to_string);
            entry.writable = Some(classification.writable);
        }
    }

    Ok(vec![entry])
}

fn content(
    id: Option<String>,
    kind: InterfaceKind,
    name: String,
    display_name: Option<DisplayName>,
    options: &ConvertOptions,
) -> Content {
    Content {
        id,
        kind,
        context: options.context.clone(),
        name,
        schema: None,
        display_name,
        command_type: None,
        request: None,
        response: None,
        display_unit: None,
        writable: None,
    }
}

/// Read one `elProperties` entry and append its content entries.
///
/// Entries of a property-level `oneOf` are read as independent properties
/// and appended as they are encountered.
pub(crate) fn parse_property<'a>(
    session: &mut Session<'a>,
    property: &'a Value,
    path: &str,
    contents: &mut Vec<Content>,
) {
    let map = match expect_object(property) {
        Ok(map) => map,
        Err(violation) => {
            session.diagnostics.push(path, violation);
            return;
        }
    };

    let mut descriptor = PropertyDescriptor::default();
    let mut has_variants = false;
    for (key, value) in map {
        let member_path = join_path(path, key);
        let applied = match key.as_str() {
            "propertyName" => localized_text(value).map(|(ja, en)| {
                descriptor.name_ja = ja;
                descriptor.name_en = en;
            }),
            "accessRule" => access_rules(value, &member_path, &mut session.diagnostics)
                .map(|access| descriptor.access = access),
            "data" => match expect_object(value) {
                Ok(_) => {
                    descriptor.shape = session.normalizer.normalize(
                        value,
                        &member_path,
                        &mut session.diagnostics,
                    );
                    Ok(())
                }
                Err(violation) => Err(violation),
            },
            "oneOf" => match expect_array(value) {
                Ok(variants) => {
                    has_variants = true;
                    for (i, variant) in variants.iter().enumerate() {
                        let variant_path = join_path(&member_path, &i.to_string());
                        parse_property(session, variant, &variant_path, contents);
                    }
                    Ok(())
                }
                Err(violation) => Err(violation),
            },
            "validRelease" | "note" => expect_object(value).map(|_| ()),
            "atomic" => expect_str(value).map(|_| ()),
            _ => Err(Violation::UnknownMember {
                member: key.clone(),
            }),
        };
        if let Err(violation) = applied {
            session.diagnostics.push(&member_path, violation);
        }
    }

    // A wrapper around variants carries no data of its own.
    if has_variants && matches!(descriptor.shape.kind, TypeKind::Unset) {
        return;
    }
    let made = descriptor.contents(session.options, path, &mut session.diagnostics);
    contents.extend(made);
}

/// Read an `accessRule` block. Rules that are absent stay `notApplicable`.
fn access_rules(
    value: &Value,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Result<AccessTriple, Violation> {
    let map = expect_object(value)?;
    let mut access = AccessTriple::default();

    for (key, rule) in map {
        let rule_path = join_path(path, key);
        let rule = match expect_str(rule) {
            Ok(rule) => AccessRule::parse(rule),
            Err(violation) => {
                diagnostics.push(&rule_path, violation);
                continue;
            }
        };
        match key.as_str() {
            "get" => access.get = rule,
            "set" => access.set = rule,
            "inf" => access.notify = rule,
            _ => diagnostics.push(
                &rule_path,
                Violation::UnknownMember {
                    member: key.clone(),
                },
            ),
        }
    }
    Ok(access)
}
