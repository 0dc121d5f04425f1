//! Schema emission from normalized data types.

use crate::datatype::{DataType, EnumEntry, Member, TypeKind};
use crate::dtdl::{
    CommandPayload, ComplexSchema, DisplayName, EnumValue, Primitive, Schema, SchemaField,
};
use crate::error::Violation;
use crate::sanitize::sanitize_identifier;
use crate::types::{ConvertOptions, NumberFormat, NAME_LEN};

/// Render a data type as a value schema.
///
/// | Data type | Schema |
/// |-----------|--------|
/// | state | Enum of integers |
/// | object, oneOf, bitmap | Object with one field per child |
/// | array | Array (element not expanded) |
/// | date-time, time, raw | `datetime`, `time`, `string` |
/// | level, numericValue | `integer` |
/// | number | `long` for uint32, `integer` for the other formats |
///
/// # Errors
///
/// Returns `Violation::UnsupportedShape` for unset data and for numbers
/// without a format, wherever they occur in the tree.
pub fn emit_schema(shape: &DataType) -> Result<Schema, Violation> {
    let schema = match &shape.kind {
        TypeKind::State(entries) => Schema::Complex(ComplexSchema::Enum {
            value_schema: Primitive::Integer,
            enum_values: entries.iter().map(enum_value).collect(),
        }),
        TypeKind::Object(members) => object_schema(members.iter().map(member_field))?,
        TypeKind::OneOf(alternatives) => object_schema(alternatives.iter().map(|shape| {
            Ok(SchemaField {
                name: None,
                schema: emit_schema(shape)?,
            })
        }))?,
        TypeKind::Bitmap(fields) => object_schema(fields.iter().map(|field| {
            Ok(SchemaField {
                name: field.name.clone(),
                schema: emit_schema(&field.value)?,
            })
        }))?,
        TypeKind::Array(_) => Schema::Complex(ComplexSchema::Array {}),
        TypeKind::DateTime => Schema::Primitive(Primitive::Datetime),
        TypeKind::Time => Schema::Primitive(Primitive::Time),
        TypeKind::Raw => Schema::Primitive(Primitive::String),
        TypeKind::Level | TypeKind::NumericValue(_) => Schema::Primitive(Primitive::Integer),
        TypeKind::Number { format, .. } => match format {
            Some(NumberFormat::Uint32) => Schema::Primitive(Primitive::Long),
            Some(_) => Schema::Primitive(Primitive::Integer),
            None => return Err(Violation::UnsupportedShape { kind: "number" }),
        },
        TypeKind::Unset => return Err(Violation::UnsupportedShape { kind: "unset" }),
    };
    Ok(schema)
}

/// Build the request/response payload of a command.
pub fn emit_command_payload(
    name_ja: Option<&str>,
    name_en: &str,
    shape: &DataType,
    options: &ConvertOptions,
) -> Result<CommandPayload, Violation> {
    let name = sanitize_identifier(name_en, NAME_LEN);
    Ok(CommandPayload {
        id: options.urn(&name),
        name,
        schema: emit_schema(shape)?,
        display_name: DisplayName::from_labels(name_ja, Some(name_en)),
        display_unit: shape.unit().map(str::to_string),
    })
}

/// Identifier of an enum entry: its sanitized English label, or `edt<hex>`.
pub fn enum_entry_name(entry: &EnumEntry) -> String {
    match &entry.label_en {
        Some(label) => sanitize_identifier(label, NAME_LEN),
        None => format!("edt{:x}", entry.code),
    }
}

fn enum_value(entry: &EnumEntry) -> EnumValue {
    EnumValue {
        name: enum_entry_name(entry),
        enum_value: entry.code,
        display_name: DisplayName::from_labels(
            entry.label_ja.as_deref(),
            entry.label_en.as_deref(),
        ),
    }
}

fn member_field(member: &Member) -> Result<SchemaField, Violation> {
    Ok(SchemaField {
        name: member.name.clone(),
        schema: emit_schema(&member.shape)?,
    })
}

fn object_schema(
    fields: impl Iterator<Item = Result<SchemaField, Violation>>,
) -> Result<Schema, Violation> {
    Ok(Schema::Complex(ComplexSchema::Object {
        fields: fields.collect::<Result<Vec<_>, _>>()?,
    }))
}
