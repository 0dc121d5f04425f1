//! Type descriptor normalization.
//!
//! Reads the device description dialect's type descriptors into [`DataType`]
//! trees. Members are applied in document order, so `format` must precede a
//! numeric `enum` for the enumeration to be decoded at the right width.
//! A `$ref` is inlined into the node that holds it: the referenced members
//! merge with the siblings already applied.
//!
//! Every problem is recorded against the member that caused it and only that
//! member is skipped; the rest of the descriptor is still applied.

use serde_json::{Map, Value};

use crate::datatype::{
    BitmapField, DataType, EnumEntry, KindTag, Member, NumericEnumeration, TypeBuilder,
};
use crate::diagnostics::{join_path, Diagnostics};
use crate::error::Violation;
use crate::types::{json_type_name, NumberFormat};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Recursive-descent normalizer over a shared, read-only definitions table.
#[derive(Debug)]
pub struct Normalizer<'a> {
    definitions: &'a Map<String, Value>,
    max_depth: usize,
    /// Chain of `$ref` names currently being inlined.
    active_refs: Vec<&'a str>,
}

impl<'a> Normalizer<'a> {
    pub fn new(definitions: &'a Map<String, Value>, max_depth: usize) -> Self {
        Self {
            definitions,
            max_depth,
            active_refs: Vec::new(),
        }
    }

    /// Normalize one type descriptor found at `path`.
    pub fn normalize(
        &mut self,
        descriptor: &'a Value,
        path: &str,
        diagnostics: &mut Diagnostics,
    ) -> DataType {
        self.nested(descriptor, path, 0, diagnostics)
    }

    fn nested(
        &mut self,
        descriptor: &'a Value,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> DataType {
        if depth > self.max_depth {
            diagnostics.push(
                path,
                Violation::DepthExceeded {
                    max: self.max_depth,
                },
            );
            return DataType::default();
        }

        let mut builder = TypeBuilder::new();
        self.apply(descriptor, &mut builder, path, depth, diagnostics);

        let (data_type, dropped) = builder.finish();
        for violation in dropped {
            diagnostics.push(path, violation);
        }
        data_type
    }

    fn apply(
        &mut self,
        descriptor: &'a Value,
        builder: &mut TypeBuilder,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) {
        let map = match expect_object(descriptor) {
            Ok(map) => map,
            Err(violation) => {
                diagnostics.push(path, violation);
                return;
            }
        };

        for (key, value) in map {
            let member_path = join_path(path, key);
            if let Err(violation) =
                self.apply_member(key, value, builder, &member_path, depth, diagnostics)
            {
                diagnostics.push(&member_path, violation);
            }
        }
    }

    fn apply_member(
        &mut self,
        key: &str,
        value: &'a Value,
        builder: &mut TypeBuilder,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Violation> {
        match key {
            "type" => {
                let name = expect_str(value)?;
                let kind = KindTag::parse(name).ok_or_else(|| Violation::UnknownDataType {
                    value: name.to_string(),
                })?;
                builder.set_kind(kind)?;
            }
            "size" => {
                builder.meta.size = Some(match value {
                    Value::String(s) => c_strtol(s, 10),
                    Value::Number(_) => expect_f64(value)? as i32,
                    other => {
                        return Err(Violation::UnexpectedType {
                            expected: "number or string",
                            actual: json_type_name(other),
                        })
                    }
                });
            }
            "enum" => {
                let items = expect_array(value)?;
                match builder.kind() {
                    Some(KindTag::State) | Some(KindTag::NumericValue) => {
                        let entries = self.enum_entries(items, path, diagnostics);
                        builder.set_states(entries)?;
                    }
                    Some(KindTag::Number) => {
                        let format = builder.format().ok_or(Violation::MissingNumberFormat)?;
                        builder.set_numbers(NumericEnumeration::decode(format, items)?)?;
                    }
                    other => {
                        return Err(Violation::EnumNotSupported {
                            kind: other.map(|k| k.name()).unwrap_or("unset"),
                        })
                    }
                }
            }
            "properties" => {
                let items = expect_array(value)?;
                let members = self.object_members(items, path, depth, diagnostics);
                builder.set_children("properties", members)?;
            }
            "items" => {
                expect_object(value)?;
                let shape = self.nested(value, path, depth + 1, diagnostics);
                builder.set_children("items", vec![Member { name: None, shape }])?;
            }
            "bitmaps" => {
                let items = expect_array(value)?;
                let fields = self.bitmap_fields(items, path, depth, diagnostics);
                builder.set_bitmaps(fields)?;
            }
            "oneOf" => {
                if let Some(existing) = builder.kind() {
                    return Err(Violation::KindAlreadySet {
                        existing: existing.name(),
                    });
                }
                let items = expect_array(value)?;
                builder.set_kind(KindTag::OneOf)?;

                let alternatives = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_path = join_path(path, &i.to_string());
                        Member {
                            name: None,
                            shape: self.nested(item, &item_path, depth + 1, diagnostics),
                        }
                    })
                    .collect();
                builder.set_children("oneOf", alternatives)?;
            }
            "format" => {
                let name = expect_str(value)?;
                let format =
                    NumberFormat::parse(name).ok_or_else(|| Violation::UnknownNumberFormat {
                        value: name.to_string(),
                    })?;
                builder.set_format(format);
            }
            "$ref" => {
                let reference = expect_str(value)?;
                self.inline_reference(reference, builder, path, depth, diagnostics)?;
            }
            "unit" => builder.meta.unit = Some(expect_str(value)?.to_string()),
            "multipleOf" => builder.meta.multiple_of = Some(expect_f64(value)?),
            "minSize" => builder.meta.min_size = Some(expect_f64(value)?),
            "maxSize" => builder.meta.max_size = Some(expect_f64(value)?),
            "itemSize" => builder.meta.item_size = Some(expect_f64(value)? as i64),
            "minItems" => builder.meta.min_items = Some(expect_f64(value)? as i64),
            "maxItems" => builder.meta.max_items = Some(expect_f64(value)? as i64),
            "base" => builder.meta.base = Some(expect_str(value)?.to_string()),
            "minimum" => builder.meta.minimum = Some(expect_f64(value)?),
            "maximum" => builder.meta.maximum = Some(expect_f64(value)?),
            "coefficient" => {
                let codes = expect_array(value)?
                    .iter()
                    .map(|code| expect_str(code).map(str::to_string))
                    .collect::<Result<Vec<_>, _>>()?;
                builder.set_coefficients(codes)?;
            }
            _ => {
                return Err(Violation::UnknownMember {
                    member: key.to_string(),
                })
            }
        }
        Ok(())
    }

    fn inline_reference(
        &mut self,
        reference: &'a str,
        builder: &mut TypeBuilder,
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Violation> {
        let name = reference
            .strip_prefix(DEFINITIONS_PREFIX)
            .ok_or_else(|| Violation::MalformedReference {
                reference: reference.to_string(),
            })?;
        let target = self
            .definitions
            .get(name)
            .ok_or_else(|| Violation::UndefinedReference {
                reference: reference.to_string(),
            })?;

        if self.active_refs.contains(&name) {
            return Err(Violation::CircularReference {
                reference: reference.to_string(),
            });
        }
        if let Some(existing) = builder.kind() {
            return Err(Violation::KindAlreadySet {
                existing: existing.name(),
            });
        }
        if depth + 1 > self.max_depth {
            return Err(Violation::DepthExceeded {
                max: self.max_depth,
            });
        }

        builder.set_reference(reference);
        self.active_refs.push(name);
        self.apply(target, builder, path, depth + 1, diagnostics);
        self.active_refs.pop();
        Ok(())
    }

    fn enum_entries(
        &mut self,
        items: &'a [Value],
        path: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<EnumEntry> {
        let mut entries = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = join_path(path, &i.to_string());
            let map = match expect_object(item) {
                Ok(map) => map,
                Err(violation) => {
                    diagnostics.push(&item_path, violation);
                    continue;
                }
            };

            let mut entry = EnumEntry::default();
            for (key, value) in map {
                let member_path = join_path(&item_path, key);
                let applied = match key.as_str() {
                    "edt" => parse_edt(value).map(|code| entry.code = code),
                    "state" => localized_text(value).map(|(ja, en)| {
                        entry.label_ja = ja;
                        entry.label_en = en;
                    }),
                    "numericValue" => expect_f64(value).map(|n| entry.numeric_value = Some(n)),
                    "readOnly" => expect_bool(value).map(|b| entry.read_only = b),
                    _ => Err(Violation::UnknownMember {
                        member: key.clone(),
                    }),
                };
                if let Err(violation) = applied {
                    diagnostics.push(&member_path, violation);
                }
            }
            entries.push(entry);
        }
        entries
    }

    fn object_members(
        &mut self,
        items: &'a [Value],
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Member> {
        let mut members = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = join_path(path, &i.to_string());
            let map = match expect_object(item) {
                Ok(map) => map,
                Err(violation) => {
                    diagnostics.push(&item_path, violation);
                    continue;
                }
            };

            let mut member = Member {
                name: None,
                shape: DataType::default(),
            };
            for (key, value) in map {
                let member_path = join_path(&item_path, key);
                match key.as_str() {
                    "name" => match expect_str(value) {
                        Ok(name) => member.name = Some(name.to_string()),
                        Err(violation) => diagnostics.push(&member_path, violation),
                    },
                    "element" => {
                        member.shape = self.nested(value, &member_path, depth + 1, diagnostics);
                    }
                    _ => diagnostics.push(
                        &member_path,
                        Violation::UnknownMember {
                            member: key.clone(),
                        },
                    ),
                }
            }
            members.push(member);
        }
        members
    }

    fn bitmap_fields(
        &mut self,
        items: &'a [Value],
        path: &str,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) -> Vec<BitmapField> {
        let mut fields = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = join_path(path, &i.to_string());
            let map = match expect_object(item) {
                Ok(map) => map,
                Err(violation) => {
                    diagnostics.push(&item_path, violation);
                    continue;
                }
            };

            let mut field = BitmapField::default();
            for (key, value) in map {
                let member_path = join_path(&item_path, key);
                let applied = match key.as_str() {
                    "name" => expect_str(value).map(|name| field.name = Some(name.to_string())),
                    "descriptions" => localized_text(value).map(|(ja, en)| {
                        field.description_ja = ja;
                        field.description_en = en;
                    }),
                    "position" => bit_position(value).map(|(index, mask)| {
                        field.bit_index = index;
                        field.bit_mask = mask;
                    }),
                    "value" => {
                        field.value = self.nested(value, &member_path, depth + 1, diagnostics);
                        Ok(())
                    }
                    _ => Err(Violation::UnknownMember {
                        member: key.clone(),
                    }),
                };
                if let Err(violation) = applied {
                    diagnostics.push(&member_path, violation);
                }
            }
            fields.push(field);
        }
        fields
    }
}

/// Read a `{ja, en}` pair. Either side may be absent.
pub(crate) fn localized_text(
    value: &Value,
) -> Result<(Option<String>, Option<String>), Violation> {
    let map = expect_object(value)?;
    let text = |lang: &str| -> Result<Option<String>, Violation> {
        map.get(lang)
            .map(|v| expect_str(v).map(str::to_string))
            .transpose()
    };
    Ok((text("ja")?, text("en")?))
}

pub(crate) fn expect_object(value: &Value) -> Result<&Map<String, Value>, Violation> {
    value.as_object().ok_or(Violation::UnexpectedType {
        expected: "object",
        actual: json_type_name(value),
    })
}

pub(crate) fn expect_array(value: &Value) -> Result<&Vec<Value>, Violation> {
    value.as_array().ok_or(Violation::UnexpectedType {
        expected: "array",
        actual: json_type_name(value),
    })
}

pub(crate) fn expect_str(value: &Value) -> Result<&str, Violation> {
    value.as_str().ok_or(Violation::UnexpectedType {
        expected: "string",
        actual: json_type_name(value),
    })
}

fn expect_f64(value: &Value) -> Result<f64, Violation> {
    value.as_f64().ok_or(Violation::UnexpectedType {
        expected: "number",
        actual: json_type_name(value),
    })
}

fn expect_bool(value: &Value) -> Result<bool, Violation> {
    value.as_bool().ok_or(Violation::UnexpectedType {
        expected: "boolean",
        actual: json_type_name(value),
    })
}

fn bit_position(value: &Value) -> Result<(i32, Option<String>), Violation> {
    let map = expect_object(value)?;
    let index = match map.get("index") {
        Some(index) => expect_f64(index)? as i32,
        None => 0,
    };
    let mask = map
        .get("bitMask")
        .map(|mask| expect_str(mask).map(str::to_string))
        .transpose()?;
    Ok((index, mask))
}

/// EDT code: a number, a decimal string, or a `0x`-prefixed hex string.
fn parse_edt(value: &Value) -> Result<i32, Violation> {
    match value {
        Value::String(s) => {
            let hex = s
                .get(..2)
                .filter(|prefix| prefix.eq_ignore_ascii_case("0x"))
                .map(|_| &s[2..]);
            Ok(match hex {
                Some(digits) => c_strtol(digits, 16),
                None => c_strtol(s, 10),
            })
        }
        Value::Number(_) => Ok(expect_f64(value)? as i32),
        other => Err(Violation::UnexpectedType {
            expected: "number or string",
            actual: json_type_name(other),
        }),
    }
}

/// C `strtol` semantics: leading whitespace, optional sign, then digits up to
/// the first non-digit. No digits yields 0.
fn c_strtol(s: &str, radix: u32) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(0i64, |acc, d| {
            acc.saturating_mul(i64::from(radix))
                .saturating_add(i64::from(d))
        });

    let value = if negative { -magnitude } else { magnitude };
    value as i32
}
