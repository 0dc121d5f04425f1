//! Normalized data type tree.
//!
//! A [`DataType`] is built bottom-up by the normalizer through a
//! [`TypeBuilder`], which enforces that the kind and each collection are
//! populated at most once, then sealed into a tagged [`TypeKind`].

use serde_json::Value;

use crate::error::Violation;
use crate::types::{json_type_name, NumberFormat};

/// Value of the dialect's `type` member, plus `oneOf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    State,
    Object,
    DateTime,
    Time,
    Raw,
    Array,
    Bitmap,
    Level,
    Number,
    NumericValue,
    OneOf,
}

impl KindTag {
    /// Parse a `type` string. `oneOf` is not a `type` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "state" => Some(KindTag::State),
            "object" => Some(KindTag::Object),
            "date-time" => Some(KindTag::DateTime),
            "time" => Some(KindTag::Time),
            "raw" => Some(KindTag::Raw),
            "array" => Some(KindTag::Array),
            "bitmap" => Some(KindTag::Bitmap),
            "level" => Some(KindTag::Level),
            "number" => Some(KindTag::Number),
            "numericValue" => Some(KindTag::NumericValue),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KindTag::State => "state",
            KindTag::Object => "object",
            KindTag::DateTime => "date-time",
            KindTag::Time => "time",
            KindTag::Raw => "raw",
            KindTag::Array => "array",
            KindTag::Bitmap => "bitmap",
            KindTag::Level => "level",
            KindTag::Number => "number",
            KindTag::NumericValue => "numericValue",
            KindTag::OneOf => "oneOf",
        }
    }
}

/// One entry of a `state` or `numericValue` enumeration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumEntry {
    /// EDT code.
    pub code: i32,
    pub label_ja: Option<String>,
    pub label_en: Option<String>,
    pub numeric_value: Option<f64>,
    pub read_only: bool,
}

/// Inline enumeration of a `number`, stored at the width of its format.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericEnumeration {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
}

impl NumericEnumeration {
    /// Decode numeric literals, narrowing each to the width of `format`.
    ///
    /// Out-of-range values wrap the way a C integer conversion does rather
    /// than saturating.
    pub fn decode(format: NumberFormat, items: &[Value]) -> Result<Self, Violation> {
        let numbers = items
            .iter()
            .map(|item| {
                item.as_f64().ok_or(Violation::UnexpectedType {
                    expected: "number",
                    actual: json_type_name(item),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        // Fractions truncate toward zero, then values wrap modulo the width:
        // 200 as int8 is -56, -3 as uint16 is 65533.
        let wide = numbers.iter().map(|n| *n as i64);
        Ok(match format {
            NumberFormat::Int8 => Self::Int8(wide.map(|n| n as i8).collect()),
            NumberFormat::Int16 => Self::Int16(wide.map(|n| n as i16).collect()),
            NumberFormat::Int32 => Self::Int32(wide.map(|n| n as i32).collect()),
            NumberFormat::Uint8 => Self::Uint8(wide.map(|n| n as u8).collect()),
            NumberFormat::Uint16 => Self::Uint16(wide.map(|n| n as u16).collect()),
            NumberFormat::Uint32 => Self::Uint32(wide.map(|n| n as u32).collect()),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Uint8(v) => v.len(),
            Self::Uint16(v) => v.len(),
            Self::Uint32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widened copy of the values, in document order.
    pub fn values(&self) -> Vec<i64> {
        match self {
            Self::Int8(v) => v.iter().map(|n| i64::from(*n)).collect(),
            Self::Int16(v) => v.iter().map(|n| i64::from(*n)).collect(),
            Self::Int32(v) => v.iter().map(|n| i64::from(*n)).collect(),
            Self::Uint8(v) => v.iter().map(|n| i64::from(*n)).collect(),
            Self::Uint16(v) => v.iter().map(|n| i64::from(*n)).collect(),
            Self::Uint32(v) => v.iter().map(|n| i64::from(*n)).collect(),
        }
    }
}

/// A child of an object type, or the element of an array type.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Option<String>,
    pub shape: DataType,
}

/// One named bit range of a `bitmap` type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BitmapField {
    pub name: Option<String>,
    pub description_ja: Option<String>,
    pub description_en: Option<String>,
    pub bit_index: i32,
    pub bit_mask: Option<String>,
    pub value: DataType,
}

/// Scalar attributes copied from the descriptor as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalarMeta {
    pub size: Option<i32>,
    pub unit: Option<String>,
    pub multiple_of: Option<f64>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub item_size: Option<i64>,
    pub min_items: Option<i64>,
    pub max_items: Option<i64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub base: Option<String>,
}

/// Kind of a normalized data type together with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeKind {
    #[default]
    Unset,
    State(Vec<EnumEntry>),
    Object(Vec<Member>),
    DateTime,
    Time,
    Raw,
    /// Element type, when the descriptor has `items`.
    Array(Option<Box<DataType>>),
    Bitmap(Vec<BitmapField>),
    Level,
    Number {
        format: Option<NumberFormat>,
        enumeration: Option<NumericEnumeration>,
    },
    NumericValue(Vec<EnumEntry>),
    OneOf(Vec<DataType>),
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Unset => "unset",
            TypeKind::State(_) => "state",
            TypeKind::Object(_) => "object",
            TypeKind::DateTime => "date-time",
            TypeKind::Time => "time",
            TypeKind::Raw => "raw",
            TypeKind::Array(_) => "array",
            TypeKind::Bitmap(_) => "bitmap",
            TypeKind::Level => "level",
            TypeKind::Number { .. } => "number",
            TypeKind::NumericValue(_) => "numericValue",
            TypeKind::OneOf(_) => "oneOf",
        }
    }
}

/// Node of the normalized type tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataType {
    pub kind: TypeKind,
    pub meta: ScalarMeta,
    /// External property codes linked as array coefficients. Not resolved.
    pub coefficients: Vec<String>,
    /// `$ref` this node was resolved through, kept for diagnostics.
    pub reference: Option<String>,
}

impl DataType {
    pub fn is_state(&self) -> bool {
        matches!(self.kind, TypeKind::State(_))
    }

    pub fn unit(&self) -> Option<&str> {
        self.meta.unit.as_deref()
    }
}

/// Accumulates the members of one descriptor, `$ref` targets merged in.
#[derive(Debug, Default)]
pub struct TypeBuilder {
    kind: Option<KindTag>,
    format: Option<NumberFormat>,
    pub meta: ScalarMeta,
    states: Option<Vec<EnumEntry>>,
    numbers: Option<NumericEnumeration>,
    children: Option<(&'static str, Vec<Member>)>,
    bitmaps: Option<Vec<BitmapField>>,
    coefficients: Option<Vec<String>>,
    reference: Option<String>,
}

impl TypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> Option<KindTag> {
        self.kind
    }

    pub fn format(&self) -> Option<NumberFormat> {
        self.format
    }

    pub fn set_kind(&mut self, kind: KindTag) -> Result<(), Violation> {
        if let Some(existing) = self.kind {
            return Err(Violation::KindAlreadySet {
                existing: existing.name(),
            });
        }
        self.kind = Some(kind);
        Ok(())
    }

    pub fn set_format(&mut self, format: NumberFormat) {
        self.format = Some(format);
    }

    pub fn set_reference(&mut self, reference: &str) {
        self.reference = Some(reference.to_string());
    }

    pub fn set_states(&mut self, entries: Vec<EnumEntry>) -> Result<(), Violation> {
        set_once(&mut self.states, entries, "enum")
    }

    pub fn set_numbers(&mut self, numbers: NumericEnumeration) -> Result<(), Violation> {
        set_once(&mut self.numbers, numbers, "enum")
    }

    /// Children from `properties`, `items` or `oneOf`; `source` names the member.
    pub fn set_children(
        &mut self,
        source: &'static str,
        children: Vec<Member>,
    ) -> Result<(), Violation> {
        set_once(&mut self.children, (source, children), "children")
    }

    pub fn set_bitmaps(&mut self, fields: Vec<BitmapField>) -> Result<(), Violation> {
        set_once(&mut self.bitmaps, fields, "bitmaps")
    }

    pub fn set_coefficients(&mut self, codes: Vec<String>) -> Result<(), Violation> {
        set_once(&mut self.coefficients, codes, "coefficient")
    }

    /// Seal the accumulated members into a [`DataType`].
    ///
    /// Collections that do not belong to the final kind are dropped and
    /// reported through the returned violations. Objects take children only
    /// from `properties`, arrays only from `items`, `oneOf` only from `oneOf`.
    pub fn finish(self) -> (DataType, Vec<Violation>) {
        let mut dropped = Vec::new();
        let kind_name = self.kind.map(|k| k.name()).unwrap_or("unset");
        let mut children = self.children;
        let mut bitmaps = self.bitmaps;

        let kind = match self.kind {
            None => TypeKind::Unset,
            Some(KindTag::State) => TypeKind::State(self.states.unwrap_or_default()),
            Some(KindTag::NumericValue) => {
                TypeKind::NumericValue(self.states.unwrap_or_default())
            }
            Some(KindTag::Object) => TypeKind::Object(
                take_children(&mut children, "properties").unwrap_or_default(),
            ),
            Some(KindTag::Array) => TypeKind::Array(
                take_children(&mut children, "items")
                    .and_then(|members| members.into_iter().next())
                    .map(|member| Box::new(member.shape)),
            ),
            Some(KindTag::OneOf) => TypeKind::OneOf(
                take_children(&mut children, "oneOf")
                    .map(|members| members.into_iter().map(|m| m.shape).collect())
                    .unwrap_or_default(),
            ),
            Some(KindTag::Bitmap) => TypeKind::Bitmap(bitmaps.take().unwrap_or_default()),
            Some(KindTag::Number) => TypeKind::Number {
                format: self.format,
                enumeration: self.numbers,
            },
            Some(KindTag::DateTime) => TypeKind::DateTime,
            Some(KindTag::Time) => TypeKind::Time,
            Some(KindTag::Raw) => TypeKind::Raw,
            Some(KindTag::Level) => TypeKind::Level,
        };

        if let Some((source, _)) = children {
            dropped.push(Violation::MisplacedCollection {
                collection: source,
                kind: kind_name,
            });
        }
        if bitmaps.is_some() {
            dropped.push(Violation::MisplacedCollection {
                collection: "bitmaps",
                kind: kind_name,
            });
        }

        let data_type = DataType {
            kind,
            meta: self.meta,
            coefficients: self.coefficients.unwrap_or_default(),
            reference: self.reference,
        };
        (data_type, dropped)
    }
}

/// Take the children if they came from `source`, leaving any others in place.
fn take_children(
    children: &mut Option<(&'static str, Vec<Member>)>,
    source: &'static str,
) -> Option<Vec<Member>> {
    match children {
        Some((tag, _)) if *tag == source => children.take().map(|(_, members)| members),
        _ => None,
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, collection: &'static str) -> Result<(), Violation> {
    if slot.is_some() {
        return Err(Violation::AlreadyPopulated { collection });
    }
    *slot = Some(value);
    Ok(())
}
