//! Record layouts for the contact log decoder.
//!
//! A [`Layout`] tells the decoder how wide the fixed fields of a line are,
//! which field codes exist, what kind of value each field holds, and which
//! fields fill the slots of an assembled contact record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported length-field width, in hex digits.
pub const MAX_LENGTH_WIDTH: usize = 8;

/// Errors that can occur when loading or validating a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// JSON deserialization failed.
    #[error("invalid layout JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is out of its valid range or inconsistent with the rest
    /// of the layout.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Path of the offending setting (e.g. `"widths.length"`).
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl LayoutError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Widths, in bytes, of the fixed-size tokens of a line.
///
/// The field-code and entity-ID widths share a default but are independent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Widths {
    /// Width of the field-type code at the start of each line.
    pub field_code: usize,
    /// Width of each entity ID.
    pub entity_id: usize,
    /// Width of each hexadecimal length field.
    pub length: usize,
}

impl Default for Widths {
    fn default() -> Self {
        Self {
            field_code: 4,
            entity_id: 4,
            length: 5,
        }
    }
}

impl Widths {
    /// Largest payload length a length field of this width can express.
    pub fn max_payload_len(&self) -> usize {
        u32::try_from(self.length)
            .ok()
            .and_then(|digits| 16usize.checked_pow(digits))
            .map_or(usize::MAX, |limit| limit - 1)
    }
}

/// How the payloads of a field are stored per entity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// One text value; a later occurrence replaces an earlier one.
    #[default]
    Scalar,
    /// An ordered list of text values, appended in line order.
    List,
    /// One opaque byte value; a later occurrence replaces an earlier one.
    Binary,
}

impl FieldKind {
    /// Lowercase name as used in layout JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::List => "list",
            FieldKind::Binary => "binary",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one field code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDef {
    /// Semantic field name (e.g. `"phone"`).
    pub name: String,
    /// Storage kind; defaults to [`FieldKind::Scalar`].
    #[serde(default)]
    pub kind: FieldKind,
}

impl FieldDef {
    /// Create a field declaration.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Which field names fill the slots of an assembled contact record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecordBinding {
    /// Scalar field holding the first name.
    pub first: String,
    /// Scalar field holding the last name.
    pub last: String,
    /// List field holding phone numbers.
    pub phones: String,
    /// List field holding call timestamps (epoch seconds).
    pub call_times: String,
    /// Binary field holding the contact image.
    pub image: String,
}

impl Default for RecordBinding {
    fn default() -> Self {
        Self {
            first: "first".into(),
            last: "last".into(),
            phones: "phone".into(),
            call_times: "time".into(),
            image: "image".into(),
        }
    }
}

impl RecordBinding {
    /// `(slot, field name, required kind)` for every record slot.
    pub fn slots(&self) -> [(&'static str, &str, FieldKind); 5] {
        [
            ("first", self.first.as_str(), FieldKind::Scalar),
            ("last", self.last.as_str(), FieldKind::Scalar),
            ("phones", self.phones.as_str(), FieldKind::List),
            ("call_times", self.call_times.as_str(), FieldKind::List),
            ("image", self.image.as_str(), FieldKind::Binary),
        ]
    }
}

/// A complete record layout.
///
/// # Example
/// ```
/// let layout = contactlog_layout::Layout::default();
/// let first = layout.resolve(b"86B7").unwrap();
/// assert_eq!(first.name, "first");
/// assert_eq!(layout.widths.length, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Layout {
    /// Layout identifier (e.g. `"contacts-v1"`).
    pub id: String,
    /// Token widths.
    #[serde(default)]
    pub widths: Widths,
    /// Field code to field declaration.
    pub fields: BTreeMap<String, FieldDef>,
    /// Record slot bindings.
    #[serde(default)]
    pub record: RecordBinding,
}

impl Default for Layout {
    /// The contacts layout: first and last name, phone numbers, call times,
    /// and an embedded image.
    fn default() -> Self {
        let fields = [
            ("86B7", FieldDef::new("first", FieldKind::Scalar)),
            ("9E60", FieldDef::new("last", FieldKind::Scalar)),
            ("5159", FieldDef::new("phone", FieldKind::List)),
            ("D812", FieldDef::new("time", FieldKind::List)),
            ("6704", FieldDef::new("image", FieldKind::Binary)),
        ];
        Self {
            id: "contacts-v1".into(),
            widths: Widths::default(),
            fields: fields
                .into_iter()
                .map(|(code, def)| (code.to_string(), def))
                .collect(),
            record: RecordBinding::default(),
        }
    }
}

impl Layout {
    /// Look up the field declared for a raw field code.
    pub fn resolve(&self, code: &[u8]) -> Option<&FieldDef> {
        std::str::from_utf8(code)
            .ok()
            .and_then(|code| self.fields.get(code))
    }

    /// First field code (in code order) declared with the given name.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, def)| def.name == name)
            .map(|(code, _)| code.as_str())
    }

    /// Kind of the field with the given name, if declared.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .values()
            .find(|def| def.name == name)
            .map(|def| def.kind)
    }

    /// Check the structural rules every layout must satisfy.
    ///
    /// - `id` must be non-empty
    /// - every width must be > 0, and `widths.length` at most [`MAX_LENGTH_WIDTH`]
    /// - at least one field must be declared
    /// - codes must be ASCII and exactly `widths.field_code` bytes long
    /// - names must be non-empty, and codes sharing a name must share a kind
    /// - every record slot must name a declared field of the slot's kind
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.id.trim().is_empty() {
            return Err(LayoutError::invalid("id", "must not be empty"));
        }

        let widths = [
            ("widths.field_code", self.widths.field_code),
            ("widths.entity_id", self.widths.entity_id),
            ("widths.length", self.widths.length),
        ];
        for (field, width) in widths {
            if width == 0 {
                return Err(LayoutError::invalid(field, "must be > 0"));
            }
        }
        if self.widths.length > MAX_LENGTH_WIDTH {
            return Err(LayoutError::invalid(
                "widths.length",
                format!(
                    "{} exceeds maximum length width ({MAX_LENGTH_WIDTH})",
                    self.widths.length
                ),
            ));
        }

        if self.fields.is_empty() {
            return Err(LayoutError::invalid("fields", "must declare at least one field"));
        }

        let mut kinds: BTreeMap<&str, FieldKind> = BTreeMap::new();
        for (code, def) in &self.fields {
            if !code.is_ascii() || code.len() != self.widths.field_code {
                return Err(LayoutError::invalid(
                    format!("fields.{code}"),
                    format!(
                        "code must be {} ASCII bytes long",
                        self.widths.field_code
                    ),
                ));
            }
            if def.name.trim().is_empty() {
                return Err(LayoutError::invalid(
                    format!("fields.{code}.name"),
                    "must not be empty",
                ));
            }
            if let Some(previous) = kinds.insert(def.name.as_str(), def.kind)
                && previous != def.kind
            {
                return Err(LayoutError::invalid(
                    format!("fields.{code}.kind"),
                    format!(
                        "field '{}' is declared both {previous} and {}",
                        def.name, def.kind
                    ),
                ));
            }
        }

        for (slot, name, expected) in self.record.slots() {
            match kinds.get(name) {
                None => {
                    return Err(LayoutError::invalid(
                        format!("record.{slot}"),
                        format!("field '{name}' is not declared"),
                    ));
                }
                Some(kind) if *kind != expected => {
                    return Err(LayoutError::invalid(
                        format!("record.{slot}"),
                        format!("field '{name}' is {kind}, expected {expected}"),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Load and validate a [`Layout`] from a JSON string.
///
/// `id` and `fields` are required; `widths` and `record` fall back to their
/// defaults when omitted. See [`Layout::validate`] for the structural rules.
pub fn load_layout_from_str(s: &str) -> Result<Layout, LayoutError> {
    let layout: Layout = serde_json::from_str(s)?;
    layout.validate()?;
    Ok(layout)
}
