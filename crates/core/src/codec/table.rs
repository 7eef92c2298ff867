use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use contactlog_layout::{FieldKind, Layout};
use serde::{Serialize, Serializer};

use super::blob::Blob;
use super::error::DecodeError;
use super::lexer::{lex_line, read_field_code, strip_terminator};

/// Identifier of one logical entity (a contact).
///
/// IDs are opaque bytes: two IDs are the same entity only when their bytes
/// are equal. Text output uses the ID as-is when it is UTF-8 without a
/// backslash, and an ASCII-escaped form (`\xff\xfe00`) otherwise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(Vec<u8>);

impl EntityId {
    /// Create an ID from text or bytes.
    pub fn new(id: impl Into<Vec<u8>>) -> Self {
        Self(id.into())
    }

    /// Create an ID from raw line bytes.
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }

    /// The raw ID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for EntityId {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for EntityId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if !text.contains('\\') => f.write_str(text),
            _ => write!(f, "{}", self.0.escape_ascii()),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-entity values of one field, stored according to the field's kind.
///
/// The variant is chosen once, from the layout, when the column is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldColumn {
    /// Last value written per entity.
    Scalar(BTreeMap<EntityId, String>),
    /// Every value per entity, in line order.
    List(BTreeMap<EntityId, Vec<String>>),
    /// Last payload written per entity, kept as bytes.
    Binary(BTreeMap<EntityId, Blob>),
}

impl FieldColumn {
    /// An empty column of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Scalar => FieldColumn::Scalar(BTreeMap::new()),
            FieldKind::List => FieldColumn::List(BTreeMap::new()),
            FieldKind::Binary => FieldColumn::Binary(BTreeMap::new()),
        }
    }

    /// The kind this column was created with.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldColumn::Scalar(_) => FieldKind::Scalar,
            FieldColumn::List(_) => FieldKind::List,
            FieldColumn::Binary(_) => FieldKind::Binary,
        }
    }

    /// Number of entities with an entry in this column.
    pub fn len(&self) -> usize {
        match self {
            FieldColumn::Scalar(m) => m.len(),
            FieldColumn::List(m) => m.len(),
            FieldColumn::Binary(m) => m.len(),
        }
    }

    /// Whether no entity has an entry in this column.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities with an entry in this column, in ID order.
    pub fn entity_ids(&self) -> Vec<&EntityId> {
        match self {
            FieldColumn::Scalar(m) => m.keys().collect(),
            FieldColumn::List(m) => m.keys().collect(),
            FieldColumn::Binary(m) => m.keys().collect(),
        }
    }

    /// Every stored payload as `(entity, bytes)`, entities in ID order and
    /// list elements in their original order.
    pub fn payloads(&self) -> Vec<(&EntityId, &[u8])> {
        match self {
            FieldColumn::Scalar(m) => m.iter().map(|(id, v)| (id, v.as_bytes())).collect(),
            FieldColumn::List(m) => m
                .iter()
                .flat_map(|(id, values)| values.iter().map(move |v| (id, v.as_bytes())))
                .collect(),
            FieldColumn::Binary(m) => m.iter().map(|(id, v)| (id, v.as_bytes())).collect(),
        }
    }

    fn insert(&mut self, id: EntityId, payload: &[u8]) {
        match self {
            FieldColumn::Scalar(m) => {
                m.insert(id, String::from_utf8_lossy(payload).into_owned());
            }
            FieldColumn::List(m) => m
                .entry(id)
                .or_default()
                .push(String::from_utf8_lossy(payload).into_owned()),
            FieldColumn::Binary(m) => {
                m.insert(id, Blob::from(payload));
            }
        }
    }
}

/// The decoded contents of a whole log: field name to per-entity values,
/// plus every entity ID seen under any field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldTable {
    #[serde(rename = "fields")]
    columns: BTreeMap<String, FieldColumn>,
    #[serde(rename = "entities")]
    entity_ids: BTreeSet<EntityId>,
}

impl FieldTable {
    /// The column for a field name, if any line carried that field.
    pub fn column(&self, field: &str) -> Option<&FieldColumn> {
        self.columns.get(field)
    }

    /// All columns, in field-name order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &FieldColumn)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    /// Every entity ID seen under any field.
    pub fn entity_ids(&self) -> &BTreeSet<EntityId> {
        &self.entity_ids
    }

    /// Number of distinct entities.
    pub fn entity_count(&self) -> usize {
        self.entity_ids.len()
    }

    /// Scalar value of `field` for `id`. `None` when the field is not a
    /// scalar column or the entity has no entry.
    pub fn scalar(&self, field: &str, id: impl AsRef<[u8]>) -> Option<&str> {
        match self.columns.get(field)? {
            FieldColumn::Scalar(m) => m.get(id.as_ref()).map(String::as_str),
            _ => None,
        }
    }

    /// List values of `field` for `id`, in line order.
    pub fn list(&self, field: &str, id: impl AsRef<[u8]>) -> Option<&[String]> {
        match self.columns.get(field)? {
            FieldColumn::List(m) => m.get(id.as_ref()).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Binary value of `field` for `id`. An empty payload reads as `None`.
    pub fn binary(&self, field: &str, id: impl AsRef<[u8]>) -> Option<&Blob> {
        match self.columns.get(field)? {
            FieldColumn::Binary(m) => m.get(id.as_ref()).filter(|blob| !blob.is_empty()),
            _ => None,
        }
    }
}

/// Builds a [`FieldTable`] one line at a time.
///
/// Lines must be pushed in file order: scalar and binary fields keep the
/// last value pushed and list fields append in push order. After the first
/// error the builder is poisoned: every later push and [`finish`] return
/// that error, so a partially decoded table is never handed out.
///
/// [`finish`]: FieldTableBuilder::finish
#[derive(Debug)]
pub struct FieldTableBuilder<'l> {
    layout: &'l Layout,
    table: FieldTable,
    next_line: usize,
    failed: Option<DecodeError>,
}

impl<'l> FieldTableBuilder<'l> {
    /// Start an empty table for the given layout.
    pub fn new(layout: &'l Layout) -> Self {
        Self {
            layout,
            table: FieldTable::default(),
            next_line: 0,
            failed: None,
        }
    }

    /// Decode one line (terminator optional) into the table.
    pub fn push_line(&mut self, line: &[u8]) -> Result<(), DecodeError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let index = self.next_line;
        self.next_line += 1;

        let result = self.decode_line(index, line);
        if let Err(err) = &result {
            self.failed = Some(err.clone());
        }
        result
    }

    /// Number of lines pushed so far, blank ones included.
    pub fn lines_read(&self) -> usize {
        self.next_line
    }

    /// Finish the pass and hand out the table.
    pub fn finish(self) -> Result<FieldTable, DecodeError> {
        match self.failed {
            Some(err) => Err(err),
            None => Ok(self.table),
        }
    }

    fn decode_line(&mut self, index: usize, line: &[u8]) -> Result<(), DecodeError> {
        if strip_terminator(line).is_empty() {
            return Ok(());
        }
        let layout = self.layout;
        let code =
            read_field_code(line, &layout.widths).map_err(|e| DecodeError::from_lex(index, e))?;
        let def = layout
            .resolve(code)
            .ok_or_else(|| DecodeError::UnknownFieldCode {
                line: index,
                code: String::from_utf8_lossy(code).into_owned(),
            })?;
        let lexed = lex_line(line, &layout.widths).map_err(|e| DecodeError::from_lex(index, e))?;

        let column = self
            .table
            .columns
            .entry(def.name.clone())
            .or_insert_with(|| FieldColumn::new(def.kind));
        for triple in lexed.triples {
            let id = EntityId::from_bytes(triple.entity_id);
            column.insert(id.clone(), triple.payload);
            self.table.entity_ids.insert(id);
        }
        Ok(())
    }
}

/// Decode a sequence of lines into a [`FieldTable`].
pub fn build_field_table<I>(lines: I, layout: &Layout) -> Result<FieldTable, DecodeError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut builder = FieldTableBuilder::new(layout);
    for line in lines {
        builder.push_line(line.as_ref())?;
    }
    builder.finish()
}

/// Decode a whole log held in memory. Lines are split on `\n`; line indices
/// in errors match [`LineIndex`](contactlog_diagnostics::LineIndex) lines.
pub fn decode_bytes(input: &[u8], layout: &Layout) -> Result<FieldTable, DecodeError> {
    build_field_table(input.split_inclusive(|b| *b == b'\n'), layout)
}
