use serde::Serialize;

use super::timestamp::format_epoch;
use crate::codec::blob::Blob;
use crate::codec::table::EntityId;

/// One assembled contact.
///
/// Names are sanitized and the display name composed when the record is
/// built; the record holds plain copies and no reference to the table it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    id: EntityId,
    first_name: String,
    last_name: String,
    display_name: String,
    phone_numbers: Vec<String>,
    call_times: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<Blob>,
}

impl ContactRecord {
    /// Build a record, sanitizing both names and dropping an empty image.
    pub fn new(
        id: EntityId,
        first_name: &str,
        last_name: &str,
        phone_numbers: Vec<String>,
        call_times: Vec<i64>,
        image: Option<Blob>,
    ) -> Self {
        let first_name = sanitize_name(first_name);
        let last_name = sanitize_name(last_name);
        let display_name = compose_display_name(&first_name, &last_name);
        Self {
            id,
            first_name,
            last_name,
            display_name,
            phone_numbers,
            call_times,
            image: image.filter(|blob| !blob.is_empty()),
        }
    }

    /// The contact's entity ID.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Sanitized first name.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Sanitized last name.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// `first last`, trimmed. Used for naming, never for lookups.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Phone numbers in log order.
    pub fn phone_numbers(&self) -> &[String] {
        &self.phone_numbers
    }

    /// Call timestamps in epoch seconds, in log order.
    pub fn call_times(&self) -> &[i64] {
        &self.call_times
    }

    /// Embedded image payload, if any.
    pub fn image(&self) -> Option<&Blob> {
        self.image.as_ref()
    }

    /// Call timestamps rendered by [`format_epoch`]; values outside the
    /// representable range are shown as raw seconds.
    pub fn call_log(&self) -> Vec<String> {
        self.call_times
            .iter()
            .map(|secs| format_epoch(*secs).unwrap_or_else(|| secs.to_string()))
            .collect()
    }

    /// File-name stem for this contact: the display name with spaces and
    /// path separators replaced by `_`, or the entity ID when the name is
    /// empty.
    pub fn file_stem(&self) -> String {
        if self.display_name.is_empty() {
            return self.id.to_string();
        }
        self.display_name
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                c => c,
            })
            .collect()
    }

    /// File name for this contact's image, e.g. `Jane_Doe.png`.
    pub fn image_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem(), extension.trim_start_matches('.'))
    }
}

/// Keep only printable ASCII (`0x20..=0x7E`).
pub fn sanitize_name(raw: &str) -> String {
    raw.chars().filter(|c| matches!(c, ' '..='~')).collect()
}

/// Join first and last name with one space and trim the result.
pub fn compose_display_name(first: &str, last: &str) -> String {
    format!("{first} {last}").trim().to_string()
}
