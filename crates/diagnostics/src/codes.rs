//! Diagnostic ID constants.
//!
//! `CLOG1xxx` codes are fatal decode errors, `CLOG2xxx` are assembly notes,
//! and `CLOG3xxx` come from the image writer.

/// A triple's entity ID, length field, or payload runs past the end of its line.
pub const TRUNCATED_LINE: &str = "CLOG1001";

/// A length field is not a hexadecimal integer.
pub const INVALID_LENGTH_ENCODING: &str = "CLOG1002";

/// A line starts with a field code the layout does not declare.
pub const UNKNOWN_FIELD_CODE: &str = "CLOG1003";

/// A contact has no value for a bound field; the field's default was used.
pub const MISSING_FIELD: &str = "CLOG2001";

/// A call timestamp is not an integer number of epoch seconds.
pub const INVALID_TIMESTAMP: &str = "CLOG2002";

/// An image file already exists and was left untouched.
pub const IMAGE_EXISTS: &str = "CLOG3001";

/// An image payload is not valid base64.
pub const INVALID_IMAGE_DATA: &str = "CLOG3002";

/// Every code defined in this module, in numeric order.
pub const ALL: &[&str] = &[
    TRUNCATED_LINE,
    INVALID_LENGTH_ENCODING,
    UNKNOWN_FIELD_CODE,
    MISSING_FIELD,
    INVALID_TIMESTAMP,
    IMAGE_EXISTS,
    INVALID_IMAGE_DATA,
];
