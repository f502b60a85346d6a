//! Error types for petsync.

use thiserror::Error;

use crate::RecordType;

/// An entity could not be converted to or from its remote record form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A field required by the record type is absent or blank.
    #[error("{record_type} record is missing required field `{field}`")]
    MissingField {
        /// Type of record being converted.
        record_type: RecordType,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The record has a different type than the target entity.
    #[error("expected {expected} record, got {actual}")]
    TypeMismatch {
        /// Type the conversion expected.
        expected: RecordType,
        /// Type the record actually has.
        actual: RecordType,
    },

    /// A field is present but holds the wrong kind of value.
    #[error("{record_type} record field `{field}` has an invalid value")]
    InvalidField {
        /// Type of record being converted.
        record_type: RecordType,
        /// Name of the offending field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ConversionError::MissingField {
            record_type: RecordType::Pet,
            field: "name",
        };
        assert_eq!(err.to_string(), "Pet record is missing required field `name`");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConversionError>();
    }
}
