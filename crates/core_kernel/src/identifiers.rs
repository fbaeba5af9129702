//! Strongly-typed identifiers for domain entities
//!
//! Billing records are addressed by a natural composite key (dealer code and
//! GST invoice number). Rows the system generates itself, such as audit
//! entries and import batches, get UUID-backed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new time-ordered identifier (v7)
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(AuditEntryId, "AUD");
define_id!(ImportBatchId, "IMP");

macro_rules! define_code {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates the code, trimming surrounding whitespace.
            ///
            /// Blank input is rejected.
            pub fn new(value: impl AsRef<str>) -> Result<Self, CoreError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(CoreError::BlankCode($label));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> String {
                code.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_code!(DealerCode, "dealer code");
define_code!(GstInvoiceNo, "GST invoice number");

/// Composite natural key of a billing record
///
/// The key is not enforced unique by the store; see the billing adapters
/// for how duplicates are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub dealer_code: DealerCode,
    pub gst_invoice_no: GstInvoiceNo,
}

impl RecordKey {
    pub fn new(dealer_code: DealerCode, gst_invoice_no: GstInvoiceNo) -> Self {
        Self {
            dealer_code,
            gst_invoice_no,
        }
    }

    /// Builds a key from raw strings, validating both parts
    pub fn parse(dealer_code: &str, gst_invoice_no: &str) -> Result<Self, CoreError> {
        Ok(Self {
            dealer_code: DealerCode::new(dealer_code)?,
            gst_invoice_no: GstInvoiceNo::new(gst_invoice_no)?,
        })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dealer_code, self.gst_invoice_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_entry_id_display() {
        let id = AuditEntryId::new();
        assert!(id.to_string().starts_with("AUD-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = ImportBatchId::new();
        let parsed: ImportBatchId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_record_key_trims_input() {
        let key = RecordKey::parse("  D001 ", "INV-100\t").unwrap();
        assert_eq!(key.dealer_code.as_str(), "D001");
        assert_eq!(key.gst_invoice_no.as_str(), "INV-100");
        assert_eq!(key.to_string(), "D001/INV-100");
    }

    #[test]
    fn test_blank_codes_rejected() {
        assert!(matches!(DealerCode::new("   "), Err(CoreError::BlankCode("dealer code"))));
        assert!(RecordKey::parse("D001", "").is_err());
    }
}
