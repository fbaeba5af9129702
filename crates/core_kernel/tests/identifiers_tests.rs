//! Unit tests for the Identifiers module
//!
//! Tests cover the generated UUID identifiers and the natural
//! dealer code / GST invoice number key.

use core_kernel::{AuditEntryId, DealerCode, GstInvoiceNo, ImportBatchId, RecordKey};
use std::collections::HashSet;
use uuid::Uuid;

mod audit_entry_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = AuditEntryId::new();
        let id2 = AuditEntryId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_generates_time_ordered_ids() {
        let id1 = AuditEntryId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = AuditEntryId::new();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = AuditEntryId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(AuditEntryId::prefix(), "AUD");
        assert_eq!(ImportBatchId::prefix(), "IMP");
    }

    #[test]
    fn test_from_str_with_and_without_prefix() {
        let original = AuditEntryId::new();
        let with_prefix: AuditEntryId = original.to_string().parse().unwrap();
        let bare: AuditEntryId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, with_prefix);
        assert_eq!(original, bare);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("AUD-not-a-uuid".parse::<AuditEntryId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = AuditEntryId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}

mod record_key_tests {
    use super::*;

    #[test]
    fn test_codes_are_trimmed() {
        let dealer = DealerCode::new("  D001 ").unwrap();
        assert_eq!(dealer.as_str(), "D001");
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        let upper = GstInvoiceNo::new("INV-100").unwrap();
        let lower = GstInvoiceNo::new("inv-100").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_key_hashes_on_both_parts() {
        let mut keys = HashSet::new();
        keys.insert(RecordKey::parse("D001", "INV-100").unwrap());
        keys.insert(RecordKey::parse("D001", "INV-101").unwrap());
        keys.insert(RecordKey::parse("D002", "INV-100").unwrap());
        keys.insert(RecordKey::parse("D001", "INV-100").unwrap());
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_deserialize_rejects_blank_code() {
        let result: Result<DealerCode, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_key_round_trips_through_json() {
        let key = RecordKey::parse("D001", "INV-100").unwrap();
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["dealer_code"], "D001");
        assert_eq!(json["gst_invoice_no"], "INV-100");
        let back: RecordKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);
    }
}
