//! PostgreSQL adapter tests
//!
//! These start a PostgreSQL container and are ignored by default; run them
//! with `cargo test -p infra_db -- --ignored` on a machine with Docker.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::PortError;
use domain_billing::{
    BillingQueryService, BillingRecordEditor, BillingStore, CredentialStore, EditableField,
    EditorError, OutstandingFilter, RecordSearch, TypeOfDue,
};
use infra_db::repositories::user::{UserRepository, UserRow};
use infra_db::{PostgresBillingStore, PostgresCredentialStore};
use test_utils::{
    assert_audit_entry, assert_changed_fields, assert_exceeds_ceiling, create_isolated_test_database,
    BillingRecordBuilder, EditableFieldsBuilder, KeyFixtures, StringFixtures, TestDatabase,
};

async fn setup() -> (TestDatabase, Arc<PostgresBillingStore>) {
    let db = create_isolated_test_database()
        .await
        .expect("Failed to create test database");
    let store = Arc::new(PostgresBillingStore::new(db.pool().clone()));
    (db, store)
}

async fn load_standard_record(store: &Arc<PostgresBillingStore>) {
    let queries = BillingQueryService::new(store.clone());
    queries
        .import(
            vec![BillingRecordBuilder::new().build_import_row()],
            StringFixtures::uploader(),
        )
        .await
        .expect("Failed to load record");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_commits_row_and_audit_together() {
    let (_db, store) = setup().await;
    load_standard_record(&store).await;
    let editor = BillingRecordEditor::new(store.clone());
    let key = KeyFixtures::standard();

    let fields = EditableFieldsBuilder::new().receipt_1(dec!(10000)).build();
    let outcome = editor.update(&key, fields, "cashier01").await.unwrap();

    assert_changed_fields(
        &outcome.changes,
        &[
            EditableField::ReceiptAmount1,
            EditableField::ReceiptNumber1,
            EditableField::ReceiptDate1,
        ],
    );
    assert_audit_entry(&outcome.changes[0], EditableField::ReceiptAmount1, "", "10000");

    let stored = editor.fetch(&key).await.unwrap();
    assert_eq!(stored.fields.receipt_amount_1, Some(dec!(10000)));
    assert!(stored.collection_timestamp.is_some());
    assert!(stored.due_amount().is_zero());

    let history = editor.history(&key).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|e| e.changed_at == history[0].changed_at));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_rejected_update_writes_nothing() {
    let (db, store) = setup().await;
    load_standard_record(&store).await;
    let editor = BillingRecordEditor::new(store.clone());
    let key = KeyFixtures::standard();

    let fields = EditableFieldsBuilder::new()
        .receipt_1(dec!(9000))
        .insurance_receipt(dec!(1500))
        .build();
    let result = editor.update(&key, fields, "cashier01").await;

    assert_exceeds_ceiling(&result, dec!(10500), dec!(10000));
    let stored = editor.fetch(&key).await.unwrap();
    assert_eq!(stored.fields.receipt_amount_1, None);
    assert!(stored.collection_timestamp.is_none());
    assert!(editor.history(&key).await.unwrap().is_empty());
    assert_eq!(db.audit_row_count().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_keys_resolve_to_earliest_row() {
    let (db, store) = setup().await;
    let queries = BillingQueryService::new(store.clone());
    queries
        .import(
            vec![
                BillingRecordBuilder::new().with_customer_name("first").build_import_row(),
                BillingRecordBuilder::new().with_customer_name("second").build_import_row(),
            ],
            "loader",
        )
        .await
        .unwrap();
    let editor = BillingRecordEditor::new(store.clone());
    let key = KeyFixtures::standard();

    let fields = EditableFieldsBuilder::new().claim_remarks("first row only").build();
    editor.update(&key, fields, "cashier01").await.unwrap();

    let remarks = db.claim_remarks_by_load_order().await.unwrap();
    assert_eq!(remarks, vec![Some("first row only".to_string()), None]);
    assert_eq!(
        editor.fetch(&key).await.unwrap().customer_name.as_deref(),
        Some("first")
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_legacy_type_of_due_reads_back_verbatim() {
    let (db, store) = setup().await;
    load_standard_record(&store).await;
    assert_eq!(db.force_type_of_due("Written Off").await.unwrap(), 1);
    let editor = BillingRecordEditor::new(store.clone());
    let key = KeyFixtures::standard();

    let record = editor.fetch(&key).await.unwrap();
    assert_eq!(
        record.fields.type_of_due,
        Some(TypeOfDue::Legacy("Written Off".to_string()))
    );

    let fields = EditableFieldsBuilder::starting_from(record.fields.clone())
        .type_of_due(TypeOfDue::Cleared)
        .build();
    let outcome = editor.update(&key, fields, "cashier01").await.unwrap();
    assert_audit_entry(&outcome.changes[0], EditableField::TypeOfDue, "Written Off", "Cleared");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_audit_log_is_append_only() {
    let (db, store) = setup().await;
    load_standard_record(&store).await;
    let editor = BillingRecordEditor::new(store.clone());
    let fields = EditableFieldsBuilder::new().claim_remarks("noted").build();
    editor
        .update(&KeyFixtures::standard(), fields, "cashier01")
        .await
        .unwrap();

    let result = sqlx::query("DELETE FROM service_billing_audit_log")
        .execute(db.pool())
        .await;
    let err = infra_db::DatabaseError::from(result.unwrap_err());
    assert!(err.is_constraint_violation());
    assert_eq!(db.audit_row_count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_updates_serialize_on_row_lock() {
    let (_db, store) = setup().await;
    load_standard_record(&store).await;
    let editor = BillingRecordEditor::new(store.clone());
    let key = KeyFixtures::standard();

    let a = EditableFieldsBuilder::new().receipt_1(dec!(6000)).build();
    let b = EditableFieldsBuilder::new().receipt_1(dec!(7000)).build();
    let (ra, rb) = tokio::join!(
        editor.update(&key, a, "cashier01"),
        editor.update(&key, b, "cashier02"),
    );
    ra.unwrap();
    rb.unwrap();

    let stored = editor.fetch(&key).await.unwrap();
    let history = editor.history(&key).await.unwrap();
    let amount_changes: Vec<_> = history
        .iter()
        .filter(|e| e.field() == Some(EditableField::ReceiptAmount1))
        .collect();
    assert_eq!(amount_changes.len(), 2);
    // newest first: the later writer saw the earlier writer's value
    assert_eq!(amount_changes[0].old_value, amount_changes[1].new_value);
    assert_eq!(
        stored.fields.receipt_amount_1.map(|d| d.normalize().to_string()),
        Some(amount_changes[0].new_value.clone())
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_open_transaction_does_not_block_other_keys() {
    let (_db, store) = setup().await;
    let queries = BillingQueryService::new(store.clone());
    queries
        .import(
            vec![
                BillingRecordBuilder::new().build_import_row(),
                BillingRecordBuilder::new()
                    .with_key(KeyFixtures::other_invoice())
                    .build_import_row(),
            ],
            StringFixtures::uploader(),
        )
        .await
        .unwrap();

    let mut held = store.begin().await.unwrap();
    assert!(held
        .lock_for_update(&KeyFixtures::standard())
        .await
        .unwrap()
        .is_some());

    let editor = BillingRecordEditor::new(store.clone());
    let fields = EditableFieldsBuilder::new().claim_remarks("independent").build();
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        editor.update(&KeyFixtures::other_invoice(), fields, "cashier02"),
    )
    .await
    .expect("update on another key waited for the held lock")
    .unwrap();
    assert_eq!(outcome.changes.len(), 1);

    held.rollback().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_search_and_reports() {
    let (_db, store) = setup().await;
    let queries = BillingQueryService::new(store.clone());
    let may_1 = NaiveDate::from_ymd_opt(2024, 5, 1);
    let may_2 = NaiveDate::from_ymd_opt(2024, 5, 2);
    queries
        .import(
            vec![
                BillingRecordBuilder::new()
                    .with_codes("D001", "INV_1")
                    .with_invoice_date(may_1)
                    .with_labour(dec!(400), dec!(100))
                    .build_import_row(),
                BillingRecordBuilder::new()
                    .with_codes("D001", "INVX1")
                    .with_invoice_date(may_2)
                    .build_import_row(),
                BillingRecordBuilder::new()
                    .with_codes("D002", "INV-3")
                    .with_invoice_date(may_1)
                    .with_vehicle("KA05MN4321", "VIN-3")
                    .with_labour(dec!(250), dec!(0))
                    .build_import_row(),
            ],
            "loader",
        )
        .await
        .unwrap();

    // underscore is literal, not a wildcard
    let found = queries
        .search(&RecordSearch::new(Some("inv_".to_string()), None, None))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key.gst_invoice_no.as_str(), "INV_1");

    let all = queries.search(&RecordSearch::default()).await.unwrap();
    assert_eq!(all[0].key.gst_invoice_no.as_str(), "INVX1");

    let outstanding = queries
        .outstanding(&OutstandingFilter::new(Some("d002".to_string()), None))
        .await
        .unwrap();
    assert_eq!(outstanding.len(), 1);

    let summary = queries.daily_summary(may_1.unwrap()).await.unwrap();
    assert_eq!(summary.vehicles_serviced, 2);
    assert_eq!(summary.labour_revenue, core_kernel::Money::new(dec!(750)));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_padded_stored_key_is_editable_and_blank_key_is_skipped() {
    let (db, store) = setup().await;
    db.insert_raw_row("D001 ", " INV-100", dec!(10000)).await.unwrap();
    db.insert_raw_row("  ", "INV-100-BLANK", dec!(500)).await.unwrap();
    let queries = BillingQueryService::new(store.clone());
    let editor = BillingRecordEditor::new(store.clone());

    let found = queries
        .search(&RecordSearch::new(Some("INV-100".to_string()), None, None))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let key = found[0].key.clone();
    assert_eq!(key, KeyFixtures::standard());

    let outstanding = queries.outstanding(&OutstandingFilter::default()).await.unwrap();
    assert_eq!(outstanding.len(), 1);

    assert!(editor.fetch(&key).await.is_ok());
    let fields = EditableFieldsBuilder::new().receipt_1(dec!(10000)).build();
    let outcome = editor.update(&key, fields, "cashier01").await.unwrap();
    assert!(!outcome.changes.is_empty());

    let stored = editor.fetch(&key).await.unwrap();
    assert!(stored.due_amount().is_zero());
    assert_eq!(editor.history(&key).await.unwrap().len(), outcome.changes.len());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_missing_record_is_not_found() {
    let (_db, store) = setup().await;
    let editor = BillingRecordEditor::new(store.clone());

    let result = editor
        .update(&KeyFixtures::missing(), Default::default(), "cashier01")
        .await;
    assert!(matches!(result, Err(EditorError::NotFound(_))));
    assert!(store.fetch(&KeyFixtures::missing()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_credentials_round_trip() {
    let db = create_isolated_test_database().await.unwrap();
    let users = UserRepository::new(db.pool().clone());
    users
        .insert(&UserRow {
            username: "cashier01".to_string(),
            password_hash: "old-hash".to_string(),
            roles: vec!["billing:write".to_string()],
            is_active: true,
        })
        .await
        .unwrap();

    let store = PostgresCredentialStore::new(db.pool().clone());
    store.set_password_hash("cashier01", "new-hash").await.unwrap();
    let user = store.find_user("cashier01").await.unwrap().unwrap();
    assert_eq!(user.password_hash, "new-hash");
    assert_eq!(user.roles, vec!["billing:write".to_string()]);

    let err = store.set_password_hash("nobody", "x").await.unwrap_err();
    assert!(matches!(err, PortError::NotFound { .. }));
}
