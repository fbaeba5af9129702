//! Billing Domain Ports
//!
//! This module defines the port interfaces the billing domain needs from its
//! data store, so the editor and report services can run against PostgreSQL
//! (infra_db) or an in-memory store in tests.
//!
//! # Transactions
//!
//! Edits go through a [`BillingUnitOfWork`]: the row is read and locked,
//! written, and its audit entries appended inside one transaction. Dropping
//! a unit of work without calling `commit` discards everything it staged.
//!
//! ```rust,ignore
//! let mut uow = store.begin().await?;
//! let locked = uow.lock_for_update(&key).await?;
//! uow.write_fields(locked.row_id, &fields, Utc::now()).await?;
//! uow.append_audit(&entries).await?;
//! uow.commit().await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, PortError, RecordKey};

use crate::audit::{AuditLogEntry, NewAuditEntry};
use crate::import::NewBillingRow;
use crate::record::{BillingRecord, EditableFields};
use crate::reports::{DailySummary, OutstandingFilter, RecordSearch};

/// A billing row read and locked inside a unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedRecord {
    /// Surrogate row id; identifies the exact row when keys repeat
    pub row_id: i64,
    pub invoice_amount: Option<Decimal>,
    pub fields: EditableFields,
}

/// Data-store port for billing records
#[async_trait]
pub trait BillingStore: DomainPort + HealthCheckable {
    /// Reads a record by key; when the key repeats the earliest-loaded row wins
    async fn fetch(&self, key: &RecordKey) -> Result<Option<BillingRecord>, PortError>;

    /// Opens a transaction for an edit
    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, PortError>;

    /// Audit entries for a record, newest first
    async fn history(&self, key: &RecordKey) -> Result<Vec<AuditLogEntry>, PortError>;

    /// Records matching a search, newest invoice first
    async fn search(
        &self,
        search: &RecordSearch,
        limit: usize,
    ) -> Result<Vec<BillingRecord>, PortError>;

    /// Records with an amount still due, newest invoice first
    async fn outstanding(&self, filter: &OutstandingFilter) -> Result<Vec<BillingRecord>, PortError>;

    /// Visit and labour totals for an invoice date
    async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, PortError>;

    /// Inserts a batch of rows in one transaction; returns the row count
    async fn insert_rows(&self, rows: &[NewBillingRow], uploaded_by: &str) -> Result<u64, PortError>;
}

/// One open transaction against the billing store
#[async_trait]
pub trait BillingUnitOfWork: Send {
    /// Reads the editable fields of the row for `key` and locks it until the
    /// transaction ends. `None` when no row matches.
    async fn lock_for_update(&mut self, key: &RecordKey) -> Result<Option<LockedRecord>, PortError>;

    /// Overwrites every editable column of the row and stamps the collection time
    async fn write_fields(
        &mut self,
        row_id: i64,
        fields: &EditableFields,
        collected_at: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Appends audit rows; the store assigns their timestamps
    async fn append_audit(&mut self, entries: &[NewAuditEntry]) -> Result<Vec<AuditLogEntry>, PortError>;

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// Stored login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<String>,
    pub is_active: bool,
}

/// Port for the users table
#[async_trait]
pub trait CredentialStore: DomainPort {
    async fn find_user(&self, username: &str) -> Result<Option<UserCredentials>, PortError>;

    /// Replaces a user's password hash; `NotFound` when the user is unknown
    async fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<(), PortError>;
}

/// In-memory implementations of the billing ports for testing
///
/// The store keeps rows in load order, so repeated keys resolve to the
/// earliest row exactly as the PostgreSQL adapter does. A unit of work holds
/// the store lock from `begin` until it is committed or dropped, which
/// serializes edits.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::{Mutex, OwnedMutexGuard};

    use core_kernel::{AdapterHealth, HealthCheckResult};

    use crate::reports::sort_by_invoice_date_desc;

    /// Where an injected failure fires
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailurePoint {
        Begin,
        LockForUpdate,
        WriteFields,
        /// After the row write, before the audit insert
        AppendAudit,
        Commit,
    }

    #[derive(Debug, Clone)]
    struct StoredRow {
        row_id: i64,
        record: BillingRecord,
    }

    #[derive(Debug, Default)]
    struct State {
        rows: Vec<StoredRow>,
        audit: Vec<AuditLogEntry>,
        next_row_id: i64,
        failure: Option<FailurePoint>,
    }

    impl State {
        fn first_row(&self, key: &RecordKey) -> Option<&StoredRow> {
            self.rows.iter().find(|r| &r.record.key == key)
        }

        fn push(&mut self, record: BillingRecord) -> i64 {
            self.next_row_id += 1;
            self.rows.push(StoredRow {
                row_id: self.next_row_id,
                record,
            });
            self.next_row_id
        }

        fn check(&self, point: FailurePoint) -> Result<(), PortError> {
            if self.failure == Some(point) {
                return Err(PortError::internal(format!("injected failure at {point:?}")));
            }
            Ok(())
        }
    }

    /// In-memory billing store
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryBillingStore {
        state: Arc<Mutex<State>>,
    }

    impl InMemoryBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with records, in load order
        pub async fn with_records(records: Vec<BillingRecord>) -> Self {
            let store = Self::new();
            {
                let mut state = store.state.lock().await;
                for record in records {
                    state.push(record);
                }
            }
            store
        }

        /// Adds a record, returning its row id
        pub async fn insert(&self, record: BillingRecord) -> i64 {
            self.state.lock().await.push(record)
        }

        /// Makes every later operation at `point` fail until cleared
        pub async fn fail_at(&self, point: FailurePoint) {
            self.state.lock().await.failure = Some(point);
        }

        pub async fn clear_failure(&self) {
            self.state.lock().await.failure = None;
        }

        /// Every stored row for a key, in load order
        pub async fn rows_for(&self, key: &RecordKey) -> Vec<BillingRecord> {
            self.state
                .lock()
                .await
                .rows
                .iter()
                .filter(|r| &r.record.key == key)
                .map(|r| r.record.clone())
                .collect()
        }

        /// The full audit log, in write order
        pub async fn audit_log(&self) -> Vec<AuditLogEntry> {
            self.state.lock().await.audit.clone()
        }
    }

    impl DomainPort for InMemoryBillingStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryBillingStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-billing-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory store always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl BillingStore for InMemoryBillingStore {
        async fn fetch(&self, key: &RecordKey) -> Result<Option<BillingRecord>, PortError> {
            let state = self.state.lock().await;
            Ok(state.first_row(key).map(|r| r.record.clone()))
        }

        async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            guard.check(FailurePoint::Begin)?;
            let staged_rows = guard.rows.clone();
            Ok(Box::new(InMemoryUnitOfWork {
                guard,
                staged_rows,
                staged_audit: Vec::new(),
            }))
        }

        async fn history(&self, key: &RecordKey) -> Result<Vec<AuditLogEntry>, PortError> {
            let state = self.state.lock().await;
            Ok(state
                .audit
                .iter()
                .rev()
                .filter(|e| &e.key == key)
                .cloned()
                .collect())
        }

        async fn search(
            &self,
            search: &RecordSearch,
            limit: usize,
        ) -> Result<Vec<BillingRecord>, PortError> {
            let state = self.state.lock().await;
            let mut records: Vec<BillingRecord> = state
                .rows
                .iter()
                .map(|r| &r.record)
                .filter(|r| search.matches(r))
                .cloned()
                .collect();
            sort_by_invoice_date_desc(&mut records);
            records.truncate(limit);
            Ok(records)
        }

        async fn outstanding(&self, filter: &OutstandingFilter) -> Result<Vec<BillingRecord>, PortError> {
            let state = self.state.lock().await;
            let mut records: Vec<BillingRecord> = state
                .rows
                .iter()
                .map(|r| &r.record)
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            sort_by_invoice_date_desc(&mut records);
            Ok(records)
        }

        async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, PortError> {
            let state = self.state.lock().await;
            Ok(DailySummary::from_records(date, state.rows.iter().map(|r| &r.record)))
        }

        async fn insert_rows(&self, rows: &[NewBillingRow], uploaded_by: &str) -> Result<u64, PortError> {
            let mut state = self.state.lock().await;
            for row in rows {
                state.push(row.clone().into_record(uploaded_by));
            }
            Ok(rows.len() as u64)
        }
    }

    /// Unit of work over [`InMemoryBillingStore`]
    ///
    /// Changes are staged on copies and published on commit.
    pub struct InMemoryUnitOfWork {
        guard: OwnedMutexGuard<State>,
        staged_rows: Vec<StoredRow>,
        staged_audit: Vec<AuditLogEntry>,
    }

    #[async_trait]
    impl BillingUnitOfWork for InMemoryUnitOfWork {
        async fn lock_for_update(&mut self, key: &RecordKey) -> Result<Option<LockedRecord>, PortError> {
            self.guard.check(FailurePoint::LockForUpdate)?;
            Ok(self
                .staged_rows
                .iter()
                .find(|r| &r.record.key == key)
                .map(|r| LockedRecord {
                    row_id: r.row_id,
                    invoice_amount: r.record.invoice_amount,
                    fields: r.record.fields.clone(),
                }))
        }

        async fn write_fields(
            &mut self,
            row_id: i64,
            fields: &EditableFields,
            collected_at: DateTime<Utc>,
        ) -> Result<(), PortError> {
            self.guard.check(FailurePoint::WriteFields)?;
            let row = self
                .staged_rows
                .iter_mut()
                .find(|r| r.row_id == row_id)
                .ok_or_else(|| PortError::not_found("BillingRecord", row_id))?;
            row.record.fields = fields.clone();
            row.record.collection_timestamp = Some(collected_at);
            Ok(())
        }

        async fn append_audit(&mut self, entries: &[NewAuditEntry]) -> Result<Vec<AuditLogEntry>, PortError> {
            self.guard.check(FailurePoint::AppendAudit)?;
            let now = Utc::now();
            let recorded: Vec<AuditLogEntry> = entries
                .iter()
                .cloned()
                .map(|e| AuditLogEntry::recorded(e, now))
                .collect();
            self.staged_audit.extend(recorded.iter().cloned());
            Ok(recorded)
        }

        async fn commit(mut self: Box<Self>) -> Result<(), PortError> {
            self.guard.check(FailurePoint::Commit)?;
            let staged_rows = std::mem::take(&mut self.staged_rows);
            let staged_audit = std::mem::take(&mut self.staged_audit);
            self.guard.rows = staged_rows;
            self.guard.audit.extend(staged_audit);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), PortError> {
            Ok(())
        }
    }

    /// In-memory credential store
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryCredentialStore {
        users: Arc<Mutex<HashMap<String, UserCredentials>>>,
    }

    impl InMemoryCredentialStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_users(users: Vec<UserCredentials>) -> Self {
            let store = Self::new();
            {
                let mut map = store.users.lock().await;
                for user in users {
                    map.insert(user.username.clone(), user);
                }
            }
            store
        }
    }

    impl DomainPort for InMemoryCredentialStore {}

    #[async_trait]
    impl CredentialStore for InMemoryCredentialStore {
        async fn find_user(&self, username: &str) -> Result<Option<UserCredentials>, PortError> {
            Ok(self.users.lock().await.get(username).cloned())
        }

        async fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<(), PortError> {
            let mut users = self.users.lock().await;
            let user = users
                .get_mut(username)
                .ok_or_else(|| PortError::not_found("User", username))?;
            user.password_hash = password_hash.to_string();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{FailurePoint, InMemoryBillingStore, InMemoryCredentialStore};
    use super::*;
    use crate::record::EditableField;
    use rust_decimal_macros::dec;

    fn record(invoice_amount: Decimal, customer: &str) -> BillingRecord {
        BillingRecord {
            key: RecordKey::parse("D001", "INV-100").unwrap(),
            gst_invoice_date: None,
            ro_date: None,
            customer_name: Some(customer.to_string()),
            vehicle_reg_no: None,
            vin: None,
            invoice_amount: Some(invoice_amount),
            cust_labor: None,
            ins_labor: None,
            fields: EditableFields::default(),
            collection_timestamp: None,
            uploaded_by: None,
        }
    }

    fn entry(key: &RecordKey) -> NewAuditEntry {
        NewAuditEntry {
            id: core_kernel::AuditEntryId::new(),
            actor: "clerk".to_string(),
            key: key.clone(),
            field: EditableField::ClaimRemarks,
            old_value: String::new(),
            new_value: "noted".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_first_loaded_row() {
        let store = InMemoryBillingStore::with_records(vec![
            record(dec!(100), "first"),
            record(dec!(200), "second"),
        ])
        .await;
        let key = RecordKey::parse("D001", "INV-100").unwrap();

        let fetched = store.fetch(&key).await.unwrap().unwrap();
        assert_eq!(fetched.customer_name.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_uncommitted_unit_of_work_is_discarded() {
        let store = InMemoryBillingStore::with_records(vec![record(dec!(100), "a")]).await;
        let key = RecordKey::parse("D001", "INV-100").unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            let locked = uow.lock_for_update(&key).await.unwrap().unwrap();
            let fields = EditableFields {
                claim_remarks: Some("noted".to_string()),
                ..Default::default()
            };
            uow.write_fields(locked.row_id, &fields, Utc::now()).await.unwrap();
            uow.append_audit(&[entry(&key)]).await.unwrap();
        }

        let fetched = store.fetch(&key).await.unwrap().unwrap();
        assert_eq!(fetched.fields, EditableFields::default());
        assert!(store.audit_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_rows_and_audit() {
        let store = InMemoryBillingStore::with_records(vec![record(dec!(100), "a")]).await;
        let key = RecordKey::parse("D001", "INV-100").unwrap();

        let mut uow = store.begin().await.unwrap();
        let locked = uow.lock_for_update(&key).await.unwrap().unwrap();
        let fields = EditableFields {
            claim_remarks: Some("noted".to_string()),
            ..Default::default()
        };
        uow.write_fields(locked.row_id, &fields, Utc::now()).await.unwrap();
        uow.append_audit(&[entry(&key)]).await.unwrap();
        uow.commit().await.unwrap();

        let fetched = store.fetch(&key).await.unwrap().unwrap();
        assert_eq!(fetched.fields.claim_remarks.as_deref(), Some("noted"));
        assert!(fetched.collection_timestamp.is_some());
        assert_eq!(store.history(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_fires() {
        let store = InMemoryBillingStore::with_records(vec![record(dec!(100), "a")]).await;
        let key = RecordKey::parse("D001", "INV-100").unwrap();
        store.fail_at(FailurePoint::AppendAudit).await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow.append_audit(&[entry(&key)]).await.is_err());
        drop(uow);

        store.clear_failure().await;
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_credential_store_unknown_user() {
        let store = InMemoryCredentialStore::new();
        assert!(store.find_user("nobody").await.unwrap().is_none());
        let err = store.set_password_hash("nobody", "hash").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
