//! Database Test Utilities
//!
//! Starts a throwaway PostgreSQL container with the service billing schema
//! applied, plus a few direct-SQL probes for checking what the adapters
//! actually wrote.

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "billing_test";
const POSTGRES_PASSWORD: &str = "billing_test";
const POSTGRES_DB: &str = "service_billing_test";

const SCHEMA: &str = include_str!("../../../migrations/20240601_000001_service_billing.sql");

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Connection settings of a running test container
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub host: String,
    pub port: u16,
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{POSTGRES_USER}:{POSTGRES_PASSWORD}@{}:{}/{POSTGRES_DB}",
            self.host, self.port
        )
    }
}

/// A PostgreSQL container holding one test's data
///
/// The container stops when this value is dropped.
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the schema
    pub async fn start() -> TestResult<Self> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_exposed_port(5432.tcp())
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
        };

        // concurrent-update tests need more than one connection
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Number of rows in the audit log
    pub async fn audit_row_count(&self) -> TestResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM service_billing_audit_log")
            .fetch_one(&self.pool)
            .await?)
    }

    /// `claim_remarks` of every billing row in load order
    pub async fn claim_remarks_by_load_order(&self) -> TestResult<Vec<Option<String>>> {
        Ok(sqlx::query_scalar(
            "SELECT claim_remarks FROM fact_service_billing ORDER BY billing_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Inserts a bare billing row with the key exactly as given, untrimmed
    pub async fn insert_raw_row(
        &self,
        dealer_code: &str,
        gst_invoice_no: &str,
        invoice_amt: Decimal,
    ) -> TestResult<i64> {
        Ok(sqlx::query_scalar(
            "INSERT INTO fact_service_billing (dealer_code, gst_invoice_no, invoice_amt) \
             VALUES ($1, $2, $3) RETURNING billing_id",
        )
        .bind(dealer_code)
        .bind(gst_invoice_no)
        .bind(invoice_amt)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Overwrites `type_of_due` on every row, bypassing the editor
    pub async fn force_type_of_due(&self, raw: &str) -> TestResult<u64> {
        let result = sqlx::query("UPDATE fact_service_billing SET type_of_due = $1")
            .bind(raw)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Starts a fresh database for a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::start().await
}
