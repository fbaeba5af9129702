//! Service Billing - password reset
//!
//! Sets a user's password from the command line.
//!
//! # Usage
//!
//! ```bash
//! echo 'new-password' | cargo run --bin reset-password -- cashier01
//! ```
//!
//! The new password is read from the first line of standard input. Uses the
//! same `API_DATABASE_URL` as the server.

use std::io::BufRead;

use domain_billing::CredentialStore;
use interface_api::auth::hash_password;
use interface_api::config::ApiConfig;
use infra_db::PostgresCredentialStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let username = match std::env::args().nth(1) {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err("usage: reset-password <username>".into()),
    };

    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("password must not be empty".into());
    }

    let config = ApiConfig::from_env()?;
    let pool = infra_db::create_pool(config.database_config()).await?;
    let store = PostgresCredentialStore::new(pool);

    let password_hash = hash_password(password)?;
    store.set_password_hash(&username, &password_hash).await?;

    tracing::info!(user = %username, "Password updated");
    Ok(())
}
