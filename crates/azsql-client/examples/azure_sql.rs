//! Azure SQL Database token authentication example.
//!
//! Reads a service principal from an INI credentials file, exchanges it for
//! an access token and prints the connection string, the encoded token size
//! and the engine URL an ODBC-backed engine would be created from.
//!
//! # Running
//!
//! ```bash
//! export AZURE_SQL_SERVER=yourserver.database.windows.net
//! export AZURE_SQL_DATABASE=yourdb
//! export AZURE_SQL_CREDENTIALS=~/.config/azsql/credentials.ini
//! export AZURE_SQL_APP=reporting          # optional
//! export RUST_LOG=azsql_client=debug       # optional
//!
//! cargo run --example azure_sql
//! ```
//!
//! # Credentials File Format
//!
//! ```ini
//! [reporting]
//! tenant_id = 00000000-0000-0000-0000-000000000000
//! client_id = 11111111-1111-1111-1111-111111111111
//! client_secret = ...
//! ```

use azsql_client::{
    ClientCredentialsFlow, ConnectOptions, EngineUrl, OdbcInstRegistry, make_conn_params,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let server = std::env::var("AZURE_SQL_SERVER")?;
    let database = std::env::var("AZURE_SQL_DATABASE")?;
    let credentials = std::env::var("AZURE_SQL_CREDENTIALS")?;

    let mut options = ConnectOptions::new(server, database, credentials)
        .attribute("Encrypt", "yes")
        .attribute("TrustServerCertificate", "no");
    if let Ok(app) = std::env::var("AZURE_SQL_APP") {
        options = options.app(app);
    }

    let registry = OdbcInstRegistry::system();
    println!("Reading drivers from {}", registry.path().display());

    let params = match make_conn_params(&options, &registry, &ClientCredentialsFlow::new()).await {
        Ok(params) => params,
        Err(e) if e.is_driver_error() => {
            eprintln!("Driver not installed: {e}");
            eprintln!("Install the Microsoft ODBC driver or set .driver(...) to one that is.");
            return Err(e.into());
        }
        Err(e) if e.is_auth_error() => {
            eprintln!("Token request rejected: {e}");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Connection string: {}", params.connection_string());
    println!("Encoded token: {} bytes", params.token().len());

    let url = EngineUrl::new(&options.dialect, params.connection_string());
    println!("Engine URL: {url}");

    Ok(())
}
