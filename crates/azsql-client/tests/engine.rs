//! Engine construction tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use azsql_auth::{AccessToken, AuthError, TokenRequest};
use azsql_client::{
    ConnectOptions, EngineFactory, EngineUrl, Error, PreConnectAttrs, SQL_COPT_SS_ACCESS_TOKEN,
    StaticDrivers, TokenSource, create_engine,
};
use azsql_testing::{TempIniFile, service_principal_section};
use pretty_assertions::assert_eq;

/// Hands out a fixed token without a network round trip.
struct FixedToken(&'static str);

#[async_trait]
impl TokenSource for FixedToken {
    async fn acquire_token(&self, _request: &TokenRequest) -> Result<AccessToken, AuthError> {
        Ok(AccessToken::new(self.0))
    }
}

#[derive(Debug)]
struct Engine {
    url: String,
    token: Vec<u8>,
}

struct Factory;

impl EngineFactory for Factory {
    type Engine = Engine;
    type Error = std::fmt::Error;

    fn create_engine(&self, url: &EngineUrl, attrs: &PreConnectAttrs) -> Result<Engine, Self::Error> {
        Ok(Engine {
            url: url.to_string(),
            token: attrs
                .get(SQL_COPT_SS_ACCESS_TOKEN)
                .map(|t| t.as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }
}

struct FailingFactory;

impl EngineFactory for FailingFactory {
    type Engine = ();
    type Error = std::fmt::Error;

    fn create_engine(&self, _url: &EngineUrl, _attrs: &PreConnectAttrs) -> Result<(), Self::Error> {
        Err(std::fmt::Error)
    }
}

fn options(creds: &TempIniFile) -> ConnectOptions {
    ConnectOptions::new("srv.database.windows.net", "sales", creds.path())
}

fn creds() -> TempIniFile {
    TempIniFile::credentials(&service_principal_section("app", "t", "c", "s")).unwrap()
}

#[tokio::test]
async fn test_engine_url_and_attrs() {
    let creds = creds();
    let engine = create_engine(
        &options(&creds),
        &StaticDrivers::new(["ODBC Driver 17 for SQL Server"]),
        &FixedToken("AB"),
        &Factory,
    )
    .await
    .unwrap();

    assert_eq!(
        engine.url,
        "mssql+pyodbc:///?odbc_connect=Driver%3D%7BODBC+Driver+17+for+SQL+Server%7D\
         %3BServer%3Dsrv.database.windows.net%3BDatabase%3Dsales"
    );
    assert_eq!(engine.token, [4, 0, 0, 0, 0x41, 0, 0x42, 0]);
}

#[tokio::test]
async fn test_engine_dialect_and_extras() {
    let creds = creds();
    let options = options(&creds)
        .dialect("aioodbc")
        .attribute("Encrypt", "yes");
    let engine = create_engine(
        &options,
        &StaticDrivers::new(["ODBC Driver 17 for SQL Server"]),
        &FixedToken(""),
        &Factory,
    )
    .await
    .unwrap();

    assert!(engine.url.starts_with("mssql+aioodbc:///?odbc_connect="));
    assert!(engine.url.ends_with("%3BEncrypt%3Dyes"));
    assert_eq!(engine.token, [0, 0, 0, 0]);
}

#[tokio::test]
async fn test_engine_driver_missing() {
    let creds = creds();
    let err = create_engine(&options(&creds), &StaticDrivers::default(), &FixedToken("x"), &Factory)
        .await
        .unwrap_err();
    assert!(err.is_driver_error());
}

#[tokio::test]
async fn test_factory_error_wrapped() {
    let creds = creds();
    let err = create_engine(
        &options(&creds),
        &StaticDrivers::new(["ODBC Driver 17 for SQL Server"]),
        &FixedToken("x"),
        &FailingFactory,
    )
    .await
    .unwrap_err();

    match err {
        Error::Engine(source) => assert!(source.downcast_ref::<std::fmt::Error>().is_some()),
        other => panic!("unexpected error: {other:?}"),
    }
}
