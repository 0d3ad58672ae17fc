#![no_main]

use azsql_client::{ConnectOptions, ConnectionString, EngineUrl, build_connection_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(parsed) = ConnectionString::parse(s) {
            let _ = EngineUrl::new("pyodbc", parsed.to_string()).to_string();
        }

        if let Ok(options) = ConnectOptions::new("srv", "db", "creds.ini").attributes_from_str(s) {
            let conn = build_connection_string(&options);
            assert!(conn.to_string().starts_with("Driver={"));
        }
    }
});
