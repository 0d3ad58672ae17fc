#![no_main]

use azsql_auth::CredentialStore;
use azsql_auth::ini::Ini;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Ini::parse_relaxed(s);
        if let Ok(store) = CredentialStore::from_ini(s) {
            let _ = store.resolve(None);
            if let Some(first) = store.section_names().next() {
                let _ = store.resolve(Some(first));
            }
        }
    }
});
