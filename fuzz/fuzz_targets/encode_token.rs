#![no_main]

use azsql_auth::encode_token;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|token: String| {
    let encoded = encode_token(&token);
    assert_eq!(encoded.declared_len() as usize, encoded.payload().len());
    assert_eq!(encoded.payload().len(), token.encode_utf16().count() * 2);
});
