//! Fuzz harnesses.
//!
//! These targets can be driven by cargo-fuzz or by proptest byte vectors.
//! Each one must return normally for every input; a panic is a finding.

use crate::fixtures::{runtime, TestPage, TEXT_FIELDS};
use crate::invariants::check_page;
use settings_sync_engine::fields::ENABLE_SSL;
use settings_sync_protocol::{CommitRequest, CommitResponse, FieldMap};
use settings_sync_server::{ServerConfig, SettingsServer, SECTIONS};

/// Fuzz target for field map decoding.
pub fn fuzz_field_map_decode(data: &[u8]) {
    let _ = FieldMap::decode(data);
}

/// Fuzz target for commit request decoding.
///
/// Anything that decodes must survive an encode/decode roundtrip unchanged.
pub fn fuzz_commit_request(data: &[u8]) {
    if let Ok(request) = CommitRequest::decode(data) {
        if let Ok(encoded) = request.encode() {
            let decoded = CommitRequest::decode(&encoded);
            assert_eq!(decoded.ok(), Some(request), "Roundtrip mismatch");
        }
    }
}

/// Fuzz target for the reference server.
///
/// Posts the input to every section endpoint. A successful reply must be a
/// well-formed commit response; failures must map to an HTTP status.
pub fn fuzz_server_post(data: &[u8]) {
    let server = SettingsServer::new(ServerConfig::default());
    for (section, _) in SECTIONS {
        let path = format!("/rest/setup/{section}");
        match server.handle_post(&path, data) {
            Ok(body) => {
                assert!(
                    CommitResponse::decode(&body).is_ok(),
                    "{path}: malformed response"
                );
            }
            Err(err) => {
                assert!((400..600).contains(&err.status_code()), "{path}: {err}");
            }
        }
    }
}

/// Fuzz target for user edits on a loaded page.
///
/// Every pair of bytes selects a field and a value; page invariants are
/// checked after each edit.
pub fn fuzz_page_edits(data: &[u8]) {
    let page = runtime().block_on(TestPage::mock());

    for pair in data.chunks_exact(2) {
        let (selector, value) = (pair[0] as usize, pair[1]);
        match TEXT_FIELDS.get(selector % (TEXT_FIELDS.len() + 1)) {
            Some(field) => page.widgets.edit(field, fuzz_text(value)),
            None => page.widgets.edit(ENABLE_SSL, value % 2 == 1),
        }
        if let Err(violation) = check_page(&page) {
            panic!("invariant violated: {violation}");
        }
    }
}

fn fuzz_text(byte: u8) -> String {
    const SAMPLES: [&str; 8] = [
        "",
        "https://palette.example.com",
        "not a url",
        "ops@example.com",
        "ops@",
        "25",
        "70000",
        "smtp",
    ];
    SAMPLES[byte as usize % SAMPLES.len()].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_targets_accept_garbage() {
        for data in [&b""[..], b"{", b"[]", b"{\"action\":true}", b"\xff\xfe"] {
            fuzz_field_map_decode(data);
            fuzz_commit_request(data);
            fuzz_server_post(data);
        }
    }

    #[test]
    fn commit_request_roundtrips() {
        fuzz_commit_request(br#"{"timezone":"UTC","action":"save"}"#);
        fuzz_commit_request(br#"{"enable-ssl":true,"action":"test"}"#);
    }

    #[test]
    fn page_edits_hold_invariants() {
        fuzz_page_edits(&[0, 2, 0, 1, 17, 1, 4, 7, 9, 5, 8, 0, 10, 3]);
    }
}
