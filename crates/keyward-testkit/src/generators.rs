//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keyward::UploadRequest;
use keyward_core::{Address, Role, SymmetricContentKey, KEY_SIZE};

/// Plaintext bytes of at most `max_len`.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A random content key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricContentKey> {
    any::<[u8; KEY_SIZE]>().prop_map(SymmetricContentKey::from_bytes)
}

/// A hex address in the usual 20-byte account form.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(|bytes| Address::new(format!("0x{}", hex::encode(bytes))))
}

pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::CareProvider),
        Just(Role::Miner),
        Just(Role::Researcher),
    ]
}

/// A file name with a common extension.
pub fn file_name() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9_-]{0,15}", prop_oneof![Just("txt"), Just("pdf"), Just("png"), Just("json")])
        .prop_map(|(stem, ext)| format!("{}.{}", stem, ext))
}

pub fn mime_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("text/plain".to_string()),
        Just("application/pdf".to_string()),
        Just("image/png".to_string()),
        Just("application/json".to_string()),
        Just("application/octet-stream".to_string()),
    ]
}

/// An upload with a body of at most `max_len` bytes.
pub fn upload_request(max_len: usize) -> impl Strategy<Value = UploadRequest> {
    (file_name(), mime_type(), plaintext(max_len))
        .prop_map(|(file_name, mime_type, bytes)| UploadRequest::new(file_name, mime_type, bytes))
}
