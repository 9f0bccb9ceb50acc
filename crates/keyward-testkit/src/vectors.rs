//! Known-answer vectors.
//!
//! Fixed inputs with outputs computed by independent implementations, so a
//! change in hashing or in the envelope format is caught even when
//! round trips still succeed.

use keyward_core::{EnvelopeCipher, StoredEnvelope, SymmetricContentKey};

/// A SHA-256 content hash vector.
#[derive(Debug, Clone)]
pub struct HashVector {
    pub name: &'static str,
    pub input: &'static [u8],
    /// Expected lowercase hex digest.
    pub sha256: &'static str,
}

/// A stored envelope that must open to a known plaintext.
#[derive(Debug, Clone)]
pub struct EnvelopeVector {
    pub name: &'static str,
    /// 32-byte content key, hex.
    pub key: &'static str,
    /// Envelope JSON exactly as written to storage.
    pub envelope_json: &'static str,
    pub plaintext: &'static [u8],
}

/// SHA-256 vectors (FIPS 180-2 examples plus the scenario file body).
pub fn hash_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "empty",
            input: b"",
            sha256: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        HashVector {
            name: "abc",
            input: b"abc",
            sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        HashVector {
            name: "two-block message",
            input: b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            sha256: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        },
        HashVector {
            name: "notes.txt",
            input: b"hello",
            sha256: "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        },
    ]
}

/// AES-256-GCM vectors (McGrew and Viega GCM test cases 13 and 14) in the
/// stored envelope format.
pub fn envelope_vectors() -> Vec<EnvelopeVector> {
    const ZERO_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";
    vec![
        EnvelopeVector {
            name: "empty plaintext, zero key and nonce",
            key: ZERO_KEY,
            envelope_json: r#"{"ciphertext":"Uw+K+8dFNrmpY7TxxMtziw==","nonce":"AAAAAAAAAAAAAAAA"}"#,
            plaintext: b"",
        },
        EnvelopeVector {
            name: "one zero block, zero key and nonce",
            key: ZERO_KEY,
            envelope_json: r#"{"ciphertext":"zqdAPU1ga24HTsXTuvOdGNDRyKeZmWvwJluYtdSKuRk=","nonce":"AAAAAAAAAAAAAAAA"}"#,
            plaintext: &[0u8; 16],
        },
    ]
}

/// Check one envelope vector, returning a description of any mismatch.
pub fn check_envelope_vector(vector: &EnvelopeVector) -> Result<(), String> {
    let raw = hex::decode(vector.key).map_err(|e| format!("bad key hex: {}", e))?;
    let key = SymmetricContentKey::from_slice(&raw).map_err(|e| e.to_string())?;
    let envelope =
        StoredEnvelope::from_json_bytes(vector.envelope_json.as_bytes()).map_err(|e| e.to_string())?;
    let plaintext = envelope.open(&key).map_err(|e| e.to_string())?;
    if plaintext != vector.plaintext {
        return Err("plaintext mismatch".into());
    }
    Ok(())
}

/// Check every vector. Returns `(name, passed, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let hashes = hash_vectors().into_iter().map(|v| {
        let actual = EnvelopeCipher::content_hash(v.input);
        let ok = actual.as_str() == v.sha256;
        (v.name.to_string(), ok, actual.as_str().to_string())
    });
    let envelopes = envelope_vectors().into_iter().map(|v| match check_envelope_vector(&v) {
        Ok(()) => (v.name.to_string(), true, String::new()),
        Err(detail) => (v.name.to_string(), false, detail),
    });
    hashes.chain(envelopes).collect()
}
