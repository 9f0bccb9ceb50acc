//! RSA identity key pairs and their JWK interchange form.
//!
//! Key pairs are RSA with public exponent 65537, used with OAEP/SHA-256.
//! Persisted material is JSON holding a public and a private JWK, the same
//! shape WebCrypto's `exportKey("jwk")` produces, so keys round-trip with
//! browser clients.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default modulus size in bits.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Smallest modulus accepted for identity keys.
pub const MIN_RSA_BITS: usize = 2048;

/// JWK algorithm name for RSA-OAEP with SHA-256.
pub const JWK_ALG: &str = "RSA-OAEP-256";

/// A recipient's public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub(crate) fn inner(&self) -> &RsaPublicKey {
        &self.0
    }

    /// Export as a public JWK.
    pub fn to_jwk(&self) -> Jwk {
        Jwk {
            kty: "RSA".into(),
            n: b64u(self.0.n()),
            e: b64u(self.0.e()),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            alg: Some(JWK_ALG.into()),
            ext: Some(true),
            key_ops: Some(vec!["encrypt".into()]),
        }
    }

    /// Import from a JWK; private members, if present, are ignored.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        jwk.check_kty()?;
        let n = from_b64u("n", &jwk.n)?;
        let e = from_b64u("e", &jwk.e)?;
        let key = RsaPublicKey::new(n, e).map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        Ok(Self(key))
    }

    /// Serialize as JWK text, the form published on the ledger.
    pub fn to_jwk_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_jwk()).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Parse JWK text as published on the ledger.
    pub fn from_jwk_str(s: &str) -> Result<Self> {
        let jwk: Jwk =
            serde_json::from_str(s).map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        Self::from_jwk(&jwk)
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0.n().to_bytes_be();
        write!(f, "PublicKey(rsa-{}, {})", n.len() * 8, hex_prefix(&n))
    }
}

/// An identity's private key. Only ever held in the local key store.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    pub(crate) fn inner(&self) -> &RsaPrivateKey {
        &self.0
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Export as a private JWK including the CRT parameters.
    pub fn to_jwk(&self) -> Result<Jwk> {
        let primes = self.0.primes();
        if primes.len() != 2 {
            return Err(CoreError::InvalidKey(format!(
                "expected two primes, found {}",
                primes.len()
            )));
        }
        let (p, q) = (&primes[0], &primes[1]);
        let one = BigUint::from(1u8);
        let two = BigUint::from(2u8);
        let d = self.0.d();

        let dp = d % &(p - &one);
        let dq = d % &(q - &one);
        // p is prime, so q^(p-2) mod p is the inverse of q.
        let qi = q.modpow(&(p - &two), p);

        Ok(Jwk {
            kty: "RSA".into(),
            n: b64u(self.0.n()),
            e: b64u(self.0.e()),
            d: Some(b64u(d)),
            p: Some(b64u(p)),
            q: Some(b64u(q)),
            dp: Some(b64u(&dp)),
            dq: Some(b64u(&dq)),
            qi: Some(b64u(&qi)),
            alg: Some(JWK_ALG.into()),
            ext: Some(true),
            key_ops: Some(vec!["decrypt".into()]),
        })
    }

    /// Import from a private JWK and validate the key's consistency.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        jwk.check_kty()?;
        let n = from_b64u("n", &jwk.n)?;
        let e = from_b64u("e", &jwk.e)?;
        let d = from_b64u("d", required("d", &jwk.d)?)?;
        let p = from_b64u("p", required("p", &jwk.p)?)?;
        let q = from_b64u("q", required("q", &jwk.q)?)?;

        let mut key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        key.validate()
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        key.precompute()
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        Ok(Self(key))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// An identity's asymmetric key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh RSA key pair from the OS entropy source.
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    pub fn generate(bits: usize) -> Result<Self> {
        if bits < MIN_RSA_BITS {
            return Err(CoreError::KeyGeneration(format!(
                "modulus of {} bits is below the {} bit minimum",
                bits, MIN_RSA_BITS
            )));
        }
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CoreError::KeyGeneration(e.to_string()))?;
        let public = private.to_public_key();
        Ok(Self {
            public: PublicKey(public),
            private: PrivateKey(private),
        })
    }

    /// Export to the persisted material form.
    pub fn to_material(&self) -> Result<KeyPairMaterial> {
        Ok(KeyPairMaterial {
            public_key: self.public.to_jwk(),
            private_key: self.private.to_jwk()?,
        })
    }

    /// Import from persisted material, checking both halves belong together.
    pub fn from_material(material: &KeyPairMaterial) -> Result<Self> {
        let public = PublicKey::from_jwk(&material.public_key)?;
        let private = PrivateKey::from_jwk(&material.private_key)?;
        if private.public_key() != public {
            return Err(CoreError::InvalidKey(
                "public key does not match private key".into(),
            ));
        }
        Ok(Self { public, private })
    }
}

/// JSON Web Key for an RSA key, as produced by WebCrypto.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub n: String,
    pub e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
}

impl Jwk {
    /// Whether this JWK carries private members.
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    fn check_kty(&self) -> Result<()> {
        if self.kty != "RSA" {
            return Err(CoreError::InvalidKey(format!(
                "unsupported key type {:?}",
                self.kty
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("alg", &self.alg)
            .field("private", &self.is_private())
            .finish_non_exhaustive()
    }
}

/// Persisted key-pair material: `{"publicKey": <JWK>, "privateKey": <JWK>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairMaterial {
    pub public_key: Jwk,
    pub private_key: Jwk,
}

impl KeyPairMaterial {
    /// Serialize as JSON text for the local key store.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Parse JSON text read from the local key store.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CoreError::InvalidKey(e.to_string()))
    }
}

fn b64u(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

fn from_b64u(member: &str, value: &str) -> Result<BigUint> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| CoreError::InvalidKey(format!("JWK member {} is not base64url", member)))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

fn required<'a>(member: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| CoreError::InvalidKey(format!("JWK member {} is missing", member)))
}

fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(8)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn shared_pair() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| KeyPair::generate(DEFAULT_RSA_BITS).unwrap())
    }

    #[test]
    fn test_generate_2048() {
        let pair = shared_pair();
        assert_eq!(pair.public.bits(), 2048);
        assert_eq!(pair.private.public_key(), pair.public);
    }

    #[test]
    fn test_small_modulus_rejected() {
        assert!(matches!(
            KeyPair::generate(1024),
            Err(CoreError::KeyGeneration(_))
        ));
    }

    #[test]
    fn test_material_roundtrip() {
        let pair = shared_pair();
        let json = pair.to_material().unwrap().to_json().unwrap();
        let material = KeyPairMaterial::from_json(&json).unwrap();
        let restored = KeyPair::from_material(&material).unwrap();
        assert_eq!(restored.public, pair.public);
    }

    #[test]
    fn test_material_json_shape() {
        let material = shared_pair().to_material().unwrap();
        let value = serde_json::to_value(&material).unwrap();

        assert_eq!(value["publicKey"]["kty"], "RSA");
        assert_eq!(value["publicKey"]["e"], "AQAB");
        assert_eq!(value["publicKey"]["alg"], JWK_ALG);
        assert!(value["publicKey"].get("d").is_none());
        for member in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(value["privateKey"][member].is_string(), "missing {}", member);
        }
    }

    #[test]
    fn test_public_jwk_string_roundtrip() {
        let public = &shared_pair().public;
        let text = public.to_jwk_string().unwrap();
        assert!(text.starts_with("{\"kty\":\"RSA\""));
        assert_eq!(&PublicKey::from_jwk_str(&text).unwrap(), public);
    }

    #[test]
    fn test_mismatched_halves_rejected() {
        let a = shared_pair();
        let b = KeyPair::generate(DEFAULT_RSA_BITS).unwrap();
        let material = KeyPairMaterial {
            public_key: a.public.to_jwk(),
            private_key: b.private.to_jwk().unwrap(),
        };
        assert!(matches!(
            KeyPair::from_material(&material),
            Err(CoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_private_import_requires_members() {
        let jwk = shared_pair().public.to_jwk();
        assert!(matches!(
            PrivateKey::from_jwk(&jwk),
            Err(CoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_wrong_kty_rejected() {
        let mut jwk = shared_pair().public.to_jwk();
        jwk.kty = "EC".into();
        assert!(PublicKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_debug_does_not_leak() {
        let pair = shared_pair();
        let jwk = pair.private.to_jwk().unwrap();
        let d = jwk.d.clone().unwrap();
        assert!(!format!("{:?}", pair).contains(&d));
        assert!(!format!("{:?}", jwk).contains(&d));
    }
}
