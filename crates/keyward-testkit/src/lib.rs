//! # Keyward Testkit
//!
//! Testing utilities for Keyward.
//!
//! This crate provides:
//!
//! - **Known-answer vectors**: SHA-256 digests and AES-256-GCM envelopes
//!   with independently computed outputs
//! - **Generators**: Proptest strategies for plaintexts, keys, addresses
//!   and uploads
//! - **Fixtures**: a [`TestNetwork`] of parties sharing one ledger and one
//!   blob store
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use keyward_testkit::{text_upload, TestNetwork};
//!
//! async fn example() -> keyward::Result<()> {
//!     let network = TestNetwork::new();
//!     let alice = network.registered("alice").await?;
//!     let receipt = alice.upload(text_upload("notes.txt", "hello")).await?;
//!     assert_eq!(alice.retrieve(&receipt.file_id).await?.bytes, b"hello");
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{text_upload, TestNetwork};
pub use vectors::{envelope_vectors, hash_vectors, verify_all_vectors, EnvelopeVector, HashVector};
