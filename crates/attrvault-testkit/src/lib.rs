//! # AttrVault Testkit
//!
//! Testing utilities for AttrVault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a provisioned in-memory vault with authority and content
//!   service, plus helpers for logging users in at a fixed time
//! - **Generators**: proptest strategies for raw attributes, role lists,
//!   record kinds and policy trees
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use attrvault::RecordKind;
//! use attrvault_testkit::fixtures::TestVault;
//!
//! async fn example() {
//!     let vault = TestVault::new().await;
//!     let doctor = vault.login("d1", &["doctor"]);
//!     let record = vault
//!         .content
//!         .seal_record(RecordKind::HealthRecord, "42", &doctor.attributes, b"notes")
//!         .unwrap();
//!     assert_eq!(vault.content.open_record(&record, &doctor.secret_key).unwrap(), b"notes");
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{attrs, TestVault, FIXTURE_NOW};
pub use generators::{attribute_subset, policy_tree, small_universe};
