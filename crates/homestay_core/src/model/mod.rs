//! Domain model for persisted homestay records.
//!
//! # Responsibility
//! - Define the canonical attribute-bag record shared by every variant.
//! - Keep identity and timestamp rules in one place for all variants.
//!
//! # Invariants
//! - Every record is identified by a stable UUID string.
//! - The variant set is closed; unknown variant names never construct.

pub mod record;
