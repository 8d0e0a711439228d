//! Vault lifecycle types.
//!
//! The lifecycle state machine is owned by the external backend; this
//! crate only records and displays transitions, so nothing here enforces
//! which stage may follow which.

pub mod stage;

pub use stage::{UnknownStage, VaultStage};
