//! Persistence: saved level records and periodic autosave.
//!
//! # Invariants
//! - A level record holds only its name, seed, and save time. Reloading re-seeds.
//! - Records are addressed by a namespaced key; file names are derived from its hash.
//! - A failed autosave never interrupts the simulation.

pub mod autosave;
pub mod store;

pub use autosave::{AUTOSAVE_INTERVAL, Autosave, AutosaveOutcome};
pub use store::{LevelRecord, LevelStore, SAVE_PREFIX, StoreError};
