//! Input: keyboard and pointer events mapped to abstract movement actions.
//!
//! # Invariants
//! - The simulation reads actions and look deltas, never device events.
//! - Pointer movement only counts while the pointer is locked.

pub mod action;

pub use action::{Action, InputState};
