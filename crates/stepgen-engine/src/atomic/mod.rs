//! Atomic command creators.
//!
//! Each creator validates one prospective instruction against the
//! catalog and the current state, then either emits it or returns
//! every error its battery found. Creators never mutate state; the
//! pipeline applies transitions after a creator succeeds.

pub mod modules;
pub mod motion;
pub mod pipetting;
pub mod tips;
