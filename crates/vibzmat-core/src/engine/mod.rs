//! # Engine Module
//!
//! The vibrational-mode pipeline: Molden vibration sections become Cartesian mode sets
//! ([`cartesian`]), which are then projected into internal coordinates ([`internal`]).
//!
//! - **Configuration** ([`config`]) - Builders for mode parsing and animation options
//! - **Amplitudes** ([`symbols`], [`displacement`]) - Per-mode amplitude symbols and the
//!   displacement fields linear in them
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Per-mode projection runs in parallel when the `parallel` feature is enabled.

pub mod cartesian;
pub mod config;
pub mod displacement;
pub mod error;
pub mod internal;
pub mod progress;
pub mod symbols;
