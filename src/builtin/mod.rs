//! Built-in functionality: layouts and binding actions.
//!
//! Everything in this module is written against the public APIs of the crate
//! and serves as the out of the box experience wired up by the `tatami`
//! binary.
pub mod actions;
pub mod layout;
