//! Helpers and utilities for using x11rb as a back end for tatami
//!
//! The only public item here is [RustConn]: an [XConn][crate::x::XConn]
//! implementation over the pure-Rust [x11rb][0] bindings, speaking Xinerama
//! for multi-monitor geometry and listening for RandR change notifications
//! to pick up hotplug.
//!
//! [0]: https://crates.io/crates/x11rb
mod event;
mod xconn;

pub use xconn::RustConn;
