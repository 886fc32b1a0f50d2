//! tatami: a tag-based tiling window manager for X11.
//!
//! Clients are labelled with tag bitmasks rather than being pinned to
//! workspaces: each monitor views a tag-set and shows every client whose tags
//! intersect it. Window placement is driven by per-monitor layouts (tiled
//! master/stack, monocle or floating) and all window management state lives
//! in a pure, side-effect free model ([pure::MonitorSet]) that the X engine
//! ([x::XConnExt]) reflects onto the server.
//!
//! The crate ships a production X backend built on [x11rb][0] along with a
//! binary (`tatami`) wiring up a default configuration. Everything speaking
//! to the server goes through the [x::XConn] trait so the window management
//! logic itself can be driven (and tested) against a mock.
//!
//! [0]: https://crates.io/crates/x11rb
#![warn(
    clippy::complexity,
    clippy::correctness,
    clippy::style,
    future_incompatible,
    missing_debug_implementations,
    rust_2018_idioms,
    rustdoc::all
)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[macro_use]
pub mod macros;

pub mod builtin;
pub mod core;
pub mod pure;
pub mod util;
pub mod x;
pub mod x11rb;

#[doc(inline)]
pub use crate::core::Xid;

/// Error variants from the core window manager and the X backends.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Unable to establish a connection to the X server
    #[error(transparent)]
    Connect(#[from] ::x11rb::errors::ConnectError),

    /// The underlying connection to the X server failed
    #[error(transparent)]
    Connection(#[from] ::x11rb::errors::ConnectionError),

    /// A generic error message for one-off failure cases
    #[error("{0}")]
    Custom(String),

    /// A string that failed to parse as a hex color
    #[error("'{hex}' is not a valid hex color (expected '#RRGGBB' or '#RRGGBBAA')")]
    InvalidHexColor {
        /// The string that was used
        hex: String,
    },

    /// Data received in a client message had an unknown format
    #[error("invalid client message format: {0} (expected 8, 16 or 32)")]
    InvalidClientMessage(u8),

    /// A window hint property was malformed
    #[error("invalid window hints property: {0}")]
    InvalidHints(String),

    /// An IO error was encountered
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A key or mouse binding spec was malformed
    #[error("unable to parse '{0}' as a binding")]
    InvalidBinding(String),

    /// There were no monitors available to hold clients
    #[error("there are no monitors available")]
    NoMonitors,

    /// The configured tag list was empty or too long
    #[error("config must provide between 1 and 31 tags: got {0}")]
    InvalidTagCount(usize),

    /// An X reply contained less data than expected
    #[error("the {ty} property is not set for client {id}")]
    MissingProperty {
        /// The property that was requested
        ty: String,
        /// The client being queried
        id: Xid,
    },

    /// An X request returned an error
    #[error(transparent)]
    ReplyError(#[from] ::x11rb::errors::ReplyError),

    /// An X request failed to allocate a resource id
    #[error(transparent)]
    ReplyOrIdError(#[from] ::x11rb::errors::ReplyOrIdError),

    /// Parsing an [Atom][crate::x::Atom] from a str failed
    #[error(transparent)]
    Strum(#[from] strum::ParseError),

    /// A fatal error was received from the X server
    #[error("fatal X11 error: {0}")]
    X11(String),

    /// An attempt was made to reference a client that is not in state
    #[error("{0} is not a known client")]
    UnknownClient(Xid),

    /// A mock method was called that has no implementation provided
    #[error("mock method not implemented")]
    UnimplementedMock,

    /// Another window manager already owns the substructure redirect selection
    #[error("another window manager is already running")]
    WmAlreadyRunning,
}

/// A Result where the error type is a window manager [Error]
pub type Result<T> = std::result::Result<T, Error>;

// helper for methods in Color
macro_rules! _f2u { { $f:expr, $s:expr } => { (($f * 255.0) as u32) << $s } }

/// A simple RGBA based color
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Color {
    /// Create a new Color from a hex encoded u32: 0xRRGGBBAA
    pub fn new_from_hex(hex: u32) -> Self {
        let floats: Vec<f64> = hex
            .to_be_bytes()
            .iter()
            .map(|n| *n as f64 / 255.0)
            .collect();

        let (r, g, b, a) = (floats[0], floats[1], floats[2], floats[3]);

        Self { r, g, b, a }
    }

    /// The RGB information of this color as 0.0-1.0 range floats representing
    /// proportions of 255 for each of R, G, B
    pub fn rgb(&self) -> (f64, f64, f64) {
        (self.r, self.g, self.b)
    }

    /// 0xRRGGBB representation of this Color (no alpha information)
    pub fn rgb_u32(&self) -> u32 {
        _f2u!(self.r, 16) + _f2u!(self.g, 8) + _f2u!(self.b, 0)
    }

    /// 0xAARRGGBB representation of this Color, as expected for X border and
    /// pixel values
    pub fn argb_u32(&self) -> u32 {
        _f2u!(self.a, 24) + self.rgb_u32()
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::new_from_hex(hex)
    }
}

impl TryFrom<&str> for Color {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let invalid = || Error::InvalidHexColor { hex: s.to_string() };

        match hex.len() {
            6 => {
                let rgb = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
                Ok(Self::new_from_hex((rgb << 8) | 0xFF))
            }
            8 => u32::from_str_radix(hex, 16)
                .map(Self::new_from_hex)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::try_from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("#ff0000", 0xFFFF0000; "opaque red")]
    #[test_case("00ff00", 0xFF00FF00; "green without hash")]
    #[test_case("#0000ff80", 0x800000FF; "translucent blue")]
    #[test]
    fn color_from_str(s: &str, expected: u32) {
        let c = Color::try_from(s).expect("valid hex color");

        assert_eq!(c.argb_u32(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("#12345"; "wrong length")]
    #[test_case("#zzzzzz"; "invalid digits")]
    #[test]
    fn invalid_colors_error(s: &str) {
        assert!(Color::try_from(s).is_err());
    }
}
