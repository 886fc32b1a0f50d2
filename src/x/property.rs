//! Data types for working with X window properties
use crate::{Error, Result, Xid};
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Known property types that should be returnable by XConn impls when they
/// check window properties.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub enum Prop {
    /// One or more X Atoms
    Atom(Vec<String>),
    /// Raw bytes for when the prop type is non-standard
    Bytes(Vec<u32>),
    /// One or more cardinal numbers
    Cardinal(Vec<u32>),
    /// UTF-8 encoded string data
    UTF8String(Vec<String>),
    /// One or more X window IDs
    Window(Vec<Xid>),
    /// The WM_HINTS properties for this window
    WmHints(WmHints),
    /// The WM_NORMAL_HINTS size hints for this window
    SizeHints(SizeHints),
}

bitflags! {
    /// Possible flags that can be set in a WmHints client property
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WmHintsFlags: u32 {
        /// Input hint is set
        const INPUT_HINT         = 0b0000000001;
        /// State hint is set
        const STATE_HINT         = 0b0000000010;
        /// Urgency hint is set
        const URGENCY_HINT       = 0b0100000000;
    }
}

bitflags! {
    /// Possible flags that can be set in a WM_NORMAL_HINTS client property
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SizeHintsFlags: u32 {
        /// User-specified x, y
        const U_POSITION    = 0b0000000001;
        /// User-specified width, height
        const U_SIZE        = 0b0000000010;
        /// Program-specified position
        const P_POSITION    = 0b0000000100;
        /// Program-specified size
        const P_SIZE        = 0b0000001000;
        /// Program-specified minimum size
        const P_MIN_SIZE    = 0b0000010000;
        /// Program-specified maximum size
        const P_MAX_SIZE    = 0b0000100000;
        /// Program-specified resize increments
        const P_RESIZE_INC  = 0b0001000000;
        /// Program-specified min and max aspect ratios
        const P_ASPECT      = 0b0010000000;
        /// Program-specified base size
        const P_BASE_SIZE   = 0b0100000000;
        /// Program-specified window gravity
        const P_WIN_GRAVITY = 0b1000000000;
    }
}

/// Possible valid values for setting the `WM_STATE` property on a client.
///
/// See the [ICCCM docs][1] for more information.
///
/// [1]: https://tronche.com/gui/x/icccm/sec-4.html#s-4.1.3.1
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WmState {
    /// Window is not visible
    Withdrawn,
    /// Window is visible
    Normal,
    /// Window is iconified
    Iconic,
}

impl From<WmState> for u32 {
    fn from(s: WmState) -> u32 {
        match s {
            WmState::Withdrawn => 0,
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

impl TryFrom<u32> for WmState {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Withdrawn),
            1 => Ok(Self::Normal),
            3 => Ok(Self::Iconic),
            n => Err(Error::InvalidHints(format!("WM_STATE value: {n}"))),
        }
    }
}

/// The mapping states a window can be in
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MapState {
    /// The window is unmapped
    Unmapped,
    /// The window is never viewable
    UnViewable,
    /// The window is currently viewable
    Viewable,
}

/// The input class for a window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WindowClass {
    /// Class is copied from parent window
    CopyFromParent,
    /// Window can be displayed
    InputOutput,
    /// Window can only be used for queries
    InputOnly,
}

/// Client requested hints about information other than window geometry.
///
/// Only the hints honoured by the window manager are retained. See the ICCCM
/// [spec][1] for the full set.
///
/// [1]: https://www.x.org/releases/X11R7.6/doc/xorg-docs/specs/ICCCM/icccm.html#wm_hints_property
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WmHints {
    pub(crate) flags: WmHintsFlags,
    /// Does this client rely on the window manager for keyboard input?
    pub accepts_input: bool,
    /// Initial WM_STATE requested by the client
    pub initial_state: WmState,
}

impl WmHints {
    /// Create a new instance from component parts
    pub fn new(flags: WmHintsFlags, accepts_input: bool, initial_state: WmState) -> Self {
        Self {
            flags,
            accepts_input,
            initial_state,
        }
    }

    /// Whether the urgency hint is currently set
    pub fn urgent(&self) -> bool {
        self.flags.contains(WmHintsFlags::URGENCY_HINT)
    }

    /// Try to construct a [WmHints] instance from raw bytes.
    ///
    /// This method expects a slice of 9 u32s corresponding to the C struct
    /// layout of XWMHints: flags, input, initial_state, icon_pixmap,
    /// icon_window, icon_x, icon_y, icon_mask, window_group.
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        if raw.len() != 9 {
            return Err(Error::InvalidHints(format!(
                "raw bytes should be [u32; 9] for WmHints, got [u32; {}]",
                raw.len()
            )));
        }

        let flags = WmHintsFlags::from_bits_truncate(raw[0]);
        let accepts_input = !flags.contains(WmHintsFlags::INPUT_HINT) || raw[1] > 0;
        let initial_state = match (flags.contains(WmHintsFlags::STATE_HINT), raw[2]) {
            (true, 0) => WmState::Withdrawn,
            (true, 1) | (false, _) => WmState::Normal,
            (true, 3) => WmState::Iconic,
            (true, n) => {
                return Err(Error::InvalidHints(format!(
                    "initial state flag should be 0, 1, 3: got {n}"
                )))
            }
        };

        Ok(Self {
            flags,
            accepts_input,
            initial_state,
        })
    }
}

/// Client requested hints about window geometry, from WM_NORMAL_HINTS.
///
/// Absent fields are stored as zero, following the convention of the ICCCM
/// reference implementations: a zero max / increment / aspect disables that
/// constraint. Fallbacks between base and min size are resolved at parse
/// time so consumers never need to consult the flag word.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, PartialEq, Clone, Copy)]
pub struct SizeHints {
    pub(crate) flags: SizeHintsFlags,
    /// Base size subtracted before increment arithmetic
    pub base: (u32, u32),
    /// Resize increment granularity
    pub inc: (u32, u32),
    /// Maximum size (0 = unconstrained)
    pub max: (u32, u32),
    /// Minimum size (0 = unconstrained)
    pub min: (u32, u32),
    /// Minimum aspect ratio as h/w (0.0 = unconstrained)
    pub min_aspect: f32,
    /// Maximum aspect ratio as w/h (0.0 = unconstrained)
    pub max_aspect: f32,
}

impl SizeHints {
    /// Whether these hints pin the window to a single size.
    pub fn is_fixed(&self) -> bool {
        let (max_w, max_h) = self.max;
        let (min_w, min_h) = self.min;

        max_w > 0 && max_h > 0 && max_w == min_w && max_h == min_h
    }

    /// Try to construct a [SizeHints] instance from raw bytes.
    ///
    /// This method expects a slice of 18 u32s corresponding to the C struct
    /// layout of XSizeHints: flags, x, y, width, height, min_width,
    /// min_height, max_width, max_height, width_inc, height_inc,
    /// min_aspect (num, den), max_aspect (num, den), base_width,
    /// base_height, win_gravity.
    pub fn try_from_bytes(raw: &[u32]) -> Result<Self> {
        if raw.len() < 18 {
            return Err(Error::InvalidHints(format!(
                "raw bytes should be [u32; 18] for WM_NORMAL_HINTS, got [u32; {}]",
                raw.len()
            )));
        }

        let flags = SizeHintsFlags::from_bits_truncate(raw[0]);
        // The fields are C longs: negative values are treated as unset
        let field = |i: usize| (raw[i] as i32).max(0) as u32;

        let min = if flags.contains(SizeHintsFlags::P_MIN_SIZE) {
            (field(5), field(6))
        } else if flags.contains(SizeHintsFlags::P_BASE_SIZE) {
            (field(15), field(16))
        } else {
            (0, 0)
        };

        let base = if flags.contains(SizeHintsFlags::P_BASE_SIZE) {
            (field(15), field(16))
        } else {
            min
        };

        let max = if flags.contains(SizeHintsFlags::P_MAX_SIZE) {
            (field(7), field(8))
        } else {
            (0, 0)
        };

        let inc = if flags.contains(SizeHintsFlags::P_RESIZE_INC) {
            (field(9), field(10))
        } else {
            (0, 0)
        };

        let (min_aspect, max_aspect) = if flags.contains(SizeHintsFlags::P_ASPECT) {
            let ratio = |num: u32, den: u32| {
                if den > 0 {
                    num as f32 / den as f32
                } else {
                    0.0
                }
            };

            (ratio(field(12), field(11)), ratio(field(13), field(14)))
        } else {
            (0.0, 0.0)
        };

        Ok(Self {
            flags,
            base,
            inc,
            max,
            min,
            min_aspect,
            max_aspect,
        })
    }
}

/// The window attributes checked and honoured when managing a window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WindowAttributes {
    /// Whether this window bypasses window management entirely
    pub override_redirect: bool,
    /// Current mapping state
    pub map_state: MapState,
    /// Input class
    pub window_class: WindowClass,
}

impl WindowAttributes {
    /// Create a new instance from component parts
    pub fn new(override_redirect: bool, map_state: MapState, window_class: WindowClass) -> Self {
        Self {
            override_redirect,
            map_state,
            window_class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    fn raw_normal_hints(flags: u32) -> [u32; 18] {
        let mut raw = [0; 18];
        raw[0] = flags;
        raw[5] = 50; // min_width
        raw[6] = 40; // min_height
        raw[7] = 500; // max_width
        raw[8] = 400; // max_height
        raw[9] = 10; // width_inc
        raw[10] = 5; // height_inc
        raw[11] = 1; // min_aspect num
        raw[12] = 2; // min_aspect den
        raw[13] = 3; // max_aspect num
        raw[14] = 1; // max_aspect den
        raw[15] = 8; // base_width
        raw[16] = 6; // base_height
        raw
    }

    #[test]
    fn full_hints_parse() {
        let flags = SizeHintsFlags::P_MIN_SIZE
            | SizeHintsFlags::P_MAX_SIZE
            | SizeHintsFlags::P_RESIZE_INC
            | SizeHintsFlags::P_ASPECT
            | SizeHintsFlags::P_BASE_SIZE;
        let hints = SizeHints::try_from_bytes(&raw_normal_hints(flags.bits())).unwrap();

        assert_eq!(hints.min, (50, 40));
        assert_eq!(hints.max, (500, 400));
        assert_eq!(hints.inc, (10, 5));
        assert_eq!(hints.base, (8, 6));
        assert_eq!(hints.min_aspect, 2.0);
        assert_eq!(hints.max_aspect, 3.0);
        assert!(!hints.is_fixed());
    }

    #[test]
    fn base_falls_back_to_min() {
        let flags = SizeHintsFlags::P_MIN_SIZE;
        let hints = SizeHints::try_from_bytes(&raw_normal_hints(flags.bits())).unwrap();

        assert_eq!(hints.base, (50, 40));
        assert_eq!(hints.min, (50, 40));
        assert_eq!(hints.max, (0, 0));
    }

    #[test]
    fn min_falls_back_to_base() {
        let flags = SizeHintsFlags::P_BASE_SIZE;
        let hints = SizeHints::try_from_bytes(&raw_normal_hints(flags.bits())).unwrap();

        assert_eq!(hints.base, (8, 6));
        assert_eq!(hints.min, (8, 6));
    }

    #[test]
    fn equal_min_max_is_fixed() {
        let mut raw = raw_normal_hints(
            (SizeHintsFlags::P_MIN_SIZE | SizeHintsFlags::P_MAX_SIZE).bits(),
        );
        raw[7] = 50;
        raw[8] = 40;

        let hints = SizeHints::try_from_bytes(&raw).unwrap();

        assert!(hints.is_fixed());
    }

    #[test_case(&[0; 8]; "too short")]
    #[test]
    fn invalid_normal_hints_error(raw: &[u32]) {
        assert!(SizeHints::try_from_bytes(raw).is_err());
    }

    #[test]
    fn urgency_hint_round_trip() {
        let mut raw = [0u32; 9];
        raw[0] = WmHintsFlags::URGENCY_HINT.bits() | WmHintsFlags::INPUT_HINT.bits();
        raw[1] = 0;

        let hints = WmHints::try_from_bytes(&raw).unwrap();

        assert!(hints.urgent());
        assert!(!hints.accepts_input);
        assert_eq!(hints.initial_state, WmState::Normal);
    }
}
