//! Data types for working with X events
use crate::{
    core::bindings::{KeyCode, MouseEvent},
    pure::geometry::{Point, Rect},
    x::{Atom, XConn},
    Result, Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wrapper around the low level X event types that correspond to request /
/// response data when communicating with the X server itself.
///
/// Only events with a handler in the dispatch table are surfaced: anything
/// else is dropped inside the backend.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XEvent {
    /// A grabbed mouse button was pressed
    ButtonPress(MouseEvent),
    /// A mouse button was released (only seen inside drag pumps)
    ButtonRelease,
    /// A message has been sent to a particular client
    ClientMessage(ClientMessage),
    /// A window's configuration has changed
    ConfigureNotify(ConfigureEvent),
    /// A window is requesting to be repositioned
    ConfigureRequest(ConfigureRequestEvent),
    /// A client window has been closed
    Destroy(Xid),
    /// The mouse pointer has entered a new window
    Enter(PointerChange),
    /// A part or all of a window has become visible
    Expose(ExposeEvent),
    /// A window has taken input focus
    FocusIn(Xid),
    /// A grabbed key combination has been entered by the user
    KeyPress(KeyCode),
    /// The keyboard or pointer mapping has been changed
    MappingNotify {
        /// Whether it was the keyboard mapping that changed
        keyboard: bool,
    },
    /// A client window is requesting to be positioned and rendered on the
    /// screen
    MapRequest(Xid),
    /// The pointer has moved over the root window
    MotionNotify(MotionEvent),
    /// A client property has changed in some way
    PropertyNotify(PropertyEvent),
    /// The set of connected screens has changed
    RandrNotify,
    /// A client is being unmapped
    UnmapNotify(UnmapEvent),
}

impl std::fmt::Display for XEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use XEvent::*;

        match self {
            ButtonPress(_) => write!(f, "ButtonPress"),
            ButtonRelease => write!(f, "ButtonRelease"),
            ClientMessage(_) => write!(f, "ClientMessage"),
            ConfigureNotify(_) => write!(f, "ConfigureNotify"),
            ConfigureRequest(_) => write!(f, "ConfigureRequest"),
            Destroy(_) => write!(f, "Destroy"),
            Enter(_) => write!(f, "Enter"),
            Expose(_) => write!(f, "Expose"),
            FocusIn(_) => write!(f, "FocusIn"),
            KeyPress(_) => write!(f, "KeyPress"),
            MappingNotify { .. } => write!(f, "MappingNotify"),
            MapRequest(_) => write!(f, "MapRequest"),
            MotionNotify(_) => write!(f, "MotionNotify"),
            PropertyNotify(_) => write!(f, "PropertyNotify"),
            RandrNotify => write!(f, "RandrNotify"),
            UnmapNotify(_) => write!(f, "UnmapNotify"),
        }
    }
}

/// Event masks used when sending client events
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientEventMask {
    /// Substructure Notify
    SubstructureNotify,
    /// Structure Notify
    StructureNotify,
    /// No Mask: all clients should accept
    NoEventMask,
}

/// A client message that needs to be parsed and handled based on its type
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    /// The ID of the window that sent the message
    pub id: Xid,
    /// The mask to use when sending the event
    pub mask: ClientEventMask,
    /// The data type being set
    pub dtype: String,
    /// The raw data being sent in this message, cast up from whichever of
    /// the 8 / 16 / 32 bit formats it arrived in
    pub data: Vec<u32>,
}

impl ClientMessage {
    /// Build a new ClientMessage for sending to a given window.
    pub fn new(id: Xid, mask: ClientEventMask, dtype: impl Into<String>, data: Vec<u32>) -> Self {
        Self {
            id,
            mask,
            dtype: dtype.into(),
            data,
        }
    }
}

/// Well known client messages sent by the window manager itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientMessageKind {
    /// Ask a client to close via WM_DELETE_WINDOW
    DeleteWindow(Xid),
    /// Offer a client input focus via WM_TAKE_FOCUS
    TakeFocus(Xid),
}

impl ClientMessageKind {
    /// Build a [ClientMessage] in the standard WM_PROTOCOLS format.
    pub fn as_message<X>(&self, x: &X) -> Result<ClientMessage>
    where
        X: XConn,
    {
        let proto_msg = |id: Xid, atom: Atom| {
            let proto = Atom::WmProtocols.as_ref();
            let data = vec![*x.intern_atom(atom.as_ref())?, 0, 0, 0, 0];

            Ok(ClientMessage::new(id, ClientEventMask::NoEventMask, proto, data))
        };

        match self {
            ClientMessageKind::DeleteWindow(id) => proto_msg(*id, Atom::WmDeleteWindow),
            ClientMessageKind::TakeFocus(id) => proto_msg(*id, Atom::WmTakeFocus),
        }
    }
}

/// A configure notification for a window that changed position or size
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureEvent {
    /// The ID of the window that changed
    pub id: Xid,
    /// The new window size and position
    pub r: Rect,
    /// Is this window the root window?
    pub is_root: bool,
}

/// A request from a client to be repositioned or restacked.
///
/// Each field mirrors a bit of the request's value mask: `None` means the
/// client did not ask for that field to change, which matters when the
/// request is forwarded verbatim for unmanaged windows.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureRequestEvent {
    /// The window asking to be configured
    pub id: Xid,
    /// Requested x position
    pub x: Option<i32>,
    /// Requested y position
    pub y: Option<i32>,
    /// Requested width
    pub w: Option<u32>,
    /// Requested height
    pub h: Option<u32>,
    /// Requested border width
    pub border_width: Option<u32>,
    /// Requested stacking sibling
    pub sibling: Option<Xid>,
    /// Requested raw stack mode
    pub stack_mode: Option<u32>,
}

/// A notification that the mouse pointer has entered a window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerChange {
    /// The ID of the window that was entered
    pub id: Xid,
    /// Absolute coordinate of the event
    pub abs: Point,
}

/// A notification that a window has become visible
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposeEvent {
    /// The ID of the window that has become exposed
    pub id: Xid,
    /// How many following expose events are pending
    pub count: usize,
}

/// Pointer motion over the root window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    /// Position of the pointer relative to the root window
    pub p: Point,
    /// Server timestamp of the motion
    pub time: u32,
}

/// A property change on a known client
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    /// The ID of the window that had a property changed
    pub id: Xid,
    /// The name of the property that changed
    pub atom: String,
    /// Is this window the root window?
    pub is_root: bool,
}

/// A window being unmapped from the screen
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmapEvent {
    /// The ID of the window being unmapped
    pub id: Xid,
    /// Whether this was a synthetic event sent by the client to request the
    /// Withdrawn state (ICCCM 4.1.4)
    pub synthetic: bool,
}
