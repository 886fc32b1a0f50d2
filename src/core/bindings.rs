//! Setting up and responding to user defined key/mouse bindings
use crate::{
    core::State,
    pure::geometry::Point,
    util::keycodes_from_xmodmap,
    x::XConn,
    Error, Result, Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{EnumIter, IntoEnumIterator};

/// An action to be run in response to a key press
pub trait KeyEventHandler<X: XConn> {
    /// Execute this action
    fn call(&mut self, state: &mut State<X>, x: &X) -> Result<()>;
}

impl<F, X: XConn> KeyEventHandler<X> for F
where
    F: FnMut(&mut State<X>, &X) -> Result<()>,
{
    fn call(&mut self, state: &mut State<X>, x: &X) -> Result<()> {
        (self)(state, x)
    }
}

/// An action to be run in response to a mouse button press
pub trait MouseEventHandler<X: XConn> {
    /// Execute this action
    fn call(&mut self, evt: &MouseEvent, state: &mut State<X>, x: &X) -> Result<()>;
}

impl<F, X: XConn> MouseEventHandler<X> for F
where
    F: FnMut(&MouseEvent, &mut State<X>, &X) -> Result<()>,
{
    fn call(&mut self, evt: &MouseEvent, state: &mut State<X>, x: &X) -> Result<()> {
        (self)(evt, state, x)
    }
}

/// User defined key bindings
pub type KeyBindings<X> = HashMap<KeyCode, Box<dyn KeyEventHandler<X>>>;

/// User defined mouse bindings (button press only)
pub type MouseBindings<X> = HashMap<MouseState, Box<dyn MouseEventHandler<X>>>;

/// A mapping of key names to X key codes, as produced by `xmodmap -pke`
pub type CodeMap = HashMap<String, u8>;

/// A u16 X key-code bitmask
pub type KeyCodeMask = u16;

/// A key press and held modifiers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct KeyCode {
    /// The held modifier mask
    pub mask: KeyCodeMask,
    /// The key code that was held
    pub code: u8,
}

impl KeyCode {
    /// Create a new [KeyCode] from this one that removes the given mask
    pub fn ignoring_modifier(&self, mask: KeyCodeMask) -> KeyCode {
        KeyCode {
            mask: self.mask & !mask,
            code: self.code,
        }
    }
}

/// Known mouse buttons for binding actions
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MouseButton {
    /// 1
    Left,
    /// 2
    Middle,
    /// 3
    Right,
    /// 4
    ScrollUp,
    /// 5
    ScrollDown,
}

impl From<MouseButton> for u8 {
    fn from(b: MouseButton) -> u8 {
        match b {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::ScrollUp => 4,
            MouseButton::ScrollDown => 5,
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            1 => Ok(Self::Left),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Right),
            4 => Ok(Self::ScrollUp),
            5 => Ok(Self::ScrollDown),
            _ => Err(Error::InvalidBinding(format!("mouse button {n}"))),
        }
    }
}

/// Known modifier keys for bindings
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, EnumIter, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum ModifierKey {
    /// Control
    Ctrl,
    /// Alt
    Alt,
    /// Shift
    Shift,
    /// Meta / super / windows
    Meta,
}

impl From<ModifierKey> for u16 {
    fn from(m: ModifierKey) -> u16 {
        match m {
            ModifierKey::Shift => 1 << 0,
            ModifierKey::Ctrl => 1 << 2,
            ModifierKey::Alt => 1 << 3,
            ModifierKey::Meta => 1 << 6,
        }
    }
}

impl TryFrom<&str> for ModifierKey {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s {
            "C" => Ok(Self::Ctrl),
            "A" => Ok(Self::Alt),
            "S" => Ok(Self::Shift),
            "M" => Ok(Self::Meta),
            _ => Err(Error::InvalidBinding(s.to_owned())),
        }
    }
}

/// A mouse button press together with all held modifiers
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MouseState {
    /// The [MouseButton] being held
    pub button: MouseButton,
    /// All [ModifierKey]s being held
    pub modifiers: Vec<ModifierKey>,
}

impl MouseState {
    /// Construct a new MouseState
    pub fn new(button: MouseButton, mut modifiers: Vec<ModifierKey>) -> Self {
        modifiers.sort();
        Self { button, modifiers }
    }

    /// The modifier bitmask for the held modifiers
    pub fn mask(&self) -> u16 {
        self.modifiers.iter().fold(0, |acc, &m| acc | u16::from(m))
    }

    /// The button number being held
    pub fn button(&self) -> u8 {
        self.button.into()
    }

    /// Reconstruct a MouseState from a raw button number and modifier mask.
    pub fn from_detail_and_state(detail: u8, state: u16) -> Result<Self> {
        let button = MouseButton::try_from(detail)?;
        let modifiers = ModifierKey::iter()
            .filter(|&m| state & u16::from(m) > 0)
            .collect();

        Ok(Self::new(button, modifiers))
    }
}

/// A mouse button press event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    /// The ID of the window that was clicked
    pub id: Xid,
    /// Absolute coordinate of the event
    pub rpt: Point,
    /// Coordinate of the event relative to top-left of the window itself
    pub wpt: Point,
    /// The button and modifiers that were held
    pub state: MouseState,
}

/// Parse a textual key binding spec ("M-j", "M-S-Return", ...) into a
/// [KeyCode] using the given key name to code mapping.
pub fn parse_binding(spec: &str, codes: &CodeMap) -> Result<KeyCode> {
    let mut parts: Vec<&str> = spec.split('-').collect();
    let name = parts
        .pop()
        .ok_or_else(|| Error::InvalidBinding(spec.to_owned()))?;

    let mut mask = 0;
    for p in parts {
        mask |= u16::from(ModifierKey::try_from(p)?);
    }

    match codes.get(name) {
        Some(&code) => Ok(KeyCode { mask, code }),
        None => Err(Error::InvalidBinding(spec.to_owned())),
    }
}

/// Parse a map of binding specs into [KeyBindings], resolving key names via
/// `xmodmap -pke`.
///
/// This is the expected way of constructing the key binding table handed to
/// [crate::core::WindowManager::new]: specs are validated up front so a typo
/// fails at startup rather than leaving a dead binding.
pub fn parse_keybindings_with_xmodmap<X, S>(
    str_bindings: HashMap<S, Box<dyn KeyEventHandler<X>>>,
) -> Result<KeyBindings<X>>
where
    X: XConn,
    S: AsRef<str>,
{
    let codes = keycodes_from_xmodmap()?;

    str_bindings
        .into_iter()
        .map(|(spec, handler)| Ok((parse_binding(spec.as_ref(), &codes)?, handler)))
        .collect()
}
