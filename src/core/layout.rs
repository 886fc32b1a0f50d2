//! Layouts: pure functions from visible clients to per-client geometries.
use crate::{pure::geometry::Rect, Xid};
use std::fmt;

/// Everything a [Layout] is allowed to consult when arranging a monitor.
#[derive(Debug, Clone, Copy)]
pub struct LayoutCtx<'a> {
    /// The monitor work area (screen minus bar)
    pub work: Rect,
    /// Master area width fraction for the monitor being arranged
    pub mfact: f32,
    /// Configured master count (0 = derive from the client count)
    pub nmaster: u32,
    /// Uniform gap around each tile in pixels
    pub gap_px: u32,
    /// The visible, non-floating clients in attachment order
    pub clients: &'a [Xid],
}

/// A window arrangement for the visible tiled clients of one monitor.
///
/// Layouts are pure: they produce the outer geometry (border included) for
/// each client they were given and never touch the X server themselves. The
/// geometries are applied, size hints and all, by the window manager.
///
/// Returning `None` from [Layout::arrange] marks the layout as floating:
/// client positions are left exactly as they are.
pub trait Layout {
    /// The symbol shown in the bar while this layout is active.
    ///
    /// `n_visible` is the number of currently visible clients, for layouts
    /// whose symbol reflects it. Symbols are truncated to 16 characters.
    fn symbol(&self, n_visible: usize) -> String;

    /// Create a boxed clone of this layout for monitors to share a table.
    fn boxed_clone(&self) -> Box<dyn Layout>;

    /// Compute positions for the given clients, or `None` to leave every
    /// window where it is.
    fn arrange(&self, ctx: &LayoutCtx<'_>) -> Option<Vec<(Xid, Rect)>>;

    /// Whether this is a floating (no-op) arrangement.
    ///
    /// Used to decide whether clients may configure themselves and whether
    /// size hints apply to tiled windows.
    fn is_floating(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("symbol", &self.symbol(0))
            .finish()
    }
}

impl Clone for Box<dyn Layout> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}
