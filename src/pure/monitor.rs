//! Per-monitor state: viewed tag-sets, layout selection and client ordering
use crate::{
    pure::{
        geometry::{Point, Rect},
        TagMask,
    },
    Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where (and whether) the status bar sits on a monitor.
///
/// The bar itself is drawn by an external collaborator: the window manager
/// only reserves the space, keeps tiled clients stacked below the bar window
/// and asks for redraws. `win` is registered by the collaborator once it has
/// created its bar window for this monitor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarGeometry {
    /// Whether space is currently reserved for the bar
    pub shown: bool,
    /// Bar at the top (true) or bottom (false) of the monitor
    pub top: bool,
    /// Bar height in pixels
    pub height: u32,
    /// The screen area given to the bar
    pub rect: Rect,
    /// The collaborator's bar window, once created
    pub win: Option<Xid>,
}

/// Initial values applied to newly created monitors.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorDefaults {
    /// Master area width fraction
    pub mfact: f32,
    /// Number of clients in the master area (0 = dynamic)
    pub nmaster: u32,
    /// Initially viewed tag-set
    pub tags: TagMask,
    /// Index into the shared layout table
    pub layout: usize,
    /// Reserve space for a bar
    pub show_bar: bool,
    /// Bar at the top of the screen
    pub top_bar: bool,
    /// Bar height in pixels
    pub bar_height: u32,
}

impl Default for MonitorDefaults {
    fn default() -> Self {
        Self {
            mfact: 0.55,
            nmaster: 1,
            tags: TagMask(1),
            layout: 0,
            show_bar: true,
            top_bar: true,
            bar_height: 18,
        }
    }
}

/// A physical screen holding an ordered set of clients and a view onto the
/// tag space.
///
/// Two orders are kept over the same clients: `clients` is attachment order
/// (newest at the head) and is what tiled layouts consume; `stack` is a focus
/// LRU (most recently selected at the head) used to restore focus when the
/// selection goes away. The [TagMask] slots hold the current and previously
/// viewed tag-set so that a view of the same mask toggles back.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    /// Stable index of this monitor
    pub num: usize,
    /// Symbol of the active layout, as shown in the bar
    pub lt_symbol: String,
    /// Master area width fraction, clamped to [0.05, 0.95]
    pub mfact: f32,
    /// Number of clients in the master area (0 = dynamic)
    pub nmaster: u32,
    /// Full screen area
    pub screen: Rect,
    /// Screen area minus the bar
    pub work: Rect,
    /// Bar placement
    pub bar: BarGeometry,
    pub(crate) tag_sets: [TagMask; 2],
    pub(crate) sel_tags: usize,
    /// Index into the shared layout table
    pub layout: usize,
    /// Attachment order (head = most recently managed)
    pub clients: Vec<Xid>,
    /// Focus LRU (head = most recently selected)
    pub stack: Vec<Xid>,
    /// The selected client, if any
    pub sel: Option<Xid>,
    /// Pointer position to restore when warping back to this monitor
    pub last_pointer: Point,
}

impl Monitor {
    /// Create a new monitor covering `screen`.
    pub fn new(num: usize, screen: Rect, defaults: &MonitorDefaults) -> Self {
        let mut m = Self {
            num,
            lt_symbol: String::new(),
            mfact: defaults.mfact.clamp(0.05, 0.95),
            nmaster: defaults.nmaster,
            screen,
            work: screen,
            bar: BarGeometry {
                shown: defaults.show_bar,
                top: defaults.top_bar,
                height: defaults.bar_height,
                rect: Rect::default(),
                win: None,
            },
            tag_sets: [defaults.tags, defaults.tags],
            sel_tags: 0,
            layout: defaults.layout,
            clients: Vec::new(),
            stack: Vec::new(),
            sel: None,
            last_pointer: screen.midpoint(),
        };
        m.update_bar_geometry();

        m
    }

    /// The tag-set currently viewed on this monitor.
    pub fn active_tag_set(&self) -> TagMask {
        self.tag_sets[self.sel_tags]
    }

    /// The tag-set viewed before the current one.
    pub fn previous_tag_set(&self) -> TagMask {
        self.tag_sets[self.sel_tags ^ 1]
    }

    /// Swap to the other tag-set slot, writing `mask` into it if non-empty.
    ///
    /// An empty mask flips back to the previously viewed tag-set without
    /// modifying either slot, giving "toggle to last view" for free.
    pub fn set_view(&mut self, mask: TagMask) {
        self.sel_tags ^= 1;
        if !mask.is_empty() {
            self.tag_sets[self.sel_tags] = mask;
        }
    }

    /// XOR `mask` into the current tag-set if the result is non-empty.
    pub fn xor_view(&mut self, mask: TagMask) -> bool {
        let new = self.active_tag_set() ^ mask;
        if new.is_empty() {
            return false;
        }

        self.tag_sets[self.sel_tags] = new;
        true
    }

    /// Recompute the bar rect and work area from the screen rect.
    pub fn update_bar_geometry(&mut self) {
        let Rect { x, y, w, h } = self.screen;
        let bh = self.bar.height;

        if self.bar.shown && bh < h {
            let (bar_y, work_y) = if self.bar.top {
                (y, y + bh as i32)
            } else {
                (y + (h - bh) as i32, y)
            };

            self.bar.rect = Rect::new(x, bar_y, w, bh);
            self.work = Rect::new(x, work_y, w, h - bh);
        } else {
            // parked off-screen so an eventual toggle has a sane rect
            self.bar.rect = Rect::new(x, y - bh as i32, w, bh);
            self.work = self.screen;
        }
    }

    /// Move to a new screen rect, recomputing the dependent geometry.
    pub fn resize(&mut self, screen: Rect) {
        self.screen = screen;
        self.last_pointer = screen.midpoint();
        self.update_bar_geometry();
    }
}
