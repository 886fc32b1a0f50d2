//! Core data structures and user facing functionality for the window manager
use crate::{
    pure::{monitor::MonitorDefaults, MonitorSet, TagMask},
    x::{XConn, XConnExt, XEvent},
    Color, Result,
};
use nix::sys::signal::{signal, SigHandler, Signal};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};
use tracing::{error, span, trace, Level};

pub mod bindings;
pub mod handle;
pub mod layout;

use bindings::{KeyBindings, KeyCode, MouseBindings, MouseState};
use layout::Layout;

/// An X11 ID for a given resource
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Xid(pub u32);

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Xid> for u32 {
    fn from(id: Xid) -> Self {
        id.0
    }
}

/// A matching rule consulted when a new window is first managed.
///
/// Every field that is `Some` must match for the rule to apply; string
/// fields match on substrings the way users expect from other window
/// managers. All matching rules are applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Substring required in the WM_CLASS class field
    pub class: Option<String>,
    /// Substring required in the WM_CLASS instance field
    pub instance: Option<String>,
    /// Substring required in the window title
    pub title: Option<String>,
    /// Tags to assign (empty = monitor's current view)
    pub tags: TagMask,
    /// Force the client to float
    pub floating: bool,
    /// Send the client to a specific monitor
    pub monitor: Option<usize>,
    /// Honour size hints while tiled
    pub obeys_size_hints: bool,
}

impl Rule {
    /// Whether this rule applies to a window with the given properties.
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        let sub = |needle: &Option<String>, haystack: &str| match needle {
            Some(s) => haystack.contains(s.as_str()),
            None => true,
        };

        sub(&self.class, class) && sub(&self.instance, instance) && sub(&self.title, title)
    }
}

/// The bar drawing collaborator.
///
/// The window manager never draws the bar itself: it reserves screen space
/// per monitor and calls this hook whenever the bar content may be stale
/// (arranges, focus changes, title and urgency updates, exposes). The hook
/// may register the bar window it creates on [crate::pure::Monitor::bar] so
/// restacking can keep tiled clients below it.
pub trait BarHook<X: XConn> {
    /// Redraw the bar for the given monitor.
    fn draw_bar(&mut self, mon: usize, state: &State<X>, x: &X) -> Result<()>;

    /// The rendered width of a string in the bar font, in pixels.
    fn measure_text(&self, s: &str) -> u32;
}

/// The user facing configuration values for the window manager.
pub struct Config<X>
where
    X: XConn,
{
    /// Border color for unfocused clients
    pub normal_border: Color,
    /// Border color for the focused client
    pub focused_border: Color,
    /// Border color for clients with the urgency hint set
    pub urgent_border: Color,
    /// Window border width in pixels
    pub border_width: u32,
    /// Uniform gap around tiled clients in pixels
    pub gap_px: u32,
    /// Edge snapping distance for mouse moves in pixels
    pub snap: u32,
    /// Ordered tag names (1 to 31 entries)
    pub tags: Vec<String>,
    /// Tags that can not be brought into view directly
    pub hidden_tags: TagMask,
    /// Initial values for new monitors
    pub monitor_defaults: MonitorDefaults,
    /// The shared layout table monitors index into
    pub layouts: Vec<Box<dyn Layout>>,
    /// Rules applied to newly managed windows
    pub rules: Vec<Rule>,
    /// The bar drawing collaborator, if any
    pub bar_hook: Option<Box<dyn BarHook<X>>>,
}

impl<X: XConn> fmt::Debug for Config<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("normal_border", &self.normal_border)
            .field("focused_border", &self.focused_border)
            .field("urgent_border", &self.urgent_border)
            .field("border_width", &self.border_width)
            .field("gap_px", &self.gap_px)
            .field("snap", &self.snap)
            .field("tags", &self.tags)
            .field("hidden_tags", &self.hidden_tags)
            .field("layouts", &self.layouts)
            .field("rules", &self.rules)
            .finish()
    }
}

impl<X: XConn> Default for Config<X> {
    fn default() -> Self {
        let strings = |slice: &[&str]| slice.iter().map(|s| s.to_string()).collect();

        Config {
            normal_border: "#3c3836".try_into().expect("valid hex code"),
            focused_border: "#cc241d".try_into().expect("valid hex code"),
            urgent_border: "#fabd2f".try_into().expect("valid hex code"),
            border_width: 2,
            gap_px: 0,
            snap: 32,
            tags: strings(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
            hidden_tags: TagMask::EMPTY,
            monitor_defaults: MonitorDefaults::default(),
            layouts: vec![
                crate::builtin::layout::Tile::boxed(3),
                crate::builtin::layout::Monocle::boxed(),
                crate::builtin::layout::Floating::boxed(),
            ],
            rules: vec![],
            bar_hook: None,
        }
    }
}

/// Mutable internal state for a running [WindowManager].
pub struct State<X>
where
    X: XConn,
{
    /// The user provided configuration
    pub config: Config<X>,
    /// The pure window management model
    pub monitor_set: MonitorSet,
    pub(crate) root: Xid,
    pub(crate) running: bool,
    pub(crate) prev_focus: Option<Xid>,
    pub(crate) motion_monitor: Option<usize>,
    pub(crate) key_codes: Vec<KeyCode>,
    pub(crate) mouse_states: Vec<MouseState>,
}

impl<X: XConn> fmt::Debug for State<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("config", &self.config)
            .field("monitor_set", &self.monitor_set)
            .field("root", &self.root)
            .field("running", &self.running)
            .field("prev_focus", &self.prev_focus)
            .finish()
    }
}

impl<X: XConn> State<X> {
    /// The Xid of the root window.
    pub fn root(&self) -> Xid {
        self.root
    }

    /// The client that held focus before the current one, for focus-swap.
    pub fn previous_focus(&self) -> Option<Xid> {
        self.prev_focus
    }

    #[cfg(test)]
    pub(crate) fn new_for_tests(config: Config<X>, monitor_set: MonitorSet) -> Self {
        Self {
            config,
            monitor_set,
            root: Xid(0),
            running: true,
            prev_focus: None,
            motion_monitor: None,
            key_codes: vec![],
            mouse_states: vec![],
        }
    }
}

/// A top level struct holding all of the state required to run as an X11
/// window manager.
pub struct WindowManager<X>
where
    X: XConn,
{
    x: X,
    /// The mutable window manager state
    pub state: State<X>,
    key_bindings: KeyBindings<X>,
    mouse_bindings: MouseBindings<X>,
}

impl<X: XConn> fmt::Debug for WindowManager<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager")
            .field("state", &self.state)
            .finish()
    }
}

impl<X> WindowManager<X>
where
    X: XConn,
{
    /// Construct a new [WindowManager] with the provided config, bindings
    /// and X connection.
    pub fn new(
        config: Config<X>,
        key_bindings: KeyBindings<X>,
        mouse_bindings: MouseBindings<X>,
        x: X,
    ) -> Result<Self> {
        let monitor_set = MonitorSet::try_new(
            config.monitor_defaults.clone(),
            config.tags.len(),
            config.hidden_tags,
            x.screen_details()?,
        )?;

        let state = State {
            config,
            monitor_set,
            root: x.root(),
            running: true,
            prev_focus: None,
            motion_monitor: None,
            key_codes: key_bindings.keys().copied().collect(),
            mouse_states: mouse_bindings.keys().cloned().collect(),
        };

        Ok(Self {
            x,
            state,
            key_bindings,
            mouse_bindings,
        })
    }

    /// Start the window manager and run it until told to exit.
    ///
    /// Existing viewable windows are adopted on startup so that a restart
    /// picks the session back up.
    pub fn run(mut self) -> Result<()> {
        trace!("registering SIGCHLD signal handler");
        // children are reparented to and reaped by init
        #[allow(unsafe_code)]
        if let Err(e) = unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) } {
            return Err(crate::custom_error!("unable to set signal handler: {}", e));
        }

        trace!("grabbing key bindings");
        self.x.grab_keys(&self.state.key_codes)?;

        trace!("adopting existing clients");
        self.x.manage_existing_clients(&mut self.state)?;
        self.x.refresh(&mut self.state)?;

        loop {
            let event = self.x.next_event()?;
            let span = span!(target: "tatami", Level::DEBUG, "XEvent", %event);
            let _enter = span.enter();
            trace!(details = ?event, "event details");

            if let Err(e) = self.handle_xevent(event) {
                error!(%e, "error handling event");
            }
            self.x.flush();

            if !self.state.running {
                return Ok(());
            }
        }
    }

    fn handle_xevent(&mut self, event: XEvent) -> Result<()> {
        use XEvent::*;

        let WindowManager {
            x,
            state,
            key_bindings,
            mouse_bindings,
        } = self;

        match event {
            ButtonPress(e) => handle::button_press(&e, mouse_bindings, state, x)?,
            ButtonRelease => (), // only meaningful inside drag pumps
            ClientMessage(m) => handle::client_message(&m, state, x)?,
            ConfigureNotify(e) if e.is_root => handle::root_geometry_changed(state, x)?,
            ConfigureNotify(_) => (),
            ConfigureRequest(e) => handle::configure_request(&e, state, x)?,
            Destroy(id) => handle::destroy(id, state, x)?,
            Enter(p) => handle::enter(&p, state, x)?,
            Expose(e) => handle::expose(&e, state, x)?,
            FocusIn(id) => handle::focus_in(id, state, x)?,
            KeyPress(code) => handle::key_press(code, key_bindings, state, x)?,
            MappingNotify { keyboard } => handle::mapping_notify(keyboard, state, x)?,
            MapRequest(id) => handle::map_request(id, state, x)?,
            MotionNotify(e) => handle::motion(&e, state, x)?,
            PropertyNotify(e) => handle::property_notify(&e, state, x)?,
            RandrNotify => handle::root_geometry_changed(state, x)?,
            UnmapNotify(e) => handle::unmap_notify(&e, state, x)?,
        }

        Ok(())
    }
}
