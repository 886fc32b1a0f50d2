//! Logic for interacting with the X server
use crate::{
    core::{bindings::{KeyCode, MouseState}, layout::LayoutCtx, State},
    pure::{geometry::{Point, Rect}, Client, TagMask},
    x::{atom::AUTO_FLOAT_WINDOW_TYPES, event::{ClientMessage, ClientMessageKind}, property::WmState},
    Result, Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

pub mod atom;
pub mod event;
pub mod property;

#[cfg(test)]
pub mod mock;

#[cfg(test)]
pub use mock::MockXConn;

pub use atom::Atom;
pub use event::XEvent;
pub use property::{Prop, SizeHints, WindowAttributes, WmHints};

/// On screen configuration options for X clients
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClientConfig {
    /// The border width in pixels
    BorderPx(u32),
    /// Absolute size and position on the screen as a [Rect]
    Position(Rect),
    /// Stack above the given sibling, or at the very top when `None`
    StackAbove(Option<Xid>),
    /// Stack below the given sibling, or at the very bottom when `None`
    StackBelow(Option<Xid>),
}

/// Attributes for an X11 client window
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientAttr {
    /// Border color as an argb hex value
    BorderColor(u32),
    /// Set the pre-defined client event mask
    ClientEventMask,
    /// Set the pre-defined root event mask
    RootEventMask,
}

/// A handle on a running X11 connection that we can use for issuing requests.
///
/// XConn is the contract between the window management state machine and the
/// display server: everything the manager needs from X is enumerated here and
/// nothing else is allowed to touch the wire. This is what lets the full
/// event handling logic run against [MockXConn] in tests.
pub trait XConn {
    /// The ID of the window manager root window.
    fn root(&self) -> Xid;
    /// Ask the X server for the dimensions of each currently available screen.
    fn screen_details(&self) -> Result<Vec<Rect>>;
    /// Ask the X server for the current (x, y) coordinate of the mouse cursor.
    fn cursor_position(&self) -> Result<Point>;

    /// Grab the specified key codes on the root window, intercepting them for
    /// processing within the window manager itself.
    fn grab_keys(&self, key_codes: &[KeyCode]) -> Result<()>;
    /// Update the button grabs installed on a client window.
    ///
    /// For a focused client only the given bound button states are grabbed;
    /// for an unfocused client every button is grabbed so that clicking the
    /// window can focus it.
    fn grab_buttons(&self, client: Xid, focused: bool, states: &[MouseState]) -> Result<()>;
    /// Release all button grabs held on a client window.
    fn ungrab_buttons(&self, client: Xid) -> Result<()>;
    /// Start a pointer grab for an interactive move / resize.
    fn grab_pointer(&self) -> Result<()>;
    /// Release the active pointer grab.
    fn ungrab_pointer(&self) -> Result<()>;
    /// Grab the whole server, stalling every other client.
    fn grab_server(&self) -> Result<()>;
    /// Release the server grab.
    fn ungrab_server(&self) -> Result<()>;

    /// Block and wait for the next event from the X server.
    fn next_event(&self) -> Result<XEvent>;
    /// Flush any pending requests to the X server.
    fn flush(&self);
    /// Flush and wait for every pending request to be processed.
    fn sync(&self) -> Result<()>;

    /// Look up the [Xid] of a given [Atom] name, interning it if needed.
    fn intern_atom(&self, atom: &str) -> Result<Xid>;
    /// Look up the string name of a given atom by its [Xid].
    fn atom_name(&self, xid: Xid) -> Result<String>;

    /// The current geometry and border width of a given client window.
    fn client_geometry(&self, client: Xid) -> Result<(Rect, u32)>;
    /// Ask the X server for the IDs of all current top-level windows.
    fn existing_clients(&self) -> Result<Vec<Xid>>;

    /// Map the given client window to the screen, making it visible.
    fn map(&self, client: Xid) -> Result<()>;
    /// Forcibly terminate the client (XKillClient).
    fn kill(&self, client: Xid) -> Result<()>;
    /// Set X input focus to be held by the given window.
    fn set_input_focus(&self, client: Xid) -> Result<()>;

    /// Look up a specific property on a given client window.
    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>>;
    /// Get the current ICCCM WM_STATE for a given client window.
    fn get_wm_state(&self, client: Xid) -> Result<Option<WmState>>;
    /// Request the [WindowAttributes] for a given client window.
    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes>;

    /// Set the current ICCCM WM_STATE for a given client window.
    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()>;
    /// Set a specific property on a given client window.
    fn set_prop(&self, client: Xid, name: &str, val: Prop) -> Result<()>;
    /// Delete a property from a given client window.
    fn delete_prop(&self, client: Xid, prop_name: &str) -> Result<()>;
    /// Set one or more [ClientAttr] for a given client window.
    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()>;
    /// Apply the given [ClientConfig] options to a client window.
    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()>;
    /// Send a [ClientMessage] to a given client.
    fn send_client_message(&self, msg: ClientMessage) -> Result<()>;
    /// Send a synthetic ConfigureNotify informing a client of its current
    /// geometry without moving it.
    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()>;

    /// Reposition the mouse cursor to the given coordinates within a window.
    fn warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()>;
}

/// The window management engine: every state transition with X visible side
/// effects is implemented here on top of the raw [XConn] operations.
///
/// Auto-implemented for all [XConn] impls.
pub trait XConnExt: XConn + Sized {
    /// Run a closure while holding a grab on the X server, releasing the
    /// grab on every exit path.
    ///
    /// Used around sequences that race against clients vanishing, such as
    /// restoring state in [XConnExt::unmanage] and force-killing clients.
    fn with_server_grab<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.grab_server()?;
        let res = f();
        if let Err(e) = self.sync() {
            debug!(%e, "sync while releasing server grab");
        }
        if let Err(e) = self.ungrab_server() {
            error!(%e, "unable to release server grab");
        }

        res
    }

    /// Begin managing a new client window.
    ///
    /// Reads the client's properties, applies the configured rules, clamps
    /// the window into its monitor, installs grabs and event masks, attaches
    /// it at the head of the monitor's orders and focuses it.
    fn manage(&self, id: Xid, state: &mut State<Self>) -> Result<()> {
        trace!(%id, "managing new client");
        let (r, original_border) = self.client_geometry(id)?;

        let mut c = Client::new(
            id,
            r,
            state.config.border_width,
            TagMask::EMPTY,
            state.monitor_set.focused_monitor_index(),
        );
        c.old_border_width = original_border;
        c.title = self.window_title(id)?;

        // transient windows inherit monitor and tags from their parent,
        // everything else goes through the rules
        let parent = self.transient_parent(id)?;
        match parent.and_then(|p| state.monitor_set.client(&p)) {
            Some(p) => {
                c.mon = p.mon;
                c.tags = p.tags;
                c.is_floating = true;
            }
            None => self.apply_rules(&mut c, state),
        }

        if let Some(Prop::SizeHints(hints)) = self.get_prop(id, Atom::WmNormalHints.as_ref())? {
            c.update_size_hints(hints);
        }
        if let Some(Prop::WmHints(hints)) = self.get_prop(id, Atom::WmHints.as_ref())? {
            c.never_focus = !hints.accepts_input;
            c.is_urgent = hints.urgent();
        }

        let (floating_type, fullscreen_requested) = self.window_type_flags(id)?;
        c.is_floating = c.is_floating || floating_type || c.is_fixed;

        // the window must end up within its monitor
        let m = state
            .monitor_set
            .monitor(c.mon)
            .ok_or(crate::Error::NoMonitors)?;
        clamp_into(&mut c, m.screen, m.work);

        self.set_client_config(id, &[ClientConfig::BorderPx(c.border_width)])?;
        self.set_client_attributes(
            id,
            &[
                ClientAttr::BorderColor(state.config.normal_border.argb_u32()),
                ClientAttr::ClientEventMask,
            ],
        )?;
        self.grab_buttons(id, false, &state.mouse_states)?;

        let mon = c.mon;
        state.monitor_set.insert(c);
        self.update_client_list(state)?;
        self.set_wm_state(id, WmState::Normal)?;
        self.map(id)?;

        if fullscreen_requested {
            self.set_fullscreen(id, true, state)?;
        }

        self.arrange(mon, state)?;
        self.focus(Some(id), state)
    }

    /// Stop managing a client, restoring its pre-management state on the
    /// server unless it has already been destroyed.
    fn unmanage(&self, id: Xid, destroyed: bool, state: &mut State<Self>) -> Result<()> {
        trace!(%id, destroyed, "removing client");
        let c = match state.monitor_set.remove(&id) {
            Some(c) => c,
            None => return Ok(()),
        };

        if !destroyed {
            // the client may vanish at any point in this sequence: hold the
            // server so property updates can not interleave with the
            // destroy, and swallow the errors from a lost race
            self.with_server_grab(|| {
                let border = ClientConfig::BorderPx(c.old_border_width);
                if let Err(e) = self.set_client_config(id, &[border]) {
                    debug!(%id, %e, "restoring border of unmanaged client");
                }
                if let Err(e) = self.ungrab_buttons(id) {
                    debug!(%id, %e, "ungrabbing buttons of unmanaged client");
                }
                if let Err(e) = self.set_wm_state(id, WmState::Withdrawn) {
                    debug!(%id, %e, "setting withdrawn state on unmanaged client");
                }

                Ok(())
            })?;
        }

        self.update_client_list(state)?;
        self.focus(None, state)?;
        let mon = c.mon.min(state.monitor_set.n_monitors() - 1);
        self.arrange(mon, state)
    }

    /// Adopt windows that already exist on the server, as found on startup.
    fn manage_existing_clients(&self, state: &mut State<Self>) -> Result<()> {
        for id in self.existing_clients()? {
            if state.monitor_set.contains(&id) {
                continue;
            }

            let attrs = match self.get_window_attributes(id) {
                Ok(attrs) => attrs,
                Err(_) => continue, // raced with the window closing
            };

            let viewable = attrs.map_state == property::MapState::Viewable;
            let iconic = self.get_wm_state(id)? == Some(WmState::Iconic);

            if !attrs.override_redirect && (viewable || iconic) {
                self.manage(id, state)?;
            }
        }

        Ok(())
    }

    /// Give focus to the given client, or to the most recently focused
    /// visible client of the focused monitor when `None`.
    ///
    /// Handles unfocusing the previous selection, promoting the new focus in
    /// its monitor's stack, border colors, button grab modes and the ICCCM /
    /// EWMH focus properties.
    fn focus(&self, target: Option<Xid>, state: &mut State<Self>) -> Result<()> {
        let target = target
            .filter(|id| state.monitor_set.is_visible(id))
            .or_else(|| state.monitor_set.top_of_stack(state.monitor_set.focused_monitor_index()));

        let prev = state.monitor_set.focused_monitor().sel;
        if prev.is_some() && prev != target {
            self.unfocus(prev.expect("is_some checked"), state)?;
        }

        match target {
            Some(id) => {
                state.monitor_set.focus_client(&id);
                if let Some(c) = state.monitor_set.client_mut(&id) {
                    c.is_urgent = false;
                }

                self.grab_buttons(id, true, &state.mouse_states)?;
                self.set_client_attributes(
                    id,
                    &[ClientAttr::BorderColor(state.config.focused_border.argb_u32())],
                )?;
                self.give_input_focus(id, state)?;
            }
            None => {
                state
                    .monitor_set
                    .clear_focus(state.monitor_set.focused_monitor_index());
                self.set_input_focus(self.root())?;
                self.delete_prop(self.root(), Atom::NetActiveWindow.as_ref())?;
            }
        }

        self.draw_bar(state.monitor_set.focused_monitor_index(), state)
    }

    /// Revert a client to its unfocused appearance and record it for
    /// focus-swap.
    fn unfocus(&self, id: Xid, state: &mut State<Self>) -> Result<()> {
        state.prev_focus = Some(id);
        self.grab_buttons(id, false, &state.mouse_states)?;
        self.set_client_attributes(
            id,
            &[ClientAttr::BorderColor(state.config.normal_border.argb_u32())],
        )
    }

    /// Set X input focus following the client's ICCCM input model.
    fn give_input_focus(&self, id: Xid, state: &mut State<Self>) -> Result<()> {
        let never_focus = state
            .monitor_set
            .client(&id)
            .map(|c| c.never_focus)
            .unwrap_or(false);

        if !never_focus {
            self.set_input_focus(id)?;
            self.set_prop(
                self.root(),
                Atom::NetActiveWindow.as_ref(),
                Prop::Window(vec![id]),
            )?;
        }

        if self.client_supports_protocol(id, Atom::WmTakeFocus.as_ref())? {
            let msg = ClientMessageKind::TakeFocus(id).as_message(self)?;
            self.send_client_message(msg)?;
        }

        Ok(())
    }

    /// Re-apply the active layout on the given monitor and restack it.
    fn arrange(&self, mon: usize, state: &mut State<Self>) -> Result<()> {
        self.show_hide(mon, state)?;

        let (work, mfact, nmaster, layout_idx) = match state.monitor_set.monitor(mon) {
            Some(m) => (m.work, m.mfact, m.nmaster, m.layout),
            None => return Ok(()),
        };

        let n_visible = state.monitor_set.visible_clients(mon).len();
        let tiled = state.monitor_set.tiled_clients(mon);
        let layout = &state.config.layouts[layout_idx % state.config.layouts.len()];

        let mut symbol = layout.symbol(n_visible);
        symbol.truncate(16);

        let positions = layout.arrange(&LayoutCtx {
            work,
            mfact,
            nmaster,
            gap_px: state.config.gap_px,
            clients: &tiled,
        });

        if let Some(m) = state.monitor_set.monitor_mut(mon) {
            m.lt_symbol = symbol;
        }

        if let Some(positions) = positions {
            for (id, outer) in positions {
                let border = state
                    .monitor_set
                    .client(&id)
                    .map(|c| c.border_width)
                    .unwrap_or(0);
                self.resize_client(id, outer.shrink_in(border), false, state)?;
            }
        }

        self.restack(mon, state)
    }

    /// Arrange every monitor.
    fn arrange_all(&self, state: &mut State<Self>) -> Result<()> {
        for mon in 0..state.monitor_set.n_monitors() {
            self.arrange(mon, state)?;
        }

        Ok(())
    }

    /// Re-focus and re-arrange after a change to the visible set.
    fn refresh(&self, state: &mut State<Self>) -> Result<()> {
        self.focus(None, state)?;
        self.arrange(state.monitor_set.focused_monitor_index(), state)
    }

    /// Move visible clients on screen (top of stack first) and park hidden
    /// ones off screen (bottom of stack first).
    ///
    /// Iterating the stack top-down for the show pass and bottom-up for the
    /// hide pass means newly exposed windows paint before the windows they
    /// were covering move away.
    fn show_hide(&self, mon: usize, state: &mut State<Self>) -> Result<()> {
        let stack = match state.monitor_set.monitor(mon) {
            Some(m) => m.stack.clone(),
            None => return Ok(()),
        };

        for id in stack.iter().filter(|id| state.monitor_set.is_visible(id)) {
            let r = state.monitor_set.client(id).expect("stacked client in arena").rect;
            self.set_client_config(*id, &[ClientConfig::Position(r)])?;
        }

        for id in stack.iter().rev().filter(|id| !state.monitor_set.is_visible(id)) {
            let c = state.monitor_set.client(id).expect("stacked client in arena");
            let hidden = Rect {
                x: -2 * c.outer_w() as i32,
                ..c.rect
            };
            self.set_client_config(*id, &[ClientConfig::Position(hidden)])?;
        }

        Ok(())
    }

    /// Restore the stacking order of a monitor: the selected client is
    /// raised if it floats, and all visible tiled clients are chained below
    /// the monitor's bar window.
    fn restack(&self, mon: usize, state: &mut State<Self>) -> Result<()> {
        self.draw_bar(mon, state)?;

        let m = match state.monitor_set.monitor(mon) {
            Some(m) => m,
            None => return Ok(()),
        };
        let sel = match m.sel {
            Some(sel) => sel,
            None => return Ok(()),
        };

        let floating_layout =
            state.config.layouts[m.layout % state.config.layouts.len()].is_floating();
        let sel_floating = state
            .monitor_set
            .client(&sel)
            .map(|c| c.is_floating)
            .unwrap_or(false);

        if sel_floating || floating_layout {
            self.set_client_config(sel, &[ClientConfig::StackAbove(None)])?;
        }

        if !floating_layout {
            let m = state.monitor_set.monitor(mon).expect("checked above");
            let mut sibling = m.bar.win;
            let tiled: Vec<Xid> = m
                .stack
                .iter()
                .filter(|id| {
                    state.monitor_set.is_visible(id)
                        && !state.monitor_set.client(id).map(|c| c.is_floating).unwrap_or(true)
                })
                .copied()
                .collect();

            for id in tiled {
                self.set_client_config(id, &[ClientConfig::StackBelow(sibling)])?;
                sibling = Some(id);
            }
        }

        Ok(())
    }

    /// Ask the bar collaborator to redraw the bar on the given monitor.
    fn draw_bar(&self, mon: usize, state: &mut State<Self>) -> Result<()> {
        let mut hook = state.config.bar_hook.take();
        if let Some(ref mut h) = hook {
            if let Err(e) = h.draw_bar(mon, state, self) {
                warn!(%e, mon, "error returned from bar hook");
            }
        }
        state.config.bar_hook = hook;

        Ok(())
    }

    /// Resize a client applying its size hint constraints first.
    ///
    /// `r` is the target inner geometry (border excluded). No X request is
    /// issued if the constrained geometry matches the current one.
    fn resize_client(
        &self,
        id: Xid,
        r: Rect,
        interactive: bool,
        state: &mut State<Self>,
    ) -> Result<()> {
        let (c, work) = match state.monitor_set.client(&id) {
            Some(c) => (
                c.clone(),
                state
                    .monitor_set
                    .monitor(c.mon)
                    .map(|m| m.work)
                    .unwrap_or_default(),
            ),
            None => return Ok(()),
        };

        let floating_layout = state
            .monitor_set
            .monitor(c.mon)
            .map(|m| state.config.layouts[m.layout % state.config.layouts.len()].is_floating())
            .unwrap_or(false);

        let screen = screen_union(state);
        let (new, changed) = c.apply_size_hints(r, screen, work, interactive, floating_layout);

        if changed {
            self.resize_client_unchecked(id, new, state)?;
        }

        Ok(())
    }

    /// Resize a client bypassing size hints (fullscreen and layout-internal
    /// moves).
    fn resize_client_unchecked(&self, id: Xid, r: Rect, state: &mut State<Self>) -> Result<()> {
        let border = match state.monitor_set.client_mut(&id) {
            Some(c) => {
                c.prev_rect = c.rect;
                c.rect = r;
                c.border_width
            }
            None => return Ok(()),
        };

        self.set_client_config(
            id,
            &[ClientConfig::Position(r), ClientConfig::BorderPx(border)],
        )
    }

    /// Put a client into or out of the EWMH fullscreen state.
    fn set_fullscreen(&self, id: Xid, fullscreen: bool, state: &mut State<Self>) -> Result<()> {
        let c = match state.monitor_set.client(&id) {
            Some(c) => c.clone(),
            None => return Ok(()),
        };

        if fullscreen && !c.is_fullscreen {
            self.set_prop(
                id,
                Atom::NetWmState.as_ref(),
                Prop::Atom(vec![Atom::NetWmStateFullscreen.as_ref().to_owned()]),
            )?;

            let screen = state
                .monitor_set
                .monitor(c.mon)
                .map(|m| m.screen)
                .unwrap_or_default();

            {
                let c = state.monitor_set.client_mut(&id).expect("cloned above");
                c.is_fullscreen = true;
                c.old_state = c.is_floating;
                c.old_border_width = c.border_width;
                c.border_width = 0;
                c.is_floating = true;
            }

            self.resize_client_unchecked(id, screen, state)?;
            self.set_client_config(id, &[ClientConfig::StackAbove(None)])
        } else if !fullscreen && c.is_fullscreen {
            self.set_prop(id, Atom::NetWmState.as_ref(), Prop::Atom(vec![]))?;

            let (restored, border, mon) = {
                let c = state.monitor_set.client_mut(&id).expect("cloned above");
                c.is_fullscreen = false;
                c.is_floating = c.old_state;
                c.border_width = c.old_border_width;
                c.rect = c.prev_rect;
                (c.rect, c.border_width, c.mon)
            };

            self.set_client_config(
                id,
                &[
                    ClientConfig::Position(restored),
                    ClientConfig::BorderPx(border),
                ],
            )?;
            self.arrange(mon, state)
        } else {
            Ok(())
        }
    }

    /// Close a client: politely via WM_DELETE_WINDOW when supported, with
    /// XKillClient under a server grab otherwise.
    fn kill_client(&self, id: Xid) -> Result<()> {
        if self.client_supports_protocol(id, Atom::WmDeleteWindow.as_ref())? {
            let msg = ClientMessageKind::DeleteWindow(id).as_message(self)?;
            self.send_client_message(msg)
        } else {
            self.with_server_grab(|| {
                if let Err(e) = self.kill(id) {
                    debug!(%id, %e, "killing client");
                }

                Ok(())
            })
        }
    }

    /// Rewrite the root _NET_CLIENT_LIST to the current managed set.
    fn update_client_list(&self, state: &State<Self>) -> Result<()> {
        self.set_prop(
            self.root(),
            Atom::NetClientList.as_ref(),
            Prop::Window(state.monitor_set.client_list()),
        )
    }

    /// Warp the pointer to the stored position for the given monitor.
    fn warp_to_monitor(&self, mon: usize, state: &State<Self>) -> Result<()> {
        if let Some(m) = state.monitor_set.monitor(mon) {
            let Point { x, y } = m.last_pointer;
            self.warp_pointer(self.root(), x as i16, y as i16)?;
        }

        Ok(())
    }

    // property helpers

    /// Request the title of a given client window following EWMH / ICCCM
    /// conventions.
    fn window_title(&self, id: Xid) -> Result<String> {
        let first_string = |p: Option<Prop>| match p {
            Some(Prop::UTF8String(mut strs)) if !strs.is_empty() => Some(strs.remove(0)),
            _ => None,
        };

        match first_string(self.get_prop(id, Atom::NetWmName.as_ref())?) {
            Some(s) => Ok(s),
            None => Ok(first_string(self.get_prop(id, Atom::WmName.as_ref())?).unwrap_or_default()),
        }
    }

    /// The (class, instance) pair from WM_CLASS, empty strings when unset.
    fn window_class(&self, id: Xid) -> Result<(String, String)> {
        match self.get_prop(id, Atom::WmClass.as_ref())? {
            Some(Prop::UTF8String(strs)) if strs.len() >= 2 => {
                Ok((strs[1].clone(), strs[0].clone()))
            }
            _ => Ok((String::new(), String::new())),
        }
    }

    /// The managed parent of this window from WM_TRANSIENT_FOR, if any.
    fn transient_parent(&self, id: Xid) -> Result<Option<Xid>> {
        match self.get_prop(id, Atom::WmTransientFor.as_ref())? {
            Some(Prop::Window(ids)) => Ok(ids.first().copied()),
            _ => Ok(None),
        }
    }

    /// Check whether a given client window supports a particular protocol.
    fn client_supports_protocol(&self, id: Xid, proto: &str) -> Result<bool> {
        match self.get_prop(id, Atom::WmProtocols.as_ref())? {
            Some(Prop::Atom(protocols)) => Ok(protocols.iter().any(|p| p == proto)),
            _ => Ok(false),
        }
    }

    /// Inspect _NET_WM_WINDOW_TYPE and _NET_WM_STATE for a window, returning
    /// (should float, wants fullscreen).
    fn window_type_flags(&self, id: Xid) -> Result<(bool, bool)> {
        let float_types: Vec<&str> = AUTO_FLOAT_WINDOW_TYPES.iter().map(|a| a.as_ref()).collect();

        let floating = match self.get_prop(id, Atom::NetWmWindowType.as_ref())? {
            Some(Prop::Atom(atoms)) => atoms.iter().any(|a| float_types.contains(&a.as_str())),
            _ => false,
        };

        let fullscreen = match self.get_prop(id, Atom::NetWmState.as_ref())? {
            Some(Prop::Atom(atoms)) => atoms
                .iter()
                .any(|a| a == Atom::NetWmStateFullscreen.as_ref()),
            _ => false,
        };

        Ok((floating, fullscreen))
    }

    /// Match a new client against the configured rules, applying every rule
    /// that matches in order.
    fn apply_rules(&self, c: &mut Client, state: &State<Self>) {
        let (class, instance) = match self.window_class(c.id) {
            Ok(pair) => pair,
            Err(_) => return,
        };

        for rule in &state.config.rules {
            if rule.matches(&class, &instance, &c.title) {
                c.tags |= rule.tags;
                c.is_floating = c.is_floating || rule.floating;
                c.obeys_size_hints = rule.obeys_size_hints;
                if let Some(mon) = rule.monitor {
                    if mon < state.monitor_set.n_monitors() {
                        c.mon = mon;
                    }
                }
            }
        }

        debug!(
            id = %c.id, %class, %instance, tags = %c.tags,
            floating = c.is_floating, mon = c.mon, "applied rules"
        );
    }
}

// Auto impl XConnExt for all XConn impls
impl<T> XConnExt for T where T: XConn {}

// The bounding box around every monitor, used for interactive clamping.
fn screen_union<X: XConn>(state: &State<X>) -> Rect {
    let mut it = state.monitor_set.monitors();
    let first = match it.next() {
        Some(m) => m.screen,
        None => return Rect::default(),
    };

    it.fold(first, |acc, m| {
        let x = acc.x.min(m.screen.x);
        let y = acc.y.min(m.screen.y);
        let right = acc.right().max(m.screen.right());
        let bottom = acc.bottom().max(m.screen.bottom());

        Rect::new(x, y, (right - x) as u32, (bottom - y) as u32)
    })
}

// Pull a freshly managed client fully inside its monitor.
fn clamp_into(c: &mut Client, screen: Rect, work: Rect) {
    let (ow, oh) = (c.rect.w + 2 * c.border_width, c.rect.h + 2 * c.border_width);
    let r = &mut c.rect;

    if r.x + ow as i32 > screen.right() {
        r.x = screen.right() - ow as i32;
    }
    if r.y + oh as i32 > screen.bottom() {
        r.y = screen.bottom() - oh as i32;
    }
    r.x = r.x.max(work.x);
    r.y = r.y.max(work.y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Config, Rule, State},
        pure::{monitor::MonitorDefaults, MonitorSet},
    };
    use simple_test_case::test_case;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingConn {
        configs: RefCell<Vec<(Xid, Vec<ClientConfig>)>>,
    }

    impl MockXConn for RecordingConn {
        fn mock_set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
            self.configs.borrow_mut().push((client, data.to_vec()));
            Ok(())
        }

        fn mock_set_prop(&self, _: Xid, _: &str, _: Prop) -> Result<()> {
            Ok(())
        }

        fn mock_set_client_attributes(&self, _: Xid, _: &[ClientAttr]) -> Result<()> {
            Ok(())
        }

        fn mock_grab_buttons(&self, _: Xid, _: bool, _: &[MouseState]) -> Result<()> {
            Ok(())
        }

        fn mock_set_input_focus(&self, _: Xid) -> Result<()> {
            Ok(())
        }

        fn mock_delete_prop(&self, _: Xid, _: &str) -> Result<()> {
            Ok(())
        }

        fn mock_get_prop(&self, _: Xid, _: &str) -> Result<Option<Prop>> {
            Ok(None)
        }
    }

    fn test_state<X: XConn>() -> State<X> {
        let monitor_set = MonitorSet::try_new(
            MonitorDefaults::default(),
            9,
            TagMask::EMPTY,
            vec![Rect::new(0, 0, 1920, 1080)],
        )
        .unwrap();

        State::new_for_tests(Config::default(), monitor_set)
    }

    fn add_client(state: &mut State<RecordingConn>, id: u32, floating: bool) {
        let tags = state.monitor_set.focused_monitor().active_tag_set();
        let mut c = Client::new(Xid(id), Rect::new(10, 30, 400, 300), 2, tags, 0);
        c.is_floating = floating;
        state.monitor_set.insert(c);
        state.monitor_set.focus_client(&Xid(id));
    }

    #[test]
    fn arrange_tiles_visible_clients() {
        let x = RecordingConn::default();
        let mut state = test_state();
        add_client(&mut state, 1, false);
        add_client(&mut state, 2, false);

        x.arrange(0, &mut state).unwrap();

        // both clients were given tiled positions
        let configs = x.configs.borrow();
        let positioned: Vec<Xid> = configs
            .iter()
            .filter(|(_, cfg)| cfg.iter().any(|c| matches!(c, ClientConfig::Position(_))))
            .map(|(id, _)| *id)
            .collect();

        assert!(positioned.contains(&Xid(1)));
        assert!(positioned.contains(&Xid(2)));
    }

    #[test]
    fn arrange_updates_the_layout_symbol() {
        let x = RecordingConn::default();
        let mut state = test_state();
        add_client(&mut state, 1, false);

        x.arrange(0, &mut state).unwrap();

        assert_eq!(state.monitor_set.monitor(0).unwrap().lt_symbol, "[]=");
    }

    #[test]
    fn fullscreen_round_trip_restores_geometry() {
        let x = RecordingConn::default();
        let mut state = test_state();
        add_client(&mut state, 1, false);
        let before = state.monitor_set.client(&Xid(1)).unwrap().clone();

        x.set_fullscreen(Xid(1), true, &mut state).unwrap();

        {
            let c = state.monitor_set.client(&Xid(1)).unwrap();
            assert!(c.is_fullscreen);
            assert!(c.is_floating);
            assert_eq!(c.border_width, 0);
            assert_eq!(c.rect, Rect::new(0, 0, 1920, 1080));
        }

        x.set_fullscreen(Xid(1), false, &mut state).unwrap();

        let c = state.monitor_set.client(&Xid(1)).unwrap();
        assert!(!c.is_fullscreen);
        assert_eq!(c.is_floating, before.is_floating);
        assert_eq!(c.border_width, before.border_width);
        assert_eq!(c.rect, before.rect);
    }

    #[test]
    fn focus_promotes_target_in_stack() {
        let x = RecordingConn::default();
        let mut state = test_state();
        add_client(&mut state, 1, false);
        add_client(&mut state, 2, false);

        x.focus(Some(Xid(1)), &mut state).unwrap();

        let m = state.monitor_set.focused_monitor();
        assert_eq!(m.sel, Some(Xid(1)));
        assert_eq!(m.stack[0], Xid(1));
        assert_eq!(state.prev_focus, Some(Xid(2)));
    }

    #[test]
    fn hidden_clients_are_parked_off_screen() {
        let x = RecordingConn::default();
        let mut state = test_state();
        add_client(&mut state, 1, false);
        state.monitor_set.client_mut(&Xid(1)).unwrap().tags = TagMask(0b10);

        x.show_hide(0, &mut state).unwrap();

        let configs = x.configs.borrow();
        let (_, cfg) = configs.iter().find(|(id, _)| *id == Xid(1)).unwrap();
        match cfg[0] {
            ClientConfig::Position(r) => assert!(r.x < 0),
            ref other => panic!("expected Position, got {other:?}"),
        }
    }

    #[test_case("term", "", "", true; "class substring")]
    #[test_case("", "xterm-inst", "", true; "instance substring")]
    #[test_case("", "", "scratch", true; "title substring")]
    #[test_case("gimp", "", "", false; "non matching")]
    #[test]
    fn rule_matching(class: &str, instance: &str, title: &str, expected: bool) {
        let rule = Rule {
            class: some_if(class),
            instance: some_if(instance),
            title: some_if(title),
            tags: TagMask::EMPTY,
            floating: true,
            monitor: None,
            obeys_size_hints: true,
        };

        assert_eq!(rule.matches("xterm", "xterm-inst", "scratchpad"), expected);
    }

    fn some_if(s: &str) -> Option<String> {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    }
}
