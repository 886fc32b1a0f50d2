//! API wrapper for talking to the X server using x11rb
use crate::{
    core::bindings::{KeyCode, MouseState},
    pure::geometry::{Point, Rect},
    x::{
        atom::EWMH_SUPPORTED_ATOMS,
        event::{ClientEventMask, XEvent},
        property::{
            MapState, Prop, SizeHints, WindowAttributes, WindowClass as WinClass, WmHints, WmState,
        },
        Atom, ClientAttr, ClientConfig, XConn,
    },
    Error, Result, Xid,
};
use std::{collections::HashMap, str::FromStr};
use tracing::{trace, warn};
use x11rb::{
    connection::{Connection, RequestConnection},
    protocol::{
        randr::{self, ConnectionExt as _},
        xinerama::ConnectionExt as _,
        xproto::{
            AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
            ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux,
            EventMask, GrabMode, InputFocus, ModMask, PropMode, StackMode,
            WindowClass, CONFIGURE_NOTIFY_EVENT,
        },
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

use super::event::convert_event;

const WM_NAME: &str = "tatami";

// The mask of events selected on the root window as the WM
fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::POINTER_MOTION
        | EventMask::ENTER_WINDOW
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::PROPERTY_CHANGE
}

// The mask of events selected on newly managed client windows
fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW
        | EventMask::FOCUS_CHANGE
        | EventMask::PROPERTY_CHANGE
        | EventMask::STRUCTURE_NOTIFY
}

// numlock and capslock alter the modifier mask when active and need to be
// stripped before matching against bindings
pub(super) const NUMLOCK: u16 = 1 << 4;
pub(super) const CAPSLOCK: u16 = 1 << 1;

// grabs are installed for every combination of the ignored modifiers
const IGNORED_MOD_COMBOS: [u16; 4] = [0, CAPSLOCK, NUMLOCK, NUMLOCK | CAPSLOCK];

/// Handles communication with an X server via x11rb.
pub struct RustConn {
    conn: RustConnection,
    root: Xid,
    check_win: Xid,
    atoms: HashMap<Atom, u32>,
    xinerama_active: bool,
}

impl std::fmt::Debug for RustConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustConn")
            .field("root", &self.root)
            .field("check_win", &self.check_win)
            .field("xinerama_active", &self.xinerama_active)
            .finish()
    }
}

impl RustConn {
    /// Establish a new connection to the running X server, selecting for
    /// substructure redirection on the root window.
    ///
    /// # Errors
    /// Errors with [Error::WmAlreadyRunning] if another window manager holds
    /// the substructure redirect selection on the root window.
    pub fn new() -> Result<Self> {
        let (conn, screen_idx) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen_idx].root;

        // becoming the window manager: only one client may select
        // SubstructureRedirect on the root
        let aux = ChangeWindowAttributesAux::new().event_mask(root_event_mask());
        let res = conn.change_window_attributes(root, &aux)?.check();
        if let Err(x11rb::errors::ReplyError::X11Error(ref e)) = res {
            if e.error_kind == x11rb::protocol::ErrorKind::Access {
                return Err(Error::WmAlreadyRunning);
            }
        }
        res.map_err(Error::from)?;

        // send all InternAtom requests before fetching any of the replies
        use strum::IntoEnumIterator;
        let cookies: Vec<_> = Atom::iter()
            .map(|a| (a, conn.intern_atom(false, a.as_ref().as_bytes())))
            .collect();
        let mut atoms = HashMap::new();
        for (a, cookie) in cookies {
            atoms.insert(a, cookie?.reply()?.atom);
        }

        let xinerama_active = conn
            .xinerama_is_active()
            .ok()
            .and_then(|c| c.reply().ok())
            .map(|r| r.state != 0)
            .unwrap_or(false);

        if conn.extension_information(randr::X11_EXTENSION_NAME)?.is_some() {
            let mask = randr::NotifyMask::OUTPUT_CHANGE
                | randr::NotifyMask::CRTC_CHANGE
                | randr::NotifyMask::SCREEN_CHANGE;
            conn.randr_select_input(root, mask)?;
        }

        let check_win = conn.generate_id()?;
        let aux = CreateWindowAux::new().override_redirect(1);
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_win,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &aux,
        )?;

        let this = Self {
            conn,
            root: Xid(root),
            check_win: Xid(check_win),
            atoms,
            xinerama_active,
        };

        this.set_ewmh_properties()?;
        this.conn.flush()?;

        Ok(this)
    }

    fn known_atom(&self, atom: Atom) -> u32 {
        // every Atom variant is interned in `new`
        *self.atoms.get(&atom).expect("atom to have been interned")
    }

    pub(super) fn atom_id_to_name(&self, id: u32) -> Option<String> {
        // known atoms first to save the round trip
        if let Some(a) = self.atoms.iter().find(|(_, &v)| v == id).map(|(a, _)| *a) {
            return Some(a.as_ref().to_string());
        }

        self.conn
            .get_atom_name(id)
            .ok()
            .and_then(|c| c.reply().ok())
            .and_then(|r| String::from_utf8(r.name).ok())
    }

    pub(super) fn root_id(&self) -> u32 {
        *self.root
    }

    // Advertise EWMH support and the check window linking back to us
    fn set_ewmh_properties(&self) -> Result<()> {
        let check = self.known_atom(Atom::NetSupportingWmCheck);
        let utf8 = self.known_atom(Atom::UTF8String);
        let net_wm_name = self.known_atom(Atom::NetWmName);

        for &win in [*self.check_win, *self.root].iter() {
            self.conn.change_property32(
                PropMode::REPLACE,
                win,
                check,
                AtomEnum::WINDOW,
                &[*self.check_win],
            )?;
            self.conn.change_property8(
                PropMode::REPLACE,
                win,
                net_wm_name,
                utf8,
                WM_NAME.as_bytes(),
            )?;
        }

        let supported: Vec<u32> = EWMH_SUPPORTED_ATOMS
            .iter()
            .map(|a| self.known_atom(*a))
            .collect();
        self.conn.change_property32(
            PropMode::REPLACE,
            *self.root,
            self.known_atom(Atom::NetSupported),
            AtomEnum::ATOM,
            &supported,
        )?;

        self.conn
            .delete_property(*self.root, self.known_atom(Atom::NetClientList))?;

        Ok(())
    }

    fn prop_reply_to_prop(
        &self,
        name: &str,
        r: x11rb::protocol::xproto::GetPropertyReply,
    ) -> Result<Option<Prop>> {
        if r.format == 0 || r.value.is_empty() {
            return Ok(None);
        }

        let value32 = || -> Vec<u32> {
            r.value32().map(|it| it.collect()).unwrap_or_default()
        };

        if name == Atom::WmNormalHints.as_ref() {
            return Ok(Some(Prop::SizeHints(SizeHints::try_from_bytes(
                &value32(),
            )?)));
        }
        if name == Atom::WmHints.as_ref() {
            return Ok(Some(Prop::WmHints(WmHints::try_from_bytes(&value32())?)));
        }

        let prop = if r.type_ == u32::from(AtomEnum::ATOM) {
            let names = value32()
                .into_iter()
                .filter_map(|id| self.atom_id_to_name(id))
                .collect();
            Prop::Atom(names)
        } else if r.type_ == u32::from(AtomEnum::WINDOW) {
            Prop::Window(value32().into_iter().map(Xid).collect())
        } else if r.type_ == u32::from(AtomEnum::CARDINAL) {
            Prop::Cardinal(value32())
        } else if r.type_ == u32::from(AtomEnum::STRING)
            || r.type_ == self.known_atom(Atom::UTF8String)
        {
            let strs = r
                .value
                .split(|&b| b == 0)
                .filter(|s| !s.is_empty())
                .map(|s| String::from_utf8_lossy(s).to_string())
                .collect();
            Prop::UTF8String(strs)
        } else {
            Prop::Bytes(value32())
        };

        Ok(Some(prop))
    }
}

impl XConn for RustConn {
    fn root(&self) -> Xid {
        self.root
    }

    fn screen_details(&self) -> Result<Vec<Rect>> {
        if self.xinerama_active {
            let screens = self.conn.xinerama_query_screens()?.reply()?.screen_info;
            let rects: Vec<Rect> = screens
                .into_iter()
                .map(|s| {
                    Rect::new(
                        s.x_org as i32,
                        s.y_org as i32,
                        s.width as u32,
                        s.height as u32,
                    )
                })
                .collect();

            if !rects.is_empty() {
                return Ok(rects);
            }
        }

        // no Xinerama: treat the root window as a single monitor
        let geo = self.conn.get_geometry(*self.root)?.reply()?;

        Ok(vec![Rect::new(
            geo.x as i32,
            geo.y as i32,
            geo.width as u32,
            geo.height as u32,
        )])
    }

    fn cursor_position(&self) -> Result<Point> {
        let reply = self.conn.query_pointer(*self.root)?.reply()?;

        Ok(Point::new(reply.root_x as i32, reply.root_y as i32))
    }

    fn grab_keys(&self, key_codes: &[KeyCode]) -> Result<()> {
        self.conn.ungrab_key(0, *self.root, ModMask::ANY)?;

        for k in key_codes {
            for &m in IGNORED_MOD_COMBOS.iter() {
                self.conn.grab_key(
                    false, // don't pass grabbed events through to the client
                    *self.root,
                    ModMask::from(k.mask | m),
                    k.code,
                    GrabMode::ASYNC, // don't lock the pointer input while grabbing
                    GrabMode::ASYNC, // don't lock the keyboard input while grabbing
                )?;
            }
        }

        self.conn.flush()?;

        Ok(())
    }

    fn grab_buttons(&self, client: Xid, focused: bool, states: &[MouseState]) -> Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, *client, ModMask::ANY)?;

        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;

        if focused {
            for state in states {
                for &m in IGNORED_MOD_COMBOS.iter() {
                    self.conn.grab_button(
                        false,
                        *client,
                        mask,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                        x11rb::NONE,
                        x11rb::NONE,
                        ButtonIndex::from(state.button()),
                        ModMask::from(state.mask() | m),
                    )?;
                }
            }
        } else {
            // grab everything so that a click anywhere can focus the client
            self.conn.grab_button(
                false,
                *client,
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }

        Ok(())
    }

    fn ungrab_buttons(&self, client: Xid) -> Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, *client, ModMask::ANY)?;

        Ok(())
    }

    fn grab_pointer(&self) -> Result<()> {
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION;

        self.conn
            .grab_pointer(
                false,
                *self.root,
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )?
            .reply()?;

        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;

        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server()?.check()?;

        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server()?.check()?;

        Ok(())
    }

    fn next_event(&self) -> Result<XEvent> {
        loop {
            let event = self.conn.wait_for_event()?;

            match convert_event(self, event)? {
                Some(event) => {
                    trace!(%event, "event from server");
                    return Ok(event);
                }
                None => continue,
            }
        }
    }

    fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            warn!(%e, "unable to flush connection");
        }
    }

    fn sync(&self) -> Result<()> {
        // a zero-information round trip drains the request pipeline
        self.conn.get_input_focus()?.reply()?;

        Ok(())
    }

    fn intern_atom(&self, atom: &str) -> Result<Xid> {
        if let Ok(known) = Atom::from_str(atom) {
            return Ok(Xid(self.known_atom(known)));
        }

        let id = self
            .conn
            .intern_atom(false, atom.as_bytes())?
            .reply()?
            .atom;

        Ok(Xid(id))
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        self.atom_id_to_name(*xid)
            .ok_or_else(|| Error::Custom(format!("{xid} is not a known atom")))
    }

    fn client_geometry(&self, client: Xid) -> Result<(Rect, u32)> {
        let geo = self.conn.get_geometry(*client)?.reply()?;
        let r = Rect::new(geo.x as i32, geo.y as i32, geo.width as u32, geo.height as u32);

        Ok((r, geo.border_width as u32))
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        let reply = self.conn.query_tree(*self.root)?.reply()?;

        Ok(reply.children.into_iter().map(Xid).collect())
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.conn.map_window(*client)?;

        Ok(())
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.conn.kill_client(*client)?.check()?;

        Ok(())
    }

    fn set_input_focus(&self, client: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, *client, x11rb::CURRENT_TIME)?;

        Ok(())
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        let atom = *self.intern_atom(prop_name)?;
        let r = self
            .conn
            .get_property(false, *client, atom, AtomEnum::ANY, 0, 1024)?
            .reply()?;

        self.prop_reply_to_prop(prop_name, r)
    }

    fn get_wm_state(&self, client: Xid) -> Result<Option<WmState>> {
        let wm_state = self.known_atom(Atom::WmState);
        let r = self
            .conn
            .get_property(false, *client, wm_state, wm_state, 0, 2)?
            .reply()?;

        match r.value32().and_then(|mut it| it.next()) {
            Some(raw) => Ok(WmState::try_from(raw).ok()),
            None => Ok(None),
        }
    }

    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes> {
        let reply = self.conn.get_window_attributes(*client)?.reply()?;

        let map_state = match reply.map_state {
            x11rb::protocol::xproto::MapState::UNMAPPED => MapState::Unmapped,
            x11rb::protocol::xproto::MapState::UNVIEWABLE => MapState::UnViewable,
            _ => MapState::Viewable,
        };
        let window_class = match reply.class {
            x11rb::protocol::xproto::WindowClass::INPUT_OUTPUT => WinClass::InputOutput,
            x11rb::protocol::xproto::WindowClass::INPUT_ONLY => WinClass::InputOnly,
            _ => WinClass::CopyFromParent,
        };

        Ok(WindowAttributes::new(
            reply.override_redirect,
            map_state,
            window_class,
        ))
    }

    fn set_wm_state(&self, client: Xid, wm_state: WmState) -> Result<()> {
        let state = self.known_atom(Atom::WmState);
        let data: [u32; 2] = [wm_state.into(), x11rb::NONE];
        self.conn
            .change_property32(PropMode::REPLACE, *client, state, state, &data)?;

        Ok(())
    }

    fn set_prop(&self, client: Xid, name: &str, val: Prop) -> Result<()> {
        let atom = *self.intern_atom(name)?;

        match val {
            Prop::Atom(names) => {
                let mut data = Vec::with_capacity(names.len());
                for name in names.iter() {
                    data.push(*self.intern_atom(name)?);
                }
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *client,
                    atom,
                    AtomEnum::ATOM,
                    &data,
                )?;
            }

            Prop::Cardinal(vals) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *client,
                    atom,
                    AtomEnum::CARDINAL,
                    &vals,
                )?;
            }

            Prop::Window(ids) => {
                let data: Vec<u32> = ids.iter().map(|id| **id).collect();
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *client,
                    atom,
                    AtomEnum::WINDOW,
                    &data,
                )?;
            }

            Prop::UTF8String(strs) => {
                self.conn.change_property8(
                    PropMode::REPLACE,
                    *client,
                    atom,
                    self.known_atom(Atom::UTF8String),
                    strs.join("\0").as_bytes(),
                )?;
            }

            Prop::Bytes(_) | Prop::WmHints(_) | Prop::SizeHints(_) => {
                return Err(Error::Custom(format!(
                    "unable to set '{name}' property: unsupported prop type"
                )))
            }
        }

        Ok(())
    }

    fn delete_prop(&self, client: Xid, prop_name: &str) -> Result<()> {
        let atom = *self.intern_atom(prop_name)?;
        self.conn.delete_property(*client, atom)?;

        Ok(())
    }

    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        let mut aux = ChangeWindowAttributesAux::new();
        for attr in attrs {
            aux = match attr {
                ClientAttr::BorderColor(argb) => aux.border_pixel(*argb),
                ClientAttr::ClientEventMask => aux.event_mask(client_event_mask()),
                ClientAttr::RootEventMask => aux.event_mask(root_event_mask()),
            };
        }

        self.conn.change_window_attributes(*client, &aux)?;

        Ok(())
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        let mut aux = ConfigureWindowAux::new();
        for conf in data {
            aux = match conf {
                ClientConfig::BorderPx(px) => aux.border_width(*px),
                ClientConfig::Position(r) => aux
                    .x(r.x)
                    .y(r.y)
                    .width(r.w.max(1))
                    .height(r.h.max(1)),
                ClientConfig::StackAbove(sibling) => {
                    let aux = aux.stack_mode(StackMode::ABOVE);
                    match sibling {
                        Some(s) => aux.sibling(**s),
                        None => aux,
                    }
                }
                ClientConfig::StackBelow(sibling) => {
                    let aux = aux.stack_mode(StackMode::BELOW);
                    match sibling {
                        Some(s) => aux.sibling(**s),
                        None => aux,
                    }
                }
            };
        }

        self.conn.configure_window(*client, &aux)?;

        Ok(())
    }

    fn send_client_message(&self, msg: crate::x::event::ClientMessage) -> Result<()> {
        let type_ = *self.intern_atom(&msg.dtype)?;
        let mut data = [0u32; 5];
        for (i, v) in msg.data.iter().take(5).enumerate() {
            data[i] = *v;
        }

        let event = ClientMessageEvent::new(32, *msg.id, type_, data);
        let mask = match msg.mask {
            ClientEventMask::NoEventMask => EventMask::NO_EVENT,
            ClientEventMask::StructureNotify => EventMask::STRUCTURE_NOTIFY,
            ClientEventMask::SubstructureNotify => EventMask::SUBSTRUCTURE_NOTIFY,
        };

        self.conn.send_event(false, *msg.id, mask, event)?;

        Ok(())
    }

    fn send_configure_notify(&self, client: Xid, r: Rect, border: u32) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: *client,
            window: *client,
            above_sibling: x11rb::NONE,
            x: r.x as i16,
            y: r.y as i16,
            width: r.w as u16,
            height: r.h as u16,
            border_width: border as u16,
            override_redirect: false,
        };

        self.conn
            .send_event(false, *client, EventMask::STRUCTURE_NOTIFY, event)?;

        Ok(())
    }

    fn warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()> {
        self.conn
            .warp_pointer(x11rb::NONE, *id, 0, 0, 0, 0, x, y)?;

        Ok(())
    }
}
