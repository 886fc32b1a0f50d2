//! XEvent handlers for use in the main event loop
use crate::{
    core::{
        bindings::{KeyBindings, KeyCode, MouseBindings, MouseEvent},
        State,
    },
    pure::geometry::Rect,
    x::{
        event::{
            ClientMessage, ConfigureRequestEvent, ExposeEvent, MotionEvent, PointerChange,
            UnmapEvent,
        },
        Atom, ClientAttr, ClientConfig, Prop, XConn, XConnExt,
    },
    Result, Xid,
};
use tracing::{debug, error, trace};

// _NET_WM_STATE client message verbs
const NET_WM_STATE_REMOVE: u32 = 0;
const NET_WM_STATE_ADD: u32 = 1;
const NET_WM_STATE_TOGGLE: u32 = 2;

pub(crate) fn key_press<X: XConn>(
    key: KeyCode,
    bindings: &mut KeyBindings<X>,
    state: &mut State<X>,
    x: &X,
) -> Result<()> {
    if let Some(action) = bindings.get_mut(&key) {
        trace!(?key, "running user keybinding");
        if let Err(error) = action.call(state, x) {
            error!(%error, ?key, "error running user keybinding");
            return Err(error);
        }
    }

    Ok(())
}

pub(crate) fn button_press<X: XConn>(
    e: &MouseEvent,
    bindings: &mut MouseBindings<X>,
    state: &mut State<X>,
    x: &X,
) -> Result<()> {
    // clicking a monitor moves focus to it
    let mon = match state.monitor_set.client(&e.id) {
        Some(c) => c.mon,
        None => state.monitor_set.monitor_at(e.rpt),
    };

    if mon != state.monitor_set.focused_monitor_index() {
        if let Some(sel) = state.monitor_set.focused_monitor().sel {
            x.unfocus(sel, state)?;
        }
        state.monitor_set.focus_monitor(mon);
        x.focus(None, state)?;
    }

    if state.monitor_set.contains(&e.id) {
        x.focus(Some(e.id), state)?;
        x.restack(mon, state)?;
    }

    if let Some(action) = bindings.get_mut(&e.state) {
        trace!(state = ?e.state, "running user mouse binding");
        if let Err(error) = action.call(e, state, x) {
            error!(%error, "error running user mouse binding");
            return Err(error);
        }
    }

    Ok(())
}

pub(crate) fn client_message<X: XConn>(
    msg: &ClientMessage,
    state: &mut State<X>,
    x: &X,
) -> Result<()> {
    trace!(id = %msg.id, dtype = ?msg.dtype, data = ?msg.data, "got client message");

    if !state.monitor_set.contains(&msg.id) {
        return Ok(());
    }

    if msg.dtype == Atom::NetWmState.as_ref() {
        let fullscreen = *x.intern_atom(Atom::NetWmStateFullscreen.as_ref())?;
        let mentions_fullscreen =
            msg.data.get(1) == Some(&fullscreen) || msg.data.get(2) == Some(&fullscreen);

        if mentions_fullscreen {
            let currently = state
                .monitor_set
                .client(&msg.id)
                .map(|c| c.is_fullscreen)
                .unwrap_or(false);

            let target = match msg.data.first() {
                Some(&NET_WM_STATE_ADD) => true,
                Some(&NET_WM_STATE_REMOVE) => false,
                Some(&NET_WM_STATE_TOGGLE) => !currently,
                _ => return Ok(()),
            };

            return x.set_fullscreen(msg.id, target, state);
        }
    } else if msg.dtype == Atom::NetActiveWindow.as_ref() {
        // bring the client into view, then raise and focus it
        if state.monitor_set.reveal_client(&msg.id) {
            let mon = state.monitor_set.focused_monitor_index();
            x.arrange(mon, state)?;
        }
        x.focus(Some(msg.id), state)?;
        x.restack(state.monitor_set.focused_monitor_index(), state)?;
    }

    Ok(())
}

pub(crate) fn configure_request<X: XConn>(
    e: &ConfigureRequestEvent,
    state: &mut State<X>,
    x: &X,
) -> Result<()> {
    let id = e.id;

    let (is_floating, mon_idx, cur, border) = match state.monitor_set.client(&id) {
        Some(c) => (c.is_floating, c.mon, c.rect, c.border_width),
        None => return forward_configure_request(e, x),
    };

    if let Some(bw) = e.border_width {
        if let Some(c) = state.monitor_set.client_mut(&id) {
            c.border_width = bw;
        }
        return Ok(());
    }

    let floating_layout = {
        let m = state.monitor_set.monitor(mon_idx);
        m.map(|m| state.config.layouts[m.layout % state.config.layouts.len()].is_floating())
            .unwrap_or(false)
    };

    if !(is_floating || floating_layout) {
        // tiled windows are pinned: acknowledge with current geometry
        return x.send_configure_notify(id, cur, border);
    }

    let screen = match state.monitor_set.monitor(mon_idx) {
        Some(m) => m.screen,
        None => return Ok(()),
    };

    let (r, moved, resized) = {
        let c = state.monitor_set.client_mut(&id).expect("checked above");
        let moved = e.x.is_some() || e.y.is_some();
        let resized = e.w.is_some() || e.h.is_some();

        c.prev_rect = c.rect;
        // requested coordinates are relative to the monitor origin
        if let Some(rx) = e.x {
            c.rect.x = screen.x + rx;
        }
        if let Some(ry) = e.y {
            c.rect.y = screen.y + ry;
        }
        if let Some(rw) = e.w {
            c.rect.w = rw;
        }
        if let Some(rh) = e.h {
            c.rect.h = rh;
        }

        // a floating window pushed over the monitor edge is centered instead
        if c.rect.x + c.outer_w() as i32 > screen.right() {
            c.rect.x = screen.x + (screen.w as i32 - c.outer_w() as i32) / 2;
        }
        if c.rect.y + c.outer_h() as i32 > screen.bottom() {
            c.rect.y = screen.y + (screen.h as i32 - c.outer_h() as i32) / 2;
        }

        (c.rect, moved, resized)
    };

    if moved && !resized {
        x.send_configure_notify(id, r, border)?;
    }
    if state.monitor_set.is_visible(&id) {
        x.set_client_config(id, &[ClientConfig::Position(r)])?;
    }

    Ok(())
}

fn forward_configure_request<X: XConn>(e: &ConfigureRequestEvent, x: &X) -> Result<()> {
    // the window may already be gone: drop the request if we can not size it
    let (cur, _) = match x.client_geometry(e.id) {
        Ok(geo) => geo,
        Err(err) => {
            debug!(id = %e.id, %err, "dropping configure request for unknown window");
            return Ok(());
        }
    };

    let r = Rect::new(
        e.x.unwrap_or(cur.x),
        e.y.unwrap_or(cur.y),
        e.w.unwrap_or(cur.w),
        e.h.unwrap_or(cur.h),
    );

    let mut cfg = vec![ClientConfig::Position(r)];
    if let Some(bw) = e.border_width {
        cfg.push(ClientConfig::BorderPx(bw));
    }
    match e.stack_mode {
        Some(0) => cfg.push(ClientConfig::StackAbove(e.sibling)),
        Some(1) => cfg.push(ClientConfig::StackBelow(e.sibling)),
        _ => (),
    }

    x.set_client_config(e.id, &cfg)
}

pub(crate) fn root_geometry_changed<X: XConn>(state: &mut State<X>, x: &X) -> Result<()> {
    let rects = x.screen_details()?;
    debug!(?rects, "re-detecting monitors");

    if !state.monitor_set.update_monitors(rects) {
        return Ok(());
    }

    // fullscreen clients track their monitor's new size
    let fullscreen: Vec<(Xid, Rect)> = state
        .monitor_set
        .all_clients()
        .filter_map(|id| {
            let c = state.monitor_set.client(id)?;
            if c.is_fullscreen {
                Some((*id, state.monitor_set.monitor(c.mon)?.screen))
            } else {
                None
            }
        })
        .collect();

    for (id, screen) in fullscreen {
        x.resize_client_unchecked(id, screen, state)?;
    }

    // follow the pointer to whichever monitor it is now on
    if let Ok(p) = x.cursor_position() {
        let mon = state.monitor_set.monitor_at(p);
        state.monitor_set.focus_monitor(mon);
    }

    x.focus(None, state)?;
    x.arrange_all(state)
}

pub(crate) fn destroy<X: XConn>(id: Xid, state: &mut State<X>, x: &X) -> Result<()> {
    x.unmanage(id, true, state)
}

pub(crate) fn enter<X: XConn>(p: &PointerChange, state: &mut State<X>, x: &X) -> Result<()> {
    let client = state.monitor_set.client(&p.id).map(|c| c.id);
    let mon = match state.monitor_set.client(&p.id) {
        Some(c) => c.mon,
        None => state.monitor_set.monitor_at(p.abs),
    };

    if mon != state.monitor_set.focused_monitor_index() {
        if let Some(sel) = state.monitor_set.focused_monitor().sel {
            x.unfocus(sel, state)?;
        }
        state.monitor_set.focus_monitor(mon);
    } else if client.is_none() || client == state.monitor_set.focused_monitor().sel {
        return Ok(());
    }

    x.focus(client, state)
}

pub(crate) fn expose<X: XConn>(e: &ExposeEvent, state: &mut State<X>, x: &X) -> Result<()> {
    if e.count != 0 {
        return Ok(());
    }

    let mon = state
        .monitor_set
        .monitors()
        .position(|m| m.bar.win == Some(e.id))
        .unwrap_or(state.monitor_set.focused_monitor_index());

    x.draw_bar(mon, state)
}

// Reassert focus if an ill-behaved client stole it
pub(crate) fn focus_in<X: XConn>(id: Xid, state: &mut State<X>, x: &X) -> Result<()> {
    match state.monitor_set.focused_monitor().sel {
        Some(sel) if sel != id => x.give_input_focus(sel, state),
        _ => Ok(()),
    }
}

pub(crate) fn mapping_notify<X: XConn>(keyboard: bool, state: &mut State<X>, x: &X) -> Result<()> {
    if keyboard {
        trace!("keyboard mapping changed: re-grabbing keys");
        x.grab_keys(&state.key_codes)?;
    }

    Ok(())
}

pub(crate) fn map_request<X: XConn>(id: Xid, state: &mut State<X>, x: &X) -> Result<()> {
    trace!(%id, "handling new map request");
    let attrs = x.get_window_attributes(id)?;

    if !state.monitor_set.contains(&id) && !attrs.override_redirect {
        x.manage(id, state)?;
    }

    Ok(())
}

pub(crate) fn motion<X: XConn>(e: &MotionEvent, state: &mut State<X>, x: &X) -> Result<()> {
    let mon = state.monitor_set.monitor_at(e.p);
    let prev = state.motion_monitor.replace(mon);

    if let Some(m) = state.monitor_set.monitor_mut(mon) {
        m.last_pointer = e.p;
    }

    if let Some(prev_mon) = prev {
        if mon != prev_mon && mon != state.monitor_set.focused_monitor_index() {
            if let Some(sel) = state.monitor_set.focused_monitor().sel {
                x.unfocus(sel, state)?;
            }
            state.monitor_set.focus_monitor(mon);
            x.focus(None, state)?;
        }
    }

    Ok(())
}

pub(crate) fn property_notify<X: XConn>(
    e: &crate::x::event::PropertyEvent,
    state: &mut State<X>,
    x: &X,
) -> Result<()> {
    // the root window name doubles as the status text
    if e.is_root && e.atom == Atom::WmName.as_ref() {
        let mon = state.monitor_set.focused_monitor_index();
        return x.draw_bar(mon, state);
    }

    if !state.monitor_set.contains(&e.id) {
        return Ok(());
    }
    let id = e.id;

    if e.atom == Atom::WmTransientFor.as_ref() {
        let already_floating = state
            .monitor_set
            .client(&id)
            .map(|c| c.is_floating)
            .unwrap_or(true);

        if !already_floating {
            let parent_managed = x
                .transient_parent(id)?
                .map(|p| state.monitor_set.contains(&p))
                .unwrap_or(false);

            if parent_managed {
                let mon = {
                    let c = state.monitor_set.client_mut(&id).expect("checked above");
                    c.is_floating = true;
                    c.mon
                };
                x.arrange(mon, state)?;
            }
        }
    } else if e.atom == Atom::WmNormalHints.as_ref() {
        if let Some(Prop::SizeHints(hints)) = x.get_prop(id, Atom::WmNormalHints.as_ref())? {
            let (became_floating, mon) = {
                let c = state.monitor_set.client_mut(&id).expect("checked above");
                c.update_size_hints(hints);
                let became_floating = c.is_fixed && !c.is_floating;
                c.is_floating = c.is_floating || c.is_fixed;
                (became_floating, c.mon)
            };

            if became_floating {
                x.arrange(mon, state)?;
            }
        }
    } else if e.atom == Atom::WmHints.as_ref() {
        if let Some(Prop::WmHints(hints)) = x.get_prop(id, Atom::WmHints.as_ref())? {
            let selected = state.monitor_set.focused_client() == Some(id);
            let urgent = hints.urgent() && !selected;
            if let Some(c) = state.monitor_set.client_mut(&id) {
                c.never_focus = !hints.accepts_input;
                c.is_urgent = urgent;
            }

            if urgent {
                let argb = state.config.urgent_border.argb_u32();
                x.set_client_attributes(id, &[ClientAttr::BorderColor(argb)])?;
            }

            for mon in 0..state.monitor_set.n_monitors() {
                x.draw_bar(mon, state)?;
            }
        }
    } else if e.atom == Atom::WmName.as_ref() || e.atom == Atom::NetWmName.as_ref() {
        let title = x.window_title(id)?;
        let selected = state.monitor_set.focused_client() == Some(id);
        if let Some(c) = state.monitor_set.client_mut(&id) {
            c.title = title;
        }

        if selected {
            let mon = state.monitor_set.focused_monitor_index();
            x.draw_bar(mon, state)?;
        }
    } else if e.atom == Atom::NetWmWindowType.as_ref() {
        let (should_float, fullscreen) = x.window_type_flags(id)?;

        if fullscreen {
            x.set_fullscreen(id, true, state)?;
        }

        let needs_arrange = {
            let c = state.monitor_set.client_mut(&id).expect("checked above");
            let needs = should_float && !c.is_floating;
            c.is_floating = c.is_floating || should_float;
            needs.then_some(c.mon)
        };

        if let Some(mon) = needs_arrange {
            x.arrange(mon, state)?;
        }
    }

    Ok(())
}

pub(crate) fn unmap_notify<X: XConn>(e: &UnmapEvent, state: &mut State<X>, x: &X) -> Result<()> {
    if !state.monitor_set.contains(&e.id) {
        return Ok(());
    }

    if e.synthetic {
        // ICCCM withdrawal request
        x.set_wm_state(e.id, crate::x::property::WmState::Withdrawn)
    } else {
        x.unmanage(e.id, false, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Config, Rule, State},
        pure::{geometry::Point, monitor::MonitorDefaults, MonitorSet, TagMask},
        x::{
            event::ClientEventMask,
            mock::MockXConn,
            property::{MapState, WindowAttributes, WindowClass, WmState},
            ClientAttr,
        },
        Error,
    };
    use std::cell::RefCell;
    use strum::IntoEnumIterator;

    const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

    fn atom_id(name: &str) -> Option<Xid> {
        Atom::iter()
            .position(|a| a.as_ref() == name)
            .map(|i| Xid(i as u32 + 1000))
    }

    /// A mock X server with a small set of known windows and their props.
    #[derive(Default)]
    struct FakeServer {
        window_class: Option<(String, String)>,
        fullscreen_prop: RefCell<Vec<String>>,
        withdrawn: RefCell<Vec<Xid>>,
        configure_notified: RefCell<Vec<Xid>>,
        configured: RefCell<Vec<(Xid, Vec<ClientConfig>)>>,
    }

    impl MockXConn for FakeServer {
        fn mock_screen_details(&self) -> crate::Result<Vec<Rect>> {
            Ok(vec![SCREEN])
        }

        fn mock_get_window_attributes(&self, _: Xid) -> crate::Result<WindowAttributes> {
            Ok(WindowAttributes::new(
                false,
                MapState::Viewable,
                WindowClass::InputOutput,
            ))
        }

        fn mock_client_geometry(&self, _: Xid) -> crate::Result<(Rect, u32)> {
            Ok((Rect::new(100, 100, 800, 600), 1))
        }

        fn mock_intern_atom(&self, atom: &str) -> crate::Result<Xid> {
            atom_id(atom).ok_or(Error::UnimplementedMock)
        }

        fn mock_get_prop(&self, _: Xid, name: &str) -> crate::Result<Option<Prop>> {
            if name == Atom::WmClass.as_ref() {
                if let Some((class, instance)) = &self.window_class {
                    return Ok(Some(Prop::UTF8String(vec![
                        instance.clone(),
                        class.clone(),
                    ])));
                }
            }

            Ok(None)
        }

        fn mock_set_prop(&self, _: Xid, name: &str, val: Prop) -> crate::Result<()> {
            if name == Atom::NetWmState.as_ref() {
                if let Prop::Atom(atoms) = val {
                    *self.fullscreen_prop.borrow_mut() = atoms;
                }
            }

            Ok(())
        }

        fn mock_delete_prop(&self, _: Xid, _: &str) -> crate::Result<()> {
            Ok(())
        }

        fn mock_set_client_attributes(&self, _: Xid, _: &[ClientAttr]) -> crate::Result<()> {
            Ok(())
        }

        fn mock_set_client_config(&self, id: Xid, data: &[ClientConfig]) -> crate::Result<()> {
            self.configured.borrow_mut().push((id, data.to_vec()));
            Ok(())
        }

        fn mock_set_input_focus(&self, _: Xid) -> crate::Result<()> {
            Ok(())
        }

        fn mock_set_wm_state(&self, id: Xid, s: WmState) -> crate::Result<()> {
            if s == WmState::Withdrawn {
                self.withdrawn.borrow_mut().push(id);
            }
            Ok(())
        }

        fn mock_send_client_message(&self, _: crate::x::event::ClientMessage) -> crate::Result<()> {
            Ok(())
        }

        fn mock_send_configure_notify(&self, id: Xid, _: Rect, _: u32) -> crate::Result<()> {
            self.configure_notified.borrow_mut().push(id);
            Ok(())
        }
    }

    fn test_state<X: XConn>(config: Config<X>) -> State<X> {
        let monitor_set = MonitorSet::try_new(
            MonitorDefaults::default(),
            9,
            TagMask::EMPTY,
            vec![SCREEN],
        )
        .unwrap();

        State::new_for_tests(config, monitor_set)
    }

    #[test]
    fn mapping_a_window_manages_and_tiles_it() {
        let x = FakeServer::default();
        let mut state = test_state(Config {
            monitor_defaults: MonitorDefaults {
                mfact: 0.55,
                ..Default::default()
            },
            ..Default::default()
        });

        map_request(Xid(1), &mut state, &x).unwrap();

        let c = state.monitor_set.client(&Xid(1)).expect("client managed");
        let m = state.monitor_set.focused_monitor();

        assert_eq!(c.tags, m.active_tag_set());
        assert!(!c.is_floating);
        // sole tiled client: the whole work area minus the border
        let work = m.work;
        assert_eq!(c.rect, work.shrink_in(state.config.border_width));
        assert_eq!(m.clients[0], Xid(1));
        assert_eq!(m.stack[0], Xid(1));
        assert_eq!(m.sel, Some(Xid(1)));
    }

    #[test]
    fn duplicate_map_requests_are_ignored() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());

        map_request(Xid(1), &mut state, &x).unwrap();
        map_request(Xid(1), &mut state, &x).unwrap();

        assert_eq!(state.monitor_set.all_clients().count(), 1);
    }

    #[test]
    fn matching_rules_make_clients_float() {
        let x = FakeServer {
            window_class: Some(("Gimp".to_string(), "gimp".to_string())),
            ..Default::default()
        };
        let mut state = test_state(Config {
            rules: vec![Rule {
                class: Some("Gimp".to_string()),
                instance: None,
                title: None,
                tags: TagMask::EMPTY,
                floating: true,
                monitor: None,
                obeys_size_hints: true,
            }],
            ..Default::default()
        });

        map_request(Xid(1), &mut state, &x).unwrap();

        let c = state.monitor_set.client(&Xid(1)).unwrap();
        assert!(c.is_floating);
        // floating clients keep their (clamped) initial geometry
        assert_eq!(c.rect, Rect::new(100, 100, 800, 600));
    }

    #[test]
    fn net_active_window_reveals_and_focuses_hidden_clients() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();

        // retag onto tag 3 (current view stays on tag 1)
        state.monitor_set.client_mut(&Xid(1)).unwrap().tags = TagMask(1 << 2);
        assert!(!state.monitor_set.is_visible(&Xid(1)));

        let msg = ClientMessage::new(
            Xid(1),
            ClientEventMask::NoEventMask,
            Atom::NetActiveWindow.as_ref(),
            vec![],
        );
        client_message(&msg, &mut state, &x).unwrap();

        let m = state.monitor_set.focused_monitor();
        assert!(m.active_tag_set().intersects(TagMask(1 << 2)));
        assert_eq!(m.previous_tag_set(), TagMask(1));
        assert_eq!(m.sel, Some(Xid(1)));
        assert!(state.monitor_set.is_visible(&Xid(1)));
    }

    #[test]
    fn fullscreen_client_messages_toggle_state() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();

        let fs = *atom_id(Atom::NetWmStateFullscreen.as_ref()).unwrap();
        let msg = |action: u32| {
            ClientMessage::new(
                Xid(1),
                ClientEventMask::NoEventMask,
                Atom::NetWmState.as_ref(),
                vec![action, fs, 0],
            )
        };

        client_message(&msg(NET_WM_STATE_ADD), &mut state, &x).unwrap();
        {
            let c = state.monitor_set.client(&Xid(1)).unwrap();
            assert!(c.is_fullscreen);
            assert_eq!(c.rect, SCREEN);
            assert_eq!(c.border_width, 0);
            assert!(c.is_floating);
        }
        assert_eq!(
            *x.fullscreen_prop.borrow(),
            vec![Atom::NetWmStateFullscreen.as_ref().to_string()]
        );

        client_message(&msg(NET_WM_STATE_TOGGLE), &mut state, &x).unwrap();
        let c = state.monitor_set.client(&Xid(1)).unwrap();
        assert!(!c.is_fullscreen);
        assert!(!c.is_floating);
        assert!(x.fullscreen_prop.borrow().is_empty());
    }

    #[test]
    fn tiled_windows_get_synthetic_configure_notify() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();

        let e = ConfigureRequestEvent {
            id: Xid(1),
            x: Some(5),
            y: Some(5),
            w: Some(100),
            h: Some(100),
            border_width: None,
            sibling: None,
            stack_mode: None,
        };
        let before = state.monitor_set.client(&Xid(1)).unwrap().rect;

        configure_request(&e, &mut state, &x).unwrap();

        assert_eq!(state.monitor_set.client(&Xid(1)).unwrap().rect, before);
        assert_eq!(*x.configure_notified.borrow(), vec![Xid(1)]);
    }

    #[test]
    fn floating_windows_may_configure_themselves() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();
        state.monitor_set.client_mut(&Xid(1)).unwrap().is_floating = true;

        let e = ConfigureRequestEvent {
            id: Xid(1),
            x: Some(50),
            y: Some(60),
            w: Some(400),
            h: Some(300),
            border_width: None,
            sibling: None,
            stack_mode: None,
        };
        configure_request(&e, &mut state, &x).unwrap();

        let c = state.monitor_set.client(&Xid(1)).unwrap();
        assert_eq!(c.rect, Rect::new(50, 60, 400, 300));
    }

    #[test]
    fn oversized_floating_requests_are_centered() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();
        state.monitor_set.client_mut(&Xid(1)).unwrap().is_floating = true;

        let e = ConfigureRequestEvent {
            id: Xid(1),
            x: Some(1900),
            y: None,
            w: Some(400),
            h: None,
            border_width: None,
            sibling: None,
            stack_mode: None,
        };
        configure_request(&e, &mut state, &x).unwrap();

        let c = state.monitor_set.client(&Xid(1)).unwrap();
        assert_eq!(c.rect.x, (1920 - c.outer_w() as i32) / 2);
    }

    #[test]
    fn synthetic_unmaps_set_withdrawn_real_unmaps_unmanage() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();
        map_request(Xid(2), &mut state, &x).unwrap();

        unmap_notify(
            &UnmapEvent {
                id: Xid(1),
                synthetic: true,
            },
            &mut state,
            &x,
        )
        .unwrap();
        assert!(state.monitor_set.contains(&Xid(1)));
        assert_eq!(*x.withdrawn.borrow(), vec![Xid(1)]);

        unmap_notify(
            &UnmapEvent {
                id: Xid(2),
                synthetic: false,
            },
            &mut state,
            &x,
        )
        .unwrap();
        assert!(!state.monitor_set.contains(&Xid(2)));
    }

    #[test]
    fn destroy_unmanages_unconditionally() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        map_request(Xid(1), &mut state, &x).unwrap();

        destroy(Xid(1), &mut state, &x).unwrap();

        assert!(!state.monitor_set.contains(&Xid(1)));
        assert_eq!(state.monitor_set.focused_monitor().sel, None);
    }

    #[test]
    fn motion_across_monitors_moves_focus() {
        let x = FakeServer::default();
        let mut state = test_state(Config::default());
        let second = Rect::new(1920, 0, 1280, 1024);
        state.monitor_set.update_monitors(vec![SCREEN, second]);

        motion(
            &MotionEvent {
                p: Point::new(100, 100),
                time: 1,
            },
            &mut state,
            &x,
        )
        .unwrap();
        motion(
            &MotionEvent {
                p: Point::new(2000, 100),
                time: 2,
            },
            &mut state,
            &x,
        )
        .unwrap();

        assert_eq!(state.monitor_set.focused_monitor_index(), 1);
    }
}
