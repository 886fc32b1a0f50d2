//! Pre-defined actions for use in key and mouse bindings.
//!
//! Each action is a typed constructor returning a boxed handler: the argument
//! each operation needs is fixed in its constructor signature, so a binding
//! table with a wrong argument shape fails to compile rather than at runtime.
use crate::{
    core::{
        bindings::{KeyEventHandler, MouseEventHandler},
        handle, State,
    },
    pure::{geometry::{Point, Rect}, TagMask},
    util,
    x::{XConn, XConnExt, XEvent},
    Result, Xid,
};
use tracing::trace;

// NOTE: this is here to force the correct lifetime requirements on closures
//       being used as handlers. The generic impl in crate::core::bindings for
//       functions of the right signature isn't sufficient on its own.

/// Construct a [KeyEventHandler] from a closure or free function
pub fn key_handler<F, X>(f: F) -> Box<dyn KeyEventHandler<X>>
where
    F: FnMut(&mut State<X>, &X) -> Result<()> + 'static,
    X: XConn,
{
    Box::new(f)
}

/// Construct a [MouseEventHandler] from a closure or free function
pub fn mouse_handler<F, X>(f: F) -> Box<dyn MouseEventHandler<X>>
where
    F: FnMut(&crate::core::bindings::MouseEvent, &mut State<X>, &X) -> Result<()> + 'static,
    X: XConn,
{
    Box::new(f)
}

/// View the given tag-set on the focused monitor.
pub fn view<X: XConn>(mask: TagMask) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.view(mask) {
            x.refresh(s)
        } else {
            Ok(())
        }
    })
}

/// Toggle back to the previously viewed tag-set.
pub fn view_previous<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    view(TagMask::EMPTY)
}

/// XOR the given tag-set into the focused monitor's view.
pub fn toggle_view<X: XConn>(mask: TagMask) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.toggle_view(mask) {
            x.refresh(s)
        } else {
            Ok(())
        }
    })
}

/// Re-tag the selected client.
pub fn tag<X: XConn>(mask: TagMask) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.tag(mask) {
            x.refresh(s)
        } else {
            Ok(())
        }
    })
}

/// XOR the given mask into the selected client's tags.
pub fn toggle_tag<X: XConn>(mask: TagMask) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.toggle_tag(mask) {
            x.refresh(s)
        } else {
            Ok(())
        }
    })
}

/// Move focus through the visible clients of the focused monitor.
pub fn focus_stack<X: XConn>(dir: i32) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if let Some(next) = s.monitor_set.cycle_client(dir) {
            x.focus(Some(next), s)?;
            x.restack(s.monitor_set.focused_monitor_index(), s)?;
        }

        Ok(())
    })
}

/// Swap the selected client with its neighbour in the tiled order.
pub fn move_stack<X: XConn>(dir: i32) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.swap_in_stack(dir) {
            x.arrange(s.monitor_set.focused_monitor_index(), s)
        } else {
            Ok(())
        }
    })
}

/// Give focus back to the client that held it before the current one.
pub fn swap_focus<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, x: &X| {
        match s.prev_focus.filter(|id| s.monitor_set.contains(id)) {
            Some(prev) => {
                x.focus(Some(prev), s)?;
                x.restack(s.monitor_set.focused_monitor_index(), s)
            }
            None => Ok(()),
        }
    })
}

/// Move focus to the next / previous monitor.
pub fn focus_monitor<X: XConn>(dir: i32) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.n_monitors() < 2 {
            return Ok(());
        }

        let target = s.monitor_set.next_monitor(dir);
        if let Some(sel) = s.monitor_set.focused_monitor().sel {
            x.unfocus(sel, s)?;
        }
        s.monitor_set.focus_monitor(target);
        x.focus(None, s)?;
        x.warp_to_monitor(target, s)
    })
}

/// Send the selected client to the next / previous monitor.
pub fn tag_monitor<X: XConn>(dir: i32) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.n_monitors() < 2 {
            return Ok(());
        }

        let sel = match s.monitor_set.focused_client() {
            Some(sel) => sel,
            None => return Ok(()),
        };
        let target = s.monitor_set.next_monitor(dir);

        if s.monitor_set.send_to_monitor(&sel, target) {
            x.focus(None, s)?;
            x.arrange_all(s)?;
        }

        Ok(())
    })
}

/// Nudge the master area width fraction.
pub fn set_mfact<X: XConn>(delta: f32) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.adjust_mfact(delta) {
            x.arrange(s.monitor_set.focused_monitor_index(), s)
        } else {
            Ok(())
        }
    })
}

/// Adjust the number of clients in the master area.
pub fn inc_nmaster<X: XConn>(delta: i32) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if s.monitor_set.adjust_nmaster(delta) {
            x.arrange(s.monitor_set.focused_monitor_index(), s)
        } else {
            Ok(())
        }
    })
}

/// Switch the focused monitor to the layout at the given index in the
/// configured layout table.
pub fn set_layout<X: XConn>(index: usize) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |s: &mut State<X>, x: &X| {
        if index >= s.config.layouts.len() {
            return Ok(());
        }

        s.monitor_set.focused_monitor_mut().layout = index;
        x.arrange(s.monitor_set.focused_monitor_index(), s)
    })
}

/// Promote the selected client to the master position, or swap the current
/// master with the next client in the stack.
pub fn zoom<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, x: &X| {
        let sel = match s.monitor_set.focused_client() {
            Some(sel) => sel,
            None => return Ok(()),
        };

        if s.monitor_set.promote_to_master(&sel) {
            x.focus(Some(sel), s)?;
            x.arrange(s.monitor_set.focused_monitor_index(), s)
        } else {
            Ok(())
        }
    })
}

/// Show / hide the bar on the focused monitor.
pub fn toggle_bar<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, x: &X| {
        let m = s.monitor_set.focused_monitor_mut();
        m.bar.shown = !m.bar.shown;
        m.update_bar_geometry();

        x.arrange(s.monitor_set.focused_monitor_index(), s)
    })
}

/// Toggle the selected client between floating and tiled.
pub fn toggle_floating<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, x: &X| {
        let sel = match s.monitor_set.focused_client() {
            Some(sel) => sel,
            None => return Ok(()),
        };

        let (now_floating, r) = {
            let c = match s.monitor_set.client_mut(&sel) {
                Some(c) => c,
                None => return Ok(()),
            };
            if c.is_fullscreen {
                return Ok(());
            }

            // fixed size clients can never be tiled
            c.is_floating = !c.is_floating || c.is_fixed;
            (c.is_floating, c.rect)
        };

        if now_floating {
            x.resize_client(sel, r, false, s)?;
        }

        x.arrange(s.monitor_set.focused_monitor_index(), s)
    })
}

/// Toggle the selected client in and out of fullscreen.
pub fn toggle_fullscreen<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, x: &X| {
        let sel = match s.monitor_set.focused_client() {
            Some(sel) => sel,
            None => return Ok(()),
        };
        let fullscreen = s
            .monitor_set
            .client(&sel)
            .map(|c| c.is_fullscreen)
            .unwrap_or(false);

        x.set_fullscreen(sel, !fullscreen, s)
    })
}

/// Ask the selected client to close.
pub fn kill_focused<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, x: &X| match s.monitor_set.focused_client() {
        Some(sel) => x.kill_client(sel),
        None => Ok(()),
    })
}

/// Spawn an external program as part of a key binding
pub fn spawn<X: XConn>(program: &'static str) -> Box<dyn KeyEventHandler<X>> {
    key_handler(move |_, _| util::spawn(program))
}

/// Exit the window manager event loop cleanly.
pub fn quit<X: XConn>() -> Box<dyn KeyEventHandler<X>> {
    key_handler(|s: &mut State<X>, _| {
        s.running = false;
        Ok(())
    })
}

// mouse driven move / resize

// Drop motion events beyond ~60 per second
const DRAG_INTERVAL_MS: u32 = 1000 / 60;

enum Drag {
    Move,
    Resize,
}

/// Drag the clicked client with the mouse, snapping to work area edges.
///
/// Tiled clients pop out to floating once dragged further than the snap
/// threshold. Fullscreen clients are never moved.
pub fn drag_move<X: XConn>() -> Box<dyn MouseEventHandler<X>> {
    mouse_handler(|evt, s: &mut State<X>, x: &X| begin_drag(evt.id, s, x, Drag::Move))
}

/// Resize the clicked client with the mouse.
///
/// Tiled clients pop out to floating once resized further than the snap
/// threshold. Fullscreen clients are never resized.
pub fn drag_resize<X: XConn>() -> Box<dyn MouseEventHandler<X>> {
    mouse_handler(|evt, s: &mut State<X>, x: &X| begin_drag(evt.id, s, x, Drag::Resize))
}

fn begin_drag<X: XConn>(id: Xid, s: &mut State<X>, x: &X, kind: Drag) -> Result<()> {
    let c = match s.monitor_set.client(&id) {
        Some(c) => c.clone(),
        None => return Ok(()),
    };
    if c.is_fullscreen {
        return Ok(());
    }

    x.focus(Some(id), s)?;
    x.restack(s.monitor_set.focused_monitor_index(), s)?;

    if let Drag::Resize = kind {
        // put the pointer on the corner being dragged
        let (w, h) = (c.rect.w + c.border_width - 1, c.rect.h + c.border_width - 1);
        x.warp_pointer(id, w as i16, h as i16)?;
    }

    let start = x.cursor_position()?;
    let orig = c.rect;

    x.grab_pointer()?;
    let res = drag_pump(id, start, orig, &kind, s, x);
    if let Err(e) = x.ungrab_pointer() {
        trace!(%e, "releasing pointer grab");
    }
    res?;

    // dropping a window onto another monitor sends it there
    let (r, mon) = match s.monitor_set.client(&id) {
        Some(c) => (c.rect, c.mon),
        None => return Ok(()), // destroyed mid drag
    };
    let target = s.monitor_set.monitor_for_rect(&r);
    if target != mon && s.monitor_set.send_to_monitor(&id, target) {
        s.monitor_set.focus_monitor(target);
        x.focus(Some(id), s)?;
        x.arrange_all(s)?;
    }

    Ok(())
}

// The nested event pump for mouse drags: only the dragged client is mutated
// until the button is released. Configure requests, exposes and map requests
// arriving mid-drag are dispatched to their normal handlers.
fn drag_pump<X: XConn>(
    id: Xid,
    start: Point,
    orig: Rect,
    kind: &Drag,
    s: &mut State<X>,
    x: &X,
) -> Result<()> {
    let mut last_motion = 0u32;

    loop {
        match x.next_event()? {
            XEvent::ButtonRelease => return Ok(()),
            XEvent::MotionNotify(m) => {
                if m.time.saturating_sub(last_motion) <= DRAG_INTERVAL_MS {
                    continue;
                }
                last_motion = m.time;

                match kind {
                    Drag::Move => drag_move_to(id, start, orig, m.p, s, x)?,
                    Drag::Resize => drag_resize_to(id, orig, m.p, s, x)?,
                }
            }
            XEvent::ConfigureRequest(e) => handle::configure_request(&e, s, x)?,
            XEvent::Expose(e) => handle::expose(&e, s, x)?,
            XEvent::MapRequest(mid) => handle::map_request(mid, s, x)?,
            // the dragged client can vanish mid-drag
            XEvent::Destroy(did) => {
                handle::destroy(did, s, x)?;
                if did == id {
                    return Ok(());
                }
            }
            XEvent::UnmapNotify(e) => {
                handle::unmap_notify(&e, s, x)?;
                if e.id == id {
                    return Ok(());
                }
            }
            _ => (),
        }
    }
}

fn drag_move_to<X: XConn>(
    id: Xid,
    start: Point,
    orig: Rect,
    p: Point,
    s: &mut State<X>,
    x: &X,
) -> Result<()> {
    let (c, work) = match s.monitor_set.client(&id) {
        Some(c) => (
            c.clone(),
            s.monitor_set.monitor(c.mon).map(|m| m.work).unwrap_or_default(),
        ),
        None => return Ok(()),
    };

    let mut nx = orig.x + (p.x - start.x);
    let mut ny = orig.y + (p.y - start.y);
    let snap = s.config.snap as i32;
    let (ow, oh) = (c.outer_w() as i32, c.outer_h() as i32);

    // snap to the work area edges
    if (work.x - nx).abs() < snap {
        nx = work.x;
    } else if (work.right() - (nx + ow)).abs() < snap {
        nx = work.right() - ow;
    }
    if (work.y - ny).abs() < snap {
        ny = work.y;
    } else if (work.bottom() - (ny + oh)).abs() < snap {
        ny = work.bottom() - oh;
    }

    if !c.is_floating {
        if (nx - c.rect.x).abs() <= snap && (ny - c.rect.y).abs() <= snap {
            return Ok(());
        }
        pop_to_floating(id, s, x)?;
    }

    x.resize_client(id, Rect::new(nx, ny, orig.w, orig.h), true, s)
}

fn drag_resize_to<X: XConn>(
    id: Xid,
    orig: Rect,
    p: Point,
    s: &mut State<X>,
    x: &X,
) -> Result<()> {
    let c = match s.monitor_set.client(&id) {
        Some(c) => c.clone(),
        None => return Ok(()),
    };

    let bw = c.border_width as i32;
    let nw = (p.x - orig.x - 2 * bw + 1).max(1) as u32;
    let nh = (p.y - orig.y - 2 * bw + 1).max(1) as u32;

    if !c.is_floating {
        let snap = s.config.snap;
        if nw.abs_diff(c.rect.w) <= snap && nh.abs_diff(c.rect.h) <= snap {
            return Ok(());
        }
        pop_to_floating(id, s, x)?;
    }

    x.resize_client(id, Rect::new(orig.x, orig.y, nw, nh), true, s)
}

fn pop_to_floating<X: XConn>(id: Xid, s: &mut State<X>, x: &X) -> Result<()> {
    let mon = match s.monitor_set.client_mut(&id) {
        Some(c) => {
            c.is_floating = true;
            c.mon
        }
        None => return Ok(()),
    };

    x.arrange(mon, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Config, State},
        pure::{monitor::MonitorDefaults, Client, MonitorSet},
        x::{mock::MockXConn, ClientAttr, ClientConfig, Prop},
    };

    struct NullConn;

    impl MockXConn for NullConn {
        fn mock_set_client_config(&self, _: Xid, _: &[ClientConfig]) -> Result<()> {
            Ok(())
        }

        fn mock_set_client_attributes(&self, _: Xid, _: &[ClientAttr]) -> Result<()> {
            Ok(())
        }

        fn mock_set_input_focus(&self, _: Xid) -> Result<()> {
            Ok(())
        }

        fn mock_set_prop(&self, _: Xid, _: &str, _: Prop) -> Result<()> {
            Ok(())
        }

        fn mock_delete_prop(&self, _: Xid, _: &str) -> Result<()> {
            Ok(())
        }

        fn mock_get_prop(&self, _: Xid, _: &str) -> Result<Option<Prop>> {
            Ok(None)
        }
    }

    fn state_with_clients(n: u32) -> State<NullConn> {
        let monitor_set = MonitorSet::try_new(
            MonitorDefaults::default(),
            9,
            TagMask::EMPTY,
            vec![Rect::new(0, 0, 1920, 1080)],
        )
        .unwrap();
        let mut s = State::new_for_tests(Config::default(), monitor_set);

        for id in 1..=n {
            let tags = s.monitor_set.focused_monitor().active_tag_set();
            s.monitor_set
                .insert(Client::new(Xid(id), Rect::new(0, 0, 100, 100), 1, tags, 0));
            s.monitor_set.focus_client(&Xid(id));
        }

        s
    }

    #[test]
    fn focus_stack_round_trips() {
        let x = NullConn;
        let mut s = state_with_clients(3);
        let start = s.monitor_set.focused_client();

        focus_stack(1).call(&mut s, &x).unwrap();
        assert_ne!(s.monitor_set.focused_client(), start);

        focus_stack(-1).call(&mut s, &x).unwrap();
        assert_eq!(s.monitor_set.focused_client(), start);
    }

    #[test]
    fn view_actions_drive_the_two_slot_history() {
        let x = NullConn;
        let mut s = state_with_clients(1);

        view(TagMask(0b10)).call(&mut s, &x).unwrap();
        assert_eq!(s.monitor_set.focused_monitor().active_tag_set(), TagMask(0b10));

        view_previous().call(&mut s, &x).unwrap();
        assert_eq!(s.monitor_set.focused_monitor().active_tag_set(), TagMask(1));
    }

    #[test]
    fn quit_stops_the_event_loop() {
        let x = NullConn;
        let mut s = state_with_clients(0);

        quit().call(&mut s, &x).unwrap();

        assert!(!s.running);
    }

    #[test]
    fn toggle_floating_round_trips() {
        let x = NullConn;
        let mut s = state_with_clients(1);

        toggle_floating().call(&mut s, &x).unwrap();
        assert!(s.monitor_set.client(&Xid(1)).unwrap().is_floating);

        toggle_floating().call(&mut s, &x).unwrap();
        assert!(!s.monitor_set.client(&Xid(1)).unwrap().is_floating);
    }

    #[test]
    fn zoom_promotes_the_selection() {
        let x = NullConn;
        let mut s = state_with_clients(3);
        s.monitor_set.focus_client(&Xid(1));

        zoom().call(&mut s, &x).unwrap();

        assert_eq!(s.monitor_set.focused_monitor().clients[0], Xid(1));
        assert_eq!(s.monitor_set.focused_client(), Some(Xid(1)));
    }
}
