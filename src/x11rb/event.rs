//! Converting raw x11rb events into their typed [XEvent] form
use crate::{
    core::bindings::{KeyCode, MouseEvent, MouseState},
    pure::geometry::{Point, Rect},
    x::{
        event::{
            ClientEventMask, ClientMessage, ConfigureEvent, ConfigureRequestEvent, ExposeEvent,
            MotionEvent, PointerChange, UnmapEvent, XEvent,
        },
        Atom,
    },
    Error, Result, Xid,
};
use tracing::{debug, warn};
use x11rb::protocol::{
    xproto::{ConfigWindow, Mapping, NotifyDetail, NotifyMode},
    Event,
};

use super::xconn::{RustConn, CAPSLOCK, NUMLOCK};

// strip the lock modifiers so bindings match regardless of their state
fn clean_mask(mask: u16) -> u16 {
    mask & !(NUMLOCK | CAPSLOCK)
}

/// Convert a raw event into its dispatchable form.
///
/// `Ok(None)` means the event carries nothing for the window manager: it is
/// silently dropped. Protocol errors on the benign whitelist (operations on
/// windows that vanished mid-flight and contested grabs) are dropped the same
/// way; anything else is fatal.
pub(super) fn convert_event(conn: &RustConn, event: Event) -> Result<Option<XEvent>> {
    match event {
        Event::Error(e) => {
            use x11rb::protocol::ErrorKind::*;

            match e.error_kind {
                Window | Match | Drawable | Access => {
                    debug!(
                        kind = ?e.error_kind,
                        major = e.major_opcode,
                        minor = e.minor_opcode,
                        "ignoring benign X error"
                    );
                    Ok(None)
                }
                kind => Err(Error::X11(format!(
                    "{:?} (major={}, minor={})",
                    kind, e.major_opcode, e.minor_opcode
                ))),
            }
        }

        Event::ButtonPress(e) => {
            match MouseState::from_detail_and_state(e.detail, clean_mask(u16::from(e.state))) {
                Ok(state) => Ok(Some(XEvent::ButtonPress(MouseEvent {
                    id: Xid(e.event),
                    rpt: Point::new(e.root_x as i32, e.root_y as i32),
                    wpt: Point::new(e.event_x as i32, e.event_y as i32),
                    state,
                }))),
                Err(_) => {
                    warn!(detail = e.detail, "dropping unknown mouse button event");
                    Ok(None)
                }
            }
        }

        Event::ButtonRelease(_) => Ok(Some(XEvent::ButtonRelease)),

        Event::KeyPress(e) => {
            let code = KeyCode {
                mask: u16::from(e.state),
                code: e.detail,
            };

            Ok(Some(XEvent::KeyPress(
                code.ignoring_modifier(NUMLOCK | CAPSLOCK),
            )))
        }

        Event::MotionNotify(e) if e.event == conn.root_id() => {
            Ok(Some(XEvent::MotionNotify(MotionEvent {
                p: Point::new(e.root_x as i32, e.root_y as i32),
                time: e.time,
            })))
        }
        Event::MotionNotify(_) => Ok(None),

        Event::EnterNotify(e) => {
            // sub-window crossings and grab transitions are not focus changes
            let normal = e.mode == NotifyMode::NORMAL && e.detail != NotifyDetail::INFERIOR;
            if normal || e.event == conn.root_id() {
                Ok(Some(XEvent::Enter(PointerChange {
                    id: Xid(e.event),
                    abs: Point::new(e.root_x as i32, e.root_y as i32),
                })))
            } else {
                Ok(None)
            }
        }

        Event::FocusIn(e) => Ok(Some(XEvent::FocusIn(Xid(e.event)))),

        Event::MapRequest(e) => Ok(Some(XEvent::MapRequest(Xid(e.window)))),

        Event::DestroyNotify(e) => Ok(Some(XEvent::Destroy(Xid(e.window)))),

        Event::UnmapNotify(e) => Ok(Some(XEvent::UnmapNotify(UnmapEvent {
            id: Xid(e.window),
            // the send-event flag marks an ICCCM withdrawal request
            synthetic: e.response_type & 0x80 != 0,
        }))),

        Event::ConfigureNotify(e) => Ok(Some(XEvent::ConfigureNotify(ConfigureEvent {
            id: Xid(e.window),
            r: Rect::new(e.x as i32, e.y as i32, e.width as u32, e.height as u32),
            is_root: e.window == conn.root_id(),
        }))),

        Event::ConfigureRequest(e) => {
            let vm = u32::from(e.value_mask);
            let has = |flag: ConfigWindow| vm & u32::from(flag) != 0;

            Ok(Some(XEvent::ConfigureRequest(ConfigureRequestEvent {
                id: Xid(e.window),
                x: has(ConfigWindow::X).then_some(e.x as i32),
                y: has(ConfigWindow::Y).then_some(e.y as i32),
                w: has(ConfigWindow::WIDTH).then_some(e.width as u32),
                h: has(ConfigWindow::HEIGHT).then_some(e.height as u32),
                border_width: has(ConfigWindow::BORDER_WIDTH).then_some(e.border_width as u32),
                sibling: has(ConfigWindow::SIBLING).then_some(Xid(e.sibling)),
                stack_mode: has(ConfigWindow::STACK_MODE).then_some(u32::from(e.stack_mode)),
            })))
        }

        Event::ClientMessage(e) => {
            let dtype = match conn.atom_id_to_name(e.type_) {
                Some(name) => name,
                None => return Ok(None),
            };

            let data: Vec<u32> = match e.format {
                8 => e.data.as_data8().iter().map(|&d| d as u32).collect(),
                16 => e.data.as_data16().iter().map(|&d| d as u32).collect(),
                32 => e.data.as_data32().to_vec(),
                n => return Err(Error::InvalidClientMessage(n)),
            };

            Ok(Some(XEvent::ClientMessage(ClientMessage::new(
                Xid(e.window),
                ClientEventMask::NoEventMask,
                dtype,
                data,
            ))))
        }

        Event::PropertyNotify(e) => {
            let is_root = e.window == conn.root_id();
            let atom = match conn.atom_id_to_name(e.atom) {
                Some(name) => name,
                None => return Ok(None),
            };

            // the only root property of interest is the status text
            if is_root && atom != Atom::WmName.as_ref() {
                return Ok(None);
            }

            Ok(Some(XEvent::PropertyNotify(
                crate::x::event::PropertyEvent {
                    id: Xid(e.window),
                    atom,
                    is_root,
                },
            )))
        }

        Event::Expose(e) => Ok(Some(XEvent::Expose(ExposeEvent {
            id: Xid(e.window),
            count: e.count as usize,
        }))),

        Event::MappingNotify(e) => Ok(Some(XEvent::MappingNotify {
            keyboard: e.request == Mapping::KEYBOARD,
        })),

        Event::RandrScreenChangeNotify(_) | Event::RandrNotify(_) => Ok(Some(XEvent::RandrNotify)),

        _ => Ok(None),
    }
}
