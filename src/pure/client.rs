//! Per-window client records
use crate::{
    pure::{geometry::Rect, TagMask},
    x::property::SizeHints,
    Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The window management record for a single top-level client window.
///
/// A [Client] belongs to exactly one monitor (by index) and appears in that
/// monitor's attachment list and focus stack. All fields are pure state: the
/// X side effects that keep the server in sync with them live in
/// [crate::x::XConnExt].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    /// The X window being managed
    pub id: Xid,
    /// Current WM_NAME / _NET_WM_NAME
    pub title: String,
    /// Current geometry (border excluded)
    pub rect: Rect,
    /// Geometry before the most recent resize
    pub prev_rect: Rect,
    /// Current border width in pixels
    pub border_width: u32,
    /// Border width the window had before being managed
    pub old_border_width: u32,
    /// The tags this client is labelled with
    pub tags: TagMask,
    /// Index of the monitor holding this client
    pub mon: usize,
    /// WM_NORMAL_HINTS constraints
    pub hints: SizeHints,
    /// min == max size hints: never tiled
    pub is_fixed: bool,
    /// Excluded from tiled layout
    pub is_floating: bool,
    /// ICCCM urgency flag
    pub is_urgent: bool,
    /// Client asked never to receive input focus
    pub never_focus: bool,
    /// Floating state saved while fullscreen
    pub old_state: bool,
    /// Currently covering the full monitor rect
    pub is_fullscreen: bool,
    /// Whether size hints are respected while tiled
    pub obeys_size_hints: bool,
}

impl Client {
    /// Create a new record for a window with the given initial geometry.
    pub fn new(id: Xid, rect: Rect, border_width: u32, tags: TagMask, mon: usize) -> Self {
        Self {
            id,
            title: String::new(),
            rect,
            prev_rect: rect,
            border_width,
            old_border_width: border_width,
            tags,
            mon,
            hints: SizeHints::default(),
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            old_state: false,
            is_fullscreen: false,
            obeys_size_hints: true,
        }
    }

    /// Total width including the border on both sides
    pub fn outer_w(&self) -> u32 {
        self.rect.w + 2 * self.border_width
    }

    /// Total height including the border on both sides
    pub fn outer_h(&self) -> u32 {
        self.rect.h + 2 * self.border_width
    }

    /// Store new WM_NORMAL_HINTS, refreshing the fixed flag.
    ///
    /// Fixed-size clients can never be tiled so they are forced floating by
    /// the caller.
    pub fn update_size_hints(&mut self, hints: SizeHints) {
        self.is_fixed = hints.is_fixed();
        self.hints = hints;
    }

    /// Constrain a proposed geometry according to ICCCM 4.1.2.3.
    ///
    /// `interactive` indicates a mouse driven move / resize: the proposal is
    /// then clamped to remain reachable on the full `screen` rather than
    /// inside the monitor `work` area. Size hint arithmetic (base size,
    /// aspect ratio, increments, min / max) only applies when the client is
    /// floating, the active layout is floating (`floating_layout`) or the
    /// client is configured to have its hints honoured while tiled.
    ///
    /// Returns the constrained geometry and whether it differs from the
    /// client's current one, letting callers skip redundant X calls. The
    /// function is idempotent: re-applying it to its own output is a no-op.
    pub fn apply_size_hints(
        &self,
        proposed: Rect,
        screen: Rect,
        work: Rect,
        interactive: bool,
        floating_layout: bool,
    ) -> (Rect, bool) {
        let bw = self.border_width as i32;
        let Rect { mut x, mut y, w, h } = proposed;
        let mut w = w.max(1) as i32;
        let mut h = h.max(1) as i32;

        if interactive {
            // keep some part of the window reachable on screen
            if x > screen.right() {
                x = screen.right() - (w + 2 * bw);
            }
            if y > screen.bottom() {
                y = screen.bottom() - (h + 2 * bw);
            }
            if x + w + 2 * bw < screen.x {
                x = screen.x;
            }
            if y + h + 2 * bw < screen.y {
                y = screen.y;
            }
        } else {
            if x >= work.right() {
                x = work.right() - (w + 2 * bw);
            }
            if y >= work.bottom() {
                y = work.bottom() - (h + 2 * bw);
            }
            if x + w + 2 * bw <= work.x {
                x = work.x;
            }
            if y + h + 2 * bw <= work.y {
                y = work.y;
            }
        }

        if self.obeys_size_hints || self.is_floating || floating_layout {
            let SizeHints {
                base: (base_w, base_h),
                inc: (inc_w, inc_h),
                max: (max_w, max_h),
                min: (min_w, min_h),
                min_aspect,
                max_aspect,
                ..
            } = self.hints;

            // when the base size doubles as the minimum it must stay in
            // place for the aspect ratio checks
            let base_is_min = (base_w, base_h) == (min_w, min_h);
            if !base_is_min {
                w -= base_w as i32;
                h -= base_h as i32;
            }

            if min_aspect > 0.0 && max_aspect > 0.0 {
                if max_aspect < w as f32 / h as f32 {
                    w = (h as f32 * max_aspect + 0.5) as i32;
                } else if min_aspect < h as f32 / w as f32 {
                    h = (w as f32 * min_aspect + 0.5) as i32;
                }
            }

            if base_is_min {
                w -= base_w as i32;
                h -= base_h as i32;
            }

            if inc_w > 0 {
                w -= w % inc_w as i32;
            }
            if inc_h > 0 {
                h -= h % inc_h as i32;
            }

            w = (w + base_w as i32).max(min_w as i32);
            h = (h + base_h as i32).max(min_h as i32);

            // max bounds are snapped onto the increment lattice so that a
            // clamped result is a fixed point of this function
            let lattice_max = |mx: u32, base: u32, inc: u32| -> i32 {
                if inc > 0 && mx >= base {
                    (base + ((mx - base) / inc) * inc) as i32
                } else {
                    mx as i32
                }
            };

            if max_w > 0 {
                w = w.min(lattice_max(max_w, base_w, inc_w));
            }
            if max_h > 0 {
                h = h.min(lattice_max(max_h, base_h, inc_h));
            }
        }

        let r = Rect::new(x, y, w.max(1) as u32, h.max(1) as u32);

        (r, r != self.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x::property::SizeHintsFlags;
    use quickcheck::quickcheck;
    use simple_test_case::test_case;

    const SCREEN: Rect = Rect::new(0, 0, 2000, 1000);
    const WORK: Rect = Rect::new(0, 20, 1000, 980);

    fn client_with_hints(hints: SizeHints) -> Client {
        let mut c = Client::new(Xid(1), Rect::new(10, 30, 200, 100), 2, TagMask(1), 0);
        c.update_size_hints(hints);
        c
    }

    #[test]
    fn zero_sizes_are_raised_to_one() {
        let c = client_with_hints(SizeHints::default());

        let (r, _) = c.apply_size_hints(Rect::new(10, 30, 0, 0), SCREEN, WORK, false, false);

        assert_eq!((r.w, r.h), (1, 1));
    }

    #[test_case(Rect::new(1500, 30, 200, 100), 796; "right of work area")]
    #[test_case(Rect::new(-500, 30, 200, 100), 0; "left of work area")]
    #[test]
    fn tiled_proposals_are_pulled_into_the_work_area(proposed: Rect, expected_x: i32) {
        let c = client_with_hints(SizeHints::default());

        let (r, _) = c.apply_size_hints(proposed, SCREEN, WORK, false, false);

        assert_eq!(r.x, expected_x);
    }

    #[test]
    fn interactive_proposals_clamp_against_the_full_screen() {
        let c = client_with_hints(SizeHints::default());

        let (r, _) = c.apply_size_hints(
            Rect::new(2500, 30, 200, 100),
            SCREEN,
            WORK,
            true,
            false,
        );

        assert_eq!(r.x, 2000 - 204);
    }

    #[test]
    fn increments_snap_down_for_floating_clients() {
        let mut c = client_with_hints(SizeHints {
            flags: SizeHintsFlags::P_RESIZE_INC,
            inc: (7, 13),
            ..Default::default()
        });
        c.is_floating = true;

        let (r, _) = c.apply_size_hints(Rect::new(10, 30, 200, 100), SCREEN, WORK, false, false);

        assert_eq!((r.w, r.h), (196, 91));
    }

    #[test]
    fn min_max_bounds_are_enforced() {
        let mut c = client_with_hints(SizeHints {
            flags: SizeHintsFlags::P_MIN_SIZE | SizeHintsFlags::P_MAX_SIZE,
            min: (50, 60),
            max: (120, 130),
            ..Default::default()
        });
        c.is_floating = true;

        let (small, _) = c.apply_size_hints(Rect::new(10, 30, 5, 5), SCREEN, WORK, false, false);
        let (big, _) = c.apply_size_hints(Rect::new(10, 30, 900, 900), SCREEN, WORK, false, false);

        assert_eq!((small.w, small.h), (50, 60));
        assert_eq!((big.w, big.h), (120, 130));
    }

    #[test]
    fn aspect_ratio_limits_width() {
        let mut c = client_with_hints(SizeHints {
            flags: SizeHintsFlags::P_ASPECT,
            min_aspect: 0.5,
            max_aspect: 2.0,
            ..Default::default()
        });
        c.is_floating = true;

        // 400x100 is wider than 2:1 so width collapses to h * max_aspect
        let (r, _) = c.apply_size_hints(Rect::new(10, 30, 400, 100), SCREEN, WORK, false, false);

        assert_eq!((r.w, r.h), (200, 100));
    }

    #[test]
    fn hints_are_skipped_for_tiled_clients_that_ignore_them() {
        let mut c = client_with_hints(SizeHints {
            flags: SizeHintsFlags::P_RESIZE_INC,
            inc: (7, 13),
            ..Default::default()
        });
        c.obeys_size_hints = false;

        let (r, _) = c.apply_size_hints(Rect::new(10, 30, 200, 100), SCREEN, WORK, false, false);

        assert_eq!((r.w, r.h), (200, 100));
    }

    #[test]
    fn unchanged_geometry_reports_no_change() {
        let c = client_with_hints(SizeHints::default());

        let (r, changed) = c.apply_size_hints(c.rect, SCREEN, WORK, false, false);

        assert_eq!(r, c.rect);
        assert!(!changed);
    }

    quickcheck! {
        // Constraining twice must always give the same result as once
        fn size_hint_application_is_idempotent(x: i16, y: i16, w: u16, h: u16) -> bool {
            let mut c = client_with_hints(SizeHints {
                flags: SizeHintsFlags::P_MIN_SIZE
                    | SizeHintsFlags::P_MAX_SIZE
                    | SizeHintsFlags::P_RESIZE_INC
                    | SizeHintsFlags::P_BASE_SIZE,
                base: (4, 4),
                inc: (7, 13),
                min: (50, 60),
                max: (700, 800),
                ..Default::default()
            });
            c.is_floating = true;

            let proposed = Rect::new(x as i32, y as i32, w as u32, h as u32);
            let (once, _) = c.apply_size_hints(proposed, SCREEN, WORK, false, false);
            let (twice, changed) = {
                let mut c2 = c.clone();
                c2.rect = once;
                c2.apply_size_hints(once, SCREEN, WORK, false, false)
            };

            once == twice && !changed
        }
    }
}
