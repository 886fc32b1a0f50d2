//! Built-in layouts.
use crate::{
    core::layout::{Layout, LayoutCtx},
    pure::geometry::Rect,
    Xid,
};

/// The classic master / stack tiling.
///
/// The master column holds the first `nmaster` clients (or a derived count
/// when `nmaster` is zero) and takes `mfact` of the work area width whenever
/// a stack column is needed. Within each column heights are divided equally
/// with the rounding remainder absorbed by the later rows, and every tile is
/// surrounded by the configured uniform gap.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    /// Upper bound on the derived master count when `nmaster` is zero
    pub dynamic_max: u32,
}

impl Tile {
    /// A [Tile] layout capping the derived master count at `dynamic_max`.
    pub fn boxed(dynamic_max: u32) -> Box<dyn Layout> {
        Box::new(Self {
            dynamic_max: dynamic_max.max(1),
        })
    }

    fn master_count(&self, n: u32, nmaster: u32) -> u32 {
        if nmaster > 0 {
            nmaster
        } else {
            (n / 2).max(1).min(self.dynamic_max)
        }
    }
}

impl Layout for Tile {
    fn symbol(&self, _n_visible: usize) -> String {
        "[]=".to_owned()
    }

    fn boxed_clone(&self) -> Box<dyn Layout> {
        Box::new(*self)
    }

    fn arrange(&self, ctx: &LayoutCtx<'_>) -> Option<Vec<(Xid, Rect)>> {
        let n = ctx.clients.len() as u32;
        if n == 0 {
            return Some(vec![]);
        }

        let Rect { x, y, w, h } = ctx.work;
        let g = ctx.gap_px;
        let m = self.master_count(n, ctx.nmaster);

        let mw = if n > m {
            (w as f32 * ctx.mfact) as u32
        } else {
            w.saturating_sub(g)
        };

        let mut my = g;
        let mut ty = g;
        let mut positions = Vec::with_capacity(n as usize);

        for (i, &id) in ctx.clients.iter().enumerate() {
            let i = i as u32;
            let r = if i < m {
                let rows_left = n.min(m) - i;
                let row_h = ((h - my) / rows_left).saturating_sub(g).max(1);
                let r = Rect::new(x + g as i32, y + my as i32, mw.saturating_sub(g).max(1), row_h);
                my = (my + row_h + g).min(h);
                r
            } else {
                let rows_left = n - i;
                let row_h = ((h - ty) / rows_left).saturating_sub(g).max(1);
                let r = Rect::new(
                    x + (mw + g) as i32,
                    y + ty as i32,
                    w.saturating_sub(mw + 2 * g).max(1),
                    row_h,
                );
                ty = (ty + row_h + g).min(h);
                r
            };

            positions.push((id, r));
        }

        Some(positions)
    }
}

/// Fullscreen-within-the-work-area: every visible client takes the whole
/// work area (minus gaps) and the focused one sits on top.
#[derive(Debug, Clone, Copy)]
pub struct Monocle;

impl Monocle {
    /// A boxed [Monocle] layout.
    pub fn boxed() -> Box<dyn Layout> {
        Box::new(Self)
    }
}

impl Layout for Monocle {
    fn symbol(&self, n_visible: usize) -> String {
        format!("[{n_visible}]")
    }

    fn boxed_clone(&self) -> Box<dyn Layout> {
        Box::new(*self)
    }

    fn arrange(&self, ctx: &LayoutCtx<'_>) -> Option<Vec<(Xid, Rect)>> {
        let r = ctx.work.shrink_by(ctx.gap_px);

        Some(ctx.clients.iter().map(|&id| (id, r)).collect())
    }
}

/// The null arrangement: windows stay wherever they were last put.
#[derive(Debug, Clone, Copy)]
pub struct Floating;

impl Floating {
    /// A boxed [Floating] layout.
    pub fn boxed() -> Box<dyn Layout> {
        Box::new(Self)
    }
}

impl Layout for Floating {
    fn symbol(&self, _n_visible: usize) -> String {
        "><>".to_owned()
    }

    fn boxed_clone(&self) -> Box<dyn Layout> {
        Box::new(*self)
    }

    fn arrange(&self, _: &LayoutCtx<'_>) -> Option<Vec<(Xid, Rect)>> {
        None
    }

    fn is_floating(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use simple_test_case::test_case;

    const WORK: Rect = Rect::new(0, 18, 1920, 1062);

    fn ids(n: u32) -> Vec<Xid> {
        (1..=n).map(Xid).collect()
    }

    fn tile(n: u32, mfact: f32, nmaster: u32, gap: u32) -> Vec<(Xid, Rect)> {
        let clients = ids(n);
        let ctx = LayoutCtx {
            work: WORK,
            mfact,
            nmaster,
            gap_px: gap,
            clients: &clients,
        };

        Tile { dynamic_max: 3 }.arrange(&ctx).expect("tile arranges")
    }

    #[test]
    fn single_client_fills_the_work_area_minus_gaps() {
        let positions = tile(1, 0.55, 1, 10);

        assert_eq!(positions, vec![(Xid(1), Rect::new(10, 28, 1900, 1042))]);
    }

    #[test]
    fn master_column_takes_mfact_of_the_width() {
        let positions = tile(2, 0.55, 1, 0);
        let (_, master) = positions[0];
        let (_, stacked) = positions[1];

        assert_eq!(master.w, (1920.0 * 0.55) as u32);
        assert_eq!(stacked.x, master.right());
        assert_eq!(stacked.right(), WORK.right());
    }

    #[test]
    fn stack_rows_share_the_column_height() {
        let positions = tile(4, 0.6, 1, 0);

        // one master, three stack rows: 1062 / 3 = 354
        let heights: Vec<u32> = positions[1..].iter().map(|(_, r)| r.h).collect();
        assert_eq!(heights, vec![354, 354, 354]);
    }

    #[test]
    fn rounding_remainder_lands_in_the_final_row() {
        let positions = tile(4, 0.6, 1, 0);
        let last = positions.last().unwrap().1;

        assert_eq!(last.bottom(), WORK.bottom());
    }

    #[test_case(0, 4, 2; "zero nmaster derives from client count")]
    #[test_case(0, 10, 3; "derived count is capped")]
    #[test_case(2, 10, 2; "explicit nmaster wins")]
    #[test]
    fn master_count(nmaster: u32, n: u32, expected: u32) {
        assert_eq!(Tile { dynamic_max: 3 }.master_count(n, nmaster), expected);
    }

    #[test]
    fn monocle_stacks_everything_on_the_work_area() {
        let clients = ids(3);
        let ctx = LayoutCtx {
            work: WORK,
            mfact: 0.55,
            nmaster: 1,
            gap_px: 5,
            clients: &clients,
        };

        let positions = Monocle.arrange(&ctx).expect("monocle arranges");

        assert_eq!(positions.len(), 3);
        assert!(positions.iter().all(|(_, r)| *r == WORK.shrink_by(5)));
    }

    #[test]
    fn monocle_symbol_shows_the_visible_count() {
        assert_eq!(Monocle.symbol(4), "[4]");
    }

    #[test]
    fn floating_leaves_positions_alone() {
        let clients = ids(3);
        let ctx = LayoutCtx {
            work: WORK,
            mfact: 0.55,
            nmaster: 1,
            gap_px: 5,
            clients: &clients,
        };

        assert!(Floating.arrange(&ctx).is_none());
        assert!(Floating.is_floating());
    }

    #[derive(Debug, Clone, Copy)]
    struct TileArgs {
        n: u32,
        mfact: f32,
        nmaster: u32,
        gap: u32,
    }

    impl Arbitrary for TileArgs {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                n: u32::arbitrary(g) % 12 + 1,
                mfact: 0.05 + (u32::arbitrary(g) % 91) as f32 / 100.0,
                nmaster: u32::arbitrary(g) % 4,
                gap: u32::arbitrary(g) % 20,
            }
        }
    }

    #[quickcheck]
    fn tile_produces_non_overlapping_rects_within_the_work_area(args: TileArgs) -> bool {
        let positions = tile(args.n, args.mfact, args.nmaster, args.gap);

        let all_inside = positions.iter().all(|(_, r)| WORK.contains(r));

        let disjoint = positions.iter().enumerate().all(|(i, (_, a))| {
            positions[i + 1..]
                .iter()
                .all(|(_, b)| a.intersection_area(b) == 0)
        });

        positions.len() == args.n as usize && all_inside && disjoint
    }
}
