//! The side-effect free internal state representation of the window manager.
use crate::{
    pure::{
        geometry::{Point, Rect},
        monitor::{Monitor, MonitorDefaults},
        Client, TagMask,
    },
    Error, Result, Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All monitors and clients known to the window manager.
///
/// Client records live in a single arena keyed by window id; monitors hold
/// only id chains. Detaching a client from its monitor therefore invalidates
/// both of the monitor's orders atomically and can never double-free or leave
/// a dangling reference behind.
///
/// Every mutating operation leaves the invariants listed on
/// [MonitorSet::check_invariants] intact. Operations return whether they
/// changed anything so that callers can skip redundant server round trips.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSet {
    pub(crate) monitors: Vec<Monitor>,
    pub(crate) clients: HashMap<Xid, Client>,
    pub(crate) sel_mon: usize,
    defaults: MonitorDefaults,
    valid_tags: TagMask,
    hidden_tags: TagMask,
}

impl MonitorSet {
    /// Create a new [MonitorSet] covering the given screen rects.
    ///
    /// # Errors
    /// Errors if no screens are attached or the tag count is out of range.
    pub fn try_new(
        defaults: MonitorDefaults,
        n_tags: usize,
        hidden_tags: TagMask,
        screens: Vec<Rect>,
    ) -> Result<Self> {
        if !(1..=31).contains(&n_tags) {
            return Err(Error::InvalidTagCount(n_tags));
        }

        let mut s = Self {
            monitors: Vec::new(),
            clients: HashMap::new(),
            sel_mon: 0,
            defaults,
            valid_tags: TagMask::all(n_tags),
            hidden_tags,
        };

        if !s.update_monitors(screens) {
            return Err(Error::NoMonitors);
        }

        Ok(s)
    }

    /// The mask of all configured tags.
    pub fn valid_tags(&self) -> TagMask {
        self.valid_tags
    }

    /// The tags that can not be brought into view directly.
    pub fn viewable_tags(&self) -> TagMask {
        self.valid_tags & !self.hidden_tags
    }

    // monitor / client access

    /// Iterate over all monitors in index order.
    pub fn monitors(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.iter()
    }

    /// The number of monitors currently attached.
    pub fn n_monitors(&self) -> usize {
        self.monitors.len()
    }

    /// The monitor at the given index, if there is one.
    pub fn monitor(&self, index: usize) -> Option<&Monitor> {
        self.monitors.get(index)
    }

    /// Mutable access to the monitor at the given index.
    ///
    /// Exposed so that a bar collaborator can register its bar window and
    /// adjust the reserved geometry per monitor.
    pub fn monitor_mut(&mut self, index: usize) -> Option<&mut Monitor> {
        self.monitors.get_mut(index)
    }

    /// The currently focused monitor.
    pub fn focused_monitor(&self) -> &Monitor {
        &self.monitors[self.sel_mon]
    }

    /// Mutable access to the currently focused monitor.
    pub fn focused_monitor_mut(&mut self) -> &mut Monitor {
        &mut self.monitors[self.sel_mon]
    }

    /// The index of the currently focused monitor.
    pub fn focused_monitor_index(&self) -> usize {
        self.sel_mon
    }

    /// Move monitor focus to the given index (no client side effects).
    pub fn focus_monitor(&mut self, index: usize) {
        if index < self.monitors.len() {
            self.sel_mon = index;
        }
    }

    /// Whether the given window is currently managed.
    pub fn contains(&self, id: &Xid) -> bool {
        self.clients.contains_key(id)
    }

    /// The client record for the given window, if it is managed.
    pub fn client(&self, id: &Xid) -> Option<&Client> {
        self.clients.get(id)
    }

    /// Mutable access to the client record for the given window.
    pub fn client_mut(&mut self, id: &Xid) -> Option<&mut Client> {
        self.clients.get_mut(id)
    }

    /// The selected client of the focused monitor.
    pub fn focused_client(&self) -> Option<Xid> {
        self.focused_monitor().sel
    }

    /// Iterate over all managed window ids in an unspecified order.
    pub fn all_clients(&self) -> impl Iterator<Item = &Xid> {
        self.clients.keys()
    }

    /// All window ids in attachment order, monitor by monitor.
    ///
    /// This is the order advertised through `_NET_CLIENT_LIST`.
    pub fn client_list(&self) -> Vec<Xid> {
        self.monitors
            .iter()
            .flat_map(|m| m.clients.iter().rev().copied())
            .collect()
    }

    /// Whether the given client intersects the viewed tag-set of its monitor.
    pub fn is_visible(&self, id: &Xid) -> bool {
        match self.clients.get(id) {
            Some(c) => match self.monitors.get(c.mon) {
                Some(m) => c.tags.intersects(m.active_tag_set()),
                None => false,
            },
            None => false,
        }
    }

    /// Visible clients of a monitor in attachment order.
    pub fn visible_clients(&self, mon: usize) -> Vec<Xid> {
        match self.monitors.get(mon) {
            Some(m) => m
                .clients
                .iter()
                .filter(|id| self.is_visible(id))
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Visible, non-floating clients of a monitor in attachment order.
    ///
    /// This is the sequence handed to tiled layouts.
    pub fn tiled_clients(&self, mon: usize) -> Vec<Xid> {
        self.visible_clients(mon)
            .into_iter()
            .filter(|id| !self.clients[id].is_floating)
            .collect()
    }

    // attachment

    /// Add a new client record, attaching it at the head of its monitor's
    /// attachment list and focus stack.
    pub fn insert(&mut self, mut client: Client) {
        if client.mon >= self.monitors.len() {
            client.mon = self.sel_mon;
        }
        client.tags = client.tags.clamped_to(self.valid_tags);
        if client.tags.is_empty() {
            client.tags = self.monitors[client.mon].active_tag_set();
        }

        let id = client.id;
        let m = &mut self.monitors[client.mon];
        m.clients.insert(0, id);
        m.stack.insert(0, id);
        self.clients.insert(id, client);
    }

    /// Remove a client, detaching it from both of its monitor's orders.
    ///
    /// The monitor selection falls back to the most recently focused visible
    /// client left on the stack.
    pub fn remove(&mut self, id: &Xid) -> Option<Client> {
        let client = self.clients.remove(id)?;

        if let Some(m) = self.monitors.get_mut(client.mon) {
            m.clients.retain(|c| c != id);
            m.stack.retain(|c| c != id);
        }

        if self.monitors.get(client.mon).and_then(|m| m.sel) == Some(*id) {
            self.monitors[client.mon].sel = self.top_of_stack(client.mon);
        }

        Some(client)
    }

    /// The most recently focused visible client on a monitor's stack.
    pub fn top_of_stack(&self, mon: usize) -> Option<Xid> {
        self.monitors
            .get(mon)?
            .stack
            .iter()
            .find(|id| self.is_visible(id))
            .copied()
    }

    /// Mark `id` as focused: monitor focus follows it and it is promoted to
    /// the head of its monitor's focus stack.
    pub fn focus_client(&mut self, id: &Xid) {
        let mon = match self.clients.get(id) {
            Some(c) => c.mon,
            None => return,
        };

        let m = &mut self.monitors[mon];
        m.stack.retain(|c| c != id);
        m.stack.insert(0, *id);
        m.sel = Some(*id);
        self.sel_mon = mon;
    }

    /// Clear the selection of the given monitor.
    pub fn clear_focus(&mut self, mon: usize) {
        if let Some(m) = self.monitors.get_mut(mon) {
            m.sel = None;
        }
    }

    // focus / stack traversal

    /// The next (dir > 0) or previous (dir < 0) visible client relative to
    /// the current selection in attachment order, wrapping at the ends.
    pub fn cycle_client(&self, dir: i32) -> Option<Xid> {
        let m = self.focused_monitor();
        let visible = self.visible_clients(self.sel_mon);
        if visible.is_empty() {
            return None;
        }

        let cur = m.sel.and_then(|sel| visible.iter().position(|id| *id == sel));

        let next = match cur {
            Some(i) => {
                let n = visible.len() as i32;
                (((i as i32 + dir) % n + n) % n) as usize
            }
            // no current selection: pick an end based on direction
            None if dir > 0 => 0,
            None => visible.len() - 1,
        };

        Some(visible[next])
    }

    /// Swap the selected client with the next / previous visible tiled client
    /// in the attachment order, wrapping at the ends.
    ///
    /// The focus stack is untouched so focus stays with the moved client.
    pub fn swap_in_stack(&mut self, dir: i32) -> bool {
        let sel = match self.focused_client() {
            Some(id) => id,
            None => return false,
        };
        if self.clients[&sel].is_floating {
            return false;
        }

        let tiled = self.tiled_clients(self.sel_mon);
        if tiled.len() < 2 {
            return false;
        }

        let i = match tiled.iter().position(|id| *id == sel) {
            Some(i) => i,
            None => return false,
        };
        let n = tiled.len() as i32;
        let j = (((i as i32 + dir) % n + n) % n) as usize;
        let other = tiled[j];

        let m = &mut self.monitors[self.sel_mon];
        let a = m.clients.iter().position(|id| *id == sel);
        let b = m.clients.iter().position(|id| *id == other);
        if let (Some(a), Some(b)) = (a, b) {
            m.clients.swap(a, b);
            return true;
        }

        false
    }

    /// Move the given client to the head of its monitor's attachment list,
    /// or swap it with the next tiled client if it is already the master.
    pub fn promote_to_master(&mut self, id: &Xid) -> bool {
        let mon = match self.clients.get(id) {
            Some(c) if !c.is_floating => c.mon,
            _ => return false,
        };

        let target = match self.tiled_clients(mon).first() {
            Some(master) if master == id => match self.tiled_clients(mon).get(1) {
                Some(&next) => next,
                None => return false,
            },
            Some(_) => *id,
            None => return false,
        };

        let m = &mut self.monitors[mon];
        m.clients.retain(|c| *c != target);
        m.clients.insert(0, target);

        true
    }

    // tagging

    /// View the given tag-set on the focused monitor.
    ///
    /// Viewing the currently active set is a no-op; otherwise the two slot
    /// history flips, making a second `view` of the previous mask an
    /// involution. Hidden tags can not be brought into view this way.
    pub fn view(&mut self, mask: TagMask) -> bool {
        let mask = mask.clamped_to(self.viewable_tags());
        let m = self.focused_monitor_mut();

        if mask == m.active_tag_set() {
            return false;
        }

        m.set_view(mask);
        self.reselect(self.sel_mon);

        true
    }

    /// XOR the given tag-set into the focused monitor's view.
    pub fn toggle_view(&mut self, mask: TagMask) -> bool {
        let mask = mask.clamped_to(self.viewable_tags());
        let changed = self.focused_monitor_mut().xor_view(mask);
        if changed {
            self.reselect(self.sel_mon);
        }

        changed
    }

    /// Re-tag the selected client with the given mask.
    pub fn tag(&mut self, mask: TagMask) -> bool {
        let mask = mask.clamped_to(self.valid_tags);
        if mask.is_empty() {
            return false;
        }

        let sel = match self.focused_client() {
            Some(id) => id,
            None => return false,
        };

        self.clients.get_mut(&sel).expect("selected client in arena").tags = mask;
        self.reselect(self.sel_mon);

        true
    }

    /// XOR the given mask into the selected client's tags, refusing to empty
    /// them.
    pub fn toggle_tag(&mut self, mask: TagMask) -> bool {
        let mask = mask.clamped_to(self.valid_tags);
        let sel = match self.focused_client() {
            Some(id) => id,
            None => return false,
        };

        let c = self.clients.get_mut(&sel).expect("selected client in arena");
        let new = c.tags ^ mask;
        if new.is_empty() {
            return false;
        }

        c.tags = new;
        self.reselect(self.sel_mon);

        true
    }

    /// Make sure the tag-set viewed on the focused monitor contains the given
    /// client's tags, flipping the view history slot if it does not.
    pub fn reveal_client(&mut self, id: &Xid) -> bool {
        let (mon, tags) = match self.clients.get(id) {
            Some(c) => (c.mon, c.tags),
            None => return false,
        };

        self.sel_mon = mon;
        if self.is_visible(id) {
            return false;
        }

        self.monitors[mon].set_view(tags);
        true
    }

    // restore an in-view selection after the visible set changed
    fn reselect(&mut self, mon: usize) {
        let still_visible = self.monitors[mon]
            .sel
            .map(|id| self.is_visible(&id))
            .unwrap_or(false);

        if !still_visible {
            self.monitors[mon].sel = self.top_of_stack(mon);
        }
    }

    // monitors

    /// The index of the monitor whose screen contains the given point,
    /// falling back to the focused monitor.
    pub fn monitor_at(&self, p: Point) -> usize {
        self.monitors
            .iter()
            .position(|m| m.screen.contains_point(p))
            .unwrap_or(self.sel_mon)
    }

    /// The index of the monitor with the largest intersection with the given
    /// rect, falling back to the focused monitor.
    pub fn monitor_for_rect(&self, r: &Rect) -> usize {
        let mut best = self.sel_mon;
        let mut area = 0;

        for (i, m) in self.monitors.iter().enumerate() {
            let a = m.screen.intersection_area(r);
            if a > area {
                area = a;
                best = i;
            }
        }

        best
    }

    /// The next (dir > 0) or previous monitor index, cycling.
    pub fn next_monitor(&self, dir: i32) -> usize {
        let n = self.monitors.len() as i32;
        let i = self.sel_mon as i32;

        (((i + dir.signum()) % n + n) % n) as usize
    }

    /// Move a client to the given monitor, re-tagging it with that monitor's
    /// viewed tag-set and attaching it at the head of both orders.
    pub fn send_to_monitor(&mut self, id: &Xid, target: usize) -> bool {
        if target >= self.monitors.len() {
            return false;
        }

        let source = match self.clients.get(id) {
            Some(c) if c.mon != target => c.mon,
            _ => return false,
        };

        let m = &mut self.monitors[source];
        m.clients.retain(|c| c != id);
        m.stack.retain(|c| c != id);
        if m.sel == Some(*id) {
            m.sel = None;
        }
        self.reselect(source);

        let tags = self.monitors[target].active_tag_set();
        let c = self.clients.get_mut(id).expect("checked above");
        c.mon = target;
        c.tags = tags;

        let m = &mut self.monitors[target];
        m.clients.insert(0, *id);
        m.stack.insert(0, *id);

        true
    }

    /// Reconcile the monitor list against a fresh set of screen rects.
    ///
    /// Identical rects are deduplicated. Existing monitors keep their index
    /// and have their geometry updated in place; extra rects become new
    /// monitors; when fewer rects are reported the dropped monitors' clients
    /// are appended (stack order preserved) to the first monitor.
    ///
    /// Returns whether anything changed.
    pub fn update_monitors(&mut self, screens: Vec<Rect>) -> bool {
        let mut unique: Vec<Rect> = Vec::with_capacity(screens.len());
        for r in screens {
            if r.w > 0 && r.h > 0 && !unique.contains(&r) {
                unique.push(r);
            }
        }

        if unique.is_empty() {
            return false;
        }

        let mut changed = false;

        // grow / update in place
        for (i, r) in unique.iter().enumerate() {
            match self.monitors.get_mut(i) {
                Some(m) => {
                    if m.screen != *r {
                        m.resize(*r);
                        changed = true;
                    }
                }
                None => {
                    self.monitors.push(Monitor::new(i, *r, &self.defaults));
                    changed = true;
                }
            }
        }

        // drain removed monitors into the first one
        while self.monitors.len() > unique.len() {
            let dropped = self.monitors.pop().expect("len > unique len >= 1");
            changed = true;

            for id in &dropped.clients {
                if let Some(c) = self.clients.get_mut(id) {
                    c.mon = 0;
                }
            }
            self.monitors[0].clients.extend(dropped.clients);
            self.monitors[0].stack.extend(dropped.stack);
        }

        if self.sel_mon >= self.monitors.len() {
            self.sel_mon = 0;
        }
        if changed {
            for i in 0..self.monitors.len() {
                self.reselect(i);
            }
        }

        changed
    }

    /// Nudge the focused monitor's master factor, clamping to [0.05, 0.95].
    pub fn adjust_mfact(&mut self, delta: f32) -> bool {
        let m = self.focused_monitor_mut();
        let new = (m.mfact + delta).clamp(0.05, 0.95);
        let changed = (new - m.mfact).abs() > f32::EPSILON;
        m.mfact = new;

        changed
    }

    /// Adjust the focused monitor's master count, saturating at zero.
    pub fn adjust_nmaster(&mut self, delta: i32) -> bool {
        let m = self.focused_monitor_mut();
        let new = (m.nmaster as i32 + delta).max(0) as u32;
        let changed = new != m.nmaster;
        m.nmaster = new;

        changed
    }

    /// Assert the structural invariants that must hold between event
    /// handler executions.
    #[cfg(test)]
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        use std::collections::HashSet;

        let mut seen: HashSet<Xid> = HashSet::new();

        for m in &self.monitors {
            let in_clients: HashSet<Xid> = m.clients.iter().copied().collect();
            let in_stack: HashSet<Xid> = m.stack.iter().copied().collect();

            if in_clients != in_stack {
                return Err(format!(
                    "monitor {} clients {:?} != stack {:?}",
                    m.num, m.clients, m.stack
                ));
            }

            for id in &m.clients {
                if !seen.insert(*id) {
                    return Err(format!("{id} is on more than one monitor"));
                }
                let c = self
                    .clients
                    .get(id)
                    .ok_or(format!("{id} is listed but not in the arena"))?;
                if c.mon != m.num {
                    return Err(format!("{id} is on monitor {} but thinks it is on {}", m.num, c.mon));
                }
            }

            if let Some(sel) = m.sel {
                if !self.is_visible(&sel) {
                    return Err(format!("selected client {sel} is not visible"));
                }
            }

            if m.sel_tags > 1 {
                return Err(format!("monitor {} sel_tags out of range", m.num));
            }
        }

        for (id, c) in &self.clients {
            if !seen.contains(id) {
                return Err(format!("{id} is in the arena but not on any monitor"));
            }
            if c.tags.is_empty() || !c.tags.clamped_to(self.valid_tags).eq(&c.tags) {
                return Err(format!("{id} has invalid tags {}", c.tags));
            }
        }

        Ok(())
    }
}
