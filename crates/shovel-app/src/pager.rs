//! Accumulated flow list with cursor-based paging
//!
//! Pages arrive newest-first. Consecutive pages overlap on the boundary flow
//! (the cursor bound is inclusive), so merging skips ids already present.
//! Tick markers are interleaved whenever the tick changes between
//! consecutive flows.

use std::collections::HashSet;

use shovel_client::is_terminal_page;
use shovel_core::{FlowId, FlowSummary, Timestamp};

use crate::timeline::TickClock;

/// One entry of the rendered list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListRow {
    Tick(i64),
    Flow(FlowSummary),
}

impl ListRow {
    pub fn flow(&self) -> Option<&FlowSummary> {
        match self {
            ListRow::Flow(flow) => Some(flow),
            ListRow::Tick(_) => None,
        }
    }
}

/// Direction of keyboard navigation in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the top (newer flows)
    Previous,
    /// Towards the bottom (older flows)
    Next,
}

#[derive(Debug, Clone, Default)]
pub struct FlowListPager {
    rows: Vec<ListRow>,
    ids: HashSet<FlowId>,
    last_tick: Option<i64>,
    exhausted: bool,
}

impl FlowListPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every flow, ahead of a fresh load.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.ids.clear();
        self.last_tick = None;
        self.exhausted = false;
    }

    /// Append a page, skipping flows already listed. Returns how many flows
    /// were added.
    ///
    /// The terminal-page rule looks at the page as delivered, duplicates
    /// included.
    pub fn merge(&mut self, page: Vec<FlowSummary>, clock: &TickClock) -> usize {
        self.exhausted = is_terminal_page(page.len());

        let mut added = 0;
        for flow in page {
            if !self.ids.insert(flow.id) {
                continue;
            }
            if let Some(tick) = clock.tick_of(flow.ts_start) {
                if self.last_tick != Some(tick) {
                    self.rows.push(ListRow::Tick(tick));
                    self.last_tick = Some(tick);
                }
            }
            self.rows.push(ListRow::Flow(flow));
            added += 1;
        }
        added
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn flows(&self) -> impl Iterator<Item = &FlowSummary> {
        self.rows.iter().filter_map(ListRow::flow)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: FlowId) -> bool {
        self.ids.contains(&id)
    }

    pub fn flow(&self, id: FlowId) -> Option<&FlowSummary> {
        self.flows().find(|f| f.id == id)
    }

    /// Whether the last page was terminal.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Cursor for the next page: start of the oldest listed flow.
    pub fn cursor(&self) -> Option<Timestamp> {
        self.flows().last().map(|f| f.ts_start)
    }

    /// Flow next to `selected` in `direction`, skipping tick markers.
    ///
    /// Without a selection the first flow is returned. A selection that is
    /// not listed has no neighbour.
    pub fn adjacent(&self, selected: Option<FlowId>, direction: Direction) -> Option<FlowId> {
        let Some(selected) = selected else {
            return self.flows().next().map(|f| f.id);
        };
        let index = self
            .rows
            .iter()
            .position(|row| row.flow().is_some_and(|f| f.id == selected))?;

        let neighbour = match direction {
            Direction::Previous => self.rows[..index].iter().rev().find_map(ListRow::flow),
            Direction::Next => self.rows[index + 1..].iter().find_map(ListRow::flow),
        };
        neighbour.map(|f| f.id)
    }

    /// Start timestamps of the flows at positions `first..=last` of the flow
    /// sequence (tick markers excluded), as `(newest, oldest)`.
    pub fn visible_span(&self, first: usize, last: usize) -> Option<(Timestamp, Timestamp)> {
        let (first, last) = (first.min(last), first.max(last));
        let newest = self.flows().nth(first)?.ts_start;
        let oldest = self
            .flows()
            .take(last.saturating_add(1))
            .last()
            .map(|f| f.ts_start)
            .unwrap_or(newest);
        Some((newest, oldest))
    }
}
