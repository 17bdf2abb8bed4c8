//! Per-traversal visit bookkeeping
//!
//! Tracks, for one top-level expansion, which groups are on the current path
//! and which have been fully expanded. Reaching a group that is still on the
//! path closes a cycle; reaching one that is already finished is a diamond.

use std::collections::HashMap;

use super::outcome::{Expansion, ExpansionFailure};

#[derive(Debug, PartialEq, Clone, Copy)]
enum VisitState {
    Visiting,
    /// Expanded with the group at `depth`; `truncated` when part of its
    /// subtree was cut off by the depth limit or left to a cyclic ancestor
    Visited { depth: usize, truncated: bool },
}

/// Result of trying to enter a group
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Visit {
    /// Caller must expand the group and call [`Traversal::leave`] when done
    Enter,
    /// Already expanded earlier in this traversal
    Expanded,
    /// Group is an ancestor of itself; carries the closing path
    Cycle(Vec<String>),
    /// Entering would exceed the maximum nesting depth
    TooDeep,
}

#[derive(Debug)]
struct Frame {
    group: String,
    truncated: bool,
}

#[derive(Debug)]
pub(crate) struct Traversal {
    max_depth: usize,
    state: HashMap<String, VisitState>,
    path: Vec<Frame>,
    outcome: Expansion,
}

impl Traversal {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            state: HashMap::new(),
            path: Vec::new(),
            outcome: Expansion::default(),
        }
    }

    /// Number of groups on the current expansion path
    pub(crate) fn depth(&self) -> usize {
        self.path.len()
    }

    /// Decides whether `group` is expanded at the current depth
    ///
    /// A group whose earlier expansion was truncated is entered again when
    /// reached at a shallower depth, since more of its subtree now fits
    /// under the limit.
    pub(crate) fn enter(&mut self, group: &str) -> Visit {
        let key = visit_key(group);
        let depth = self.depth();

        match self.state.get(&key).copied() {
            Some(VisitState::Visiting) => {
                let start = self
                    .path
                    .iter()
                    .position(|frame| visit_key(&frame.group) == key)
                    .unwrap_or(0);
                let mut cycle: Vec<String> =
                    self.path[start..].iter().map(|frame| frame.group.clone()).collect();
                cycle.push(group.to_string());
                // Groups inside the cycle rely on the ancestor's expansion,
                // which may still be cut short
                self.mark_truncated_from(start + 1);
                return Visit::Cycle(cycle);
            }
            Some(VisitState::Visited { truncated: false, .. }) => return Visit::Expanded,
            Some(VisitState::Visited { depth: seen, truncated: true }) if depth >= seen => {
                // Reached no shallower than before, so the same cut applies here
                self.mark_truncated_from(0);
                return Visit::Expanded;
            }
            _ => {}
        }

        if depth >= self.max_depth {
            self.mark_truncated_from(0);
            return Visit::TooDeep;
        }

        self.state.insert(key, VisitState::Visiting);
        self.path.push(Frame {
            group: group.to_string(),
            truncated: false,
        });
        Visit::Enter
    }

    pub(crate) fn leave(&mut self, group: &str) {
        let truncated = self.path.pop().map(|frame| frame.truncated).unwrap_or(false);
        self.state.insert(
            visit_key(group),
            VisitState::Visited {
                depth: self.path.len(),
                truncated,
            },
        );
    }

    fn mark_truncated_from(&mut self, start: usize) {
        for frame in self.path.iter_mut().skip(start) {
            frame.truncated = true;
        }
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn record_group_expanded(&mut self) {
        self.outcome.groups_expanded += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: ExpansionFailure) {
        self.outcome.failures.push(failure);
    }

    pub(crate) fn record_cycle(&mut self, cycle: Vec<String>) {
        self.outcome.cycles.push(cycle);
    }

    pub(crate) fn finish(self) -> Expansion {
        self.outcome
    }
}

/// Group addresses are case-insensitive in the directory
fn visit_key(group: &str) -> String {
    group.trim().to_ascii_lowercase()
}
