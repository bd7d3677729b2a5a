//! The defer-execution walk: an append-only event stream recording every
//! defer push/pop and every control transfer in a function body, plus the
//! four linear scans that turn it into per-transfer defer-run lists.
//!
//! Grounded directly in the `DeferWalkEntry`/`DeferWalk`/`pushDeferEntry`
//! shape of the original analyser: one flat vector of tagged entries, each
//! stamped with the defer-nesting depth in effect when it was pushed, rather
//! than a generic tree walker. The four sub-analyses (`goto`, `break`,
//! `continue`, `return`) are separate scans because each has a different
//! anchor-matching rule, not because the data demands it.

use crate::diagnostic::{codes, Diagnostic, Diagnostics};
use crate::ids::LabelId;
use crate::source::Span;

/// `MAX_DEFERS`: the number of live (pushed-but-not-popped) defer entries
/// permitted at once.
pub const MAX_DEFERS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeferId(pub usize);

#[derive(Debug, Clone)]
pub enum WalkEntryKind {
    Defer(DeferId),
    ExitDefer,
    BreakStart,
    BreakContinueStart,
    BreakEnd,
    BreakContinueEnd,
    Label(LabelId),
    Goto { target: LabelId, span: Span },
    Break(Span),
    Continue(Span),
    Return(Span),
}

#[derive(Debug, Clone)]
struct WalkEntry {
    kind: WalkEntryKind,
    #[allow(dead_code)]
    depth: u32,
}

/// The result of resolving one control transfer: the defers that must run,
/// innermost (most recently entered) first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferResolution {
    pub span: Span,
    pub defers: Vec<DeferId>,
}

#[derive(Debug, Default)]
pub struct DeferWalk {
    entries: Vec<WalkEntry>,
    defer_depth: u32,
    defer_count: usize,
}

impl DeferWalk {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: WalkEntryKind) {
        self.entries.push(WalkEntry {
            kind,
            depth: self.defer_depth,
        });
    }

    /// Returns `None` (after reporting) once `MAX_DEFERS` live defers would
    /// be exceeded.
    pub fn push_defer(&mut self, span: Span, diags: &mut Diagnostics) -> Option<DeferId> {
        if self.defer_count >= MAX_DEFERS {
            diags.add(Diagnostic::from_code(
                &codes::E0503,
                span,
                format!("more than {MAX_DEFERS} defer statements are live at once"),
            ));
            return None;
        }
        let id = DeferId(self.defer_count);
        self.defer_count += 1;
        self.defer_depth += 1;
        self.push(WalkEntryKind::Defer(id));
        Some(id)
    }

    pub fn exit_defer(&mut self) {
        self.defer_depth = self.defer_depth.saturating_sub(1);
        self.push(WalkEntryKind::ExitDefer);
    }

    pub fn break_start(&mut self) {
        self.push(WalkEntryKind::BreakStart);
    }

    pub fn break_continue_start(&mut self) {
        self.push(WalkEntryKind::BreakContinueStart);
    }

    pub fn break_end(&mut self) {
        self.push(WalkEntryKind::BreakEnd);
    }

    pub fn break_continue_end(&mut self) {
        self.push(WalkEntryKind::BreakContinueEnd);
    }

    pub fn label(&mut self, id: LabelId) {
        self.push(WalkEntryKind::Label(id));
    }

    pub fn goto(&mut self, target: LabelId, span: Span) {
        self.push(WalkEntryKind::Goto { target, span });
    }

    pub fn record_break(&mut self, span: Span) {
        self.push(WalkEntryKind::Break(span));
    }

    pub fn record_continue(&mut self, span: Span) {
        self.push(WalkEntryKind::Continue(span));
    }

    pub fn record_return(&mut self, span: Span) {
        self.push(WalkEntryKind::Return(span));
    }

    /// Simulates the active-defer stack forward across the whole entry
    /// sequence, snapshotting it at every entry of kind `at`.
    fn snapshots_at<F>(&self, mut matches: F) -> Vec<(usize, Vec<DeferId>)>
    where
        F: FnMut(&WalkEntryKind) -> bool,
    {
        let mut active: Vec<DeferId> = Vec::new();
        let mut out = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            match &entry.kind {
                WalkEntryKind::Defer(id) => active.push(*id),
                WalkEntryKind::ExitDefer => {
                    active.pop();
                }
                _ => {}
            }
            if matches(&entry.kind) {
                out.push((i, active.clone()));
            }
        }
        out
    }

    /// Sub-analysis 1: for every `return`, the defers to run are all
    /// currently active defers, innermost first.
    pub fn analyse_return(&self) -> Vec<DeferResolution> {
        self.snapshots_at(|k| matches!(k, WalkEntryKind::Return(_)))
            .into_iter()
            .map(|(i, active)| {
                let WalkEntryKind::Return(span) = self.entries[i].kind else {
                    unreachable!()
                };
                DeferResolution {
                    span,
                    defers: active.into_iter().rev().collect(),
                }
            })
            .collect()
    }

    /// Sub-analysis 2: for every `break`, the defers entered after the
    /// nearest `BreakStart` or `BreakContinueStart`, innermost first.
    pub fn analyse_break(&self) -> Vec<DeferResolution> {
        self.analyse_bounded(
            |k| matches!(k, WalkEntryKind::Break(_)),
            |k| matches!(k, WalkEntryKind::BreakStart | WalkEntryKind::BreakContinueStart),
            |k| matches!(k, WalkEntryKind::BreakEnd | WalkEntryKind::BreakContinueEnd),
            |k| {
                if let WalkEntryKind::Break(span) = k {
                    Some(*span)
                } else {
                    None
                }
            },
        )
    }

    /// Sub-analysis 3: for every `continue`, bounded by the nearest
    /// `BreakContinueStart` only (a plain switch's `BreakStart` does not
    /// anchor a `continue`).
    pub fn analyse_continue(&self) -> Vec<DeferResolution> {
        self.analyse_bounded(
            |k| matches!(k, WalkEntryKind::Continue(_)),
            |k| matches!(k, WalkEntryKind::BreakContinueStart),
            |k| matches!(k, WalkEntryKind::BreakContinueEnd),
            |k| {
                if let WalkEntryKind::Continue(span) = k {
                    Some(*span)
                } else {
                    None
                }
            },
        )
    }

    fn analyse_bounded(
        &self,
        is_transfer: impl Fn(&WalkEntryKind) -> bool,
        is_anchor_start: impl Fn(&WalkEntryKind) -> bool,
        is_anchor_end: impl Fn(&WalkEntryKind) -> bool,
        span_of: impl Fn(&WalkEntryKind) -> Option<Span>,
    ) -> Vec<DeferResolution> {
        let mut active: Vec<DeferId> = Vec::new();
        let mut anchor_floors: Vec<usize> = Vec::new();
        let mut out = Vec::new();
        for entry in &self.entries {
            match &entry.kind {
                WalkEntryKind::Defer(id) => active.push(*id),
                WalkEntryKind::ExitDefer => {
                    active.pop();
                }
                k if is_anchor_start(k) => anchor_floors.push(active.len()),
                k if is_anchor_end(k) => {
                    anchor_floors.pop();
                }
                k if is_transfer(k) => {
                    let floor = anchor_floors.last().copied().unwrap_or(active.len());
                    let defers = active[floor..].iter().rev().copied().collect();
                    out.push(DeferResolution {
                        span: span_of(k).expect("transfer entry carries a span"),
                        defers,
                    });
                }
                _ => {}
            }
        }
        out
    }

    /// Sub-analysis 4: for every `goto`, the defers active at the goto but
    /// not active at its target label must run before the jump. Returns an
    /// error resolution (empty `defers`, reported to `diags`) when the label
    /// is unresolved or the jump would enter a scope with an extra defer.
    pub fn analyse_goto(&self, diags: &mut Diagnostics) -> Vec<DeferResolution> {
        let label_snapshots = self.snapshots_at(|k| matches!(k, WalkEntryKind::Label(_)));
        let mut out = Vec::new();
        for entry in &self.entries {
            let WalkEntryKind::Goto { target, span } = &entry.kind else {
                continue;
            };
            let label_active = label_snapshots.iter().find_map(|(i, active)| {
                if let WalkEntryKind::Label(id) = &self.entries[*i].kind {
                    (id == target).then_some(active)
                } else {
                    None
                }
            });
            let Some(label_active) = label_active else {
                // Caller already reports unresolved-goto (E0403); nothing to
                // resolve here.
                out.push(DeferResolution {
                    span: *span,
                    defers: Vec::new(),
                });
                continue;
            };
            let goto_active = self.active_defers_before(entry);
            if label_active.len() > goto_active.len()
                || goto_active[..label_active.len()] != label_active[..]
            {
                diags.add(Diagnostic::from_code(
                    &codes::E0405,
                    *span,
                    "goto would jump into a scope guarded by a defer not active at the source",
                ));
                out.push(DeferResolution {
                    span: *span,
                    defers: Vec::new(),
                });
                continue;
            }
            let defers = goto_active[label_active.len()..]
                .iter()
                .rev()
                .copied()
                .collect();
            out.push(DeferResolution { span: *span, defers });
        }
        out
    }

    fn active_defers_before(&self, target: &WalkEntry) -> Vec<DeferId> {
        let mut active = Vec::new();
        for entry in &self.entries {
            if std::ptr::eq(entry, target) {
                break;
            }
            match &entry.kind {
                WalkEntryKind::Defer(id) => active.push(*id),
                WalkEntryKind::ExitDefer => {
                    active.pop();
                }
                _ => {}
            }
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_inside_two_defers_runs_them_innermost_first() {
        let mut walk = DeferWalk::new();
        let mut diags = Diagnostics::new();
        let d0 = walk.push_defer(Span::new(0, 1), &mut diags).unwrap();
        let d1 = walk.push_defer(Span::new(1, 2), &mut diags).unwrap();
        walk.record_return(Span::new(2, 3));
        walk.exit_defer();
        walk.exit_defer();

        let resolutions = walk.analyse_return();
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].defers, vec![d1, d0]);
    }

    #[test]
    fn break_only_sees_defers_after_the_loop_anchor() {
        let mut walk = DeferWalk::new();
        let mut diags = Diagnostics::new();
        let outer = walk.push_defer(Span::new(0, 1), &mut diags).unwrap();
        walk.break_continue_start();
        let inner = walk.push_defer(Span::new(1, 2), &mut diags).unwrap();
        walk.record_break(Span::new(2, 3));
        walk.exit_defer();
        walk.break_continue_end();
        walk.exit_defer();
        let _ = outer;

        let resolutions = walk.analyse_break();
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].defers, vec![inner]);
    }

    #[test]
    fn continue_ignores_a_plain_switch_anchor() {
        let mut walk = DeferWalk::new();
        walk.break_continue_start(); // loop
        walk.break_start(); // nested switch
        walk.record_continue(Span::new(0, 1));
        walk.break_end();
        walk.break_continue_end();

        let resolutions = walk.analyse_continue();
        assert_eq!(resolutions.len(), 1);
        assert!(resolutions[0].defers.is_empty());
    }

    #[test]
    fn goto_forward_out_of_a_defer_scope_runs_that_defer() {
        let mut walk = DeferWalk::new();
        let mut diags = Diagnostics::new();
        let d = walk.push_defer(Span::new(0, 1), &mut diags).unwrap();
        walk.goto(LabelId(0), Span::new(1, 2));
        walk.exit_defer();
        walk.label(LabelId(0));

        let resolutions = walk.analyse_goto(&mut diags);
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].defers, vec![d]);
        assert!(diags.is_empty());
    }

    #[test]
    fn goto_into_a_protected_defer_scope_is_an_error() {
        let mut walk = DeferWalk::new();
        let mut diags = Diagnostics::new();
        walk.goto(LabelId(0), Span::new(0, 1));
        let _d = walk.push_defer(Span::new(1, 2), &mut diags).unwrap();
        walk.label(LabelId(0));
        walk.exit_defer();

        let resolutions = walk.analyse_goto(&mut diags);
        assert_eq!(resolutions.len(), 1);
        assert!(resolutions[0].defers.is_empty());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn pushing_past_max_defers_reports_too_many_defers() {
        let mut walk = DeferWalk::new();
        let mut diags = Diagnostics::new();
        for _ in 0..MAX_DEFERS {
            walk.push_defer(Span::new(0, 1), &mut diags).unwrap();
        }
        assert!(walk.push_defer(Span::new(0, 1), &mut diags).is_none());
        assert_eq!(diags.error_count(), 1);
    }
}
