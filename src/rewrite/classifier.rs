//! Declaration classifier
//!
//! Decides, for one line inside a scope, whether it binds or reuses names and
//! produces the corrected text. The only state touched is the scope's binding
//! set.

use tracing::debug;

use crate::report::{Issue, RewriteDecision};
use crate::rewrite::lookahead::{Lookahead, LookaheadOutcome};
use crate::scope::ScopeState;
use crate::statement::{AssignForm, Candidate, MultiAssign, Statement, Target};

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub text: String,
    pub decision: Option<RewriteDecision>,
    pub issue: Option<Issue>,
}

impl Classified {
    fn unchanged(raw: &str) -> Self {
        Classified {
            text: raw.to_string(),
            decision: None,
            issue: None,
        }
    }
}

/// Classify the line at 0-based `index` of the input.
pub fn classify_line(
    index: usize,
    raw: &str,
    statement: &Statement,
    state: &mut ScopeState,
    lookahead: &Lookahead,
    discard: &str,
) -> Classified {
    let line_no = index + 1;
    match statement {
        Statement::Candidate(c) => classify_candidate(index, raw, c, state, lookahead, discard),
        Statement::MultiAssign(m) => classify_multi_assign(line_no, raw, m, state),
        Statement::Declaration(decl) => {
            for name in &decl.names {
                state.bindings.bind(name, line_no);
            }
            Classified::unchanged(raw)
        }
        Statement::Other => Classified::unchanged(raw),
    }
}

fn classify_candidate(
    index: usize,
    raw: &str,
    candidate: &Candidate,
    state: &mut ScopeState,
    lookahead: &Lookahead,
    discard: &str,
) -> Classified {
    let line_no = index + 1;

    let written_bound = candidate
        .first
        .name()
        .map_or(false, |n| state.bindings.contains(n));

    // A bound first target is a reuse and stays as written
    let (first, horizon) = if written_bound {
        (candidate.first.clone(), None)
    } else {
        choose_first(index, candidate, state, lookahead)
    };

    let issue = match (&first, horizon) {
        (Target::Discard, Some((name, scanned))) => Some(Issue::unterminated(
            line_no,
            raw,
            &state.scope.id,
            &name,
            scanned,
        )),
        _ => None,
    };

    let new_names: Vec<&str> = first
        .name()
        .into_iter()
        .chain(std::iter::once(candidate.second.as_str()))
        .filter(|n| !state.bindings.contains(n))
        .collect();

    let form = if new_names.is_empty() {
        AssignForm::Reuse
    } else {
        AssignForm::Binding
    };

    let decision = match (candidate.form, form) {
        (AssignForm::Reuse, AssignForm::Reuse) => RewriteDecision::KeepAsReuse,
        (AssignForm::Binding, AssignForm::Reuse) => RewriteDecision::ConvertToReuse,
        (AssignForm::Reuse, AssignForm::Binding) => RewriteDecision::ConvertToBinding,
        (AssignForm::Binding, AssignForm::Binding) => RewriteDecision::NoOp,
    };

    for name in &new_names {
        state.bindings.bind(name, line_no);
    }

    let text = if decision.changes_form() || first != candidate.first {
        candidate.render(raw, &first, form, discard)
    } else {
        raw.to_string()
    };

    debug!(
        line = line_no,
        scope = %state.scope.id,
        ?decision,
        discarded = first.is_discard(),
        "classified candidate"
    );

    Classified {
        text,
        decision: Some(decision),
        issue,
    }
}

/// Tie-break for an unbound first target. The written name wins if it is read
/// later; otherwise the scope's slot name is used if it is still unbound and
/// read later; otherwise the placeholder. Also returns the name whose scan
/// hit the horizon, if any.
fn choose_first(
    index: usize,
    candidate: &Candidate,
    state: &ScopeState,
    lookahead: &Lookahead,
) -> (Target, Option<(String, usize)>) {
    let mut horizon = None;

    if let Some(name) = candidate.first.name() {
        match lookahead.find_reference(index, name) {
            LookaheadOutcome::Referenced { line } => {
                debug!(line = index + 1, name, referenced_at = line, "first target needed");
                return (Target::Named(name.to_string()), None);
            }
            LookaheadOutcome::HorizonReached { scanned } => {
                horizon = Some((name.to_string(), scanned));
            }
            LookaheadOutcome::NotReferenced => {}
        }
    }

    let slot = state
        .slot_name(&candidate.second)
        .filter(|s| Some(*s) != candidate.first.name() && !state.bindings.contains(s));
    if let Some(slot) = slot {
        match lookahead.find_reference(index, slot) {
            LookaheadOutcome::Referenced { line } => {
                debug!(line = index + 1, slot, referenced_at = line, "slot name needed");
                return (Target::Named(slot.to_string()), None);
            }
            LookaheadOutcome::HorizonReached { scanned } => {
                horizon.get_or_insert_with(|| (slot.to_string(), scanned));
            }
            LookaheadOutcome::NotReferenced => {}
        }
    }

    (Target::Discard, horizon)
}

fn classify_multi_assign(
    line_no: usize,
    raw: &str,
    assign: &MultiAssign,
    state: &mut ScopeState,
) -> Classified {
    match assign.form {
        AssignForm::Binding => {
            for name in assign.names() {
                state.bindings.bind(name, line_no);
            }
            Classified::unchanged(raw)
        }
        AssignForm::Reuse => {
            let unbound: Vec<String> = assign
                .names()
                .into_iter()
                .filter(|n| !state.bindings.contains(n))
                .map(String::from)
                .collect();

            if unbound.is_empty() {
                return Classified::unchanged(raw);
            }

            debug!(line = line_no, ?unbound, "unresolvable reuse");
            Classified {
                text: raw.to_string(),
                decision: None,
                issue: Some(Issue::unresolvable(line_no, raw, &state.scope.id, unbound)),
            }
        }
    }
}
