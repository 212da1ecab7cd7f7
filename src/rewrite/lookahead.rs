//! Look-ahead utilities
//!
//! Forward scans over the rest of the active scope. They never look past the
//! scope boundary and never look further than the configured horizon.

use std::collections::HashMap;

use tracing::trace;

use crate::helpers::{code_portion, mentions_identifier};
use crate::scope::BoundaryRule;
use crate::statement::{Statement, StatementMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookaheadOutcome {
    /// The name is read on this 1-based line.
    Referenced { line: usize },
    /// The whole rest of the scope was scanned without a reference.
    NotReferenced,
    /// The horizon ran out before the scope ended.
    HorizonReached { scanned: usize },
}

pub struct Lookahead<'a> {
    lines: &'a [&'a str],
    rule: &'a BoundaryRule,
    matcher: &'a StatementMatcher,
    horizon: Option<usize>,
}

enum Step<'a> {
    Line(usize, &'a str),
    Horizon(usize),
}

impl<'a> Lookahead<'a> {
    pub fn new(
        lines: &'a [&'a str],
        rule: &'a BoundaryRule,
        matcher: &'a StatementMatcher,
        horizon: Option<usize>,
    ) -> Self {
        Lookahead {
            lines,
            rule,
            matcher,
            horizon,
        }
    }

    /// Lines after `index` (0-based) up to the scope boundary, with a final
    /// `Horizon` step if `horizon` cut the scan short.
    fn scope_tail(&self, index: usize, horizon: Option<usize>) -> impl Iterator<Item = Step<'a>> + '_ {
        let lines = self.lines;
        let rule = self.rule;

        let mut offset = 0;
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            let i = index + 1 + offset;
            let line = lines.get(i)?;
            let line_no = i + 1;
            if rule.classify(line_no, line).is_some() {
                done = true;
                return None;
            }
            if let Some(h) = horizon {
                if offset >= h {
                    done = true;
                    return Some(Step::Horizon(offset));
                }
            }
            offset += 1;
            Some(Step::Line(line_no, *line))
        })
    }

    /// Search the rest of the scope for a read of `name`.
    pub fn find_reference(&self, index: usize, name: &str) -> LookaheadOutcome {
        for step in self.scope_tail(index, self.horizon) {
            match step {
                Step::Line(line_no, raw) => {
                    let statement = self.matcher.classify(raw);
                    let code = code_portion(statement.read_portion(raw));
                    if mentions_identifier(&code, name) {
                        trace!(name, line = line_no, "reference found");
                        return LookaheadOutcome::Referenced { line: line_no };
                    }
                }
                Step::Horizon(scanned) => {
                    trace!(name, scanned, "lookahead horizon reached");
                    return LookaheadOutcome::HorizonReached { scanned };
                }
            }
        }
        LookaheadOutcome::NotReferenced
    }

    /// Logical first-slot names for the scope opened by the header at
    /// `header` (0-based), keyed by second target.
    ///
    /// For each second target the slot takes the name of the first candidate
    /// whose first target is read, within the horizon, after that candidate
    /// or after any earlier candidate with the same second target. Only
    /// positions, right-hand sides and the names of such candidates are
    /// consulted, so the map is the same for a scope and for its rewrite.
    pub fn slot_names(&self, header: usize) -> HashMap<String, String> {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut named: Vec<(usize, String, String)> = Vec::new();

        for step in self.scope_tail(header, None) {
            if let Step::Line(line_no, raw) = step {
                if let Statement::Candidate(c) = self.matcher.classify(raw) {
                    let index = line_no - 1;
                    positions.entry(c.second.clone()).or_default().push(index);
                    if let Some(first) = c.first.name() {
                        named.push((index, c.second.clone(), first.to_string()));
                    }
                }
            }
        }

        let mut slots = HashMap::new();
        for (index, second, first) in named {
            if slots.contains_key(&second) {
                continue;
            }
            let read = positions[&second].iter().take_while(|&&i| i <= index).any(|&i| {
                matches!(
                    self.find_reference(i, &first),
                    LookaheadOutcome::Referenced { .. }
                )
            });
            if read {
                trace!(second = %second, slot = %first, "slot name resolved");
                slots.insert(second, first);
            }
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;

    fn with_lookahead<F: FnOnce(&Lookahead)>(lines: &[&str], horizon: Option<usize>, f: F) {
        let config = RewriteConfig::default()
            .with_marker("func Scope")
            .with_horizon(horizon);
        let rule = BoundaryRule::new(&config);
        let matcher = StatementMatcher::new(&config).unwrap();
        let lookahead = Lookahead::new(lines, &rule, &matcher, horizon);
        f(&lookahead);
    }

    #[test]
    fn test_reference_found() {
        let lines = vec!["func ScopeA", "x, y = call()", "use(y)", "x, y = call()", "use(x)"];
        with_lookahead(&lines, None, |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::Referenced { line: 5 });
        });
    }

    #[test]
    fn test_assignment_targets_are_not_reads() {
        let lines = vec!["func ScopeA", "x, y = call()", "x, y = call()", "use(y)"];
        with_lookahead(&lines, None, |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::NotReferenced);
        });
    }

    #[test]
    fn test_stops_at_scope_boundary() {
        let lines = vec!["func ScopeA", "x, y = call()", "func ScopeB", "use(x)"];
        with_lookahead(&lines, None, |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::NotReferenced);
        });

        let lines = vec!["func ScopeA", "x, y = call()", "func helper() {", "use(x)"];
        with_lookahead(&lines, None, |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::NotReferenced);
        });
    }

    #[test]
    fn test_horizon_cap() {
        let lines = vec!["func ScopeA", "x, y = call()", "a()", "b()", "use(x)"];
        with_lookahead(&lines, Some(2), |la| {
            assert_eq!(
                la.find_reference(1, "x"),
                LookaheadOutcome::HorizonReached { scanned: 2 }
            );
        });
        with_lookahead(&lines, Some(3), |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::Referenced { line: 5 });
        });
    }

    #[test]
    fn test_horizon_longer_than_scope_is_not_reached() {
        let lines = vec!["func ScopeA", "x, y = call()", "use(y)"];
        with_lookahead(&lines, Some(50), |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::NotReferenced);
        });
    }

    #[test]
    fn test_string_and_member_mentions_ignored() {
        let lines = vec!["func ScopeA", "x, y = call()", "t.Log(\"x\")", "obj.x()"];
        with_lookahead(&lines, None, |la| {
            assert_eq!(la.find_reference(1, "x"), LookaheadOutcome::NotReferenced);
        });
    }

    #[test]
    fn test_slot_names_from_read_candidates() {
        let lines = vec![
            "func ScopeA",
            "_, body = client.do()",
            "check(resp)",
            "other, x = client.do()",
            "resp, body = client.do()",
        ];
        with_lookahead(&lines, None, |la| {
            let slots = la.slot_names(0);
            assert_eq!(slots.get("body").map(String::as_str), Some("resp"));
            assert_eq!(slots.get("x"), None);
        });
    }

    #[test]
    fn test_slot_names_skip_unread_names() {
        let lines = vec![
            "func ScopeA",
            "other, body = call()",
            "resp, body = call()",
            "use(resp, body)",
        ];
        with_lookahead(&lines, None, |la| {
            assert_eq!(la.slot_names(0).get("body").map(String::as_str), Some("resp"));
        });
    }

    #[test]
    fn test_slot_names_respect_horizon() {
        let lines = vec![
            "func ScopeA",
            "resp, body = call()",
            "a()",
            "b()",
            "check(resp)",
        ];
        with_lookahead(&lines, Some(2), |la| {
            assert!(la.slot_names(0).is_empty());
        });
        with_lookahead(&lines, Some(3), |la| {
            assert_eq!(la.slot_names(0).get("body").map(String::as_str), Some("resp"));
        });
    }
}
