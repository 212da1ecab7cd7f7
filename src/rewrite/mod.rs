//! Rewrite pass
//!
//! One forward pass over the input lines:
//!
//! ```text
//! raw line ──► ScopeTracker ──► StatementMatcher ──► classifier ──► output line
//!                  │                                     │
//!                  └── BindingSet (per scope) ◄──────────┘
//!                                                        │
//!                                         Lookahead (rest of scope, capped)
//! ```
//!
//! When a scope opens, its candidates are scanned once to fix the logical
//! name behind each `_` first target.
//!
//! Lines at or below the cutoff and lines outside any scope are copied as
//! they are. After the pass the output is checked against the input; a
//! protected line that changed aborts the whole pass.

pub mod classifier;
pub mod lookahead;

pub use classifier::{classify_line, Classified};
pub use lookahead::{Lookahead, LookaheadOutcome};

use tracing::{debug, info};

use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::report::{LineRewrite, Report};
use crate::scope::{BoundaryRule, ScopeEvent, ScopeTracker};
use crate::statement::StatementMatcher;

/// Rewritten text plus everything the pass found on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
    pub lines: Vec<String>,
    pub trailing_newline: bool,
    pub report: Report,
}

impl RewriteOutput {
    pub fn text(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn changed(&self) -> bool {
        self.report.rewritten_count() > 0
    }
}

pub struct Rewriter<'c> {
    config: &'c RewriteConfig,
    matcher: StatementMatcher,
    rule: BoundaryRule,
}

impl<'c> Rewriter<'c> {
    pub fn new(config: &'c RewriteConfig) -> Result<Self, RewriteError> {
        config.validate()?;
        Ok(Rewriter {
            config,
            matcher: StatementMatcher::new(config)?,
            rule: BoundaryRule::new(config),
        })
    }

    pub fn rewrite_lines(&self, lines: &[&str]) -> Result<RewriteOutput, RewriteError> {
        let mut tracker = ScopeTracker::new(self.config);
        let lookahead = Lookahead::new(
            lines,
            &self.rule,
            &self.matcher,
            self.config.lookahead_horizon,
        );
        let mut report = Report::new(lines.len());
        let mut output = Vec::with_capacity(lines.len());

        for (index, raw) in lines.iter().enumerate() {
            let line_no = index + 1;

            match tracker.on_line(line_no, raw) {
                ScopeEvent::Start(id) => {
                    debug!(line = line_no, scope = %id, "scope start");
                    if let Some(state) = tracker.current_mut() {
                        state.set_slot_names(lookahead.slot_names(index));
                    }
                    output.push(raw.to_string());
                    continue;
                }
                ScopeEvent::Close(id) => {
                    debug!(line = line_no, scope = %id, "scope closed by foreign unit");
                    output.push(raw.to_string());
                    continue;
                }
                ScopeEvent::Outside => {
                    output.push(raw.to_string());
                    continue;
                }
                ScopeEvent::Continue => {}
            }

            let state = match tracker.current_mut() {
                Some(state) => state,
                None => {
                    output.push(raw.to_string());
                    continue;
                }
            };

            let statement = self.matcher.classify(raw);
            let classified = classify_line(
                index,
                raw,
                &statement,
                state,
                &lookahead,
                self.matcher.discard(),
            );

            if let Some(decision) = classified.decision {
                report.decisions.push(LineRewrite {
                    line: line_no,
                    decision,
                    before: raw.to_string(),
                    after: classified.text.clone(),
                });
            }
            if let Some(issue) = classified.issue {
                report.issues.push(issue);
            }
            output.push(classified.text);
        }

        if let Some(scope) = tracker.finish() {
            debug!(scope = %scope.id, "scope closed by end of input");
        }
        report.scopes = tracker.opened();

        verify_integrity(lines, &output, self.config.cutoff_line)?;

        info!(
            lines = lines.len(),
            scopes = report.scopes,
            rewritten = report.rewritten_count(),
            issues = report.issues.len(),
            "rewrite pass finished"
        );

        Ok(RewriteOutput {
            lines: output,
            trailing_newline: false,
            report,
        })
    }

    pub fn rewrite_source(&self, source: &str) -> Result<RewriteOutput, RewriteError> {
        let (lines, trailing_newline) = split_source(source);
        let mut out = self.rewrite_lines(&lines)?;
        out.trailing_newline = trailing_newline;
        Ok(out)
    }
}

/// Split on `\n` only, so `\r` stays part of each line and protected lines
/// round-trip byte for byte.
pub fn split_source(source: &str) -> (Vec<&str>, bool) {
    if source.is_empty() {
        return (Vec::new(), false);
    }
    let mut lines: Vec<&str> = source.split('\n').collect();
    let trailing_newline = source.ends_with('\n');
    if trailing_newline {
        lines.pop();
    }
    (lines, trailing_newline)
}

/// Fatal consistency checks on the finished output.
pub fn verify_integrity(input: &[&str], output: &[String], cutoff: usize) -> Result<(), RewriteError> {
    if input.len() != output.len() {
        return Err(RewriteError::LineCountMismatch {
            input: input.len(),
            output: output.len(),
        });
    }

    let protected = cutoff.min(input.len());
    for (i, (before, after)) in input[..protected].iter().zip(&output[..protected]).enumerate() {
        if *before != after.as_str() {
            return Err(RewriteError::CutoffViolation {
                line: i + 1,
                cutoff,
            });
        }
    }
    Ok(())
}
