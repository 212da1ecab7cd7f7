// Core modules
pub mod config;
pub mod error;
pub mod error_msg;
pub mod report;
pub mod helpers;

// Pass components
pub mod scope;
pub mod statement;
pub mod rewrite;


pub use config::RewriteConfig;
pub use error::RewriteError;
pub use report::{Confidence, Issue, IssueKind, LineRewrite, Report, RewriteDecision};
pub use rewrite::{RewriteOutput, Rewriter};

//===========================================================================
// ENTRY POINTS
//===========================================================================

/// Rewrite a whole source text.
///
/// Returns the corrected text with a report of every decision and every
/// non-fatal issue. Fails only on invalid configuration or when the output
/// would alter protected lines.
pub fn rewrite_source(source: &str, config: &RewriteConfig) -> Result<RewriteOutput, RewriteError> {
    Rewriter::new(config)?.rewrite_source(source)
}

/// Rewrite an in-memory line sequence. The output has one line per input line.
pub fn rewrite_lines(lines: &[&str], config: &RewriteConfig) -> Result<RewriteOutput, RewriteError> {
    Rewriter::new(config)?.rewrite_lines(lines)
}
