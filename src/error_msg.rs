//! rebind diagnostic messages
//!
//! Every finding of the pass carries a stable code so that scripts driving
//! the tool can match on it:
//!
//! `RBxxx` where the ranges are
//! - 001-019: statement findings inside a scope (non-fatal)
//! - 100-119: integrity checks on the rewritten output (fatal)
//! - 120-139: configuration errors (fatal)
//!
//! Rendering follows the usual compiler layout:
//!
//! ```text
//! warning[RB001][scope]: reuse of names never bound in this scope: x, y
//!   --> fixtures/a_test.go:12
//!    |
//! 12 |     x, y = y, x
//!    |
//!    = scope: func TestIntegration_Orders
//! ```

use std::fmt;

use colored::*;

use crate::error::RewriteError;
use crate::report::{Confidence, Issue, Report};

//=============================================================================
// ERROR CATEGORIES
//=============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Binding state of a scope (RB001-009)
    Scope,
    /// Tie-break lookahead (RB010-019)
    Lookahead,
    /// Output integrity (RB100-119)
    Integrity,
    /// Configuration (RB120-139)
    Config,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Scope => write!(f, "scope"),
            ErrorCategory::Lookahead => write!(f, "lookahead"),
            ErrorCategory::Integrity => write!(f, "integrity"),
            ErrorCategory::Config => write!(f, "config"),
        }
    }
}

//=============================================================================
// ERROR CODES
//=============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorCode {
    /// Reuse-form statement for names that were never bound
    RB001,
    /// Lookahead horizon exhausted before the scope ended
    RB010,
    /// Protected line altered
    RB100,
    /// Output length differs from input length
    RB101,
    /// Producer pattern does not compile
    RB120,
    /// Malformed configuration
    RB121,
}

impl ErrorCode {
    pub fn code_str(&self) -> &'static str {
        match self {
            ErrorCode::RB001 => "RB001",
            ErrorCode::RB010 => "RB010",
            ErrorCode::RB100 => "RB100",
            ErrorCode::RB101 => "RB101",
            ErrorCode::RB120 => "RB120",
            ErrorCode::RB121 => "RB121",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::RB001 => ErrorCategory::Scope,
            ErrorCode::RB010 => ErrorCategory::Lookahead,
            ErrorCode::RB100 | ErrorCode::RB101 => ErrorCategory::Integrity,
            ErrorCode::RB120 | ErrorCode::RB121 => ErrorCategory::Config,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Integrity | ErrorCategory::Config
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code_str())
    }
}

//=============================================================================
// RENDERING
//=============================================================================

/// Format a single non-fatal issue with its source line.
pub fn format_issue(issue: &Issue, file: &str) -> String {
    let code = issue.code();
    let level = if code.is_fatal() {
        "error".red().bold()
    } else {
        "warning".yellow().bold()
    };
    let mut output = String::new();

    output.push_str(&format!(
        "{}[{}][{}]: {}\n",
        level,
        code.code_str(),
        code.category(),
        issue.message.bold()
    ));

    let gutter = " ".repeat(issue.line.to_string().len());
    output.push_str(&format!("{}{} {}:{}\n", gutter, "-->".blue().bold(), file, issue.line));

    if !issue.source.is_empty() {
        output.push_str(&format!("{} {}\n", gutter, "|".blue().bold()));
        output.push_str(&format!(
            "{} {} {}\n",
            issue.line.to_string().blue().bold(),
            "|".blue().bold(),
            issue.source
        ));
        output.push_str(&format!("{} {}\n", gutter, "|".blue().bold()));
    }

    if let Some(ref scope) = issue.scope {
        output.push_str(&format!("{} {} scope: {}\n", gutter, "=".blue().bold(), scope));
    }
    if issue.confidence == Confidence::Low {
        output.push_str(&format!(
            "{} {} {}: decision made with low confidence\n",
            gutter,
            "=".blue().bold(),
            "note".cyan().bold()
        ));
    }

    output
}

/// Format every issue of a report followed by a summary footer.
pub fn format_report(report: &Report, file: &str) -> String {
    let mut output = String::new();

    for issue in &report.issues {
        output.push_str(&format_issue(issue, file));
        output.push('\n');
    }

    output.push_str(&format_summary(report));
    output
}

pub fn format_summary(report: &Report) -> String {
    let rewritten = report.rewritten_count();
    let issues = report.issues.len();

    let head = if issues == 0 {
        "done".green().bold()
    } else {
        "done".yellow().bold()
    };

    format!(
        "{}: {} line{} rewritten across {} scope{}, {} issue{}\n",
        head,
        rewritten,
        plural(rewritten),
        report.scopes,
        plural(report.scopes),
        issues,
        plural(issues)
    )
}

/// Format a fatal error. Integrity failures are reported as internal bugs.
pub fn format_fatal(error: &RewriteError) -> String {
    let code = error.code();
    let mut output = format!(
        "{}[{}][{}]: {}\n",
        "error".red().bold(),
        code.code_str(),
        code.category(),
        error.to_string().bold()
    );

    if code.category() == ErrorCategory::Integrity {
        output.push_str(&format!(
            "\n{}: the rewrite pass produced inconsistent output and nothing was written.\n",
            "note".cyan().bold()
        ));
        output.push_str("      This is a bug in rebind, not in the input file.\n");
    }

    output
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
