//! Outcome of a rewrite pass: per-line decisions and non-fatal issues.

use serde::Serialize;

use crate::error_msg::ErrorCode;

/// What the classifier decided for one candidate statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteDecision {
    /// Reuse form, all names already bound.
    KeepAsReuse,
    /// Written as reuse, introduces a name.
    ConvertToBinding,
    /// Written as binding, introduces nothing.
    ConvertToReuse,
    /// Binding form that really introduces a name.
    NoOp,
}

impl RewriteDecision {
    pub fn changes_form(&self) -> bool {
        matches!(
            self,
            RewriteDecision::ConvertToBinding | RewriteDecision::ConvertToReuse
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IssueKind {
    /// A reuse-form statement whose shape is unknown assigns names that
    /// were never bound in the scope. The line is left unchanged.
    UnresolvableStatement { names: Vec<String> },
    /// The tie-break lookahead hit its horizon before the scope ended.
    /// The discard placeholder was chosen.
    UnterminatedScope { name: String, scanned: usize },
}

impl IssueKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            IssueKind::UnresolvableStatement { .. } => ErrorCode::RB001,
            IssueKind::UnterminatedScope { .. } => ErrorCode::RB010,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// 1-based line number.
    pub line: usize,
    /// Stable code, always `kind.code()`.
    pub code: ErrorCode,
    #[serde(flatten)]
    pub kind: IssueKind,
    pub message: String,
    pub source: String,
    pub scope: Option<String>,
    pub confidence: Confidence,
}

impl Issue {
    pub fn unresolvable(line: usize, source: &str, scope: &str, names: Vec<String>) -> Self {
        Issue {
            line,
            code: ErrorCode::RB001,
            message: format!(
                "reuse of names never bound in this scope: {}",
                names.join(", ")
            ),
            kind: IssueKind::UnresolvableStatement { names },
            source: source.to_string(),
            scope: Some(scope.to_string()),
            confidence: Confidence::High,
        }
    }

    pub fn unterminated(line: usize, source: &str, scope: &str, name: &str, scanned: usize) -> Self {
        Issue {
            line,
            code: ErrorCode::RB010,
            message: format!(
                "no reference to `{}` within {} line{}, discarding it",
                name,
                scanned,
                if scanned == 1 { "" } else { "s" }
            ),
            kind: IssueKind::UnterminatedScope {
                name: name.to_string(),
                scanned,
            },
            source: source.to_string(),
            scope: Some(scope.to_string()),
            confidence: Confidence::Low,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

/// One classified candidate statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRewrite {
    pub line: usize,
    pub decision: RewriteDecision,
    pub before: String,
    pub after: String,
}

impl LineRewrite {
    pub fn is_change(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub lines: usize,
    pub scopes: usize,
    pub decisions: Vec<LineRewrite>,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn new(lines: usize) -> Self {
        Report {
            lines,
            ..Report::default()
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn rewritten_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.is_change()).count()
    }

    pub fn issues_at(&self, line: usize) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.line == line)
    }

    pub fn decision_at(&self, line: usize) -> Option<RewriteDecision> {
        self.decisions
            .iter()
            .find(|d| d.line == line)
            .map(|d| d.decision)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_json_carries_code_and_kind() {
        let issue = Issue::unresolvable(4, "\tx, y = y, x", "func ScopeA", vec!["x".to_string()]);
        assert_eq!(issue.code(), issue.kind.code());

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "RB001");
        assert_eq!(json["kind"], "unresolvable-statement");
        assert_eq!(json["line"], 4);

        let issue = Issue::unterminated(9, "\tresp, body = f()", "func ScopeA", "resp", 3);
        assert_eq!(issue.code(), issue.kind.code());
        assert_eq!(serde_json::to_value(&issue).unwrap()["code"], "RB010");
    }
}
