//! Statement shapes recognized by the classifier
//!
//! Three kinds of lines matter to the pass:
//! - **Candidate**: `first, second <op> producer(...)` where `first` may be the
//!   discard placeholder. Only candidates are ever rewritten.
//! - **MultiAssign**: any other `a, b[, c...] <op> expr`. Tracked for binding
//!   state and checked for unbound reuse, never rewritten.
//! - **Declaration**: single-name `x := ...` or `var x ...` lines that bind
//!   names without being candidates.
//!
//! Everything else is `Other` and flows through untouched.

use std::ops::Range;

use regex::Regex;

use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::helpers::{is_valid_identifier, strip_inline_comment};

//=============================================================================
// TYPES
//=============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Named(String),
    Discard,
}

impl Target {
    pub fn name(&self) -> Option<&str> {
        match self {
            Target::Named(n) => Some(n),
            Target::Discard => None,
        }
    }

    pub fn is_discard(&self) -> bool {
        matches!(self, Target::Discard)
    }

    pub fn render<'a>(&'a self, discard: &'a str) -> &'a str {
        match self {
            Target::Named(n) => n,
            Target::Discard => discard,
        }
    }
}

/// How the statement is written: `:=` introduces names, `=` reuses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignForm {
    Binding,
    Reuse,
}

impl AssignForm {
    pub fn operator(&self) -> &'static str {
        match self {
            AssignForm::Binding => ":=",
            AssignForm::Reuse => "=",
        }
    }

    fn parse(op: &str) -> Self {
        if op == ":=" {
            AssignForm::Binding
        } else {
            AssignForm::Reuse
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub first: Target,
    pub second: String,
    pub form: AssignForm,
    /// Byte range of the first target in the raw line.
    first_span: Range<usize>,
    /// Byte range of the operator in the raw line.
    op_span: Range<usize>,
    /// Right-hand side, comment included.
    pub rhs: String,
}

impl Candidate {
    /// Names this statement binds as written.
    pub fn names(&self) -> Vec<&str> {
        self.first
            .name()
            .into_iter()
            .chain(std::iter::once(self.second.as_str()))
            .collect()
    }

    /// Re-render `raw` with a different first target and form.
    ///
    /// Only the two spans change, so spacing, indentation and trailing
    /// comments stay exactly as written.
    pub fn render(&self, raw: &str, first: &Target, form: AssignForm, discard: &str) -> String {
        let mut out = String::with_capacity(raw.len() + 1);
        out.push_str(&raw[..self.first_span.start]);
        out.push_str(first.render(discard));
        out.push_str(&raw[self.first_span.end..self.op_span.start]);
        out.push_str(form.operator());
        out.push_str(&raw[self.op_span.end..]);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiAssign {
    pub targets: Vec<Target>,
    pub form: AssignForm,
    pub rhs: String,
}

impl MultiAssign {
    pub fn names(&self) -> Vec<&str> {
        self.targets.iter().filter_map(|t| t.name()).collect()
    }
}

/// Names bound by `x := ...` or `var x ...`, with the initializer if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub names: Vec<String>,
    pub rhs: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Candidate(Candidate),
    MultiAssign(MultiAssign),
    Declaration(Declaration),
    Other,
}

impl Statement {
    /// The part of the line that may read variables. For assignments this is
    /// the right-hand side only, so rewriting targets never changes what a
    /// later lookahead sees.
    pub fn read_portion<'a>(&'a self, raw: &'a str) -> &'a str {
        match self {
            Statement::Candidate(c) => &c.rhs,
            Statement::MultiAssign(m) => &m.rhs,
            Statement::Declaration(d) => &d.rhs,
            Statement::Other => raw,
        }
    }
}

//=============================================================================
// MATCHER
//=============================================================================

pub struct StatementMatcher {
    multi: Regex,
    single_decl: Regex,
    var_decl: Regex,
    producer: Regex,
    discard: String,
}

impl StatementMatcher {
    pub fn new(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let producer = Regex::new(&format!(r"^(?:{})", config.producer_pattern)).map_err(|e| {
            RewriteError::InvalidProducerPattern {
                pattern: config.producer_pattern.clone(),
                reason: e.to_string(),
            }
        })?;

        // Static patterns; these cannot fail to compile.
        let multi = Regex::new(
            r"^\s*(?P<lhs>[A-Za-z_][A-Za-z0-9_]*(?:\s*,\s*[A-Za-z_][A-Za-z0-9_]*)+)\s*(?P<op>:=|=)(?P<rhs>.*)$",
        )
        .map_err(|e| RewriteError::Config(e.to_string()))?;
        let single_decl = Regex::new(r"^\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*:=")
            .map_err(|e| RewriteError::Config(e.to_string()))?;
        let var_decl = Regex::new(
            r"^\s*var\s+(?P<names>[A-Za-z_][A-Za-z0-9_]*(?:\s*,\s*[A-Za-z_][A-Za-z0-9_]*)*)",
        )
        .map_err(|e| RewriteError::Config(e.to_string()))?;

        Ok(StatementMatcher {
            multi,
            single_decl,
            var_decl,
            producer,
            discard: config.discard.clone(),
        })
    }

    pub fn discard(&self) -> &str {
        &self.discard
    }

    fn target(&self, name: &str) -> Target {
        if name == self.discard {
            Target::Discard
        } else {
            Target::Named(name.to_string())
        }
    }

    pub fn classify(&self, raw: &str) -> Statement {
        let code = strip_inline_comment(raw);

        if let Some(caps) = self.multi.captures(&code) {
            let rhs_code = &caps["rhs"];
            // `a, b == c` style comparisons are not assignments
            if rhs_code.starts_with('=') {
                return Statement::Other;
            }

            let lhs = caps.name("lhs").map(|m| m.range()).unwrap_or(0..0);
            let op = caps.name("op").map(|m| m.range()).unwrap_or(0..0);
            let form = AssignForm::parse(&code[op.clone()]);
            let rhs = raw[op.end..].to_string();

            let parts: Vec<(Range<usize>, &str)> = split_targets(&code, lhs);
            let targets: Vec<Target> = parts.iter().map(|(_, n)| self.target(n)).collect();

            if let Some(candidate) = self.as_candidate(&parts, &targets, form, op.clone(), &rhs) {
                return Statement::Candidate(candidate);
            }

            return Statement::MultiAssign(MultiAssign {
                targets,
                form,
                rhs,
            });
        }

        if let Some(caps) = self.single_decl.captures(&code) {
            let name = &caps["name"];
            if name != self.discard {
                let end = caps.get(0).map_or(code.len(), |m| m.end());
                return Statement::Declaration(Declaration {
                    names: vec![name.to_string()],
                    rhs: raw[end..].to_string(),
                });
            }
            return Statement::Other;
        }

        if let Some(caps) = self.var_decl.captures(&code) {
            let names = caps["names"]
                .split(',')
                .map(|n| n.trim())
                .filter(|n| is_valid_identifier(n) && *n != self.discard)
                .map(String::from)
                .collect::<Vec<_>>();
            if !names.is_empty() {
                let end = caps.get(0).map_or(code.len(), |m| m.end());
                // `var x T = expr` reads only `expr`
                let rhs = match code[end..].find('=') {
                    Some(eq) => raw[end + eq + 1..].to_string(),
                    None => String::new(),
                };
                return Statement::Declaration(Declaration { names, rhs });
            }
        }

        Statement::Other
    }

    fn as_candidate(
        &self,
        parts: &[(Range<usize>, &str)],
        targets: &[Target],
        form: AssignForm,
        op_span: Range<usize>,
        rhs: &str,
    ) -> Option<Candidate> {
        if parts.len() != 2 {
            return None;
        }
        let second = targets[1].name()?;
        if targets[0].name() == Some(second) {
            return None;
        }
        if !self.producer.is_match(rhs.trim_start()) {
            return None;
        }

        Some(Candidate {
            first: targets[0].clone(),
            second: second.to_string(),
            form,
            first_span: parts[0].0.clone(),
            op_span,
            rhs: rhs.to_string(),
        })
    }
}

/// Split a target list into names with their byte ranges in `code`.
fn split_targets(code: &str, lhs: Range<usize>) -> Vec<(Range<usize>, &str)> {
    let mut parts = Vec::new();
    let mut offset = lhs.start;
    for piece in code[lhs.clone()].split(',') {
        let lead = piece.len() - piece.trim_start().len();
        let name = piece.trim();
        let start = offset + lead;
        parts.push((start..start + name.len(), name));
        offset += piece.len() + 1;
    }
    parts
}

/// Parameter names of a unit header such as `func TestX(t *testing.T, n int)`.
pub fn header_parameters(header: &str) -> Vec<String> {
    let code = strip_inline_comment(header);
    let open = match code.find('(') {
        Some(i) => i,
        None => return Vec::new(),
    };
    let close = match code[open..].find(')') {
        Some(i) => open + i,
        None => return Vec::new(),
    };

    code[open + 1..close]
        .split(',')
        .filter_map(|p| p.split_whitespace().next())
        .filter(|n| is_valid_identifier(n) && *n != "_")
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> StatementMatcher {
        StatementMatcher::new(&RewriteConfig::default()).unwrap()
    }

    #[test]
    fn test_two_target_candidate() {
        let raw = "\tresp, body = client.makeRequest(\"GET\", url, nil)";
        match matcher().classify(raw) {
            Statement::Candidate(c) => {
                assert_eq!(c.first, Target::Named("resp".to_string()));
                assert_eq!(c.second, "body");
                assert_eq!(c.form, AssignForm::Reuse);
                assert_eq!(c.names(), vec!["resp", "body"]);
            }
            other => panic!("expected candidate, got {:?}", other),
        }
    }

    #[test]
    fn test_discard_candidate() {
        match matcher().classify("\t_, body := client.makeRequest(\"GET\", url, nil)") {
            Statement::Candidate(c) => {
                assert!(c.first.is_discard());
                assert_eq!(c.form, AssignForm::Binding);
                assert_eq!(c.names(), vec!["body"]);
            }
            other => panic!("expected candidate, got {:?}", other),
        }
    }

    #[test]
    fn test_render_preserves_spacing_and_comment() {
        let raw = "\t\tx,  y = call() // first";
        let c = match matcher().classify(raw) {
            Statement::Candidate(c) => c,
            other => panic!("expected candidate, got {:?}", other),
        };
        assert_eq!(
            c.render(raw, &Target::Discard, AssignForm::Binding, "_"),
            "\t\t_,  y := call() // first"
        );
        assert_eq!(
            c.render(raw, &c.first, AssignForm::Reuse, "_"),
            raw
        );
    }

    #[test]
    fn test_non_call_rhs_is_multi_assign() {
        match matcher().classify("x, y = y, x") {
            Statement::MultiAssign(m) => {
                assert_eq!(m.form, AssignForm::Reuse);
                assert_eq!(m.names(), vec!["x", "y"]);
            }
            other => panic!("expected multi-assign, got {:?}", other),
        }
    }

    #[test]
    fn test_producer_restriction() {
        let config = RewriteConfig::default().with_producer(r"client\.makeRequest\(");
        let m = StatementMatcher::new(&config).unwrap();
        assert!(matches!(
            m.classify("resp, body = client.makeRequest(\"GET\")"),
            Statement::Candidate(_)
        ));
        assert!(matches!(
            m.classify("resp, err = http.Get(url)"),
            Statement::MultiAssign(_)
        ));
    }

    #[test]
    fn test_three_targets_and_trailing_discard_are_not_candidates() {
        assert!(matches!(
            matcher().classify("a, b, c := f()"),
            Statement::MultiAssign(_)
        ));
        assert!(matches!(
            matcher().classify("a, _ = f()"),
            Statement::MultiAssign(_)
        ));
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            matcher().classify("\tclient := newTestClient(t)"),
            Statement::Declaration(Declaration {
                names: vec!["client".to_string()],
                rhs: " newTestClient(t)".to_string(),
            })
        );
        assert_eq!(
            matcher().classify("\tvar resp, other *http.Response"),
            Statement::Declaration(Declaration {
                names: vec!["resp".to_string(), "other".to_string()],
                rhs: String::new(),
            })
        );
    }

    #[test]
    fn test_declaration_reads_only_initializer() {
        let m = matcher();
        let raw = "\tvar resp *http.Response = fetch(body)";
        let statement = m.classify(raw);
        assert_eq!(statement.read_portion(raw), " fetch(body)");

        let raw = "\tresp := wrap(body)";
        let statement = m.classify(raw);
        assert_eq!(statement.read_portion(raw), " wrap(body)");
    }

    #[test]
    fn test_other_lines() {
        let m = matcher();
        assert_eq!(m.classify("\tif resp.StatusCode != 200 {"), Statement::Other);
        assert_eq!(m.classify("\tfor i, v := range xs {"), Statement::Other);
        assert_eq!(m.classify("\t// x, y = call()"), Statement::Other);
        assert_eq!(m.classify("\tx = 5"), Statement::Other);
    }

    #[test]
    fn test_header_parameters() {
        assert_eq!(
            header_parameters("func TestIntegration_A(t *testing.T) {"),
            vec!["t".to_string()]
        );
        assert_eq!(
            header_parameters("func helper(a, b int, _ string)"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(header_parameters("func ScopeA").is_empty());
    }
}
