//! Scope tracking for the rebind pass
//!
//! Handles:
//! - Scope boundaries (marker header opens, next marker or foreign unit closes)
//! - Cutoff protection (nothing at or below the cutoff ever opens a scope)
//! - The per-scope binding set, dropped when the scope closes
//!
//! Scopes are flat: a new marker implicitly closes the previous scope, there
//! is no nesting and no state crosses a boundary.

use std::collections::{HashMap, HashSet};

use crate::config::RewriteConfig;
use crate::statement::header_parameters;

//=============================================================================
// SCOPE TYPES
//=============================================================================

/// A recognized scope: identifier plus 1-based start line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub id: String,
    pub start_line: usize,
}

impl Scope {
    /// Derive the scope identifier from its header: the text before the
    /// parameter list or block opener.
    pub fn from_header(header: &str, start_line: usize) -> Self {
        let trimmed = header.trim();
        let end = trimmed.find(|c| c == '(' || c == '{').unwrap_or(trimmed.len());
        Scope {
            id: trimmed[..end].trim_end().to_string(),
            start_line,
        }
    }
}

/// Names already bound in the active scope.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    names: HashSet<String>,
    /// Line of the statement that bound each name
    bound_at: HashMap<String, usize>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record a binding. Returns false if the name was already bound, in
    /// which case the original binding line is kept.
    pub fn bind(&mut self, name: &str, line: usize) -> bool {
        if self.names.insert(name.to_string()) {
            self.bound_at.insert(name.to_string(), line);
            true
        } else {
            false
        }
    }

    pub fn bound_at(&self, name: &str) -> Option<usize> {
        self.bound_at.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// All mutable state owned by the active scope.
#[derive(Debug, Clone)]
pub struct ScopeState {
    pub scope: Scope,
    pub bindings: BindingSet,
    /// Name used for the discardable first slot, keyed by the second target.
    /// Lets `_, body = ...` know it stands for `resp`. Fixed when the scope
    /// opens and never updated from rewritten lines.
    slot_names: HashMap<String, String>,
}

impl ScopeState {
    pub fn new(scope: Scope) -> Self {
        ScopeState {
            scope,
            bindings: BindingSet::new(),
            slot_names: HashMap::new(),
        }
    }

    pub fn slot_name(&self, second: &str) -> Option<&str> {
        self.slot_names.get(second).map(String::as_str)
    }

    pub fn set_slot_names(&mut self, slot_names: HashMap<String, String>) {
        self.slot_names = slot_names;
    }
}

//=============================================================================
// SCOPE TRACKER
//=============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    /// Line opens a new scope (any previous scope is closed)
    Start(String),
    /// Line belongs to the active scope
    Continue,
    /// Line is a foreign unit header that closed the active scope
    Close(String),
    /// Line is outside every scope
    Outside,
}

/// Why a line ends a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Marker,
    ForeignUnit,
}

/// Decides which lines delimit scopes. Shared by the tracker and the
/// lookahead, which must agree on where a scope ends.
#[derive(Debug, Clone)]
pub struct BoundaryRule {
    marker_prefix: String,
    unit_prefix: String,
    cutoff: usize,
}

impl BoundaryRule {
    pub fn new(config: &RewriteConfig) -> Self {
        BoundaryRule {
            marker_prefix: config.scope_marker_prefix.clone(),
            unit_prefix: config.unit_prefix.clone(),
            cutoff: config.cutoff_line,
        }
    }

    /// Classify `line` (1-based `line_no`) as a scope boundary, if it is one.
    pub fn classify(&self, line_no: usize, line: &str) -> Option<Boundary> {
        if line_no <= self.cutoff {
            return None;
        }
        if line.starts_with(&self.marker_prefix) {
            Some(Boundary::Marker)
        } else if !self.unit_prefix.is_empty() && line.starts_with(&self.unit_prefix) {
            Some(Boundary::ForeignUnit)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct ScopeTracker {
    rule: BoundaryRule,
    current: Option<ScopeState>,
    opened: usize,
}

impl ScopeTracker {
    pub fn new(config: &RewriteConfig) -> Self {
        ScopeTracker {
            rule: BoundaryRule::new(config),
            current: None,
            opened: 0,
        }
    }

    pub fn on_line(&mut self, line_no: usize, line: &str) -> ScopeEvent {
        match self.rule.classify(line_no, line) {
            Some(Boundary::Marker) => {
                let scope = Scope::from_header(line, line_no);
                let id = scope.id.clone();
                let mut state = ScopeState::new(scope);
                for param in header_parameters(line) {
                    state.bindings.bind(&param, line_no);
                }
                self.current = Some(state);
                self.opened += 1;
                ScopeEvent::Start(id)
            }
            Some(Boundary::ForeignUnit) => match self.current.take() {
                Some(state) => ScopeEvent::Close(state.scope.id),
                None => ScopeEvent::Outside,
            },
            None if self.current.is_some() => ScopeEvent::Continue,
            None => ScopeEvent::Outside,
        }
    }

    pub fn current(&self) -> Option<&ScopeState> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ScopeState> {
        self.current.as_mut()
    }

    /// End of input closes whatever scope is still open.
    pub fn finish(&mut self) -> Option<Scope> {
        self.current.take().map(|s| s.scope)
    }

    /// Number of scopes opened so far
    pub fn opened(&self) -> usize {
        self.opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(cutoff: usize) -> ScopeTracker {
        ScopeTracker::new(&RewriteConfig::default().with_cutoff(cutoff))
    }

    #[test]
    fn test_scope_id_from_header() {
        let s = Scope::from_header("func TestIntegration_Orders(t *testing.T) {", 3);
        assert_eq!(s.id, "func TestIntegration_Orders");
        assert_eq!(s.start_line, 3);
        assert_eq!(Scope::from_header("func ScopeA", 1).id, "func ScopeA");
    }

    #[test]
    fn test_marker_resets_bindings() {
        let mut t = tracker(0);
        assert_eq!(
            t.on_line(1, "func TestIntegration_A(t *testing.T) {"),
            ScopeEvent::Start("func TestIntegration_A".to_string())
        );
        t.current_mut().unwrap().bindings.bind("resp", 2);
        assert_eq!(t.on_line(2, "\tresp, body := f()"), ScopeEvent::Continue);

        t.on_line(3, "func TestIntegration_B(t *testing.T) {");
        let state = t.current().unwrap();
        assert!(!state.bindings.contains("resp"));
        assert!(state.bindings.contains("t"));
        assert_eq!(t.opened(), 2);
    }

    #[test]
    fn test_foreign_unit_closes_scope() {
        let mut t = tracker(0);
        t.on_line(1, "func TestIntegration_A(t *testing.T) {");
        assert_eq!(
            t.on_line(5, "func helper() {"),
            ScopeEvent::Close("func TestIntegration_A".to_string())
        );
        assert_eq!(t.on_line(6, "\tx, y = f()"), ScopeEvent::Outside);
        assert!(t.current().is_none());
    }

    #[test]
    fn test_cutoff_protects_markers() {
        let mut t = tracker(10);
        assert_eq!(t.on_line(4, "func TestIntegration_Old(t *testing.T) {"), ScopeEvent::Outside);
        assert_eq!(t.on_line(11, "\tresp, body = f()"), ScopeEvent::Outside);
        assert!(matches!(
            t.on_line(12, "func TestIntegration_New(t *testing.T) {"),
            ScopeEvent::Start(_)
        ));
    }

    #[test]
    fn test_finish_closes_open_scope() {
        let mut t = tracker(0);
        t.on_line(1, "func TestIntegration_A(t *testing.T) {");
        assert_eq!(t.finish().map(|s| s.start_line), Some(1));
        assert!(t.finish().is_none());
    }

    #[test]
    fn test_binding_set_first_binding_wins() {
        let mut b = BindingSet::new();
        assert!(b.bind("x", 2));
        assert!(!b.bind("x", 4));
        assert_eq!(b.bound_at("x"), Some(2));
        assert_eq!(b.len(), 1);
    }
}
