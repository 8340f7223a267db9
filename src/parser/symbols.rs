//! Lexical-scope symbol table
//!
//! A stack of scopes mapping variable names to their declared [`VarType`].
//! The global scope is pushed on construction and is never popped, so the
//! stack is never empty. Lookups walk from the innermost scope outwards and
//! the first match wins, which gives shadowing.

use rustc_hash::FxHashMap;

/// Declared type tag for a variable
///
/// Every declaration and parameter is an `Integer`. `Unknown` is what a
/// lookup of an unbound name yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Integer,
    Unknown,
}

/// Scope stack used during a single parse
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<FxHashMap<String, VarType>>,
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Exit the current scope. Ignored when only the global scope remains.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare `name` in the innermost scope, overwriting an earlier
    /// declaration of the same name in that scope.
    pub fn declare(&mut self, name: &str, var_type: VarType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), var_type);
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains_key(name))
    }

    /// True when `name` is bound in the innermost scope itself.
    pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Type of the innermost visible declaration, or [`VarType::Unknown`].
    pub fn type_of(&self, name: &str) -> VarType {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .unwrap_or(VarType::Unknown)
    }

    pub fn is_global_scope(&self) -> bool {
        self.scopes.len() == 1
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut table = SymbolTable::new();
        assert!(!table.is_declared("x"));
        assert_eq!(table.type_of("x"), VarType::Unknown);

        table.declare("x", VarType::Integer);
        assert!(table.is_declared("x"));
        assert_eq!(table.type_of("x"), VarType::Integer);
    }

    #[test]
    fn test_inner_scope_is_dropped_on_exit() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.declare("y", VarType::Integer);
        assert!(table.is_declared("y"));

        table.exit_scope();
        assert!(!table.is_declared("y"));
    }

    #[test]
    fn test_shadowing_resolves_innermost_first() {
        let mut table = SymbolTable::new();
        table.declare("x", VarType::Integer);
        table.enter_scope();
        assert!(!table.is_declared_in_current_scope("x"));

        table.declare("x", VarType::Integer);
        assert!(table.is_declared_in_current_scope("x"));
        table.exit_scope();
        assert_eq!(table.type_of("x"), VarType::Integer);
        assert!(table.is_declared_in_current_scope("x"));
    }

    #[test]
    fn test_outer_names_visible_from_inner_scope() {
        let mut table = SymbolTable::new();
        table.declare("total", VarType::Integer);
        table.enter_scope();
        table.enter_scope();

        assert!(table.is_declared("total"));
        assert!(!table.is_declared_in_current_scope("total"));
    }

    #[test]
    fn test_redeclare_in_same_scope_overwrites() {
        let mut table = SymbolTable::new();
        table.declare("x", VarType::Integer);
        table.declare("x", VarType::Integer);
        assert_eq!(table.type_of("x"), VarType::Integer);
        assert!(table.is_declared_in_current_scope("x"));
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut table = SymbolTable::new();
        table.declare("g", VarType::Integer);
        table.exit_scope();
        table.exit_scope();

        assert!(table.is_global_scope());
        assert!(table.is_declared("g"));
    }
}
