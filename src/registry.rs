//! Named column registry
//!
//! The evaluation context: owns registered columns, carries the default
//! representation for untyped literals and the engine configuration.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::error::{Error, Rejected, Result};
use crate::pipeline::{self, ColumnSource, ExecutionStats};
use crate::table::{Column, Repr};

#[derive(Debug)]
pub struct Registry {
    columns: HashMap<String, Column>,
    default_repr: Repr,
    config: EngineConfig,
}

impl Registry {
    /// Empty registry; untyped literals are int32
    pub fn new() -> Self {
        Self::with_repr(Repr::Int32)
    }

    /// Empty registry whose untyped literals take `default_repr`.
    ///
    /// Untyped literals convert like column fills: with `Repr::Int32`, `2.9`
    /// truncates toward zero to `2`. Write `2.9_f32` to keep the fraction
    /// (a fractional `_i32` literal is a parse error).
    pub fn with_repr(default_repr: Repr) -> Self {
        Self::with_config(default_repr, EngineConfig::default())
    }

    pub fn with_config(default_repr: Repr, config: EngineConfig) -> Self {
        Registry {
            columns: HashMap::new(),
            default_repr,
            config,
        }
    }

    /// Take ownership of `column` under `name`.
    ///
    /// On `DuplicateName` or `InvalidName` the column comes back inside the
    /// error and the registry is unchanged.
    pub fn register(&mut self, name: &str, column: Column) -> std::result::Result<(), Rejected> {
        if !is_identifier(name) {
            return Err(Rejected {
                error: Error::InvalidName(name.to_string()),
                column,
            });
        }
        if self.columns.contains_key(name) {
            return Err(Rejected {
                error: Error::DuplicateName(name.to_string()),
                column,
            });
        }
        tracing::debug!(name, repr = %column.repr(), len = column.len(), "register");
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    /// Register or overwrite, returning the previous column
    pub fn replace(&mut self, name: &str, column: Column) -> std::result::Result<Option<Column>, Rejected> {
        if !is_identifier(name) {
            return Err(Rejected {
                error: Error::InvalidName(name.to_string()),
                column,
            });
        }
        tracing::debug!(name, repr = %column.repr(), len = column.len(), "replace");
        Ok(self.columns.insert(name.to_string(), column))
    }

    pub fn unregister(&mut self, name: &str) -> Option<Column> {
        let removed = self.columns.remove(name);
        if removed.is_some() {
            tracing::debug!(name, "unregister");
        }
        removed
    }

    pub fn clear(&mut self) {
        tracing::debug!(count = self.columns.len(), "clear");
        self.columns.clear();
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn default_repr(&self) -> Repr {
        self.default_repr
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Evaluate an expression over registered columns into a new column.
    ///
    /// The registry is never modified; on error nothing is allocated
    /// beyond intermediates already dropped.
    pub fn evaluate(&self, expression: &str) -> Result<Column> {
        pipeline::evaluate(self, &self.config, expression)
    }

    pub fn evaluate_with_stats(&self, expression: &str) -> Result<(Column, ExecutionStats)> {
        pipeline::evaluate_with_stats(self, &self.config, expression)
    }

    /// The plan `evaluate` would run, as text
    pub fn explain(&self, expression: &str) -> Result<String> {
        pipeline::explain(self, &self.config, expression)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnSource for Registry {
    fn lookup(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    fn default_repr(&self) -> Repr {
        self.default_repr
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
