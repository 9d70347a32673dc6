//! Annotation binding subsystem.
//!
//! # Data Flow
//! ```text
//! annotations (string → string)
//!     → Binder::bind(annotations, scope, &mut target)
//!     → for each Field in T::FIELDS: lookup "<prefix>/<scope>.<key>"
//!     → pattern check (patterns.rs) → setter (parse.rs)
//!     → recurse into T::nested() under "<scope>.<sub>"
//! ```
//!
//! # Design Decisions
//! - Targets are default-constructed before binding
//! - A rejected or unparsable value keeps the default; binding never fails
//! - Schemas are static tables, not runtime introspection
//! - Compiled patterns are cached for the lifetime of the binder

pub mod parse;
pub mod patterns;

use std::collections::HashMap;

use dashmap::DashMap;
use regex::Regex;

/// String-keyed metadata attached to a cluster object.
pub type Annotations = HashMap<String, String>;

/// One bindable field of a configuration type.
pub struct Field<T> {
    /// Key suffix within the owning scope (e.g. `maxAge`).
    pub key: &'static str,
    /// Validating pattern the raw value must match, if any.
    pub pattern: Option<&'static str>,
    /// Parses the raw value into the target. Returns false when the value
    /// cannot be represented, leaving the target untouched.
    pub set: fn(&mut T, &str) -> bool,
}

/// Static binding schema of a configuration type.
pub trait Schema: Sized + 'static {
    /// Scalar fields bound directly on this type.
    const FIELDS: &'static [Field<Self>];

    /// Nested configuration objects and the sub-scope each binds under.
    fn nested(&mut self) -> Vec<(&'static str, &mut dyn Bind)> {
        Vec::new()
    }
}

/// Object-safe view of a schema, used to recurse into nested types.
pub trait Bind {
    fn bind_with(&mut self, binder: &Binder, annotations: &Annotations, scope: &str);
}

impl<T: Schema> Bind for T {
    fn bind_with(&mut self, binder: &Binder, annotations: &Annotations, scope: &str) {
        binder.bind(annotations, scope, self);
    }
}

/// Overlays annotation values onto defaulted configuration objects.
pub struct Binder {
    prefix: String,
    patterns: DashMap<&'static str, Regex>,
}

impl Binder {
    /// Create a binder for annotation keys under `prefix` (e.g. `router.deis.io`).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            patterns: DashMap::new(),
        }
    }

    /// Bind every field of `target` (and its nested objects) from `annotations`.
    pub fn bind<T: Schema>(&self, annotations: &Annotations, scope: &str, target: &mut T) {
        for field in T::FIELDS {
            let key = self.key(scope, field.key);
            let Some(value) = annotations.get(&key) else {
                continue;
            };

            if let Some(pattern) = field.pattern {
                if !self.accepts(pattern, value) {
                    tracing::debug!(
                        key = %key,
                        value = %value,
                        "Annotation rejected by pattern, keeping default"
                    );
                    continue;
                }
            }

            if !(field.set)(target, value) {
                tracing::debug!(
                    key = %key,
                    value = %value,
                    "Annotation could not be parsed, keeping default"
                );
            }
        }

        for (sub, child) in target.nested() {
            child.bind_with(self, annotations, &join_scope(scope, sub));
        }
    }

    fn key(&self, scope: &str, key: &str) -> String {
        if scope.is_empty() {
            format!("{}/{}", self.prefix, key)
        } else {
            format!("{}/{}.{}", self.prefix, scope, key)
        }
    }

    fn accepts(&self, pattern: &'static str, value: &str) -> bool {
        if let Some(re) = self.patterns.get(pattern) {
            return re.is_match(value);
        }

        match Regex::new(pattern) {
            Ok(re) => {
                let matched = re.is_match(value);
                self.patterns.insert(pattern, re);
                matched
            }
            Err(e) => {
                tracing::error!(pattern, error = %e, "Invalid field pattern");
                false
            }
        }
    }
}

fn join_scope(scope: &str, sub: &str) -> String {
    if scope.is_empty() {
        sub.to_string()
    } else {
        format!("{}.{}", scope, sub)
    }
}
