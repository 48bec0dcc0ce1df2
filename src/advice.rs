//! Dependency-change directives and their coordinate model.
//!
//! Advice is immutable once constructed. Instances may be shared freely
//! across rewriter instances and threads; nothing here mutates after
//! construction.

use std::collections::HashSet;
use std::fmt;

/// Identity of a dependency: an external module (`group:artifact`, optionally
/// versioned) or an internal project path (`:sub:project`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Coordinates {
    Module {
        /// `group:artifact`, without version.
        identifier: String,
        version: Option<String>,
    },
    Project {
        path: String,
    },
}

impl Coordinates {
    /// Parse from the usual string forms: `:path` for projects, `g:a` or
    /// `g:a:v` for modules.
    pub fn parse(s: &str) -> Self {
        if s.starts_with(':') {
            return Coordinates::Project {
                path: s.to_string(),
            };
        }
        match s.match_indices(':').nth(1) {
            Some((idx, _)) => Coordinates::Module {
                identifier: s[..idx].to_string(),
                version: Some(s[idx + 1..].to_string()),
            },
            None => Coordinates::Module {
                identifier: s.to_string(),
                version: None,
            },
        }
    }

    /// Full coordinate string: `g:a:v` when the version is known, otherwise
    /// the identifier; project paths print as-is.
    pub fn gav(&self) -> String {
        match self {
            Coordinates::Module {
                identifier,
                version: Some(v),
            } => format!("{identifier}:{v}"),
            Coordinates::Module { identifier, .. } => identifier.clone(),
            Coordinates::Project { path } => path.clone(),
        }
    }

    /// Short identifier form: `g:a` without version, or the project path.
    pub fn identifier(&self) -> &str {
        match self {
            Coordinates::Module { identifier, .. } => identifier,
            Coordinates::Project { path } => path,
        }
    }

    /// Whether a normalized source identifier refers to this dependency,
    /// by full coordinate string or by short identifier.
    pub fn matches(&self, normalized: &str) -> bool {
        normalized == self.gav() || normalized == self.identifier()
    }

    pub fn is_project(&self) -> bool {
        matches!(self, Coordinates::Project { .. })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.gav())
    }
}

/// One directive against one dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Advice {
    /// Declare a dependency that is missing.
    Add {
        coordinates: Coordinates,
        to_configuration: String,
    },
    /// Remove an existing declaration.
    Remove {
        coordinates: Coordinates,
        from_configuration: String,
    },
    /// Rewrite an existing declaration in place: new configuration, and
    /// optionally new coordinates.
    Change {
        coordinates: Coordinates,
        from_configuration: String,
        to_configuration: String,
        to_coordinates: Option<Coordinates>,
    },
}

impl Advice {
    pub fn is_add(&self) -> bool {
        matches!(self, Advice::Add { .. })
    }

    /// Coordinates the advice is keyed on (the ones expected in source).
    pub fn coordinates(&self) -> &Coordinates {
        match self {
            Advice::Add { coordinates, .. }
            | Advice::Remove { coordinates, .. }
            | Advice::Change { coordinates, .. } => coordinates,
        }
    }

    /// Configuration an existing declaration must be filed under for this
    /// advice to govern it. `None` for Add: there is no existing declaration
    /// to match.
    pub fn from_configuration(&self) -> Option<&str> {
        match self {
            Advice::Add { .. } => None,
            Advice::Remove {
                from_configuration, ..
            }
            | Advice::Change {
                from_configuration, ..
            } => Some(from_configuration),
        }
    }

    /// Configuration the printed declaration uses.
    pub fn target_configuration(&self) -> &str {
        match self {
            Advice::Add {
                to_configuration, ..
            }
            | Advice::Change {
                to_configuration, ..
            } => to_configuration,
            Advice::Remove {
                from_configuration, ..
            } => from_configuration,
        }
    }

    /// Coordinates the printed declaration uses.
    pub fn target_coordinates(&self) -> &Coordinates {
        match self {
            Advice::Change {
                coordinates,
                to_coordinates,
                ..
            } => to_coordinates.as_ref().unwrap_or(coordinates),
            other => other.coordinates(),
        }
    }
}

/// The advice supplied for one rewrite. Deduplicated; iteration order is the
/// first-seen order of the input.
///
/// Two derived views exist for add advice, with intentionally different
/// ordering guarantees: [`AdviceSet::adds`] is unordered and feeds appends
/// into an existing block, while [`AdviceSet::adds_in_order`] preserves
/// first-seen order and feeds whole-block synthesis. The two call sites
/// differ on purpose; do not unify them.
#[derive(Debug, Clone, Default)]
pub struct AdviceSet {
    items: Vec<Advice>,
}

impl AdviceSet {
    pub fn new(items: impl IntoIterator<Item = Advice>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for item in items {
            if seen.insert(item.clone()) {
                unique.push(item);
            }
        }
        Self { items: unique }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Advice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add advice as an unordered set.
    pub fn adds(&self) -> HashSet<&Advice> {
        self.items.iter().filter(|a| a.is_add()).collect()
    }

    /// Add advice in first-seen order.
    pub fn adds_in_order(&self) -> Vec<&Advice> {
        self.items.iter().filter(|a| a.is_add()).collect()
    }
}

impl FromIterator<Advice> for AdviceSet {
    fn from_iter<I: IntoIterator<Item = Advice>>(iter: I) -> Self {
        Self::new(iter)
    }
}
