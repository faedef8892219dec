//! Named experiment toggles.
//!
//! The engine only ever asks whether a name is enabled; where the set comes from
//! (config file, environment, request headers) is the caller's business.

use ahash::AHashSet;

/// Resolve redirects from the precomputed path table instead of live lookups.
pub const USE_PATH_TABLE: &str = "use-path-table";

/// An immutable set of enabled experiment names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Experiments {
    active: AHashSet<String>,
}

impl Experiments {
    /// Create a set with nothing enabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a set from experiment names. Blank names are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let active = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { active }
    }

    /// Parse a comma-separated list such as `"use-path-table, other"`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Return a copy of this set with `other`'s names enabled as well.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            active: self.active.union(&other.active).cloned().collect(),
        }
    }

    /// Enabled names in sorted order, for logging.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.active.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let experiments = Experiments::new([USE_PATH_TABLE]);
        assert!(experiments.is_active(USE_PATH_TABLE));
        assert!(!experiments.is_active("something-else"));
        assert!(!Experiments::none().is_active(USE_PATH_TABLE));
    }

    #[test]
    fn test_parse_list_trims_and_skips_blanks() {
        let experiments = Experiments::parse_list(" use-path-table ,, beta,");
        assert_eq!(experiments.names(), vec!["beta", "use-path-table"]);
    }

    #[test]
    fn test_union() {
        let a = Experiments::new(["a"]);
        let b = Experiments::new(["b"]);
        let both = a.union(&b);
        assert!(both.is_active("a"));
        assert!(both.is_active("b"));
    }
}
