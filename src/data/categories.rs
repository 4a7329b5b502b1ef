//! End-use category set and the header normalization applied to templates.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LoadGenError, Result};

/// Electrical end-use categories, in output column order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Raumwärme",
    "Warmwasser",
    "Prozesswärme",
    "Klimakälte",
    "Prozesskälte",
    "Beleuchtung",
    "IKT",
    "Mechanische Antriebe",
];

/// Template columns dropped before synthesis.
pub const DEFAULT_EXCLUDED: &[&str] = &["unstetige mech. Antriebe"];

/// Template columns renamed before synthesis, as `(from, to)`.
pub const DEFAULT_RENAMES: &[(&str, &str)] = &[("stetige mech. Antriebe", "Mechanische Antriebe")];

/// The fixed global category set plus the rules that map raw template
/// headers onto it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryMapping {
    names: Vec<String>,
    excluded: BTreeSet<String>,
    renames: BTreeMap<String, String>,
}

impl Default for CategoryMapping {
    fn default() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            excluded: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            renames: DEFAULT_RENAMES
                .iter()
                .map(|(f, t)| (f.to_string(), t.to_string()))
                .collect(),
        }
    }
}

impl CategoryMapping {
    /// Creates a mapping.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `names` is empty or has duplicates, if a
    /// category is also excluded, or if a rename targets an unknown category.
    pub fn new(
        names: Vec<String>,
        excluded: BTreeSet<String>,
        renames: BTreeMap<String, String>,
    ) -> Result<Self> {
        if names.is_empty() {
            return Err(LoadGenError::validation("category list is empty"));
        }
        let mut seen = BTreeSet::new();
        for n in &names {
            if !seen.insert(n) {
                return Err(LoadGenError::validation(format!("category \"{n}\" listed twice")));
            }
            if excluded.contains(n) {
                return Err(LoadGenError::validation(format!(
                    "category \"{n}\" is both used and excluded"
                )));
            }
        }
        if let Some((from, to)) = renames.iter().find(|(_, to)| !seen.contains(to)) {
            return Err(LoadGenError::validation(format!(
                "rename \"{from}\" -> \"{to}\" targets an unknown category"
            )));
        }
        Ok(Self {
            names,
            excluded,
            renames,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Maps raw template headers to category indices.
    ///
    /// Each entry of the result is `Some(category_index)` for a kept column or
    /// `None` for an excluded one. Every category must be covered exactly once.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming `source` on an unknown column, a
    /// duplicate after renaming, or a missing category.
    pub fn resolve_header<'a, I>(&self, headers: I, source: &str) -> Result<Vec<Option<usize>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut covered = vec![false; self.names.len()];
        let mut slots = Vec::new();
        for raw in headers {
            let raw = raw.trim();
            if self.excluded.contains(raw) {
                slots.push(None);
                continue;
            }
            let name = self.renames.get(raw).map_or(raw, String::as_str);
            let idx = self.position(name).ok_or_else(|| {
                LoadGenError::validation(format!("{source}: unexpected column \"{raw}\""))
            })?;
            if covered[idx] {
                return Err(LoadGenError::validation(format!(
                    "{source}: category \"{name}\" appears twice"
                )));
            }
            covered[idx] = true;
            slots.push(Some(idx));
        }
        if let Some(i) = covered.iter().position(|c| !c) {
            return Err(LoadGenError::validation(format!(
                "{source}: missing category \"{}\"",
                self.names[i]
            )));
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CategoryMapping {
        CategoryMapping::new(
            vec!["IKT".into(), "Mechanische Antriebe".into()],
            ["unstetige mech. Antriebe".to_string()].into(),
            [(
                "stetige mech. Antriebe".to_string(),
                "Mechanische Antriebe".to_string(),
            )]
            .into(),
        )
        .expect("valid mapping")
    }

    #[test]
    fn default_has_eight_categories() {
        let m = CategoryMapping::default();
        assert_eq!(m.len(), 8);
        assert_eq!(m.position("IKT"), Some(6));
    }

    #[test]
    fn resolve_applies_rename_and_exclusion() {
        let m = small();
        let slots = m
            .resolve_header(
                ["stetige mech. Antriebe", "unstetige mech. Antriebe", "IKT"],
                "Week_day",
            )
            .expect("header resolves");
        assert_eq!(slots, vec![Some(1), None, Some(0)]);
    }

    #[test]
    fn missing_category_is_error() {
        let err = small()
            .resolve_header(["IKT"], "Saturday")
            .expect_err("must fail");
        assert!(err.to_string().contains("Mechanische Antriebe"));
    }

    #[test]
    fn unknown_column_is_error() {
        let err = small()
            .resolve_header(["IKT", "Mechanische Antriebe", "Druckluft"], "Sunday")
            .expect_err("must fail");
        assert!(err.to_string().contains("Druckluft"));
    }

    #[test]
    fn duplicate_after_rename_is_error() {
        let err = small().resolve_header(
            ["IKT", "Mechanische Antriebe", "stetige mech. Antriebe"],
            "Holiday",
        );
        assert!(err.is_err());
    }

    #[test]
    fn used_and_excluded_rejected() {
        let err = CategoryMapping::new(
            vec!["IKT".into()],
            ["IKT".to_string()].into(),
            BTreeMap::new(),
        );
        assert!(err.is_err());
    }
}
