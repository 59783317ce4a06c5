use std::collections::HashSet;

use crate::error::RegistryError;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

pub const DEFAULT_CRITERIA: [&str; 4] = ["Knowledge", "Clarity", "Engagement", "Punctuality"];

/// Ordered set of rating criteria for a reporting period.
///
/// Built once at startup and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionRegistry {
    names: Vec<String>,
}

impl CriterionRegistry {
    pub fn new<I, S>(names: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Intake trims criterion keys, so names are stored trimmed too.
        let names: Vec<String> = names
            .into_iter()
            .map(|name| Into::<String>::into(name).trim().to_string())
            .collect();
        if names.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(RegistryError::BlankName);
            }
            if !seen.insert(name.as_str()) {
                return Err(RegistryError::Duplicate(name.clone()));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, criterion: &str) -> bool {
        self.names.iter().any(|name| name == criterion)
    }

    pub fn score_in_range(score: i32) -> bool {
        (MIN_SCORE..=MAX_SCORE).contains(&score)
    }
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        Self {
            names: DEFAULT_CRITERIA.iter().map(|name| name.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_keeps_declared_order() {
        let registry = CriterionRegistry::default();
        assert_eq!(
            registry.names(),
            &["Knowledge", "Clarity", "Engagement", "Punctuality"]
        );
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn membership_is_exact() {
        let registry = CriterionRegistry::default();
        assert!(registry.contains("Clarity"));
        assert!(!registry.contains("clarity"));
        assert!(!registry.contains("Humor"));
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert!(!CriterionRegistry::score_in_range(0));
        assert!(CriterionRegistry::score_in_range(1));
        assert!(CriterionRegistry::score_in_range(5));
        assert!(!CriterionRegistry::score_in_range(6));
    }

    #[test]
    fn names_are_trimmed_before_duplicate_check() {
        let registry = CriterionRegistry::new([" Knowledge ", "Clarity\t"]).unwrap();
        assert_eq!(registry.names(), &["Knowledge", "Clarity"]);
        assert!(registry.contains("Knowledge"));

        assert_eq!(
            CriterionRegistry::new(["Knowledge", "Knowledge "]),
            Err(RegistryError::Duplicate("Knowledge".to_string()))
        );
    }

    #[test]
    fn rejects_empty_blank_and_duplicate_names() {
        assert_eq!(
            CriterionRegistry::new(Vec::<String>::new()),
            Err(RegistryError::Empty)
        );
        assert_eq!(
            CriterionRegistry::new(["Knowledge", "  "]),
            Err(RegistryError::BlankName)
        );
        assert_eq!(
            CriterionRegistry::new(["Knowledge", "Clarity", "Knowledge"]),
            Err(RegistryError::Duplicate("Knowledge".to_string()))
        );
    }
}
