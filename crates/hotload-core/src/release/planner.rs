//! Load planning: which applications to start, and in what order.

use std::collections::HashSet;

use super::ReleaseManifest;
use crate::error::PlanningError;

/// Ordered, validated list of applications to start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadPlan {
    applications: Vec<String>,
}

impl LoadPlan {
    pub fn applications(&self) -> &[String] {
        &self.applications
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.applications.iter().map(String::as_str)
    }
}

/// Build the load plan for a release.
///
/// With no request the plan is every declared application in declaration
/// order. A request is kept in caller order with repeats dropped, and every
/// name is checked against the manifest before the plan is returned.
pub fn plan_release(
    manifest: &ReleaseManifest,
    requested: Option<&[String]>,
) -> Result<LoadPlan, PlanningError> {
    let Some(requested) = requested else {
        return Ok(LoadPlan {
            applications: manifest.applications.clone(),
        });
    };

    let mut seen = HashSet::new();
    let mut applications = Vec::with_capacity(requested.len());
    for name in requested {
        if !manifest.declares(name) {
            return Err(PlanningError::UnknownApplication {
                application: name.clone(),
                release: manifest.name.clone(),
            });
        }
        if seen.insert(name.as_str()) {
            applications.push(name.clone());
        }
    }

    Ok(LoadPlan { applications })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(apps: &[&str]) -> ReleaseManifest {
        ReleaseManifest {
            name: "shop".to_string(),
            version: semver::Version::new(1, 0, 0),
            applications: apps.iter().map(|a| a.to_string()).collect(),
            config: serde_json::Map::new(),
        }
    }

    fn names(apps: &[&str]) -> Vec<String> {
        apps.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn full_release_uses_declaration_order() {
        let plan = plan_release(&manifest(&["db", "cache", "web"]), None).unwrap();
        assert_eq!(plan.applications(), names(&["db", "cache", "web"]).as_slice());
    }

    #[test]
    fn subset_keeps_caller_order() {
        let request = names(&["web", "db"]);
        let plan =
            plan_release(&manifest(&["db", "cache", "web"]), Some(request.as_slice())).unwrap();
        assert_eq!(plan.iter().collect::<Vec<_>>(), vec!["web", "db"]);
    }

    #[test]
    fn repeated_names_collapse_to_first_occurrence() {
        let request = names(&["web", "db", "web"]);
        let plan = plan_release(&manifest(&["db", "web"]), Some(request.as_slice())).unwrap();
        assert_eq!(plan.iter().collect::<Vec<_>>(), vec!["web", "db"]);
    }

    #[test]
    fn unknown_name_fails_even_after_valid_ones() {
        let request = names(&["db", "ghost"]);
        let err =
            plan_release(&manifest(&["db", "web"]), Some(request.as_slice())).unwrap_err();
        assert_eq!(
            err,
            PlanningError::UnknownApplication {
                application: "ghost".to_string(),
                release: "shop".to_string(),
            }
        );
    }

    #[test]
    fn empty_request_gives_empty_plan() {
        let plan = plan_release(&manifest(&["db"]), Some(&[][..])).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }
}
