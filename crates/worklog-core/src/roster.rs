//! Per-project rate roster
//!
//! The roster maps `(project key, user display name)` to the user's position
//! and hourly rate. It lives in a spreadsheet between runs (see the
//! `worklog-roster` crate); this module holds the in-memory model and the
//! reconciliation against a freshly built worklog.
//!
//! Both levels are `BTreeMap`s, so iteration (and therefore the persisted
//! file) is in plain lexicographic order of project key and user name.

use crate::Worklog;
use serde::Serialize;
use std::collections::BTreeMap;

/// Stored position and rate of one user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub position: String,
    /// Hourly rate, 0 when not filled in yet
    pub rate: i64,
}

impl RosterEntry {
    pub fn new(position: impl Into<String>, rate: i64) -> Self {
        Self {
            position: position.into(),
            rate,
        }
    }
}

/// Users of one project, keyed by display name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProjectRoster {
    users: BTreeMap<String, RosterEntry>,
}

impl ProjectRoster {
    pub fn get(&self, user_name: &str) -> Option<&RosterEntry> {
        self.users.get(user_name)
    }

    pub fn insert(&mut self, user_name: impl Into<String>, entry: RosterEntry) {
        self.users.insert(user_name.into(), entry);
    }

    /// Users in lexicographic name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RosterEntry)> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Roster of every project, keyed by project key
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    projects: BTreeMap<String, ProjectRoster>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self, key: &str) -> Option<&ProjectRoster> {
        self.projects.get(key)
    }

    /// Get or create the roster of `key`
    pub fn project_mut(&mut self, key: impl Into<String>) -> &mut ProjectRoster {
        self.projects.entry(key.into()).or_default()
    }

    pub fn insert(&mut self, project: impl Into<String>, user_name: impl Into<String>, entry: RosterEntry) {
        self.project_mut(project).insert(user_name, entry);
    }

    /// Projects in lexicographic key order
    pub fn projects(&self) -> impl Iterator<Item = (&String, &ProjectRoster)> {
        self.projects.iter()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn user_count(&self) -> usize {
        self.projects.values().map(ProjectRoster::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Build the roster to persist after a run.
    ///
    /// Only projects and users present in `worklog` survive. Known users
    /// keep their stored position and rate; new users get a blank entry.
    pub fn reconcile(&self, worklog: &Worklog) -> Roster {
        let mut reconciled = Roster::new();

        for project in &worklog.projects {
            let stored = self.project(&project.key);
            let target = reconciled.project_mut(project.key.clone());

            for user in &project.users {
                let entry = stored
                    .and_then(|p| p.get(&user.display_name))
                    .cloned()
                    .unwrap_or_default();
                target.insert(user.display_name.clone(), entry);
            }
        }

        reconciled
    }

    /// Pretty JSON dump, used for debug logging
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Project, User};
    use pretty_assertions::assert_eq;

    fn user(name: &str) -> User {
        User {
            account_id: format!("id-{name}"),
            display_name: name.to_string(),
            position: String::new(),
            rate: 0,
            issues: vec![],
        }
    }

    fn worklog(projects: Vec<(&str, Vec<&str>)>) -> Worklog {
        Worklog::new(
            projects
                .into_iter()
                .map(|(key, users)| Project {
                    key: key.to_string(),
                    users: users.into_iter().map(user).collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn reconcile_keeps_known_users() {
        let mut stored = Roster::new();
        stored.insert("PRJ", "Alice", RosterEntry::new("Lead", 50));

        let reconciled = stored.reconcile(&worklog(vec![("PRJ", vec!["Alice"])]));

        assert_eq!(
            reconciled.project("PRJ").unwrap().get("Alice"),
            Some(&RosterEntry::new("Lead", 50))
        );
    }

    #[test]
    fn reconcile_blanks_new_users() {
        let reconciled = Roster::new().reconcile(&worklog(vec![("PRJ", vec!["Bob"])]));

        assert_eq!(
            reconciled.project("PRJ").unwrap().get("Bob"),
            Some(&RosterEntry::default())
        );
    }

    #[test]
    fn reconcile_drops_unobserved_users_and_projects() {
        let mut stored = Roster::new();
        stored.insert("PRJ", "Alice", RosterEntry::new("Lead", 50));
        stored.insert("PRJ", "Gone", RosterEntry::new("QA", 30));
        stored.insert("OLD", "Alice", RosterEntry::new("Lead", 50));

        let reconciled = stored.reconcile(&worklog(vec![("PRJ", vec!["Alice"])]));

        assert_eq!(reconciled.project_count(), 1);
        assert!(reconciled.project("OLD").is_none());
        let prj = reconciled.project("PRJ").unwrap();
        assert_eq!(prj.len(), 1);
        assert!(prj.get("Gone").is_none());
    }

    #[test]
    fn reconcile_is_scoped_per_project() {
        let mut stored = Roster::new();
        stored.insert("AAA", "Alice", RosterEntry::new("Lead", 50));

        let reconciled = stored.reconcile(&worklog(vec![("BBB", vec!["Alice"])]));

        assert_eq!(
            reconciled.project("BBB").unwrap().get("Alice"),
            Some(&RosterEntry::default())
        );
    }

    #[test]
    fn reconcile_keeps_projects_without_users() {
        let reconciled = Roster::new().reconcile(&worklog(vec![("PRJ", vec![])]));
        assert!(reconciled.project("PRJ").unwrap().is_empty());
    }

    #[test]
    fn iteration_is_lexicographic() {
        let reconciled = Roster::new().reconcile(&worklog(vec![
            ("ZED", vec!["bob"]),
            ("ABC", vec!["bob", "Carol", "alice", "Bob"]),
        ]));

        let keys: Vec<_> = reconciled.projects().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["ABC", "ZED"]);
        let names: Vec<_> = reconciled
            .project("ABC")
            .unwrap()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        // Byte order: uppercase sorts before lowercase
        assert_eq!(names, vec!["Bob", "Carol", "alice", "bob"]);
    }
}
