//! Fold raw worklog records into the project → user → issue → effort tree
//!
//! Grouping goes through ordered maps so the result never depends on hash
//! iteration order:
//! - users are sorted case-insensitively by display name (account id breaks ties)
//! - issues ascend by key
//! - efforts ascend by date, one per day, seconds summed

use crate::roster::ProjectRoster;
use crate::{parse_date, Effort, Issue, Project, TimeEntry, User, ValidationError};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Entries of one author, grouped by issue key and then by day
struct AuthorGroup<'a> {
    display_name: &'a str,
    issues: BTreeMap<&'a str, BTreeMap<NaiveDate, i64>>,
}

/// Aggregate the raw records of one project.
///
/// `summaries` maps issue keys to their summary; missing keys yield an empty
/// summary. `roster` supplies position and rate per display name; users
/// absent from it get an empty position and a zero rate.
///
/// Any malformed record aborts the whole aggregation.
pub fn aggregate(
    project_key: &str,
    entries: &[TimeEntry],
    summaries: &HashMap<String, String>,
    roster: Option<&ProjectRoster>,
) -> Result<Project, ValidationError> {
    let mut authors: BTreeMap<&str, AuthorGroup<'_>> = BTreeMap::new();

    for entry in entries {
        let account_id = required(&entry.author.account_id, "author.accountId", project_key)?;
        let issue_key = required(&entry.issue.key, "issue.key", project_key)?;
        let date = parse_date(&entry.start_date)?;

        let group = authors.entry(account_id).or_insert_with(|| AuthorGroup {
            display_name: &entry.author.display_name,
            issues: BTreeMap::new(),
        });
        *group
            .issues
            .entry(issue_key)
            .or_default()
            .entry(date)
            .or_insert(0) += entry.time_spent_seconds;
    }

    let mut users: Vec<User> = authors
        .into_iter()
        .map(|(account_id, group)| {
            let entry = roster
                .and_then(|r| r.get(group.display_name))
                .cloned()
                .unwrap_or_default();

            let issues = group
                .issues
                .into_iter()
                .map(|(key, days)| Issue {
                    key: key.to_string(),
                    summary: summaries.get(key).cloned().unwrap_or_default(),
                    efforts: days
                        .into_iter()
                        .map(|(date, seconds)| Effort::new(date, seconds))
                        .collect(),
                })
                .collect();

            User {
                account_id: account_id.to_string(),
                display_name: group.display_name.to_string(),
                position: entry.position,
                rate: entry.rate,
                issues,
            }
        })
        .collect();

    sort_users(&mut users);

    Ok(Project {
        key: project_key.to_string(),
        users,
    })
}

/// Case-insensitive display-name order used by the report
pub fn sort_users(users: &mut [User]) {
    users.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.account_id.cmp(&b.account_id))
    });
}

fn required<'a>(
    value: &'a str,
    field: &'static str,
    project_key: &str,
) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field,
            context: format!("worklog record of project {project_key}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Author, IssueRef, RosterEntry};
    use pretty_assertions::assert_eq;

    fn entry(account: &str, name: &str, issue: &str, date: &str, seconds: i64) -> TimeEntry {
        TimeEntry::new(Author::new(account, name), IssueRef::new(issue), date, seconds)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn same_day_entries_are_summed() {
        let entries = vec![
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 3600),
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 1800),
        ];

        let project = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap();

        assert_eq!(project.key, "PRJ");
        assert_eq!(project.users.len(), 1);
        let issue = &project.users[0].issues[0];
        assert_eq!(issue.efforts, vec![Effort::new(day(2), 5400)]);
        assert_eq!(issue.efforts[0].hours(), 1.5);
    }

    #[test]
    fn one_effort_per_distinct_date() {
        let entries = vec![
            entry("a-1", "Alice", "PRJ-1", "2024-01-03", 600),
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 1200),
            entry("a-1", "Alice", "PRJ-1", "2024-01-03", 600),
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 1200),
            entry("a-1", "Alice", "PRJ-1", "2024-01-04", 300),
        ];

        let project = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap();

        assert_eq!(
            project.users[0].issues[0].efforts,
            vec![
                Effort::new(day(2), 2400),
                Effort::new(day(3), 1200),
                Effort::new(day(4), 300),
            ]
        );
    }

    #[test]
    fn entries_grouped_by_author_and_issue() {
        let entries = vec![
            entry("b-2", "Bob", "PRJ-2", "2024-01-02", 3600),
            entry("a-1", "Alice", "PRJ-2", "2024-01-02", 3600),
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 3600),
        ];

        let project = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap();

        let names: Vec<_> = project.users.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        let alice_issues: Vec<_> = project.users[0].issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(alice_issues, vec!["PRJ-1", "PRJ-2"]);
        assert_eq!(project.users[1].issues.len(), 1);
    }

    #[test]
    fn users_sorted_case_insensitively() {
        let entries = vec![
            entry("1", "bob", "PRJ-1", "2024-01-02", 60),
            entry("2", "Alice", "PRJ-1", "2024-01-02", 60),
            entry("3", "Carol", "PRJ-1", "2024-01-02", 60),
            entry("4", "alan", "PRJ-1", "2024-01-02", 60),
        ];

        let project = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap();

        let names: Vec<_> = project.users.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["alan", "Alice", "bob", "Carol"]);
    }

    #[test]
    fn summaries_resolved_with_empty_default() {
        let entries = vec![
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 60),
            entry("a-1", "Alice", "PRJ-9", "2024-01-02", 60),
        ];
        let summaries = HashMap::from([("PRJ-1".to_string(), "Login page".to_string())]);

        let project = aggregate("PRJ", &entries, &summaries, None).unwrap();

        let issues = &project.users[0].issues;
        assert_eq!(issues[0].summary, "Login page");
        assert_eq!(issues[1].summary, "");
    }

    #[test]
    fn roster_supplies_position_and_rate() {
        let entries = vec![
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 60),
            entry("b-2", "Bob", "PRJ-1", "2024-01-02", 60),
        ];
        let mut roster = ProjectRoster::default();
        roster.insert("Alice", RosterEntry::new("Developer", 40));

        let project = aggregate("PRJ", &entries, &HashMap::new(), Some(&roster)).unwrap();

        let alice = &project.users[0];
        assert_eq!(alice.position, "Developer");
        assert_eq!(alice.rate, 40);
        let bob = &project.users[1];
        assert_eq!(bob.position, "");
        assert_eq!(bob.rate, 0);
    }

    #[test]
    fn malformed_date_aborts() {
        let entries = vec![
            entry("a-1", "Alice", "PRJ-1", "2024-01-02", 60),
            entry("a-1", "Alice", "PRJ-1", "02.01.2024", 60),
        ];

        let err = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn missing_account_id_aborts() {
        let entries = vec![entry("", "Ghost", "PRJ-1", "2024-01-02", 60)];

        let err = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "author.accountId", .. }
        ));
    }

    #[test]
    fn missing_issue_key_aborts() {
        let entries = vec![entry("a-1", "Alice", " ", "2024-01-02", 60)];

        let err = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { field: "issue.key", .. }));
    }

    #[test]
    fn no_entries_yields_empty_project() {
        let project = aggregate("PRJ", &[], &HashMap::new(), None).unwrap();
        assert!(project.users.is_empty());
    }
}
