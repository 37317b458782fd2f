//! Solution records and the form input they are built from.
//!
//! A [`Solution`] can only hold non-empty text and at least one trigger keyword, so validation
//! happens once, when a [`SolutionInput`] is turned into a record.

use crate::{KbError, KbResult};
use kb_types::{NonEmptyList, NonEmptyText};
use serde::{Deserialize, Serialize};

/// A single IT problem and its remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Solution {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub title: NonEmptyText,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub problem_statement: NonEmptyText,
    /// Plain numbered steps (`1) ... 2) ...`) or rich markup.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub description: NonEmptyText,
    pub action: Action,
}

/// Search keywords and the verification step of a [`Solution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Action {
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub trigger: NonEmptyList<NonEmptyText>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub next_step: NonEmptyText,
}

impl Solution {
    /// Returns `true` if `needle` occurs in the title, the problem statement, or any trigger.
    ///
    /// `needle` must already be lowercase; the record's fields are lowercased here.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.as_str().to_lowercase().contains(needle)
            || self
                .problem_statement
                .as_str()
                .to_lowercase()
                .contains(needle)
            || self
                .action
                .trigger
                .iter()
                .any(|keyword| keyword.as_str().to_lowercase().contains(needle))
    }

    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.action.trigger.iter().map(NonEmptyText::as_str)
    }
}

/// Raw form values as typed by the user.
///
/// `triggers` is the comma-separated keyword text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionInput {
    pub title: String,
    pub problem_statement: String,
    pub description: String,
    pub triggers: String,
    pub next_step: String,
}

impl SolutionInput {
    /// Pre-fills the form from an existing record, joining triggers with `", "`.
    pub fn from_solution(solution: &Solution) -> Self {
        Self {
            title: solution.title.to_string(),
            problem_statement: solution.problem_statement.to_string(),
            description: solution.description.to_string(),
            triggers: solution.triggers().collect::<Vec<_>>().join(", "),
            next_step: solution.action.next_step.to_string(),
        }
    }

    /// Trims every field, splits the triggers, and builds a [`Solution`].
    ///
    /// # Errors
    ///
    /// Returns `KbError::Validation` naming every required field that is empty after trimming.
    pub fn validate(&self) -> KbResult<Solution> {
        let title = NonEmptyText::new(&self.title);
        let problem_statement = NonEmptyText::new(&self.problem_statement);
        let description = NonEmptyText::new(&self.description);
        let next_step = NonEmptyText::new(&self.next_step);
        let trigger = NonEmptyList::new(split_triggers(&self.triggers));

        match (title, problem_statement, description, trigger, next_step) {
            (Ok(title), Ok(problem_statement), Ok(description), Ok(trigger), Ok(next_step)) => {
                Ok(Solution {
                    title,
                    problem_statement,
                    description,
                    action: Action { trigger, next_step },
                })
            }
            (title, problem_statement, description, trigger, next_step) => {
                let missing: Vec<&str> = [
                    ("title", title.is_err()),
                    ("problem_statement", problem_statement.is_err()),
                    ("description", description.is_err()),
                    ("trigger", trigger.is_err()),
                    ("next_step", next_step.is_err()),
                ]
                .into_iter()
                .filter_map(|(name, failed)| failed.then_some(name))
                .collect();

                Err(KbError::Validation(format!(
                    "missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Splits comma-separated keyword text into trimmed, non-empty keywords.
///
/// Duplicates are kept.
pub fn split_triggers(raw: &str) -> Vec<NonEmptyText> {
    raw.split(',')
        .filter_map(|part| NonEmptyText::new(part).ok())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn input(title: &str, triggers: &str) -> SolutionInput {
        SolutionInput {
            title: title.into(),
            problem_statement: format!("{title} problem"),
            description: "1) Restart. 2) Check again.".into(),
            triggers: triggers.into(),
            next_step: "Confirm it works.".into(),
        }
    }

    pub(crate) fn solution(title: &str, triggers: &str) -> Solution {
        input(title, triggers).validate().unwrap()
    }

    #[test]
    fn test_split_triggers_trims_and_drops_empty() {
        let keywords = split_triggers(" camera, ,teams ,, camera ");
        let words: Vec<&str> = keywords.iter().map(|k| k.as_str()).collect();
        assert_eq!(words, vec!["camera", "teams", "camera"]);
    }

    #[test]
    fn test_validate_trims_fields() {
        let mut form = input("  Teams camera not working  ", "camera");
        form.next_step = "  Check preview \n".into();

        let solution = form.validate().unwrap();
        assert_eq!(solution.title.as_str(), "Teams camera not working");
        assert_eq!(solution.action.next_step.as_str(), "Check preview");
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let form = SolutionInput {
            title: " ".into(),
            problem_statement: "Camera is black".into(),
            description: String::new(),
            triggers: " , ".into(),
            next_step: "Check".into(),
        };

        match form.validate() {
            Err(KbError::Validation(msg)) => {
                assert!(msg.contains("title"));
                assert!(msg.contains("description"));
                assert!(msg.contains("trigger"));
                assert!(!msg.contains("problem_statement"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_missing_next_step() {
        let mut form = input("VPN drops", "vpn");
        form.next_step = "   ".into();

        assert!(matches!(form.validate(), Err(KbError::Validation(_))));
    }

    #[test]
    fn test_from_solution_joins_triggers() {
        let original = solution("Printer offline", "printer, offline,queue");
        let form = SolutionInput::from_solution(&original);

        assert_eq!(form.triggers, "printer, offline, queue");
        assert_eq!(form.validate().unwrap(), original);
    }

    #[test]
    fn test_matches_lowercase_checks_three_fields_only() {
        let s = solution("Teams camera not working", "webcam");

        assert!(s.matches_lowercase("teams"));
        assert!(s.matches_lowercase("problem"));
        assert!(s.matches_lowercase("webc"));
        assert!(!s.matches_lowercase("restart"));
        assert!(!s.matches_lowercase("confirm"));
    }

    #[test]
    fn test_deserialize_rejects_empty_trigger_list() {
        let raw = r#"{
            "title": "t", "problem_statement": "p", "description": "d",
            "action": { "trigger": [], "next_step": "n" }
        }"#;
        assert!(serde_json::from_str::<Solution>(raw).is_err());
    }
}
