//! Deterministic step derivation for the wizard.

use crate::core::types::{ExternalConfig, LoaderContent, Step};

/// Derive which step to show from the current wizard data.
///
/// Checked in order, first match wins:
/// 1. an unsubmitted snapshot awaiting a resume decision
/// 2. generated content
/// 3. both input source and input format chosen
/// 4. nothing chosen yet
pub fn derive_step(
    config: &ExternalConfig,
    content: Option<&LoaderContent>,
    need_verify: bool,
) -> Step {
    if need_verify {
        return Step::Resume;
    }
    if content.is_some() {
        return Step::Schema;
    }
    if config.input_format.is_some() && config.input_source.is_some() {
        return Step::Parse;
    }
    Step::SelectInputType
}

/// Whether a snapshot loaded at session start must be confirmed before use.
///
/// Only unsubmitted content asks; a snapshot with a task id resumes straight
/// into progress tracking.
pub fn needs_verify(snapshot: Option<&LoaderContent>) -> bool {
    snapshot.is_some_and(|content| content.id.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SpecObject;

    fn configs() -> Vec<ExternalConfig> {
        let source = SpecObject::new("http").with("uris", vec!["https://example.com/a.json"]);
        let format = SpecObject::new("json");
        vec![
            ExternalConfig::default(),
            ExternalConfig {
                input_source: Some(source.clone()),
                ..ExternalConfig::default()
            },
            ExternalConfig {
                input_format: Some(format.clone()),
                ..ExternalConfig::default()
            },
            ExternalConfig {
                input_source: Some(source),
                input_format: Some(format),
                ..ExternalConfig::default()
            },
        ]
    }

    fn contents() -> Vec<Option<LoaderContent>> {
        vec![
            None,
            Some(LoaderContent::new("SELECT 1")),
            Some(LoaderContent::new("SELECT 1").with_id("query-1")),
        ]
    }

    #[test]
    fn need_verify_always_wins() {
        for config in configs() {
            for content in contents() {
                assert_eq!(derive_step(&config, content.as_ref(), true), Step::Resume);
            }
        }
    }

    #[test]
    fn content_wins_over_config() {
        for config in configs() {
            let content = LoaderContent::new("SELECT 1");
            assert_eq!(derive_step(&config, Some(&content), false), Step::Schema);
        }
    }

    #[test]
    fn parse_requires_both_source_and_format() {
        let steps: Vec<Step> = configs()
            .iter()
            .map(|config| derive_step(config, None, false))
            .collect();
        assert_eq!(
            steps,
            vec![
                Step::SelectInputType,
                Step::SelectInputType,
                Step::SelectInputType,
                Step::Parse,
            ]
        );
    }

    #[test]
    fn only_unsubmitted_snapshots_need_verify() {
        assert!(!needs_verify(None));
        assert!(needs_verify(Some(&LoaderContent::new("SELECT 1"))));
        assert!(!needs_verify(Some(
            &LoaderContent::new("SELECT 1").with_id("query-1")
        )));
    }
}
