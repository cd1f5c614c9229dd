//! Task suggestions for a free-text goal.
//!
//! [`TemplateSuggester`] fills four fixed templates after a fixed delay. It
//! performs no inference. A real generator plugs in behind
//! [`SuggestionProvider`] and returns the same draft shape.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::task::TaskDraft;

pub const SUGGESTION_COUNT: usize = 4;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// `goal` is already trimmed and non-empty.
    async fn suggest(&self, goal: &str) -> anyhow::Result<Vec<TaskDraft>>;
}

#[derive(Debug, Clone)]
pub struct TemplateSuggester {
    delay: Duration,
}

impl TemplateSuggester {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for TemplateSuggester {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

#[async_trait]
impl SuggestionProvider for TemplateSuggester {
    #[tracing::instrument(skip(self))]
    async fn suggest(&self, goal: &str) -> anyhow::Result<Vec<TaskDraft>> {
        debug!(delay_ms = self.delay.as_millis() as u64, "simulating suggestion latency");
        tokio::time::sleep(self.delay).await;
        Ok(expand_goal(goal).into())
    }
}

/// Deterministic template expansion; depends only on `goal`.
pub fn expand_goal(goal: &str) -> [TaskDraft; SUGGESTION_COUNT] {
    [
        TaskDraft::new(
            format!("Research best practices for {goal}"),
            Some("Gather information from reliable sources and document findings".to_string()),
        ),
        TaskDraft::new(
            format!("Create detailed action plan for {goal}"),
            Some("Break down into smaller, manageable steps with deadlines".to_string()),
        ),
        TaskDraft::new(
            format!("Set measurable milestones for {goal}"),
            Some("Define clear success criteria and tracking methods".to_string()),
        ),
        TaskDraft::new(
            format!("Identify resources needed for {goal}"),
            Some("List tools, time, budget, and people required".to_string()),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{SuggestionProvider, TemplateSuggester, expand_goal};

    #[test]
    fn every_template_mentions_the_goal() {
        let drafts = expand_goal("learn guitar");
        assert_eq!(drafts.len(), 4);
        for draft in &drafts {
            assert!(draft.title.contains("learn guitar"), "{}", draft.title);
            assert!(draft.notes.is_some());
        }
        assert_eq!(drafts, expand_goal("learn guitar"));
    }

    #[tokio::test]
    async fn provider_returns_the_templates() {
        let provider = TemplateSuggester::new(Duration::ZERO);
        let drafts = provider.suggest("run a marathon").await.unwrap();
        assert_eq!(drafts, expand_goal("run a marathon").to_vec());
    }
}
