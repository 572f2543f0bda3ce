//! Boundary classification capability contract.
//!
//! The model that judges "same topic or topic shift" lives outside this
//! core. `KeywordOverlapClassifier` is the built-in fallback used when no
//! model is wired: crude keyword overlap, but it keeps local runs and
//! tests self-contained.

use std::collections::HashSet;

use async_trait::async_trait;

use continuity_types::{Conversation, Message};

use crate::error::EngineError;

/// Metadata of the active conversation handed to the classifier.
#[derive(Debug, Clone, Default)]
pub struct ConversationSnapshot {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
}

impl From<&Conversation> for ConversationSnapshot {
    fn from(conversation: &Conversation) -> Self {
        Self {
            title: conversation.title.clone(),
            tags: conversation.tags.clone(),
            summary: conversation.summary.clone(),
        }
    }
}

/// Classifier judgment over a message window.
#[derive(Debug, Clone)]
pub struct BoundaryVerdict {
    /// Whether the window continues the active conversation's topic
    pub same_topic: bool,
    /// Replacement tags for the closing conversation, when shifted
    pub new_tags: Option<Vec<String>>,
    /// Title suggestion for a conversation that never got one
    pub suggested_title: Option<String>,
}

impl BoundaryVerdict {
    /// Verdict that extends the active conversation.
    pub fn same_topic() -> Self {
        Self {
            same_topic: true,
            new_tags: None,
            suggested_title: None,
        }
    }

    /// Verdict that splits the conversation.
    pub fn topic_shift() -> Self {
        Self {
            same_topic: false,
            new_tags: None,
            suggested_title: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.new_tags = Some(tags);
        self
    }

    pub fn with_suggested_title(mut self, title: impl Into<String>) -> Self {
        self.suggested_title = Some(title.into());
        self
    }
}

/// External same-topic-vs-topic-shift judgment.
#[async_trait]
pub trait BoundaryClassifier: Send + Sync {
    /// Classify the recent message window against the active conversation.
    async fn classify(
        &self,
        window: &[Message],
        active: &ConversationSnapshot,
    ) -> Result<BoundaryVerdict, EngineError>;
}

/// Keyword-overlap fallback classifier.
///
/// Tokenizes the newest user message and compares it against the active
/// conversation's title, tags, and summary. Any shared token reads as the
/// same topic; a conversation with no metadata yet cannot be judged and
/// also reads as the same topic.
pub struct KeywordOverlapClassifier;

/// Words too common to signal topic identity.
const STOPWORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "have", "what", "about", "your", "from", "just", "for",
    "you", "was", "are", "can", "how", "its", "then",
];

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(String::from)
        .collect()
}

#[async_trait]
impl BoundaryClassifier for KeywordOverlapClassifier {
    async fn classify(
        &self,
        window: &[Message],
        active: &ConversationSnapshot,
    ) -> Result<BoundaryVerdict, EngineError> {
        let Some(newest_user) = window.iter().rev().find(|m| m.is_user()) else {
            // Nothing user-authored to judge; keep extending.
            return Ok(BoundaryVerdict::same_topic());
        };

        let mut active_text = active.tags.join(" ");
        if let Some(title) = &active.title {
            active_text.push(' ');
            active_text.push_str(title);
        }
        if let Some(summary) = &active.summary {
            active_text.push(' ');
            active_text.push_str(summary);
        }

        let active_tokens = tokenize(&active_text);
        if active_tokens.is_empty() {
            return Ok(BoundaryVerdict::same_topic());
        }

        let message_tokens = tokenize(&newest_user.text);
        if message_tokens.iter().any(|t| active_tokens.contains(t)) {
            return Ok(BoundaryVerdict::same_topic());
        }

        let mut tags: Vec<String> = message_tokens.into_iter().collect();
        tags.sort_by_key(|t| std::cmp::Reverse(t.len()));
        tags.truncate(3);

        let title: String = newest_user
            .text
            .split_whitespace()
            .take(5)
            .collect::<Vec<_>>()
            .join(" ");

        let mut verdict = BoundaryVerdict::topic_shift();
        if !tags.is_empty() {
            verdict = verdict.with_tags(tags);
        }
        if !title.is_empty() {
            verdict = verdict.with_suggested_title(title);
        }
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use continuity_types::MessageRole;

    fn message(seq: u64, role: MessageRole, text: &str) -> Message {
        Message::new(
            ulid::Ulid::new().to_string(),
            "s1".to_string(),
            "t1".to_string(),
            seq,
            role,
            text.to_string(),
            Utc::now(),
        )
    }

    fn snapshot(tags: &[&str]) -> ConversationSnapshot {
        ConversationSnapshot {
            title: None,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            summary: None,
        }
    }

    #[tokio::test]
    async fn test_shared_keyword_reads_as_same_topic() {
        let window = vec![
            message(1, MessageRole::User, "My billing invoice looks wrong"),
            message(2, MessageRole::Assistant, "Let me check that."),
        ];
        let verdict = KeywordOverlapClassifier
            .classify(&window, &snapshot(&["billing"]))
            .await
            .unwrap();
        assert!(verdict.same_topic);
    }

    #[tokio::test]
    async fn test_disjoint_keywords_read_as_shift() {
        let window = vec![
            message(1, MessageRole::User, "Tell me something fun to cook tonight"),
            message(2, MessageRole::Assistant, "How about pasta?"),
        ];
        let verdict = KeywordOverlapClassifier
            .classify(&window, &snapshot(&["billing", "invoices"]))
            .await
            .unwrap();
        assert!(!verdict.same_topic);
        assert!(verdict.new_tags.is_some());
        assert!(verdict.suggested_title.is_some());
    }

    #[tokio::test]
    async fn test_no_metadata_cannot_judge() {
        let window = vec![
            message(1, MessageRole::User, "Anything at all"),
            message(2, MessageRole::Assistant, "Sure."),
        ];
        let verdict = KeywordOverlapClassifier
            .classify(&window, &ConversationSnapshot::default())
            .await
            .unwrap();
        assert!(verdict.same_topic);
    }

    #[tokio::test]
    async fn test_no_user_message_keeps_extending() {
        let window = vec![
            message(1, MessageRole::Assistant, "status update one"),
            message(2, MessageRole::Assistant, "status update two"),
        ];
        let verdict = KeywordOverlapClassifier
            .classify(&window, &snapshot(&["deploys"]))
            .await
            .unwrap();
        assert!(verdict.same_topic);
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_words() {
        let tokens = tokenize("The cat and the hat on a mat");
        assert!(tokens.contains("cat"));
        assert!(tokens.contains("hat"));
        assert!(tokens.contains("mat"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("on"));
    }
}
