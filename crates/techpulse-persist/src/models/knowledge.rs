use serde::{Deserialize, Serialize};

/// Read-only reference text used to ground assistant responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl KnowledgeSnippet {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Naive keyword match: any query word of four or more characters found
    /// as a case-insensitive substring of the title, body or tags counts as
    /// a match. No ranking beyond match/no-match.
    pub fn matches(&self, query: &str) -> bool {
        let title = self.title.to_lowercase();
        let content = self.content.to_lowercase();
        let tags: Vec<String> = self.tags.iter().map(|t| t.to_lowercase()).collect();

        query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() >= 4)
            .any(|w| {
                title.contains(&w) || content.contains(&w) || tags.iter().any(|t| t.contains(&w))
            })
    }
}
