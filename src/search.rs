//! Full-text search over saved conversations.
//!
//! Queries are split on whitespace and matched case-insensitively against
//! message content. Each matching message is one [`SearchHit`]; hits are
//! ranked by how many term occurrences they contain.

use crate::types::{Conversation, MessageRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Only search messages with one of these roles; empty means all.
    pub roles: Vec<MessageRole>,
    /// Every term must occur in a message for it to match.
    pub require_all: bool,
    pub limit: usize,
    /// Characters of context on each side of the first match.
    pub snippet_radius: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            roles: Vec::new(),
            require_all: false,
            limit: 20,
            snippet_radius: 40,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: MessageRole) -> Self {
        self.roles.push(role);
        self
    }

    pub fn require_all(mut self, yes: bool) -> Self {
        self.require_all = yes;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub conversation_id: String,
    pub conversation_title: String,
    pub message_index: usize,
    pub role: MessageRole,
    /// Total term occurrences in the message.
    pub hits: usize,
    pub snippet: String,
}

pub fn search(
    conversations: &[Conversation],
    query: &str,
    options: &SearchOptions,
) -> Vec<SearchHit> {
    let terms: Vec<Vec<char>> = query
        .split_whitespace()
        .map(|t| t.chars().map(fold).collect())
        .collect();
    if terms.is_empty() || options.limit == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(&Conversation, SearchHit)> = Vec::new();
    for conv in conversations {
        for (index, msg) in conv.messages.iter().enumerate() {
            if !options.roles.is_empty() && !options.roles.contains(&msg.role) {
                continue;
            }
            let original: Vec<char> = msg.content.chars().collect();
            let folded: Vec<char> = original.iter().copied().map(fold).collect();

            let mut hits = 0;
            let mut matched_terms = 0;
            let mut first: Option<(usize, usize)> = None;
            for term in &terms {
                let positions = occurrences(&folded, term);
                if let Some(&p) = positions.first() {
                    matched_terms += 1;
                    if first.map_or(true, |(fp, _)| p < fp) {
                        first = Some((p, term.len()));
                    }
                }
                hits += positions.len();
            }
            let matched = if options.require_all {
                matched_terms == terms.len()
            } else {
                hits > 0
            };
            let Some((pos, len)) = first.filter(|_| matched) else {
                continue;
            };

            ranked.push((
                conv,
                SearchHit {
                    conversation_id: conv.id.clone(),
                    conversation_title: conv.title.clone(),
                    message_index: index,
                    role: msg.role,
                    hits,
                    snippet: snippet(&original, pos, len, options.snippet_radius),
                },
            ));
        }
    }

    ranked.sort_by(|(ca, a), (cb, b)| {
        b.hits
            .cmp(&a.hits)
            .then_with(|| cb.created_at.cmp(&ca.created_at))
            .then_with(|| a.message_index.cmp(&b.message_index))
    });
    ranked
        .into_iter()
        .take(options.limit)
        .map(|(_, hit)| hit)
        .collect()
}

/// One char per char, so folded and original text share indices.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| *w == needle)
        .map(|(i, _)| i)
        .collect()
}

fn snippet(text: &[char], pos: usize, len: usize, radius: usize) -> String {
    let start = pos.saturating_sub(radius);
    let end = (pos + len + radius).min(text.len());
    let body: String = text[start..end]
        .iter()
        .map(|c| if c.is_whitespace() { ' ' } else { *c })
        .collect();
    let mut out = String::new();
    if start > 0 {
        out.push('…');
    }
    out.push_str(body.trim());
    if end < text.len() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn sample() -> Vec<Conversation> {
        vec![
            Conversation::new("Rust").with_messages(vec![
                Message::user("How do I use tokio select?"),
                Message::assistant("Use tokio::select! to race futures. Tokio polls each branch."),
            ]),
            Conversation::new("Weather").with_messages(vec![Message::user("Weather in Oslo")]),
        ]
    }

    #[test]
    fn test_ranked_by_hits() {
        let hits = search(&sample(), "TOKIO", &SearchOptions::new());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].role, MessageRole::Assistant);
        assert_eq!(hits[0].hits, 2);
        assert_eq!(hits[1].hits, 1);
    }

    #[test]
    fn test_role_filter_and_limit() {
        let opts = SearchOptions::new().role(MessageRole::User);
        let hits = search(&sample(), "tokio oslo", &opts);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.role == MessageRole::User));
        assert_eq!(search(&sample(), "tokio oslo", &opts.limit(1)).len(), 1);
    }

    #[test]
    fn test_require_all_terms() {
        let opts = SearchOptions::new().require_all(true);
        let hits = search(&sample(), "tokio race", &opts);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].message_index, 1);
        assert!(search(&sample(), "", &opts).is_empty());
    }

    #[test]
    fn test_snippet_window() {
        let long = format!("{} needle {}", "a".repeat(100), "b".repeat(100));
        let conv = vec![Conversation::new("t").with_messages(vec![Message::user(long)])];
        let opts = SearchOptions {
            snippet_radius: 5,
            ..Default::default()
        };
        let hit = &search(&conv, "Needle", &opts)[0];
        assert_eq!(hit.snippet, "…aaaa needle bbbb…");
    }
}
