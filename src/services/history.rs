use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::ChatEntry;

/// Storage for past query/response pairs shown on the chat page.
pub trait ChatHistoryStore: Send + Sync {
    fn append(&self, entry: ChatEntry);

    /// Entries in insertion order, oldest first.
    fn list(&self) -> Vec<ChatEntry>;
}

/// Process-lifetime history. Lost on restart.
#[derive(Default)]
pub struct InMemoryHistory {
    entries: Mutex<VecDeque<ChatEntry>>,
    limit: Option<usize>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries, dropping the oldest first.
    pub fn bounded(limit: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            limit: Some(limit),
        }
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(limit) => Self::bounded(limit),
            None => Self::new(),
        }
    }
}

impl ChatHistoryStore for InMemoryHistory {
    fn append(&self, entry: ChatEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push_back(entry);

        if let Some(limit) = self.limit {
            while entries.len() > limit {
                entries.pop_front();
            }
        }
        log::debug!("📝 Chat history now holds {} entries", entries.len());
    }

    fn list(&self) -> Vec<ChatEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryResponse;

    fn entry(query: &str) -> ChatEntry {
        ChatEntry::new(
            query,
            &QueryResponse {
                explanation: format!("explanation for {}", query),
                medications: format!("medications for {}", query),
            },
        )
    }

    #[test]
    fn test_append_and_list_in_order() {
        let history = InMemoryHistory::new();
        history.append(entry("first"));
        history.append(entry("second"));

        let queries: Vec<_> = history.list().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["first", "second"]);
    }

    #[test]
    fn test_unbounded_by_default() {
        let history = InMemoryHistory::new();
        for i in 0..500 {
            history.append(entry(&i.to_string()));
        }
        assert_eq!(history.list().len(), 500);
    }

    #[test]
    fn test_bounded_drops_oldest() {
        let history = InMemoryHistory::bounded(2);
        history.append(entry("a"));
        history.append(entry("b"));
        history.append(entry("c"));

        let queries: Vec<_> = history.list().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["b", "c"]);
    }
}
