//! Bounded crawl frontier.
//!
//! Pending identifiers in discovery order. Appends skip anything already queued
//! or visited, and the queue keeps only the most recently appended `limit`
//! entries.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    entries: VecDeque<String>,
    members: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a saved entry list, dropping duplicates.
    pub fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        let mut frontier = Self::new();
        for entry in entries {
            frontier.push(entry);
        }
        frontier
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    fn push(&mut self, id: String) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.entries.push_back(id);
        true
    }

    /// Append newly discovered links in order, skipping queued and visited
    /// ones, then evict the oldest entries beyond `limit`. Returns how many
    /// links were added.
    pub fn extend<I>(&mut self, links: I, visited: &HashSet<String>, limit: usize) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for link in links {
            if visited.contains(&link) {
                continue;
            }
            if self.push(link) {
                added += 1;
            }
        }

        while self.entries.len() > limit {
            if let Some(evicted) = self.entries.pop_front() {
                self.members.remove(&evicted);
            }
        }

        added
    }

    /// Remove and return the first entry not in `visited`, marking it visited.
    ///
    /// Visited entries ahead of it are discarded along the way.
    pub fn select_next(&mut self, visited: &mut HashSet<String>) -> Option<String> {
        while let Some(id) = self.entries.pop_front() {
            self.members.remove(&id);
            if visited.insert(id.clone()) {
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extend_preserves_order_and_dedups() {
        let mut frontier = Frontier::new();
        let mut visited = HashSet::new();
        visited.insert("/wiki/X".to_string());

        let added = frontier.extend(
            ids(&["/wiki/A", "/wiki/X", "/wiki/B", "/wiki/A", "/wiki/C"]),
            &visited,
            1000,
        );
        assert_eq!(added, 3);

        let added = frontier.extend(ids(&["/wiki/B", "/wiki/D"]), &visited, 1000);
        assert_eq!(added, 1);

        let entries: Vec<_> = frontier.iter().cloned().collect();
        assert_eq!(entries, ids(&["/wiki/A", "/wiki/B", "/wiki/C", "/wiki/D"]));
    }

    #[test]
    fn test_extend_keeps_most_recent_entries() {
        let mut frontier = Frontier::new();
        let visited = HashSet::new();

        let batch: Vec<String> = (0..1500).map(|i| format!("/wiki/P{}", i)).collect();
        frontier.extend(batch, &visited, 1000);

        assert_eq!(frontier.len(), 1000);
        let entries: Vec<_> = frontier.iter().cloned().collect();
        let expected: Vec<String> = (500..1500).map(|i| format!("/wiki/P{}", i)).collect();
        assert_eq!(entries, expected);

        // Evicted entries may be discovered again.
        assert!(!frontier.contains("/wiki/P0"));
        frontier.extend(ids(&["/wiki/P0"]), &visited, 1000);
        assert_eq!(frontier.iter().last().map(String::as_str), Some("/wiki/P0"));
        assert_eq!(frontier.len(), 1000);
    }

    #[test]
    fn test_select_next_marks_visited() {
        let mut frontier = Frontier::from_entries(ids(&["/wiki/A", "/wiki/B", "/wiki/C"]));
        let mut visited = HashSet::new();
        visited.insert("/wiki/A".to_string());

        let next = frontier.select_next(&mut visited);
        assert_eq!(next.as_deref(), Some("/wiki/B"));
        assert!(visited.contains("/wiki/B"));

        let entries: Vec<_> = frontier.iter().cloned().collect();
        assert_eq!(entries, ids(&["/wiki/C"]));

        assert_eq!(frontier.select_next(&mut visited).as_deref(), Some("/wiki/C"));
        assert_eq!(frontier.select_next(&mut visited), None);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_from_entries_drops_duplicates() {
        let frontier = Frontier::from_entries(ids(&["/wiki/A", "/wiki/A", "/wiki/B"]));
        assert_eq!(frontier.len(), 2);
        assert!(frontier.contains("/wiki/B"));
    }
}
