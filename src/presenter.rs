use crate::navigation::{self, Direction};
use image::RgbaImage;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ThumbnailRecord {
    pub file_name: String,
    pub image: RgbaImage,
}

/// Names from `names` containing `query` (case-insensitive), sorted by name.
pub fn filter_names<'a>(names: impl IntoIterator<Item = &'a str>, query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    let mut matches: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .map(str::to_owned)
        .collect();
    matches.sort_by_cached_key(|name| (name.to_lowercase(), name.clone()));
    matches
}

/// In-memory thumbnails plus the filtered, sorted view shown in the grid and
/// the single selection cursor over that view.
///
/// Only the UI thread touches this.
#[derive(Debug, Default)]
pub struct GridPresenter {
    records: HashMap<String, ThumbnailRecord>,
    revisions: HashMap<String, u64>,
    next_revision: u64,
    query: String,
    displayed: Vec<String>,
    cursor: Option<usize>,
    scroll_request: Option<usize>,
}

impl GridPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the thumbnail for `record.file_name`.
    /// Returns `true` if an older thumbnail was replaced.
    pub fn upsert(&mut self, record: ThumbnailRecord) -> bool {
        self.next_revision += 1;
        self.revisions.insert(record.file_name.clone(), self.next_revision);
        self.records.insert(record.file_name.clone(), record).is_some()
    }

    pub fn remove(&mut self, file_name: &str) -> bool {
        self.revisions.remove(file_name);
        self.records.remove(file_name).is_some()
    }

    /// Changes every time the thumbnail for `file_name` is replaced.
    pub fn revision(&self, file_name: &str) -> Option<u64> {
        self.revisions.get(file_name).copied()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.records.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, file_name: &str) -> Option<&ThumbnailRecord> {
        self.records.get(file_name)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn displayed(&self) -> &[String] {
        &self.displayed
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.cursor.and_then(|i| self.displayed.get(i)).map(String::as_str)
    }

    /// Applies a new filter query and rebuilds the view.
    ///
    /// A blank query clears the selection; otherwise the first match is selected.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_owned();
        self.rebuild();

        if self.query.trim().is_empty() || self.displayed.is_empty() {
            self.clear_selection();
        } else {
            self.select(0);
        }
    }

    /// Rebuilds the view after the record set changed, keeping the selection on
    /// the same file when it is still shown.
    pub fn refresh(&mut self) {
        let selected = self.selected().map(str::to_owned);
        self.rebuild();

        self.cursor = match selected {
            Some(name) => self
                .displayed
                .iter()
                .position(|n| *n == name)
                .or_else(|| self.cursor.map(|i| i.min(self.displayed.len().saturating_sub(1)))),
            None => None,
        };
        if self.displayed.is_empty() {
            self.cursor = None;
        }
    }

    fn rebuild(&mut self) {
        self.displayed = filter_names(self.records.keys().map(String::as_str), &self.query);
    }

    /// Selects `index` in the displayed view and asks the grid to scroll to it.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.displayed.len() {
            return None;
        }
        self.cursor = Some(index);
        self.scroll_request = Some(index);
        self.cursor
    }

    pub fn clear_selection(&mut self) {
        self.cursor = None;
        self.scroll_request = None;
    }

    pub fn move_cursor(&mut self, direction: Direction, columns: usize) -> Option<usize> {
        let next = navigation::step(self.cursor, direction, self.displayed.len(), columns)?;
        self.select(next)
    }

    /// Index the grid should scroll into view, if any. Cleared once taken.
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }
}
