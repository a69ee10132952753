use super::NodeId;

/// Case-insensitive substring match. `needle` must already be lowercase.
pub fn matches(needle: &str, name: &str) -> bool {
    name.to_lowercase().contains(needle)
}

/// Selection and scroll position, saved across a filter session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub selected: Option<NodeId>,
    pub index: usize,
    pub scroll_offset: usize,
}

/// Inline name filter.
///
/// The cursor in effect when the filter turns on is kept until it turns off,
/// however many times the query changes in between.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    query: String,
    needle: String,
    saved: Option<Cursor>,
}

impl Filter {
    pub fn is_active(&self) -> bool {
        !self.needle.is_empty()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Lowercased query, `None` while inactive.
    pub fn needle(&self) -> Option<&str> {
        if self.is_active() {
            Some(&self.needle)
        } else {
            None
        }
    }

    /// Replace the query. Returns the saved cursor when this call turned the filter off.
    pub fn set_query(&mut self, query: &str, current: Cursor) -> Option<Cursor> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clear();
        }
        if !self.is_active() {
            self.saved = Some(current);
        }
        self.query = query.to_string();
        self.needle = needle;
        None
    }

    /// Turn the filter off and hand back the cursor saved when it turned on.
    pub fn clear(&mut self) -> Option<Cursor> {
        self.query.clear();
        self.needle.clear();
        self.saved.take()
    }
}
