use std::collections::HashMap;

/// Documents seen during one discovery run, with the depth each was first seen at
///
/// Marking is a single check-and-set so a document can never be processed twice, whatever
/// number of folders or links lead to it.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    depths: HashMap<String, u32>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as visited at `depth`
    ///
    /// # Returns
    ///
    /// * `true` - The id was unvisited and is now marked
    /// * `false` - The id was already visited; its recorded depth is unchanged
    pub fn try_visit(&mut self, id: &str, depth: u32) -> bool {
        if self.depths.contains_key(id) {
            return false;
        }
        self.depths.insert(id.to_string(), depth);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.depths.contains_key(id)
    }

    /// Returns the depth `id` was first visited at
    pub fn depth_of(&self, id: &str) -> Option<u32> {
        self.depths.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}
