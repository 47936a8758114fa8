use std::collections::HashMap;

use crate::line::CacheLine;

/// Finds which way of a set holds a tag
///
/// Chosen once per cache from its kind. Sets of direct and n-way caches have at most 8 lines, so a
/// linear scan is cheapest. Fully associative caches have a single set which can hold thousands
/// of lines, so they keep a map from tag to way instead, which must mirror the line store exactly.
#[derive(Debug)]
pub enum TagLookup {
    LinearScan,
    HashMap(HashMap<u64, usize>),
}

impl TagLookup {
    pub fn hash_map(capacity: usize) -> Self {
        Self::HashMap(HashMap::with_capacity(capacity))
    }

    #[inline]
    pub fn find(&self, lines: &[CacheLine], tag: u64) -> Option<usize> {
        match self {
            TagLookup::LinearScan => lines.iter().position(|line| line.valid && line.tag == tag),
            TagLookup::HashMap(ways) => ways.get(&tag).copied(),
        }
    }

    /// Records that `way` now holds `tag`, forgetting the tag it held before, if the line was valid
    #[inline]
    pub fn replace(&mut self, evicted: Option<u64>, tag: u64, way: usize) {
        if let TagLookup::HashMap(ways) = self {
            if let Some(evicted) = evicted {
                ways.remove(&evicted);
            }
            ways.insert(tag, way);
        }
    }

    /// Number of tags tracked, only meaningful for the hash map variant
    pub fn len(&self) -> Option<usize> {
        match self {
            TagLookup::LinearScan => None,
            TagLookup::HashMap(ways) => Some(ways.len()),
        }
    }
}
