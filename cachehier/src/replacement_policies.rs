use crate::line::CacheLine;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// All indices handed to a policy are relative to a set: `way` is the position of a line within
/// its set, and `lines` is the slice holding only that set. Policies keep their own per-set state
/// in flat arrays indexed by `set * lines_per_set + way`, never references into the line store.
pub trait ReplacementPolicy {
    /// Updates the policy after a hit on a line. The line's access count has already been
    /// incremented when this is called
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn update_on_hit(&mut self, _set: usize, _way: usize, _lines: &[CacheLine]) {}

    /// Updates the policy after a new tag was written into a line, whether the line was empty or
    /// had just been chosen by [`ReplacementPolicy::select_victim`]
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn update_on_install(&mut self, _set: usize, _way: usize, _lines: &[CacheLine]) {}

    /// Chooses which line of a full set gets evicted
    ///
    /// Only called when every line in the set is valid; the cache fills invalid lines first
    ///
    /// # Arguments
    ///
    /// * `set`: The cache set
    /// * `lines`: The lines of that set
    ///
    /// returns: usize, the way to evict
    fn select_victim(&mut self, set: usize, lines: &[CacheLine]) -> usize;
}

#[derive(Debug, Default)]
/// NoPolicy is used for direct mapped caches. Each set has a single line, so the victim is always
/// the first way
///
/// As the generic cache implementation is monomorphised, the compiler can completely optimise this
/// away, removing the need for a separate implementation
pub struct NoPolicy;

impl ReplacementPolicy for NoPolicy {
    #[inline]
    fn select_victim(&mut self, _set: usize, _lines: &[CacheLine]) -> usize {
        0
    }
}

/// Standard round robin replacement policy, which keeps separate indices for each set
///
/// The index only advances on eviction, filling empty lines leaves it untouched
#[derive(Debug)]
pub struct RoundRobin {
    set_indices: Vec<usize>,
}

impl RoundRobin {
    pub fn new(num_sets: usize) -> Self {
        Self {
            set_indices: vec![0; num_sets],
        }
    }
}

impl ReplacementPolicy for RoundRobin {
    fn select_victim(&mut self, set: usize, lines: &[CacheLine]) -> usize {
        let set_index = &mut self.set_indices[set];
        let victim = *set_index;
        *set_index = (victim + 1) % lines.len();
        victim
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Link {
    prev: Option<u32>,
    next: Option<u32>,
}

/// Least Recently Used replacement policy
///
/// Each set keeps a doubly linked recency list threaded through an array of links, with the most
/// recently used way at the head and the victim at the tail. Touching a line relinks it at the
/// head in constant time, so neither hits nor evictions scan the set
#[derive(Debug)]
pub struct LeastRecentlyUsed {
    links: Vec<Link>,
    heads: Vec<u32>,
    tails: Vec<u32>,
    lines_per_set: usize,
}

impl LeastRecentlyUsed {
    /// Creates the recency lists with every set pre-linked in way order, way 0 at the head
    pub fn new(num_sets: usize, lines_per_set: usize) -> Self {
        let last = lines_per_set as u32 - 1;
        let links = (0..num_sets)
            .flat_map(|_| {
                (0..lines_per_set as u32).map(move |way| Link {
                    prev: way.checked_sub(1),
                    next: (way < last).then_some(way + 1),
                })
            })
            .collect();
        Self {
            links,
            heads: vec![0; num_sets],
            tails: vec![last; num_sets],
            lines_per_set,
        }
    }

    /// Ways of a set from most to least recently used
    pub fn recency_order(&self, set: usize) -> Vec<usize> {
        let base = set * self.lines_per_set;
        let mut order = Vec::with_capacity(self.lines_per_set);
        let mut cursor = Some(self.heads[set]);
        while let Some(way) = cursor {
            order.push(way as usize);
            cursor = self.links[base + way as usize].next;
        }
        order
    }

    fn move_to_head(&mut self, set: usize, way: usize) {
        let way = way as u32;
        let head = self.heads[set];
        if head == way {
            return;
        }
        let links = &mut self.links[set * self.lines_per_set..(set + 1) * self.lines_per_set];
        let Link { prev, next } = links[way as usize];
        if let Some(prev) = prev {
            links[prev as usize].next = next;
        }
        if let Some(next) = next {
            links[next as usize].prev = prev;
        }
        if self.tails[set] == way {
            // Not the head, so there is always a predecessor
            self.tails[set] = prev.unwrap_or(way);
        }
        links[way as usize] = Link {
            prev: None,
            next: Some(head),
        };
        links[head as usize].prev = Some(way);
        self.heads[set] = way;
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    #[inline]
    fn update_on_hit(&mut self, set: usize, way: usize, _lines: &[CacheLine]) {
        self.move_to_head(set, way);
    }

    #[inline]
    fn update_on_install(&mut self, set: usize, way: usize, _lines: &[CacheLine]) {
        self.move_to_head(set, way);
    }

    #[inline]
    fn select_victim(&mut self, set: usize, _lines: &[CacheLine]) -> usize {
        self.tails[set] as usize
    }
}

/// Least frequently used replacement policy
///
/// Each set keeps a binary min-heap of its ways, ordered by access count and then by way, with a
/// reverse map from way to heap position. The victim is always the root.
///
/// Counts only ever grow while a line is resident, so a touched line can only move away from the
/// root. Installs reset the count to 1, but they only happen at the root: either the root was the
/// victim, or it was an empty line, which has a count of 0 and the lowest way of all empty lines.
#[derive(Debug)]
pub struct LeastFrequentlyUsed {
    heaps: Vec<u32>,
    positions: Vec<u32>,
    lines_per_set: usize,
}

impl LeastFrequentlyUsed {
    /// Creates the heaps with way `i` at heap position `i` in every set
    pub fn new(num_sets: usize, lines_per_set: usize) -> Self {
        let identity: Vec<u32> = (0..num_sets)
            .flat_map(|_| 0..lines_per_set as u32)
            .collect();
        Self {
            heaps: identity.clone(),
            positions: identity,
            lines_per_set,
        }
    }

    /// The heap of a set, as ways in heap order
    pub fn heap(&self, set: usize) -> &[u32] {
        &self.heaps[set * self.lines_per_set..(set + 1) * self.lines_per_set]
    }

    fn sift_down(&mut self, set: usize, way: usize, lines: &[CacheLine]) {
        let bounds = set * self.lines_per_set..(set + 1) * self.lines_per_set;
        let heap = &mut self.heaps[bounds.clone()];
        let positions = &mut self.positions[bounds];
        let size = heap.len();
        // Lower count first, ties go to the lower way
        let precedes = |a: u32, b: u32| {
            (lines[a as usize].access_count, a) < (lines[b as usize].access_count, b)
        };

        let mut pos = positions[way] as usize;
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < size && precedes(heap[left], heap[smallest]) {
                smallest = left;
            }
            if right < size && precedes(heap[right], heap[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            heap.swap(pos, smallest);
            positions[heap[pos] as usize] = pos as u32;
            positions[heap[smallest] as usize] = smallest as u32;
            pos = smallest;
        }
    }
}

impl ReplacementPolicy for LeastFrequentlyUsed {
    #[inline]
    fn update_on_hit(&mut self, set: usize, way: usize, lines: &[CacheLine]) {
        self.sift_down(set, way, lines);
    }

    #[inline]
    fn update_on_install(&mut self, set: usize, way: usize, lines: &[CacheLine]) {
        debug_assert_eq!(self.positions[set * self.lines_per_set + way], 0);
        self.sift_down(set, way, lines);
    }

    #[inline]
    fn select_victim(&mut self, set: usize, _lines: &[CacheLine]) -> usize {
        self.heaps[set * self.lines_per_set] as usize
    }
}
