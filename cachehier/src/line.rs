use std::ops::Range;

/// A single cache line slot
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u64,
    pub valid: bool,
    /// Logical time of the last hit or install
    pub last_access: u64,
    /// Accesses since the line was installed, including the install itself
    pub access_count: u64,
}

/// Flat storage for every line of a cache, with sets laid out contiguously
///
/// Slots are addressed by `(set, way)`; replacement policies only ever see the slice of a single
/// set so their indices are small, set relative integers
#[derive(Debug)]
pub struct LineStore {
    lines: Vec<CacheLine>,
    lines_per_set: usize,
}

impl LineStore {
    pub fn new(num_sets: usize, lines_per_set: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); num_sets * lines_per_set],
            lines_per_set,
        }
    }

    #[inline]
    fn bounds(&self, set: usize) -> Range<usize> {
        let lower = set * self.lines_per_set;
        lower..lower + self.lines_per_set
    }

    #[inline]
    pub fn set(&self, set: usize) -> &[CacheLine] {
        &self.lines[self.bounds(set)]
    }

    #[inline]
    pub fn set_mut(&mut self, set: usize) -> &mut [CacheLine] {
        let bounds = self.bounds(set);
        &mut self.lines[bounds]
    }

    /// Way of the first invalid line in the set, if any
    #[inline]
    pub fn first_invalid(&self, set: usize) -> Option<usize> {
        self.set(set).iter().position(|line| !line.valid)
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn invalid_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }
}
