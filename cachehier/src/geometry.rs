use crate::config::CacheKindConfig;
use crate::error::{Error, Result};

/// The shape of a cache, and the split of a 64 bit address into tag, set index, and offset
///
/// Only constructed through [`Geometry::calculate`], which rejects sizes that would make the
/// shift/mask split meaningless, so every `Geometry` satisfies
/// `tag_bits + index_bits + offset_bits == 64` and has at least one set
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Geometry {
    kind: CacheKindConfig,
    num_sets: u64,
    lines_per_set: u64,
    line_size: u64,
    offset_bits: u32,
    index_bits: u32,
    tag_bits: u32,
}

impl Geometry {
    /// Derives the geometry of a cache from its declared size, line size, and kind
    ///
    /// # Arguments
    ///
    /// * `name`: The name of the cache, only used for error reporting
    /// * `size`: Total capacity in bytes, must be a power of two
    /// * `line_size`: Bytes per cache line, must be a power of two
    /// * `kind`: The associativity of the cache
    ///
    /// returns: Result<Geometry, Error>
    pub fn calculate(name: &str, size: u64, line_size: u64, kind: CacheKindConfig) -> Result<Self> {
        if size == 0 || line_size == 0 {
            return Err(Error::geometry(name, "size and line size must be positive"));
        }
        if !size.is_power_of_two() {
            return Err(Error::geometry(
                name,
                format!("size {size} is not a power of two"),
            ));
        }
        if !line_size.is_power_of_two() {
            return Err(Error::geometry(
                name,
                format!("line size {line_size} is not a power of two"),
            ));
        }
        let ways = kind.ways().unwrap_or(1);
        let set_bytes = line_size
            .checked_mul(ways)
            .ok_or_else(|| Error::geometry(name, "line size times associativity overflows"))?;
        if size % set_bytes != 0 {
            return Err(Error::geometry(
                name,
                format!("size {size} is not a multiple of {set_bytes} (line size {line_size} x {ways} ways)"),
            ));
        }
        let num_lines = size / line_size;
        let num_sets = match kind.ways() {
            None => 1,
            Some(ways) => num_lines / ways,
        };
        // Sizes and associativities are all powers of two, so trailing zeros is the exact log2
        debug_assert!(num_sets.is_power_of_two());
        let offset_bits = line_size.trailing_zeros();
        let index_bits = num_sets.trailing_zeros();
        let geometry = Self {
            kind,
            num_sets,
            lines_per_set: num_lines / num_sets,
            line_size,
            offset_bits,
            index_bits,
            tag_bits: u64::BITS - index_bits - offset_bits,
        };
        debug_assert_eq!(geometry.num_sets * geometry.lines_per_set * line_size, size);
        Ok(geometry)
    }

    pub fn kind(&self) -> CacheKindConfig {
        self.kind
    }

    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }

    pub fn lines_per_set(&self) -> u64 {
        self.lines_per_set
    }

    pub fn line_size(&self) -> u64 {
        self.line_size
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    /// Total number of lines in the cache
    pub fn num_lines(&self) -> u64 {
        self.num_sets * self.lines_per_set
    }

    #[inline]
    pub fn tag(&self, address: u64) -> u64 {
        // index + offset bits never exceed 63 as the size fits in a u64
        address >> (self.index_bits + self.offset_bits)
    }

    #[inline]
    pub fn set_index(&self, address: u64) -> u64 {
        (address >> self.offset_bits) & (self.num_sets - 1)
    }

    /// Recombines a tag and a set index into the line aligned address they were taken from
    pub fn line_base(&self, tag: u64, set_index: u64) -> u64 {
        (tag << (self.index_bits + self.offset_bits)) | (set_index << self.offset_bits)
    }

    /// Clears the offset bits of an address
    #[inline]
    pub fn align(&self, address: u64) -> u64 {
        address & !(self.line_size - 1)
    }
}
