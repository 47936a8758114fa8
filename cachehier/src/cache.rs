use crate::config::{CacheConfig, CacheKindConfig, ReplacementPolicyConfig};
use crate::error::Error;
use crate::geometry::Geometry;
use crate::line::{CacheLine, LineStore};
use crate::lookup::TagLookup;
use crate::replacement_policies::{
    LeastFrequentlyUsed, LeastRecentlyUsed, NoPolicy, ReplacementPolicy, RoundRobin,
};

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch to speed things up instead of dyn Cache,
/// but this gives flexibility for the future with no overhead
///
/// The trait assumes that ensuring reads spanning multiple cache lines are split properly is the
/// responsibility of the caller
pub trait CacheTrait {
    /// Probes the line holding an address, returning true on a cache hit, and false otherwise
    ///
    /// On a miss the line is installed, evicting another line of its set if the set is full. On
    /// both hits and misses the hit/miss counters, line metadata and replacement policy are
    /// updated. This is the only operation which mutates a cache.
    ///
    /// # Arguments
    ///
    /// * `address`: Any address within the line. Note this is for the line at that address, hence
    /// no size argument
    /// * `timer`: The logical time of the access
    ///
    /// returns: bool
    fn probe_or_install(&mut self, address: u64, timer: u64) -> bool;

    fn name(&self) -> &str;

    fn geometry(&self) -> &Geometry;

    fn hits(&self) -> u64;

    fn misses(&self) -> u64;

    /// Every line of the cache, sets laid out contiguously
    fn lines(&self) -> &[CacheLine];

    /// Converts an address into a set index and a tag
    ///
    /// returns: (u64, u64)
    #[inline]
    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64) {
        let geometry = self.geometry();
        (geometry.set_index(address), geometry.tag(address))
    }

    /// Gets the line size used by this cache
    fn get_line_size(&self) -> u64 {
        self.geometry().line_size()
    }

    /// Gets the number of cache lines which were never filled. Useful for analysing cache
    /// performance or debugging
    fn get_uninitialised_line_count(&self) -> usize {
        self.lines().iter().filter(|line| !line.valid).count()
    }
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// The general approach here is to have one solid implementation which is easy to maintain and
/// expand with more replacement policies without compromising too much on performance
///
/// To facilitate this we rely on Rust's monomorphisation and the inlining of the replacement policy
/// functions to provide performance, which should be close to on par with writing specialised
/// implementations for each cache type
pub struct Cache<R: ReplacementPolicy> {
    name: String,
    geometry: Geometry,
    store: LineStore,
    lookup: TagLookup,
    replacement_policy: R,
    hits: u64,
    misses: u64,
}

impl<R: ReplacementPolicy> Cache<R> {
    /// Creates an empty cache. Fully associative caches get a hash map tag lookup, everything else
    /// scans its sets
    pub fn new(name: impl Into<String>, geometry: Geometry, policy: R) -> Self {
        let lookup = match geometry.kind() {
            CacheKindConfig::Full => TagLookup::hash_map(geometry.num_lines() as usize),
            _ => TagLookup::LinearScan,
        };
        Self {
            name: name.into(),
            store: LineStore::new(geometry.num_sets() as usize, geometry.lines_per_set() as usize),
            geometry,
            lookup,
            replacement_policy: policy,
            hits: 0,
            misses: 0,
        }
    }

    pub fn replacement_policy(&self) -> &R {
        &self.replacement_policy
    }

    pub fn lookup(&self) -> &TagLookup {
        &self.lookup
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn probe_or_install(&mut self, address: u64, timer: u64) -> bool {
        let (set, tag) = self.address_to_set_and_tag(address);
        let set = set as usize;

        if let Some(way) = self.lookup.find(self.store.set(set), tag) {
            self.hits += 1;
            let lines = self.store.set_mut(set);
            lines[way].last_access = timer;
            lines[way].access_count += 1;
            self.replacement_policy.update_on_hit(set, way, lines);
            log::trace!("{}: hit {address:#x} in set {set} way {way}", self.name);
            return true;
        }

        self.misses += 1;
        // Empty lines are always used before asking the policy for a victim
        let way = match self.store.first_invalid(set) {
            Some(way) => way,
            None => self.replacement_policy.select_victim(set, self.store.set(set)),
        };
        let lines = self.store.set_mut(set);
        let evicted = lines[way].valid.then_some(lines[way].tag);
        lines[way] = CacheLine {
            tag,
            valid: true,
            last_access: timer,
            access_count: 1,
        };
        self.lookup.replace(evicted, tag, way);
        self.replacement_policy.update_on_install(set, way, lines);
        log::trace!("{}: miss {address:#x}, installed in set {set} way {way}", self.name);
        false
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn hits(&self) -> u64 {
        self.hits
    }

    fn misses(&self) -> u64 {
        self.misses
    }

    fn lines(&self) -> &[CacheLine] {
        self.store.lines()
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.store.invalid_count()
    }
}

/// Enum for every replacement policy provided by the library
///
/// Using trait objects in Rust reduces boilerplate, but it is surprisingly slow, as this is
/// completely opaque to the compiler
///
/// For most cases this isn't an issue, but for our use case we would be de-referencing for each
/// line in the input file, which imposes significant overhead
///
/// It's much faster to explicitly branch on all implementations, as the compiler can reason about
/// the concrete types, perform function inlining etc
pub enum GenericCache {
    RoundRobin(Cache<RoundRobin>),
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    LeastFrequentlyUsed(Cache<LeastFrequentlyUsed>),
    NoPolicy(Cache<NoPolicy>),
}

impl From<Cache<RoundRobin>> for GenericCache {
    fn from(value: Cache<RoundRobin>) -> Self {
        Self::RoundRobin(value)
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<LeastFrequentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastFrequentlyUsed>) -> Self {
        Self::LeastFrequentlyUsed(value)
    }
}

impl From<Cache<NoPolicy>> for GenericCache {
    fn from(value: Cache<NoPolicy>) -> Self {
        Self::NoPolicy(value)
    }
}

impl TryFrom<&CacheConfig> for GenericCache {
    type Error = Error;

    /// Validates the configuration and creates an empty cache with the configured policy
    ///
    /// Direct mapped caches have a single line per set, so they ignore the declared policy
    fn try_from(config: &CacheConfig) -> Result<Self, Self::Error> {
        let geometry = config.geometry()?;
        log::debug!(
            "{}: {} sets x {} lines of {} bytes, tag/index/offset bits {}/{}/{}, {:?}",
            config.name,
            geometry.num_sets(),
            geometry.lines_per_set(),
            geometry.line_size(),
            geometry.tag_bits(),
            geometry.index_bits(),
            geometry.offset_bits(),
            config.replacement_policy,
        );
        let name = config.name.clone();
        let num_sets = geometry.num_sets() as usize;
        let lines_per_set = geometry.lines_per_set() as usize;
        if geometry.kind() == CacheKindConfig::Direct {
            return Ok(Cache::new(name, geometry, NoPolicy).into());
        }
        Ok(match config.replacement_policy {
            ReplacementPolicyConfig::RoundRobin => {
                Cache::new(name, geometry, RoundRobin::new(num_sets)).into()
            }
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                Cache::new(name, geometry, LeastRecentlyUsed::new(num_sets, lines_per_set)).into()
            }
            ReplacementPolicyConfig::LeastFrequentlyUsed => {
                Cache::new(name, geometry, LeastFrequentlyUsed::new(num_sets, lines_per_set))
                    .into()
            }
        })
    }
}

impl CacheTrait for GenericCache {
    #[inline]
    fn probe_or_install(&mut self, address: u64, timer: u64) -> bool {
        match self {
            GenericCache::RoundRobin(c) => c.probe_or_install(address, timer),
            GenericCache::LeastRecentlyUsed(c) => c.probe_or_install(address, timer),
            GenericCache::LeastFrequentlyUsed(c) => c.probe_or_install(address, timer),
            GenericCache::NoPolicy(c) => c.probe_or_install(address, timer),
        }
    }

    fn name(&self) -> &str {
        match self {
            GenericCache::RoundRobin(c) => c.name(),
            GenericCache::LeastRecentlyUsed(c) => c.name(),
            GenericCache::LeastFrequentlyUsed(c) => c.name(),
            GenericCache::NoPolicy(c) => c.name(),
        }
    }

    fn geometry(&self) -> &Geometry {
        match self {
            GenericCache::RoundRobin(c) => c.geometry(),
            GenericCache::LeastRecentlyUsed(c) => c.geometry(),
            GenericCache::LeastFrequentlyUsed(c) => c.geometry(),
            GenericCache::NoPolicy(c) => c.geometry(),
        }
    }

    fn hits(&self) -> u64 {
        match self {
            GenericCache::RoundRobin(c) => c.hits(),
            GenericCache::LeastRecentlyUsed(c) => c.hits(),
            GenericCache::LeastFrequentlyUsed(c) => c.hits(),
            GenericCache::NoPolicy(c) => c.hits(),
        }
    }

    fn misses(&self) -> u64 {
        match self {
            GenericCache::RoundRobin(c) => c.misses(),
            GenericCache::LeastRecentlyUsed(c) => c.misses(),
            GenericCache::LeastFrequentlyUsed(c) => c.misses(),
            GenericCache::NoPolicy(c) => c.misses(),
        }
    }

    fn lines(&self) -> &[CacheLine] {
        match self {
            GenericCache::RoundRobin(c) => c.lines(),
            GenericCache::LeastRecentlyUsed(c) => c.lines(),
            GenericCache::LeastFrequentlyUsed(c) => c.lines(),
            GenericCache::NoPolicy(c) => c.lines(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::RoundRobin(c) => c.get_uninitialised_line_count(),
            GenericCache::LeastRecentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::LeastFrequentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::NoPolicy(c) => c.get_uninitialised_line_count(),
        }
    }
}
