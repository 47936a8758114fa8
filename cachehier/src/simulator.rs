use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::cache::{CacheTrait, GenericCache};
use crate::config::LayeredCacheConfig;
use crate::error::{Error, Result};
use crate::trace::{TraceEvent, TraceReader};

/// What the simulator does with a trace record it can't decode
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum MalformedRecordPolicy {
    /// Log the record, count it, and carry on with the next one
    #[default]
    Skip,
    /// Stop the simulation and return the error
    Abort,
}

/// The simulator handles line alignment when using the caches, and collects results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
///
/// Accesses are split into lines using the line size of the first cache, and the same line
/// addresses are probed at every level. Hierarchies whose levels declare different line sizes are
/// accepted, but a warning is logged on construction.
pub struct Simulator {
    caches: Vec<GenericCache>,
    offset_bits: u32,
    timer: u64,
    main_memory_accesses: u64,
    skipped_records: u64,
    malformed_records: MalformedRecordPolicy,
    result: LayeredCacheResult,
    simulation_time: Duration,
}

/// The result of a cache simulation. Can be serialised to the JSON output format
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct LayeredCacheResult {
    pub main_memory_accesses: u64,
    pub caches: Vec<CacheResult>,
}

/// The result for an individual cache. Can be serialised to the JSON output format
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, Error>, failing if there are no caches or any cache has an
    /// invalid geometry
    pub fn new(config: &LayeredCacheConfig) -> Result<Self> {
        let caches = config
            .caches
            .iter()
            .map(GenericCache::try_from)
            .collect::<Result<Vec<_>>>()?;
        let first = caches.first().ok_or(Error::EmptyHierarchy)?;
        let line_size = first.get_line_size();
        let offset_bits = first.geometry().offset_bits();
        for cache in &caches[1..] {
            if cache.get_line_size() != line_size {
                log::warn!(
                    "{} has {} byte lines but accesses are split into {} byte lines of {}",
                    cache.name(),
                    cache.get_line_size(),
                    line_size,
                    first.name(),
                );
            }
        }
        let mut simulator = Self {
            caches,
            offset_bits,
            timer: 0,
            main_memory_accesses: 0,
            skipped_records: 0,
            malformed_records: MalformedRecordPolicy::default(),
            result: LayeredCacheResult::default(),
            simulation_time: Duration::new(0, 0),
        };
        simulator.result = simulator.collect_result();
        Ok(simulator)
    }

    pub fn with_malformed_records(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_records = policy;
        self
    }

    /// Reads a value from memory, at a given address with a given size
    ///
    /// The read is split so caches are checked for each line it touches, in hierarchy order until
    /// one of them hits. Lines which miss every cache count as a main memory access. The logical
    /// clock advances once per access, however many lines it spans. A zero sized access touches
    /// no line.
    ///
    /// # Arguments
    ///
    /// * `address`: The address of the read
    /// * `size`: The size of the read in bytes
    ///
    /// returns: (), internally the counters are updated
    pub fn access(&mut self, address: u64, size: u32) {
        self.timer += 1;
        if size == 0 {
            return;
        }
        let first_line = address >> self.offset_bits;
        let last_line = address.saturating_add(size as u64 - 1) >> self.offset_bits;
        for line in first_line..=last_line {
            let line_address = line << self.offset_bits;
            let timer = self.timer;
            // any() stops at the first hit, so lower levels only see the lines that missed above
            let hit = self
                .caches
                .iter_mut()
                .any(|cache| cache.probe_or_install(line_address, timer));
            if !hit {
                self.main_memory_accesses += 1;
            }
        }
    }

    /// Replays decoded events in order
    pub fn simulate_events<I>(&mut self, events: I) -> &LayeredCacheResult
    where
        I: IntoIterator<Item = TraceEvent>,
    {
        let start = Instant::now();
        for event in events {
            self.access(event.address, event.size);
        }
        self.finish(start)
    }

    /// Simulates the caches using a textual trace held in memory
    ///
    /// See [`TraceReader`] for the format. Records which can't be decoded are handled according to
    /// the simulator's [`MalformedRecordPolicy`]
    ///
    /// # Arguments
    ///
    /// * `bytes`: The input byte array
    ///
    /// returns: Result<&LayeredCacheResult, Error>
    pub fn simulate(&mut self, bytes: &[u8]) -> Result<&LayeredCacheResult> {
        let start = Instant::now();
        for record in TraceReader::new(bytes) {
            match record {
                Ok(event) => self.access(event.address, event.size),
                Err(err) => match self.malformed_records {
                    MalformedRecordPolicy::Skip => {
                        log::warn!("skipping {err}");
                        self.skipped_records += 1;
                    }
                    MalformedRecordPolicy::Abort => {
                        self.finish(start);
                        return Err(err);
                    }
                },
            }
        }
        Ok(self.finish(start))
    }

    fn finish(&mut self, start: Instant) -> &LayeredCacheResult {
        self.simulation_time += start.elapsed();
        self.result = self.collect_result();
        log::info!(
            "simulated {} accesses in {:?}, {} main memory accesses, {} records skipped",
            self.timer,
            self.simulation_time,
            self.main_memory_accesses,
            self.skipped_records,
        );
        &self.result
    }

    fn collect_result(&self) -> LayeredCacheResult {
        LayeredCacheResult {
            main_memory_accesses: self.main_memory_accesses,
            caches: self
                .caches
                .iter()
                .map(|cache| CacheResult {
                    name: cache.name().to_string(),
                    hits: cache.hits(),
                    misses: cache.misses(),
                })
                .collect(),
        }
    }

    /// The result as of the last call to a simulate method
    pub fn result(&self) -> &LayeredCacheResult {
        &self.result
    }

    pub fn caches(&self) -> &[GenericCache] {
        &self.caches
    }

    /// Number of accesses simulated so far
    pub fn timer(&self) -> u64 {
        self.timer
    }

    pub fn main_memory_accesses(&self) -> u64 {
        self.main_memory_accesses
    }

    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of uninitialised lines for each cache
    pub fn get_uninitialised_line_counts(&self) -> Vec<u64> {
        self.caches
            .iter()
            .map(|x| x.get_uninitialised_line_count() as u64)
            .collect()
    }
}
