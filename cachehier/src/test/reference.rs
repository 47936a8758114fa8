//! Checks every cache against a straightforward model which scans its sets for victims, using the
//! line timestamps and counts directly

use super::build;
use crate::cache::CacheTrait;
use crate::config::{CacheKindConfig, ReplacementPolicyConfig};
use crate::geometry::Geometry;
use crate::util::synthetic_events;

#[derive(Clone, Copy, Default)]
struct Slot {
    tag: u64,
    valid: bool,
    stamp: u64,
    count: u64,
}

struct ScanningCache {
    geometry: Geometry,
    policy: ReplacementPolicyConfig,
    sets: Vec<Vec<Slot>>,
    round_robin: Vec<usize>,
    clock: u64,
}

impl ScanningCache {
    fn new(geometry: Geometry, kind: CacheKindConfig, policy: ReplacementPolicyConfig) -> Self {
        let policy = if kind == CacheKindConfig::Direct {
            ReplacementPolicyConfig::RoundRobin
        } else {
            policy
        };
        Self {
            geometry,
            policy,
            sets: vec![vec![Slot::default(); geometry.lines_per_set() as usize]; geometry.num_sets() as usize],
            round_robin: vec![0; geometry.num_sets() as usize],
            clock: 0,
        }
    }

    fn probe(&mut self, address: u64) -> bool {
        // Strictly increasing per probe, so LRU never ties
        self.clock += 1;
        let set_index = self.geometry.set_index(address) as usize;
        let tag = self.geometry.tag(address);
        let set = &mut self.sets[set_index];
        if let Some(slot) = set.iter_mut().find(|slot| slot.valid && slot.tag == tag) {
            slot.stamp = self.clock;
            slot.count += 1;
            return true;
        }
        let way = match set.iter().position(|slot| !slot.valid) {
            Some(way) => way,
            None => match self.policy {
                ReplacementPolicyConfig::RoundRobin => {
                    let victim = self.round_robin[set_index];
                    self.round_robin[set_index] = (victim + 1) % set.len();
                    victim
                }
                ReplacementPolicyConfig::LeastRecentlyUsed => (0..set.len())
                    .min_by_key(|&way| set[way].stamp)
                    .unwrap(),
                ReplacementPolicyConfig::LeastFrequentlyUsed => (0..set.len())
                    .min_by_key(|&way| (set[way].count, way))
                    .unwrap(),
            },
        };
        set[way] = Slot {
            tag,
            valid: true,
            stamp: self.clock,
            count: 1,
        };
        false
    }
}

#[test]
fn matches_a_scanning_model_for_every_kind_and_policy() {
    let kinds = [
        CacheKindConfig::Direct,
        CacheKindConfig::Full,
        CacheKindConfig::TwoWay,
        CacheKindConfig::FourWay,
        CacheKindConfig::EightWay,
    ];
    let policies = [
        ReplacementPolicyConfig::RoundRobin,
        ReplacementPolicyConfig::LeastRecentlyUsed,
        ReplacementPolicyConfig::LeastFrequentlyUsed,
    ];
    let events = synthetic_events(20_000, 8 * 1024, 0x5eed);
    for kind in kinds {
        for policy in policies {
            let mut cache = build(2048, 32, kind, policy);
            let mut model = ScanningCache::new(*cache.geometry(), kind, policy);
            for (timer, event) in events.iter().enumerate() {
                let line = cache.geometry().align(event.address);
                let expected = model.probe(line);
                assert_eq!(
                    cache.probe_or_install(line, timer as u64),
                    expected,
                    "{kind:?} {policy:?} diverged at access {timer}"
                );
            }
            assert!(cache.hits() > 0 && cache.misses() > 0, "{kind:?} {policy:?}");
        }
    }
}
