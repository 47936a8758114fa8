mod reference;
mod tests;

use crate::cache::GenericCache;
use crate::config::{CacheConfig, CacheKindConfig, LayeredCacheConfig, ReplacementPolicyConfig};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn cache_config(
    name: &str,
    size: u64,
    line_size: u64,
    kind: CacheKindConfig,
    replacement_policy: ReplacementPolicyConfig,
) -> CacheConfig {
    CacheConfig {
        name: name.to_string(),
        size,
        line_size,
        kind,
        replacement_policy,
    }
}

pub(crate) fn build(
    size: u64,
    line_size: u64,
    kind: CacheKindConfig,
    policy: ReplacementPolicyConfig,
) -> GenericCache {
    init_logging();
    GenericCache::try_from(&cache_config("test", size, line_size, kind, policy)).unwrap()
}

pub(crate) fn layered(caches: Vec<CacheConfig>) -> LayeredCacheConfig {
    LayeredCacheConfig { caches }
}
