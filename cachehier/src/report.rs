use std::fmt;

use crate::error::Result;
use crate::simulator::LayeredCacheResult;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty printed JSON, in the same shape as [`LayeredCacheResult`] deserialises from
    #[default]
    Json,
    /// One block per cache followed by the main memory total
    Text,
}

/// Renders a simulation result for display
pub fn render(result: &LayeredCacheResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Text => result.to_string(),
    })
}

impl fmt::Display for LayeredCacheResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cache in &self.caches {
            writeln!(f, "[{}]", cache.name)?;
            writeln!(f, "  hits:   {}", cache.hits)?;
            writeln!(f, "  misses: {}", cache.misses)?;
        }
        write!(f, "main memory accesses: {}", self.main_memory_accesses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::CacheResult;

    fn result() -> LayeredCacheResult {
        LayeredCacheResult {
            main_memory_accesses: 3,
            caches: vec![
                CacheResult {
                    name: "L1".to_string(),
                    hits: 10,
                    misses: 5,
                },
                CacheResult {
                    name: "L2".to_string(),
                    hits: 2,
                    misses: 3,
                },
            ],
        }
    }

    #[test]
    fn text_report() {
        let text = render(&result(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "[L1]\n  hits:   10\n  misses: 5\n[L2]\n  hits:   2\n  misses: 3\nmain memory accesses: 3"
        );
    }

    #[test]
    fn json_report_keeps_field_order() {
        let json = render(&result(), OutputFormat::Json).unwrap();
        let memory = json.find("main_memory_accesses").unwrap();
        let caches = json.find("caches").unwrap();
        assert!(memory < caches);
        let parsed: LayeredCacheResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result());
    }
}
