use anyhow::Result;

use crate::config::Config;
use crate::store::EmbeddingCache;

pub fn stats(config: &Config) -> Result<()> {
    let cache = EmbeddingCache::open(&config.cache_path())?;
    let rows = cache.stats()?;
    if rows.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }

    println!("{:<14} {:<28} {:<14} {:>7} {}", "Fingerprint", "Provider", "Version", "Phrases", "Created");
    println!("{}", "-".repeat(85));
    for row in rows {
        println!(
            "{:<14} {:<28} {:<14} {:>7} {}",
            row.fingerprint.get(..12).unwrap_or(row.fingerprint.as_str()),
            row.provider_id,
            row.version,
            row.phrase_count,
            row.created_at.unwrap_or_default()
        );
    }
    Ok(())
}

pub fn clear(config: &Config) -> Result<()> {
    let cache = EmbeddingCache::open(&config.cache_path())?;
    let removed = cache.clear()?;
    println!("Removed {} cached exemplar set(s)", removed);
    Ok(())
}
