use anyhow::{anyhow, Result};
use chrono::Utc;
use serde_json::json;

use workflow_trends::cache::{load_snapshot, CacheStore, SqliteCache, FRESHNESS_MS};
use workflow_trends::config::Config;

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let clear = match std::env::args().nth(1).as_deref() {
        None => false,
        Some("--clear") => true,
        Some(other) => return Err(anyhow!("unknown argument: {}", other)),
    };

    let mut cache = SqliteCache::new(&cfg.cache_path)?;
    cache.init()?;

    if clear {
        cache.remove(&cfg.cache_key)?;
        println!("{}", json!({ "key": cfg.cache_key, "cleared": true }));
        return Ok(());
    }

    let now = Utc::now();
    let payload = match load_snapshot(&cache, &cfg.cache_key)? {
        Some(snap) => json!({
            "key": cfg.cache_key,
            "present": true,
            "captured_at": snap.captured_at,
            "age_ms": snap.age(now).num_milliseconds(),
            "fresh": snap.is_fresh(now),
            "freshness_ms": FRESHNESS_MS,
            "records": snap.records.len(),
            "total_count": snap.total_count,
            "next_page": snap.next_page,
        }),
        None => json!({ "key": cfg.cache_key, "present": false }),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
