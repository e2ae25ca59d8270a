use anyhow::Result;
use chrono::Utc;
use serde_json::json;

use workflow_trends::cache::SqliteCache;
use workflow_trends::config::Config;
use workflow_trends::logging::{log, obj, v_str, Domain, Level};
use workflow_trends::pipeline::{self, Mode};
use workflow_trends::source::GitHubSource;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env().apply_args(std::env::args().skip(1))?;
    log(
        Level::Info,
        Domain::System,
        "start",
        obj(&[
            ("repo", v_str(&format!("{}/{}", cfg.owner, cfg.repo))),
            ("branch", v_str(&cfg.branch)),
            ("live", json!(cfg.live)),
        ]),
    );

    let source = GitHubSource::new(&cfg)?;
    let mut cache = SqliteCache::new(&cfg.cache_path)?;
    cache.init()?;

    let outcome = pipeline::run(&cfg, &source, &mut cache, Utc::now).await?;

    let mode = match outcome.mode {
        Mode::Static => "static",
        Mode::Live => "live",
    };
    log(
        Level::Info,
        Domain::System,
        "finished",
        obj(&[
            ("mode", v_str(mode)),
            ("records", json!(outcome.records)),
            ("panels", json!(outcome.page.as_ref().map(|p| p.panels.len()).unwrap_or(0))),
            ("output", v_str(&cfg.output_path)),
        ]),
    );
    Ok(())
}
