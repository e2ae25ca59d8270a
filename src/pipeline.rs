use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::Path;

use crate::cache::{load_snapshot, CacheStore};
use crate::config::Config;
use crate::fetch::{run_fetch_loop, FetchPlan, FetchState};
use crate::logging::{log, log_cache, log_render, obj, v_str, Domain, Level, ProfileScope};
use crate::record::WorkflowRecord;
use crate::render::{build_page, write_page, Page};
use crate::source::RunSource;
use crate::static_data::load_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Static,
    Live,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub mode: Mode,
    pub records: usize,
    pub page: Option<Page>,
}

/// Writes the page for `records`; writes nothing when there is nothing to chart.
pub fn render_records(out: &Path, records: &[WorkflowRecord]) -> Result<Option<Page>> {
    let _scope = ProfileScope::new("render");
    let Some(page) = build_page(records) else {
        log(Level::Debug, Domain::Render, "skipped", obj(&[("msg", v_str("no records"))]));
        return Ok(None);
    };
    log(
        Level::Debug,
        Domain::Aggregate,
        "series",
        obj(&[("records", json!(records.len())), ("workflows", json!(page.panels.len()))]),
    );
    write_page(out, &page)?;
    log_render(&out.display().to_string(), &page.title, page.panels.len());
    Ok(Some(page))
}

fn restore_state<C: CacheStore + ?Sized>(
    cache: &C,
    key: &str,
    seed: Vec<WorkflowRecord>,
    now: DateTime<Utc>,
) -> Result<FetchState> {
    match load_snapshot(cache, key)? {
        Some(snap) if snap.is_fresh(now) => {
            log_cache("restored", key, snap.records.len(), Some(snap.age(now).num_milliseconds()));
            Ok(FetchState::from_snapshot(snap))
        }
        Some(snap) => {
            log_cache("expired", key, snap.records.len(), Some(snap.age(now).num_milliseconds()));
            Ok(FetchState::new(seed))
        }
        None => {
            log_cache("miss", key, 0, None);
            Ok(FetchState::new(seed))
        }
    }
}

/// Static data short-circuits unless live mode is requested; otherwise the
/// fetch loop runs from the cached (or seeded) state and the page is
/// re-rendered after every page.
pub async fn run<S, C, N>(cfg: &Config, source: &S, cache: &mut C, now: N) -> Result<Outcome>
where
    S: RunSource + ?Sized,
    C: CacheStore + ?Sized,
    N: Fn() -> DateTime<Utc>,
{
    let out = Path::new(&cfg.output_path);
    let data = load_static(Path::new(&cfg.static_data_path))?;
    log(
        Level::Info,
        Domain::System,
        "static_data",
        obj(&[
            ("path", v_str(&cfg.static_data_path)),
            ("records", json!(data.records.len())),
            ("sha256", data.sha256.as_deref().map(v_str).unwrap_or(serde_json::Value::Null)),
            ("live", json!(cfg.live)),
        ]),
    );

    if !cfg.live && !data.is_empty() {
        let page = render_records(out, &data.records)?;
        return Ok(Outcome {
            mode: Mode::Static,
            records: data.records.len(),
            page,
        });
    }

    let state = restore_state(cache, &cfg.cache_key, data.records, now())?;
    let mut page = render_records(out, &state.records)?;

    let plan = FetchPlan {
        branch: &cfg.branch,
        per_page: cfg.per_page,
        cache_key: &cfg.cache_key,
    };
    let state = run_fetch_loop(source, cache, &plan, state, &now, |st, _| {
        if let Some(p) = render_records(out, &st.records)? {
            page = Some(p);
        }
        Ok(())
    })
    .await?;

    log(
        Level::Info,
        Domain::Fetch,
        "done",
        obj(&[
            ("records", json!(state.records.len())),
            ("total_count", json!(state.total_count)),
            ("next_page", json!(state.next_page)),
        ]),
    );

    Ok(Outcome {
        mode: Mode::Live,
        records: state.records.len(),
        page,
    })
}
