use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::cache::{save_snapshot, CacheSnapshot, CacheStore};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::record::WorkflowRecord;
use crate::source::RunSource;

/// Pagination progress threaded through the fetch loop.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub records: Vec<WorkflowRecord>,
    pub total_count: u64,
    pub next_page: u32,
}

impl FetchState {
    pub fn new(records: Vec<WorkflowRecord>) -> Self {
        Self {
            records,
            total_count: 0,
            next_page: 1,
        }
    }

    pub fn from_snapshot(snap: CacheSnapshot) -> Self {
        Self {
            records: snap.records,
            total_count: snap.total_count,
            next_page: snap.next_page,
        }
    }

    pub fn snapshot(&self, captured_at: DateTime<Utc>) -> CacheSnapshot {
        CacheSnapshot {
            captured_at,
            records: self.records.clone(),
            total_count: self.total_count,
            next_page: self.next_page,
        }
    }

    /// An empty accumulated list counts as exhausted even when the reported
    /// total is non-zero.
    pub fn is_exhausted(&self) -> bool {
        self.records.is_empty() || self.records.len() as u64 >= self.total_count
    }
}

pub struct FetchPlan<'a> {
    pub branch: &'a str,
    pub per_page: u32,
    pub cache_key: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStats {
    pub page: u32,
    pub returned: usize,
    pub kept: usize,
}

/// Requests pages until the state is exhausted, persisting the snapshot after
/// every page. At least one page is always requested.
pub async fn run_fetch_loop<S, C, N, P>(
    source: &S,
    cache: &mut C,
    plan: &FetchPlan<'_>,
    mut state: FetchState,
    now: N,
    mut on_page: P,
) -> Result<FetchState>
where
    S: RunSource + ?Sized,
    C: CacheStore + ?Sized,
    N: Fn() -> DateTime<Utc>,
    P: FnMut(&FetchState, PageStats) -> Result<()>,
{
    loop {
        let page = state.next_page;
        let resp = source.fetch_page(page, plan.per_page).await?;
        state.next_page = page.saturating_add(1);
        state.total_count = resp.total_count;

        let returned = resp.workflow_runs.len();
        let mut kept = 0;
        for run in resp.workflow_runs {
            if !run.on_branch(plan.branch) {
                continue;
            }
            match run.into_record() {
                Some(rec) => {
                    state.records.push(rec);
                    kept += 1;
                }
                None => log(
                    Level::Debug,
                    Domain::Fetch,
                    "run_skipped",
                    obj(&[("page", json!(page)), ("reason", v_str("missing name or start time"))]),
                ),
            }
        }

        log(
            Level::Info,
            Domain::Fetch,
            "page",
            obj(&[
                ("page", json!(page)),
                ("returned", json!(returned)),
                ("kept", json!(kept)),
                ("records", json!(state.records.len())),
                ("total_count", json!(state.total_count)),
            ]),
        );

        save_snapshot(cache, plan.cache_key, &state.snapshot(now()))?;
        on_page(&state, PageStats { page, returned, kept })?;

        if state.is_exhausted() || returned == 0 {
            break;
        }
    }
    Ok(state)
}
