use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::record::{Conclusion, Status, WorkflowRecord};

mod github;

pub use github::GitHubSource;

/// One page of the `actions/runs` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RunsPage {
    pub total_count: u64,
    #[serde(default)]
    pub workflow_runs: Vec<RemoteRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

/// A workflow run as the API returns it, before branch filtering.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRun {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub triggering_actor: Option<Actor>,
    pub status: Status,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
}

impl RemoteRun {
    pub fn on_branch(&self, branch: &str) -> bool {
        self.head_branch.as_deref() == Some(branch)
    }

    /// Runs without a name or start time cannot be charted.
    pub fn into_record(self) -> Option<WorkflowRecord> {
        Some(WorkflowRecord {
            name: self.name?,
            started_at: self.run_started_at?,
            url: self.html_url,
            triggering_actor: self.triggering_actor.map(|a| a.login).unwrap_or_default(),
            status: self.status,
            conclusion: self.conclusion,
        })
    }
}

#[async_trait]
pub trait RunSource {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<RunsPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_page_parses_api_payload() {
        let raw = r#"{
            "total_count": 2,
            "workflow_runs": [
                {
                    "id": 1,
                    "name": "Linux",
                    "head_branch": "main",
                    "run_started_at": "2024-01-01T10:00:00Z",
                    "html_url": "https://github.com/o/r/actions/runs/1",
                    "triggering_actor": {"login": "octocat", "id": 5},
                    "status": "completed",
                    "conclusion": "failure"
                },
                {
                    "id": 2,
                    "name": "Linux",
                    "head_branch": "feature",
                    "run_started_at": "2024-01-02T10:00:00Z",
                    "html_url": "https://github.com/o/r/actions/runs/2",
                    "status": "queued",
                    "conclusion": null
                }
            ]
        }"#;
        let page: RunsPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page.workflow_runs[0].on_branch("main"));
        assert!(!page.workflow_runs[1].on_branch("main"));

        let rec = page.workflow_runs[0].clone().into_record().unwrap();
        assert_eq!(rec.triggering_actor, "octocat");
        assert_eq!(rec.conclusion, Some(Conclusion::Failure));
    }

    #[test]
    fn test_run_without_start_time_is_dropped() {
        let run = RemoteRun {
            name: Some("A".to_string()),
            head_branch: Some("main".to_string()),
            run_started_at: None,
            html_url: String::new(),
            triggering_actor: None,
            status: Status::Queued,
            conclusion: None,
        };
        assert!(run.into_record().is_none());
    }
}
