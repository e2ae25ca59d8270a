use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a workflow run as reported by the Actions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Requested,
    Queued,
    Pending,
    Waiting,
    InProgress,
    Completed,
    ActionRequired,
}

/// Terminal outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    Neutral,
    TimedOut,
    ActionRequired,
    Stale,
    StartupFailure,
}

impl Conclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Skipped => "skipped",
            Conclusion::Neutral => "neutral",
            Conclusion::TimedOut => "timed_out",
            Conclusion::ActionRequired => "action_required",
            Conclusion::Stale => "stale",
            Conclusion::StartupFailure => "startup_failure",
        }
    }
}

/// One workflow run retained for charting.
///
/// Serialized with the field names the Actions API uses, so static data files
/// and cache snapshots share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub name: String,
    #[serde(rename = "run_started_at", alias = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "html_url", alias = "url", default)]
    pub url: String,
    #[serde(default, alias = "who", alias = "triggeringActor")]
    pub triggering_actor: String,
    pub status: Status,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
}

impl WorkflowRecord {
    /// UTC calendar day the run started on.
    pub fn day(&self) -> NaiveDate {
        self.started_at.date_naive()
    }

    pub fn is_success(&self) -> bool {
        self.conclusion == Some(Conclusion::Success)
    }

    pub fn is_failure(&self) -> bool {
        self.conclusion == Some(Conclusion::Failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_api_field_names() {
        let raw = r#"{
            "name": "Linux",
            "run_started_at": "2024-01-01T10:00:00Z",
            "html_url": "https://github.com/o/r/actions/runs/1",
            "triggering_actor": "octocat",
            "status": "completed",
            "conclusion": "success"
        }"#;
        let rec: WorkflowRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.name, "Linux");
        assert_eq!(rec.triggering_actor, "octocat");
        assert_eq!(rec.status, Status::Completed);
        assert!(rec.is_success());
        assert_eq!(rec.day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_missing_conclusion_is_none() {
        let raw = r#"{"name":"A","run_started_at":"2024-01-01T10:00:00Z","status":"in_progress"}"#;
        let rec: WorkflowRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.conclusion, None);
        assert!(!rec.is_success());
        assert!(!rec.is_failure());
        assert_eq!(rec.url, "");
    }

    #[test]
    fn test_accepts_aliases() {
        let raw = r#"{"name":"A","startedAt":"2024-01-01T23:59:59Z","url":"u","who":"bot","status":"completed","conclusion":"timed_out"}"#;
        let rec: WorkflowRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.url, "u");
        assert_eq!(rec.triggering_actor, "bot");
        assert_eq!(rec.conclusion, Some(Conclusion::TimedOut));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let raw = r#"{"name":"A","run_started_at":"2024-01-01T10:00:00Z","status":"exploded"}"#;
        assert!(serde_json::from_str::<WorkflowRecord>(raw).is_err());
    }

    #[test]
    fn test_serializes_with_api_field_names() {
        let rec = WorkflowRecord {
            name: "A".to_string(),
            started_at: "2024-01-01T10:00:00Z".parse().unwrap(),
            url: "u".to_string(),
            triggering_actor: "bot".to_string(),
            status: Status::Completed,
            conclusion: Some(Conclusion::Failure),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["run_started_at"], "2024-01-01T10:00:00Z");
        assert_eq!(v["html_url"], "u");
        assert_eq!(v["conclusion"], "failure");
    }
}
