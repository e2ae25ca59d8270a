use serde::Serialize;
use serde_json::{Map, Value};

use crate::aggregate::WorkflowSeries;

pub const SUCCESS_LABEL: &str = "Success tasks";
pub const FAILURE_LABEL: &str = "Failure tasks";
const SUCCESS_COLOR: &str = "rgb(99, 255, 132)";
const FAILURE_COLOR: &str = "rgb(255, 99, 132)";

/// Chart.js line chart configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: &'static str,
    #[serde(rename = "borderColor")]
    pub border_color: &'static str,
    pub data: Vec<u32>,
}

impl From<&WorkflowSeries> for ChartConfig {
    fn from(series: &WorkflowSeries) -> Self {
        Self {
            kind: "line",
            data: ChartData {
                labels: series.labels(),
                datasets: vec![
                    Dataset {
                        label: SUCCESS_LABEL,
                        border_color: SUCCESS_COLOR,
                        data: series.success_counts(),
                    },
                    Dataset {
                        label: FAILURE_LABEL,
                        border_color: FAILURE_COLOR,
                        data: series.failure_counts(),
                    },
                ],
            },
            options: Map::new(),
        }
    }
}
