use anyhow::Result;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::aggregate::{aggregate, title, WorkflowSeries};
use crate::chart::ChartConfig;
use crate::record::WorkflowRecord;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js";

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Element id; equal to the workflow name.
    pub id: String,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub title: String,
    pub panels: Vec<Panel>,
}

impl Page {
    /// Replaces the panel for `name` in place, or appends a new one.
    pub fn upsert_panel(&mut self, name: &str, series: &WorkflowSeries) {
        let panel = Panel {
            id: name.to_string(),
            chart: ChartConfig::from(series),
        };
        match self.panels.iter_mut().find(|p| p.id == name) {
            Some(existing) => *existing = panel,
            None => self.panels.push(panel),
        }
    }

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == name)
    }

    pub fn to_html(&self) -> Result<String> {
        let mut panels = String::new();
        let mut charts = Map::new();
        for p in &self.panels {
            let id = escape_html(&p.id);
            panels.push_str(&format!(
                "    <div id=\"{id}\">\n      <h3>{id}</h3>\n      <canvas></canvas>\n    </div>\n"
            ));
            charts.insert(p.id.clone(), serde_json::to_value(&p.chart)?);
        }
        let charts = script_safe(&Value::Object(charts).to_string());

        Ok(format!(
            r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Workflow runs</title>
    <script src="{CHART_JS}"></script>
  </head>
  <body>
    <h1 id="title">{title}</h1>
    <div id="container">
{panels}    </div>
    <script>
      const charts = {charts};
      for (const [id, config] of Object.entries(charts)) {{
        const canvas = document.getElementById(id).querySelector("canvas");
        new Chart(canvas, config);
      }}
    </script>
  </body>
</html>
"#,
            title = escape_html(&self.title),
        ))
    }
}

/// Builds the page for `records`. `None` when there is nothing to chart.
pub fn build_page(records: &[WorkflowRecord]) -> Option<Page> {
    let title = title(records)?;
    let mut page = Page { title, panels: Vec::new() };
    for (name, series) in aggregate(records) {
        page.upsert_panel(&name, &series);
    }
    Some(page)
}

pub fn write_page(path: &Path, page: &Page) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, page.to_html()?)?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// JSON inside <script> must not close the element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Conclusion, Status};

    fn rec(name: &str, at: &str, conclusion: Conclusion) -> WorkflowRecord {
        WorkflowRecord {
            name: name.to_string(),
            started_at: at.parse().unwrap(),
            url: String::new(),
            triggering_actor: String::new(),
            status: Status::Completed,
            conclusion: Some(conclusion),
        }
    }

    #[test]
    fn test_empty_records_build_nothing() {
        assert!(build_page(&[]).is_none());
    }

    #[test]
    fn test_page_has_one_panel_per_name() {
        let records = vec![
            rec("Linux", "2024-01-01T10:00:00Z", Conclusion::Success),
            rec("Windows", "2024-01-02T10:00:00Z", Conclusion::Failure),
            rec("Linux", "2024-01-02T10:00:00Z", Conclusion::Failure),
        ];
        let page = build_page(&records).unwrap();
        assert_eq!(page.title, "From 2024-01-01 to 2024-01-03");
        let ids: Vec<&str> = page.panels.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Linux", "Windows"]);
    }

    #[test]
    fn test_upsert_replaces_existing_panel() {
        let records = vec![rec("Linux", "2024-01-01T10:00:00Z", Conclusion::Success)];
        let mut page = build_page(&records).unwrap();
        let more = vec![
            rec("Linux", "2024-01-01T10:00:00Z", Conclusion::Success),
            rec("Linux", "2024-01-01T11:00:00Z", Conclusion::Success),
        ];
        let series = &crate::aggregate::aggregate(&more)["Linux"];
        page.upsert_panel("Linux", series);
        assert_eq!(page.panels.len(), 1);
        assert_eq!(page.panel("Linux").unwrap().chart.data.datasets[0].data, vec![2]);
    }

    #[test]
    fn test_html_contract() {
        let records = vec![rec("Build <ci>", "2024-01-01T10:00:00Z", Conclusion::Success)];
        let html = build_page(&records).unwrap().to_html().unwrap();
        assert!(html.contains("<h1 id=\"title\">From 2024-01-01 to 2024-01-02</h1>"));
        assert!(html.contains("<div id=\"container\">"));
        assert!(html.contains("<div id=\"Build &lt;ci&gt;\">"));
        assert!(html.contains("<h3>Build &lt;ci&gt;</h3>"));
        assert!(html.contains("\"Success tasks\""));
    }

    #[test]
    fn test_script_safe_json() {
        let records = vec![rec("</script><b>", "2024-01-01T10:00:00Z", Conclusion::Success)];
        let html = build_page(&records).unwrap().to_html().unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }
}
