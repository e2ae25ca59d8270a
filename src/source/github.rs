use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::source::{RunSource, RunsPage};

pub struct GitHubSource {
    client: Client,
    base: String,
    owner: String,
    repo: String,
}

#[derive(Deserialize, Debug)]
struct GitHubError {
    message: String,
}

impl GitHubSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder().user_agent(cfg.user_agent.clone()).build()?;
        Ok(Self {
            client,
            base: cfg.api_base.trim_end_matches('/').to_string(),
            owner: cfg.owner.clone(),
            repo: cfg.repo.clone(),
        })
    }

    fn runs_url(&self, page: u32, per_page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/repos/{}/{}/actions/runs",
            self.base, self.owner, self.repo
        ))?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RunSource for GitHubSource {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<RunsPage> {
        let url = self.runs_url(page, per_page)?;
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let msg = serde_json::from_str::<GitHubError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(anyhow!("github {} page {}: {}", status.as_u16(), page, msg));
        }

        Ok(resp.json().await?)
    }
}
