use anyhow::{anyhow, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub per_page: u32,
    pub user_agent: String,
    pub static_data_path: String,
    pub cache_path: String,
    pub cache_key: String,
    pub output_path: String,
    pub live: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: "mozilla-mobile".to_string(),
            repo: "mozilla-vpn-client".to_string(),
            branch: "main".to_string(),
            per_page: 100,
            user_agent: concat!("workflow-trends/", env!("CARGO_PKG_VERSION")).to_string(),
            static_data_path: "data.json".to_string(),
            cache_path: "./workflows.sqlite".to_string(),
            cache_key: "workflows".to_string(),
            output_path: "index.html".to_string(),
            live: false,
        }
    }
}

fn flag(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base: std::env::var("GITHUB_API_BASE").unwrap_or(d.api_base),
            owner: std::env::var("GITHUB_OWNER").unwrap_or(d.owner),
            repo: std::env::var("GITHUB_REPO").unwrap_or(d.repo),
            branch: std::env::var("BRANCH").unwrap_or(d.branch),
            per_page: std::env::var("PER_PAGE").ok().and_then(|v| v.parse().ok()).unwrap_or(d.per_page),
            user_agent: std::env::var("USER_AGENT").unwrap_or(d.user_agent),
            static_data_path: std::env::var("STATIC_DATA").unwrap_or(d.static_data_path),
            cache_path: std::env::var("CACHE_PATH").unwrap_or(d.cache_path),
            cache_key: std::env::var("CACHE_KEY").unwrap_or(d.cache_key),
            output_path: std::env::var("OUTPUT").unwrap_or(d.output_path),
            live: std::env::var("LIVE").map(|v| flag(&v)).unwrap_or(d.live),
        }
    }

    /// Command-line overrides: `--live`, `--output <path>`, `--data <path>`.
    pub fn apply_args<I>(mut self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--live" => self.live = true,
                "--output" => {
                    self.output_path = args.next().ok_or_else(|| anyhow!("--output needs a path"))?;
                }
                "--data" => {
                    self.static_data_path = args.next().ok_or_else(|| anyhow!("--data needs a path"))?;
                }
                other => return Err(anyhow!("unknown argument: {}", other)),
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_target_main_branch() {
        let cfg = Config::default();
        assert_eq!(cfg.branch, "main");
        assert_eq!(cfg.per_page, 100);
        assert_eq!(cfg.cache_key, "workflows");
        assert!(!cfg.live);
    }

    #[test]
    fn test_args_override() {
        let cfg = Config::default()
            .apply_args(args(&["--live", "--output", "out/page.html", "--data", "snap.json"]))
            .unwrap();
        assert!(cfg.live);
        assert_eq!(cfg.output_path, "out/page.html");
        assert_eq!(cfg.static_data_path, "snap.json");
    }

    #[test]
    fn test_args_reject_unknown_and_missing_values() {
        assert!(Config::default().apply_args(args(&["--verbose"])).is_err());
        assert!(Config::default().apply_args(args(&["--output"])).is_err());
    }

    #[test]
    fn test_flag_values() {
        assert!(flag("1"));
        assert!(flag("TRUE"));
        assert!(!flag("0"));
        assert!(!flag(""));
    }
}
