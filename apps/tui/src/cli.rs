use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "craft-pulse", version, about = "Event ticketing and CRM analytics dashboard")]
pub struct CliArgs {
    /// Print a portfolio summary and exit
    #[arg(long)]
    pub headless: bool,

    /// Print the headless summary as JSON
    #[arg(long)]
    pub json: bool,

    /// With --headless: trigger a sync and wait for it to finish first
    #[arg(long)]
    pub sync: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Analytics API origin
    #[arg(long = "api-base", value_name = "URL")]
    pub api_base: Option<String>,

    /// Customers per page
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<u32>,

    /// Log file path
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    /// Flags win over `.env` and the environment: they are written into
    /// the environment before the configuration is read.
    pub fn apply_env_overrides(&self) {
        if let Some(base) = &self.api_base {
            std::env::set_var("CRAFT_API_BASE", base);
        }
        if let Some(size) = self.page_size {
            std::env::set_var("CRAFT_PAGE_SIZE", size.to_string());
        }
        if let Some(path) = &self.log_file {
            std::env::set_var("CRAFT_LOG_FILE", path);
        }
        if self.debug {
            std::env::set_var("DEBUG", "1");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headless_sync_flags() {
        let args = CliArgs::parse_from([
            "craft-pulse",
            "--headless",
            "--sync",
            "--json",
            "--api-base",
            "https://pulse.example.com",
            "--page-size",
            "20",
        ]);
        assert!(args.headless && args.sync && args.json);
        assert_eq!(args.api_base.as_deref(), Some("https://pulse.example.com"));
        assert_eq!(args.page_size, Some(20));
        assert!(!args.debug);
    }
}
