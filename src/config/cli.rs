use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "profile-scraper")]
#[command(about = "Extract reviewer details from faculty profile pages")]
pub struct CliArgs {
    #[arg(long, short, default_value = "profile-scraper.toml")]
    pub config: String,

    /// JSON Lines file of inbound profile messages, or "-" for stdin
    #[arg(long, short, default_value = "-")]
    pub input: String,

    #[arg(long, help = "Override retry.max_attempts")]
    pub max_attempts: Option<u32>,

    #[arg(long, help = "Validate configuration and input without processing")]
    pub dry_run: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["profile-scraper"]);
        assert_eq!(args.config, "profile-scraper.toml");
        assert!(args.reads_stdin());
        assert_eq!(args.max_attempts, None);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::parse_from([
            "profile-scraper",
            "--config",
            "prod.toml",
            "--input",
            "profiles.jsonl",
            "--max-attempts",
            "3",
            "--dry-run",
            "--json-logs",
            "-v",
        ]);
        assert_eq!(args.config, "prod.toml");
        assert_eq!(args.input, "profiles.jsonl");
        assert_eq!(args.max_attempts, Some(3));
        assert!(args.dry_run && args.json_logs && args.verbose);
        assert!(!args.reads_stdin());
    }
}
