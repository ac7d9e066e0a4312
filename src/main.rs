use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use devpulse_core::{OutputFormat, PulseConfig};
use devpulse_harvest::{harvest, parse_repo_reference, GitHubClient};
use devpulse_metrics::analyze;
use devpulse_narrate::chart::ChartData;
use devpulse_narrate::llm::LlmClient;
use devpulse_narrate::notify::SlackNotifier;
use devpulse_narrate::{render_markdown, render_narrative, render_summary};
use devpulse_store::ReportStore;

#[derive(Parser)]
#[command(
    name = "devpulse",
    version,
    about = "Weekly engineering-activity reports from GitHub",
    long_about = "DevPulse harvests GitHub activity, aggregates per-author churn, flags\n\
                   statistical churn outliers, computes DORA metrics, and delivers a\n\
                   narrated weekly report to your team.\n\n\
                   Examples:\n  \
                     devpulse report --repo owner/repo      Generate this week's report\n  \
                     devpulse report --since-days 14        Use a two-week window\n  \
                     devpulse report --post-slack           Deliver the report to Slack\n  \
                     devpulse history --limit 5             Show recent stored reports\n  \
                     devpulse doctor                        Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .devpulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the activity report for a repository
    #[command(long_about = "Generate the activity report for a repository.\n\n\
        Harvests PRs, reviews, CI runs, and incidents over the window, aggregates\n\
        per-author churn, flags churn outliers, computes DORA metrics, and stores\n\
        the result. The narrative is LLM-written when an API key is configured,\n\
        with a template fallback.\n\n\
        Examples:\n  devpulse report --repo owner/repo\n  devpulse report --since-days 14 --no-llm\n  devpulse report --post-slack")]
    Report {
        /// Repository to report on (format: owner/repo, overrides config)
        #[arg(long)]
        repo: Option<String>,

        /// Harvest window in days (overrides config)
        #[arg(long)]
        since_days: Option<u64>,

        /// Post the report to the configured Slack channel
        #[arg(long)]
        post_slack: bool,

        /// Skip the LLM and use the template narrative
        #[arg(long)]
        no_llm: bool,
    },
    /// Show recent stored reports
    #[command(long_about = "Show recent stored reports, newest first.\n\n\
        Reads from the report database configured under [store].\n\n\
        Examples:\n  devpulse history\n  devpulse history --limit 5 --format json")]
    History {
        /// Maximum reports to show (default: 10)
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Create a default .devpulse.toml configuration file
    #[command(long_about = "Create a default .devpulse.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .devpulse.toml already exists.")]
    Init,
    /// Check your DevPulse setup and environment
    #[command(long_about = "Check your DevPulse setup and environment.\n\n\
        Runs diagnostics for the config file, GitHub token and repository,\n\
        LLM API key, Slack credentials, and the report database. Use\n\
        --format json for machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m⚡\x1b[0m \x1b[1mdevpulse\x1b[0m v{version} — weekly engineering-activity reports\n");

        println!("Quick start:");
        println!("  \x1b[36mdevpulse init\x1b[0m                  Create a .devpulse.toml config file");
        println!("  \x1b[36mdevpulse report --repo o/r\x1b[0m     Generate this week's report");
        println!("  \x1b[36mdevpulse history\x1b[0m               Show recent stored reports\n");

        println!("All commands:");
        println!("  \x1b[32mreport\x1b[0m    Harvest GitHub activity and generate the weekly report");
        println!("  \x1b[32mhistory\x1b[0m   Show recent stored reports");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("devpulse v{version} — weekly engineering-activity reports\n");

        println!("Quick start:");
        println!("  devpulse init                  Create a .devpulse.toml config file");
        println!("  devpulse report --repo o/r     Generate this week's report");
        println!("  devpulse history               Show recent stored reports\n");

        println!("All commands:");
        println!("  report    Harvest GitHub activity and generate the weekly report");
        println!("  history   Show recent stored reports");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'devpulse <command> --help' for details.");
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(config: &PulseConfig, format: OutputFormat, use_color: bool) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    let config_path = std::path::Path::new(".devpulse.toml");
    if config_path.exists() {
        checks.push(CheckResult::pass("config_file", ".devpulse.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".devpulse.toml not found",
            "run 'devpulse init' to create a default config",
        ));
    }

    // 2. GitHub token
    if config.github.token.is_some() || std::env::var("GITHUB_TOKEN").is_ok() {
        checks.push(CheckResult::pass("github_token", "GITHUB_TOKEN set"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "GITHUB_TOKEN not set",
            "export GITHUB_TOKEN=... or set token in .devpulse.toml [github]",
        ));
    }

    // 3. GitHub repository
    match &config.github.repo {
        Some(repo) if parse_repo_reference(repo).is_ok() => {
            checks.push(CheckResult::pass("github_repo", repo.clone()));
        }
        Some(repo) => {
            checks.push(CheckResult::fail(
                "github_repo",
                format!("invalid repository '{repo}'"),
                "use the owner/repo format in .devpulse.toml [github]",
            ));
        }
        None => {
            checks.push(CheckResult::info(
                "github_repo",
                "not configured (pass --repo to 'devpulse report')",
            ));
        }
    }

    // 4. LLM provider + API key
    let llm_provider = &config.llm.provider;
    let llm_model = &config.llm.model;
    checks.push(CheckResult::pass(
        "llm_provider",
        format!("{llm_provider} (model: {llm_model})"),
    ));
    if config.llm.api_key.is_some() || std::env::var("OPENAI_API_KEY").is_ok() {
        checks.push(CheckResult::pass("llm_api_key", "OPENAI_API_KEY set"));
    } else {
        checks.push(CheckResult::info(
            "llm_api_key",
            "OPENAI_API_KEY not set (reports use the template narrative)",
        ));
    }

    // 5. Slack credentials
    let has_token = config.slack.bot_token.is_some() || std::env::var("SLACK_BOT_TOKEN").is_ok();
    match (&config.slack.channel, has_token) {
        (Some(channel), true) => {
            checks.push(CheckResult::pass(
                "slack",
                format!("configured for {channel}"),
            ));
        }
        (Some(_), false) => {
            checks.push(CheckResult::fail(
                "slack",
                "channel set but no bot token",
                "export SLACK_BOT_TOKEN=... or set bot_token in .devpulse.toml [slack]",
            ));
        }
        (None, _) => {
            checks.push(CheckResult::info(
                "slack",
                "not configured (needed for --post-slack)",
            ));
        }
    }

    // 6. Report database
    let db_path = std::path::Path::new(&config.store.path);
    if db_path.exists() {
        let detail = match ReportStore::open(db_path) {
            Ok(store) => match store.count() {
                Ok(count) => format!("exists ({count} reports)"),
                Err(_) => "exists".into(),
            },
            Err(_) => "exists (unreadable)".into(),
        };
        checks.push(CheckResult::pass("report_database", detail));
    } else {
        checks.push(CheckResult::info(
            "report_database",
            format!("{} not found (created on first report)", config.store.path),
        ));
    }

    // Output
    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("DevPulse v{version} — Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<20} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r##"# DevPulse Configuration
# See: https://github.com/devpulse-hq/devpulse

[github]
# repo = "owner/repo"
# token = "ghp_..."          # falls back to GITHUB_TOKEN
# since_days = 7
# max_pages = 5
# exclude_bots = true

[report]
# outlier_z_threshold = 2.0
# ci_failure_alert_threshold = 3
# audit_log = "audit_log.jsonl"

[llm]
# provider = "openai"
# model = "gpt-4o-mini"
# api_key = "sk-..."         # falls back to OPENAI_API_KEY
# base_url = "https://api.openai.com"

[slack]
# bot_token = "xoxb-..."     # falls back to SLACK_BOT_TOKEN
# channel = "#dev-reports"

[store]
# path = "dev_reports.db"
"##;

#[allow(clippy::too_many_lines)]
async fn run_report(
    config: &PulseConfig,
    format: OutputFormat,
    verbose: bool,
    repo: Option<String>,
    since_days: Option<u64>,
    post_slack: bool,
    no_llm: bool,
) -> Result<()> {
    let repo_ref = match repo.or_else(|| config.github.repo.clone()) {
        Some(r) => r,
        None => {
            miette::bail!(
                help = "Pass --repo owner/repo or set repo in .devpulse.toml [github]",
                "No repository configured"
            );
        }
    };
    let (owner, name) = parse_repo_reference(&repo_ref)?;
    let window = since_days.unwrap_or(config.github.since_days);

    let client = GitHubClient::new(config.github.token.as_deref())?;

    let is_tty = std::io::stderr().is_terminal();
    let spinner = if is_tty {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap(),
        );
        pb.set_message(format!("Harvesting {owner}/{name} (last {window} days)..."));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let harvested = harvest(
        &client,
        &owner,
        &name,
        window,
        config.github.max_pages,
        config.github.exclude_bots,
    )
    .await
    .inspect_err(|_e| {
        if let Some(pb) = &spinner {
            pb.finish_with_message("Failed");
        }
    });
    let (events, metrics) = harvested?;

    if let Some(pb) = spinner {
        pb.finish_with_message("Done");
    }

    if verbose {
        eprintln!(
            "Harvested {} events across {} PRs ({} merged)",
            events.len(),
            metrics.total_prs,
            metrics.merged_prs,
        );
    }

    let report = analyze(&events, metrics, config.report.outlier_z_threshold);
    let summary = render_summary(&report, &config.report);

    // LLM narrative with template fallback.
    let narrative = if no_llm {
        render_narrative(&report)
    } else {
        let has_key = config.llm.api_key.is_some() || std::env::var("OPENAI_API_KEY").is_ok();
        if has_key {
            let llm = LlmClient::new(&config.llm)?;
            match llm.narrate(&report).await {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("warning: LLM narrative failed ({e}); using template");
                    render_narrative(&report)
                }
            }
        } else {
            render_narrative(&report)
        }
    };

    // Persist and audit before delivery so a Slack failure loses nothing.
    let store = ReportStore::open(std::path::Path::new(&config.store.path))?;
    let row_id = store.save(&report, &summary)?;
    if verbose {
        eprintln!("Stored report as row {row_id} in {}", config.store.path);
    }

    if let Err(e) = devpulse_narrate::audit::append_summary(
        std::path::Path::new(&config.report.audit_log),
        &summary,
    ) {
        eprintln!("warning: failed to append audit log: {e}");
    }

    match format {
        OutputFormat::Json => {
            let chart = ChartData::from_report(&report);
            let json = serde_json::json!({
                "report": report,
                "summary": summary,
                "narrative": narrative,
                "chart": chart,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            print!("{}", render_markdown(&report, &config.report));
            println!("\n## Narrative\n\n{narrative}");
        }
        OutputFormat::Text => {
            print!("{summary}");
            println!("\nNarrative:\n{narrative}");
        }
    }

    if post_slack {
        let notifier = SlackNotifier::new(&config.slack)?;
        let message = format!("{summary}\n{narrative}");
        notifier.post(&message).await?;
        eprintln!("Posted report to Slack");
    }

    Ok(())
}

fn run_history(config: &PulseConfig, format: OutputFormat, limit: usize) -> Result<()> {
    let db_path = std::path::Path::new(&config.store.path);
    if !db_path.exists() {
        miette::bail!(
            help = "Run 'devpulse report' first to generate one",
            "No report database at {}",
            config.store.path
        );
    }

    let store = ReportStore::open(db_path)?;
    let reports = store.recent(limit)?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# Report History\n");
            if reports.is_empty() {
                println!("No reports stored.");
            } else {
                println!("| Id | Date | PRs | Merged | Throughput | +/- | CI failures |");
                println!("|----|------|-----|--------|------------|-----|-------------|");
                for r in &reports {
                    println!(
                        "| {} | {} | {} | {} | {}% | +{}/-{} | {} |",
                        r.id,
                        r.timestamp.format("%Y-%m-%d"),
                        r.total_prs,
                        r.merged_prs,
                        r.pr_throughput,
                        r.total_additions,
                        r.total_deletions,
                        r.ci_failures,
                    );
                }
            }
        }
        OutputFormat::Text => {
            if reports.is_empty() {
                println!("No reports stored.");
            } else {
                for r in &reports {
                    println!(
                        "#{:<4} {}  prs={} merged={} throughput={}%  +{}/-{}  ci_failures={}",
                        r.id,
                        r.timestamp.format("%Y-%m-%d %H:%M"),
                        r.total_prs,
                        r.merged_prs,
                        r.pr_throughput,
                        r.total_additions,
                        r.total_deletions,
                        r.ci_failures,
                    );
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PulseConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".devpulse.toml");
            if default_path.exists() {
                PulseConfig::from_file(default_path)?
            } else {
                PulseConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
    }

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Report {
            repo,
            since_days,
            post_slack,
            no_llm,
        }) => {
            run_report(
                &config,
                cli.format,
                cli.verbose,
                repo,
                since_days,
                post_slack,
                no_llm,
            )
            .await?;
        }
        Some(Command::History { limit }) => {
            run_history(&config, cli.format, limit)?;
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".devpulse.toml");
            if path.exists() {
                miette::bail!(".devpulse.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .devpulse.toml with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "devpulse", &mut std::io::stdout());
        }
    }

    Ok(())
}
