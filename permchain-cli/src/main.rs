//! permchain: run one permission session against a simulated device
//!
//! Usage:
//!   permchain run -p CAMERA -p SYSTEM_ALERT_WINDOW --deny CAMERA --explain-before

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use permchain::{
    AutoPresenter, ChainConfigBuilder, ChainPresets, DefaultExplainReason,
    DefaultForwardToSettings, PermissionRequest, SessionOutcome, TerminalPresenter,
};
use permchain_api::PermissionResult;
use permchain_cli::tracing_support::{init_subscriber_with_config, TracingConfig, TracingFormat};
use permchain_cli::{normalize_permission, Scenario};
use std::sync::Arc;

/// Positive answers the auto presenter gives before it starts declining
const AUTO_POSITIVE_LIMIT: usize = 3;

/// Button tint (ARGB) for light and dark terminals
const TINT_LIGHT: u32 = 0xFF1972E8;
const TINT_DARK: u32 = 0xFF8AB6F5;

#[derive(Parser, Debug)]
#[command(name = "permchain", version)]
#[command(about = "Run permission request sessions against a simulated device")]
struct Cli {
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true, env = "PERMCHAIN_LOG_FORMAT")]
    log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request permissions and print the aggregated result
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Permission to request (short names like CAMERA are expanded)
    #[arg(short, long = "permission", required = true)]
    permissions: Vec<String>,

    /// Already granted on the device
    #[arg(long)]
    granted: Vec<String>,

    /// The user grants this when prompted
    #[arg(long)]
    grant: Vec<String>,

    /// The user denies this when prompted (default for unlisted permissions)
    #[arg(long)]
    deny: Vec<String>,

    /// The user denies this and ticks "don't ask again"
    #[arg(long)]
    deny_permanently: Vec<String>,

    /// The user turns this on once its settings screen opens
    #[arg(long)]
    settings_grants: Vec<String>,

    /// Explain before the first prompt
    #[arg(long)]
    explain_before: bool,

    /// Register no explain callback
    #[arg(long)]
    no_explain: bool,

    /// Register no forward-to-settings callback
    #[arg(long)]
    no_forward: bool,

    /// Answer rationales automatically instead of asking on the terminal
    #[arg(long, value_enum)]
    auto: Option<AutoAnswer>,

    /// Color button labels for a dark terminal background
    #[arg(long)]
    dark_theme: bool,

    /// Append an audit log under the user config directory
    #[arg(long)]
    audit: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for TracingFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => TracingFormat::Pretty,
            LogFormat::Compact => TracingFormat::Compact,
            LogFormat::Json => TracingFormat::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AutoAnswer {
    Yes,
    No,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => None,
        1 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    };
    init_subscriber_with_config(TracingConfig {
        level,
        format: cli.log_format.into(),
        ..Default::default()
    })
    .context("Failed to initialize logging")?;

    match cli.command {
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let host = Scenario {
        granted: args.granted,
        grant: args.grant,
        deny: args.deny,
        deny_permanently: args.deny_permanently,
        settings_grants: args.settings_grants,
    }
    .into_host();

    let mut config = if args.audit {
        ChainPresets::interactive("permchain", host).context("Failed to open audit log")?
    } else {
        ChainConfigBuilder::new().host(host).build()?
    };

    match args.auto {
        Some(AutoAnswer::Yes) => {
            config.presenter =
                Arc::new(AutoPresenter::always_positive().with_limit(AUTO_POSITIVE_LIMIT));
        }
        Some(AutoAnswer::No) => config.presenter = Arc::new(AutoPresenter::always_negative()),
        None if args.dark_theme => {
            config.presenter = Arc::new(TerminalPresenter::new().with_dark_theme());
        }
        None => {}
    }

    let mut request = PermissionRequest::new(config)
        .permissions(args.permissions.iter().map(|p| normalize_permission(p)))
        .set_dialog_tint_color(TINT_LIGHT, TINT_DARK);
    if args.explain_before {
        request = request.explain_reason_before_request();
    }
    if !args.no_explain {
        request = request.on_explain_request_reason_with_before_param(DefaultExplainReason::new(
            "These permissions are needed for the feature you selected.",
            "Continue",
            Some("Not now"),
        ));
    }
    if !args.no_forward {
        request = request.on_forward_to_settings(DefaultForwardToSettings::new(
            "These permissions can only be enabled in Settings.",
            "Open settings",
            Some("Cancel"),
        ));
    }

    let outcome = request
        .request(|result: PermissionResult| {
            tracing::debug!(all_granted = result.all_granted, "Result callback invoked");
        })
        .await?;

    match outcome {
        SessionOutcome::Completed(result) => print_result(&result),
        SessionOutcome::Abandoned => println!("session abandoned"),
    }
    Ok(())
}

fn print_result(result: &PermissionResult) {
    println!("all granted: {}", result.all_granted);
    for permission in &result.granted {
        println!("  granted  {}", permission);
    }
    for permission in &result.denied {
        println!("  denied   {}", permission);
    }
}
