use std::{
    process::ExitCode,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};
use oxidetotp::{OtpCode, OtpError, DEFAULT_WINDOW_STEPS, DEMO_SECRET};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Generate and validate time-based one-time passwords")]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Print the code for a secret
    Generate {
        /// Base32 secret, case and spaces do not matter
        #[arg(long, env = "OXIDETOTP_SECRET", hide_env_values = true, default_value = DEMO_SECRET)]
        secret: String,

        /// Unix time in seconds, defaults to now
        #[arg(long)]
        at: Option<u64>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Check a code against a secret
    Validate {
        #[arg(long)]
        code: String,

        /// Base32 secret, case and spaces do not matter
        #[arg(long, env = "OXIDETOTP_SECRET", hide_env_values = true, default_value = DEMO_SECRET)]
        secret: String,

        /// Steps of 30 seconds accepted before and after the current one
        #[arg(long, env = "OXIDETOTP_WINDOW", default_value_t = DEFAULT_WINDOW_STEPS)]
        window: u32,

        /// Unix time in seconds, defaults to now
        #[arg(long)]
        at: Option<u64>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn instant(at: Option<u64>) -> anyhow::Result<SystemTime> {
    let Some(seconds) = at else {
        return Ok(SystemTime::now());
    };

    UNIX_EPOCH
        .checked_add(Duration::from_secs(seconds))
        .ok_or_else(|| anyhow!("--at {seconds} is beyond the supported time range"))
}

fn generate_response(result: &Result<OtpCode, OtpError>) -> Value {
    match result {
        Ok(code) => json!({ "totp": code.to_string() }),
        Err(err) => json!({ "error": err.to_string() }),
    }
}

fn validate_response(valid: bool) -> Value {
    json!({ "valid": valid })
}

fn render(response: &Value, format: Format) -> String {
    match format {
        Format::Json => response.to_string(),
        Format::Text => match response.as_object().and_then(|o| o.iter().next()) {
            Some((key, Value::String(value))) if key == "error" => format!("error: {value}"),
            Some((_, Value::String(value))) => value.clone(),
            Some((_, value)) => value.to_string(),
            None => String::new(),
        },
    }
}

fn init_logging() {
    // stdout carries the response, diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let (response, format, status) = match cli.action {
        Action::Generate { secret, at, format } => {
            debug!(?at, "generating code");
            let result = oxidetotp::generate(&secret, instant(at)?);
            let status = if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };

            (generate_response(&result), format, status)
        }
        Action::Validate {
            code,
            secret,
            window,
            at,
            format,
        } => {
            debug!(?at, window, "validating code");
            let valid = oxidetotp::validate(&code, &secret, window, instant(at)?);

            (validate_response(valid), format, ExitCode::SUCCESS)
        }
    };

    println!("{}", render(&response, format));

    Ok(status)
}
