use boing::types::push::Urgency;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_VAPID_SUBJECT: &str = "mailto:admin@example.com";

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(boing::config::AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }
    if let Some(Command::AuthToken) = cli.command {
        let code = run_auth_token();
        return RunOutcome::Exit(code);
    }

    let auth = match resolve_auth_config(&cli) {
        Ok(auth) => auth,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    RunOutcome::Serve(boing::config::AppConfig {
        listen: cli.listen,
        vapid_private_key: cli.vapid_private_key,
        vapid_public_key: cli.vapid_public_key,
        vapid_subject: cli.vapid_subject,
        auth,
        push: boing::config::PushConfig {
            ttl: cli.push_ttl,
            urgency: cli.push_urgency,
            max_retries: cli.max_retries,
            retry_delay: cli.retry_delay,
            attempt_timeout: cli.attempt_timeout,
            concurrency: cli.concurrency.max(1),
        },
        storage: boing::config::StorageConfig {
            data_dir: cli.data_dir,
            max_notifications: cli.max_notifications,
            max_subscriptions: cli.max_subscriptions,
        },
        payload: boing::config::PayloadConfig {
            icon_url: cli.icon_url,
            badge_url: cli.badge_url,
        },
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "boing",
    version,
    about = "Web Push notification relay with a bounded history"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "BOING_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
    #[arg(long, env = "BOING_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "BOING_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "BOING_VAPID_SUBJECT", default_value = DEFAULT_VAPID_SUBJECT)]
    vapid_subject: String,
    #[arg(long, env = "BOING_AUTH_ENABLED", default_value_t = true, action = ArgAction::Set)]
    auth_enabled: bool,
    #[arg(long, env = "BOING_AUTH_TOKEN")]
    auth_token: Option<String>,
    /// Seconds a push service may hold an undelivered message.
    #[arg(long, env = "BOING_PUSH_TTL", default_value_t = 0)]
    push_ttl: u32,
    #[arg(long, env = "BOING_PUSH_URGENCY", default_value = "high")]
    push_urgency: Urgency,
    #[arg(long, env = "BOING_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
    /// Plain numbers are milliseconds; `ms`, `s` and `m` suffixes are accepted.
    #[arg(long, env = "BOING_RETRY_DELAY", default_value = "1000", value_parser = parse_duration)]
    retry_delay: Duration,
    #[arg(long, env = "BOING_ATTEMPT_TIMEOUT", default_value = "10s", value_parser = parse_duration)]
    attempt_timeout: Duration,
    #[arg(long, env = "BOING_CONCURRENCY", default_value_t = 16)]
    concurrency: usize,
    #[arg(long, env = "BOING_MAX_NOTIFICATIONS", default_value_t = 100)]
    max_notifications: usize,
    #[arg(long, env = "BOING_MAX_SUBSCRIPTIONS", default_value_t = 1000)]
    max_subscriptions: usize,
    #[arg(long, env = "BOING_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, env = "BOING_ICON_URL", default_value = "/icon-192.png")]
    icon_url: String,
    #[arg(long, env = "BOING_BADGE_URL", default_value = "/badge-72.png")]
    badge_url: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
    /// Generate a random bearer token for the API.
    AuthToken,
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match boing::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => (DEFAULT_VAPID_SUBJECT.to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("BOING_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("BOING_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("BOING_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace BOING_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn run_auth_token() -> i32 {
    let token = match boing::auth::generate_auth_token() {
        Ok(token) => token,
        Err(err) => {
            eprintln!("failed to generate auth token: {err}");
            return 1;
        }
    };
    println!("{token}");
    0
}

fn resolve_auth_config(cli: &Cli) -> Result<Option<boing::config::AuthConfig>, String> {
    if !cli.auth_enabled {
        return Ok(None);
    }

    let token = cli
        .auth_token
        .as_ref()
        .ok_or("auth is enabled but --auth-token is missing (pass --auth-enabled false to disable)")?
        .trim();
    if token.is_empty() {
        return Err("auth token cannot be empty".to_string());
    }

    Ok(Some(boing::config::AuthConfig {
        token: token.to_string(),
    }))
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let split = value
        .find(|ch: char| ch.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);

    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid duration '{value}'; expected <number>[ms|s|m]"))?;

    match unit.to_ascii_lowercase().as_str() {
        "" | "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        _ => Err(format!(
            "invalid duration '{value}'; expected <number>[ms|s|m]"
        )),
    }
}
