//! fortress-user - idempotent OS user account provisioning agent.

use std::env;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fortress_user::audit::AuditLogger;
use fortress_user::config::Settings;
use fortress_user::error::AgentError;
use fortress_user::executor::LocalRunner;
use fortress_user::ops::{self, Operation};
use fortress_user::provision::Provisioner;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

const DEFAULT_CONFIG_PATH: &str = "/etc/fortress/fortress-user.toml";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let config_path = get_config_path(&args);

    let settings = match Settings::load_or_default(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.code());
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("error initializing logging: {}", e);
        return ExitCode::from(e.code());
    }

    let positional = positional_args(&args);
    let Some((operation_name, operation_args)) = positional.split_first() else {
        eprintln!("{}", usage_text());
        return ExitCode::from(40);
    };

    match run(&settings, operation_name, operation_args) {
        Ok(()) => {
            println!("success");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "operation failed");
            eprintln!("{}", e);
            ExitCode::from(e.code())
        }
    }
}

/// Resolve the operation and run it against a freshly wired provisioner.
fn run(settings: &Settings, operation_name: &str, args: &[String]) -> Result<(), AgentError> {
    let operation = Operation::parse(operation_name)?;

    let audit = if settings.audit.enabled {
        match AuditLogger::new(&settings.audit.log_path) {
            Ok(logger) => Arc::new(logger),
            Err(e) => {
                // Provisioning still proceeds; a missing audit file is not
                // worth failing the whole run over.
                warn!(
                    path = %settings.audit.log_path.display(),
                    error = %e,
                    "audit log unavailable, continuing without it"
                );
                Arc::new(AuditLogger::disabled())
            }
        }
    } else {
        Arc::new(AuditLogger::disabled())
    };

    let timeout = Duration::from_secs(settings.limits.command_timeout_seconds);
    let runner = LocalRunner::new(audit, timeout);
    let provisioner = Provisioner::new(settings.provision.clone(), runner);

    info!(operation = operation_name, "dispatching operation");
    ops::dispatch(&provisioner, operation, args)
}

/// Positional arguments with flags and their values stripped.
fn positional_args(args: &[String]) -> Vec<String> {
    let mut positional = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--config" || arg == "-c" {
            iter.next();
        } else if !arg.starts_with("--config=") {
            positional.push(arg.clone());
        }
    }
    positional
}

/// Get configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> String {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

/// Initialize logging based on settings.
fn init_logging(settings: &Settings) -> Result<(), AgentError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let log_file = match &settings.logging.file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    // The json and plain stacks have distinct subscriber types, so each arm
    // assembles its own file layer.
    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            let file_layer =
                log_file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(file_layer)
                .init();
        }
        _ => {
            let file_layer =
                log_file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(file_layer)
                .init();
        }
    }

    Ok(())
}

fn usage_text() -> String {
    format!(
        r#"{} {}
usage:
    {name} create_user <user> <group> <public_key> <password> <is_service_account>
    {name} delete_user <user>
    {name} update_user_group <user> <groups>"#,
        NAME,
        VERSION,
        name = NAME
    )
}

/// Print help message.
fn print_help() {
    println!(
        r#"{}

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: {}]
    -h, --help             Print help information
    -V, --version          Print version information"#,
        usage_text(),
        DEFAULT_CONFIG_PATH
    );
}
