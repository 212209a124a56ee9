//! Command-line surface: argument parsing, settings resolution, and printing.

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use amrest_config::{Overrides, Settings, config_path, load_config_file, resolve};
use amrest_telemetry::{LogFormat, LoggingConfig, init_logging};
use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{CliDependencies, CliError, CliResult, is_client_error};
use crate::commands::{AppContext, Operation, execute, read_payload};
use crate::exit::{self, Outcome};
use crate::output::{indent_width, render_json};
use crate::response::{NormalizedResult, OutputOptions};
use crate::tree::FilterPath;

/// Parses arguments, resolves settings, runs the operation, and prints its
/// result. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let mut settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    if let Err(err) = install_logging(&settings) {
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }
    debug!(?settings, "resolved settings");

    if settings.login_password.is_none() && io::stdin().is_terminal() {
        match prompt_password(&settings.login_user) {
            Ok(password) => settings.login_password = Some(password),
            Err(err) => {
                eprintln!("error: {}", err.display_message());
                return err.exit_code();
            }
        }
    }

    invoke(cli, settings, io::stdin(), &mut io::stdout()).await
}

/// Run one parsed invocation against resolved settings, reading a payload from
/// `input` and writing the result to `out`.
async fn invoke(
    cli: Cli,
    settings: Settings,
    input: impl Read + Send,
    out: &mut (impl Write + Send),
) -> i32 {
    let indent = indent_width(cli.json_indent);
    let trace_id = Uuid::new_v4().to_string();

    match dispatch(cli, settings, &trace_id, input).await {
        Ok(result) => {
            if let Some(value) = &result.value
                && let Err(err) = print_json(out, value, indent)
            {
                eprintln!("error: {}", err.display_message());
                return err.exit_code();
            }
            if is_client_error(result.status) {
                warn!(status = result.status, "request was rejected");
            }
            exit::exit_code(Outcome::Response(result.status))
        }
        Err(err) => {
            if let Some(body) = err.printable_body()
                && let Err(print_err) = print_json(out, body, indent)
            {
                debug!(error = %print_err, "failed to print error body");
            }
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(
    cli: Cli,
    settings: Settings,
    trace_id: &str,
    input: impl Read + Send,
) -> CliResult<NormalizedResult> {
    let payload = if cli.operation.takes_payload() {
        Some(read_payload(input)?)
    } else {
        None
    };
    let operation = Operation::new(cli.operation, &cli.section, cli.name.as_deref(), payload)?;

    let deps = CliDependencies::from_settings(&settings, trace_id)?;
    let ctx = AppContext {
        client: deps.client,
        base_url: settings.url,
        realm: settings.realm,
        login_realm: settings.login_realm,
        user: settings.login_user,
        password: settings.login_password.unwrap_or_default(),
        output: OutputOptions {
            include_meta: cli.json_include_meta,
            filter: cli.json_filter.unwrap_or_default(),
        },
        logout: !cli.no_logout,
    };

    execute(&ctx, &operation).await
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let path = config_path(cli.config.as_deref());
    let file = load_config_file(&path)?;
    Ok(resolve(file, cli.overrides())?)
}

fn install_logging(settings: &Settings) -> CliResult<()> {
    let format = match settings.log_format.as_deref() {
        None => LogFormat::Pretty,
        Some(name) => LogFormat::from_name(name)
            .ok_or_else(|| CliError::validation(format!("unknown log format '{name}'")))?,
    };
    init_logging(&LoggingConfig {
        level: &settings.log_level,
        format,
    })
    .map_err(CliError::failure)
}

fn prompt_password(user: &str) -> CliResult<String> {
    rpassword::prompt_password(format!("Password for {user}: "))
        .map_err(|err| CliError::failure(anyhow!("failed to read password from terminal: {err}")))
}

fn print_json(out: &mut impl Write, value: &Value, indent: Option<usize>) -> CliResult<()> {
    let rendered = render_json(value, indent)?;
    writeln!(out, "{rendered}")
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

fn parse_filter_path(input: &str) -> Result<FilterPath, String> {
    input
        .parse::<FilterPath>()
        .map_err(|err| format!("invalid filter path '{input}': {err}"))
}

#[derive(Parser, Debug)]
#[command(
    name = "amrest",
    version,
    about = "Administer OpenAM realms, users, policies, and agents over REST"
)]
pub(crate) struct Cli {
    #[arg(value_enum, help = "Operation to perform")]
    operation: OperationKind,
    #[arg(
        default_value = "realms",
        help = "Resource collection, e.g. realms, users, groups, policies, agents"
    )]
    section: String,
    #[arg(help = "Item name or UUID, or a query filter such as 'uid sw \"adm\"'")]
    name: Option<String>,

    #[arg(long, env = "AMREST_URL", help = "Server root URL")]
    url: Option<String>,
    #[arg(short = 'R', long, env = "AMREST_LOGIN_REALM", help = "Realm to authenticate in")]
    login_realm: Option<String>,
    #[arg(short = 'u', long, env = "AMREST_LOGIN_USER", help = "Account to authenticate as")]
    login_user: Option<String>,
    #[arg(long, hide = true)]
    login_password: Option<String>,
    #[arg(short = 'p', long, help = "File whose first line is the password")]
    login_password_file: Option<PathBuf>,
    #[arg(short = 'r', long, env = "AMREST_REALM", help = "Realm to operate in")]
    realm: Option<String>,

    #[arg(
        long,
        default_value_t = 4,
        allow_negative_numbers = true,
        help = "Indent width for JSON output; negative prints compact JSON"
    )]
    json_indent: i32,
    #[arg(long, help = "Keep createdBy/creationDate/lastModified* attributes")]
    json_include_meta: bool,
    #[arg(
        long,
        value_parser = parse_filter_path,
        help = "Dot-separated path selecting part of the result, e.g. 0.name"
    )]
    json_filter: Option<FilterPath>,
    #[arg(long, hide = true)]
    no_logout: bool,

    #[arg(long, help = "Per-request timeout in seconds")]
    timeout: Option<u64>,
    #[arg(long, help = "Accept invalid TLS certificates")]
    insecure: bool,
    #[arg(long, env = "AMREST_CONF", help = "Configuration file")]
    config: Option<PathBuf>,
    #[arg(long, help = "Log level or filter directive written to stderr")]
    log_level: Option<String>,
    #[arg(long, help = "Log format: pretty or json")]
    log_format: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            realm: self.realm.clone(),
            login_realm: self.login_realm.clone(),
            login_user: self.login_user.clone(),
            login_password: self.login_password.clone(),
            login_password_file: self.login_password_file.clone(),
            timeout_secs: self.timeout,
            accept_invalid_certs: self.insecure,
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OperationKind {
    Login,
    #[value(alias = "get")]
    Read,
    #[value(alias = "post")]
    Create,
    #[value(alias = "put")]
    Update,
    Delete,
}

impl OperationKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn takes_payload(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}
