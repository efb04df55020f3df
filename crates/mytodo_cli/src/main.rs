use clap::Parser;
use clap::error::ErrorKind;
use mytodo_cli::cli::{Cli, collect_config_overrides, expand_alias, split_command_line};
use mytodo_cli::session::Session;
use mytodo_core::config::{Config, ConfigLoad, load_config_with_fallback, merge_overrides};
use mytodo_core::error::AppError;
use mytodo_core::notify::notifier_from_env;
use mytodo_core::storage::FileStorage;
use std::io::{self, BufRead, IsTerminal, Stdout};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "MYTODO_LOG";
const PROGRAM_NAME: &str = "mytodo";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "off" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("off"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn resolve_config(loaded: ConfigLoad, raw_overrides: &[String]) -> Result<Config, AppError> {
    if let Some(err) = loaded.error {
        eprintln!("WARNING: {err}");
    }

    let overrides = collect_config_overrides(raw_overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn open_session(
    config: &Config,
    interactive: bool,
) -> Result<Session<FileStorage, Stdout>, AppError> {
    let storage = FileStorage::from_env()?;
    let notifier = notifier_from_env(config.desktop_notifications)?;
    Ok(Session::open(storage, config, notifier, io::stdout(), interactive))
}

fn program_args(args: Vec<String>, config: &Config) -> Result<Vec<String>, AppError> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(PROGRAM_NAME.to_string());
    argv.extend(expand_alias(args, &config.aliases)?);
    Ok(argv)
}

fn run_single(args: Vec<String>) -> Result<(), AppError> {
    // Aliases come from the config file, so it is read before parsing.
    let loaded = load_config_with_fallback();
    let argv = program_args(args, &loaded.config)?;

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(normalize_parse_error(err)),
    };

    init_tracing(cli.verbose);
    let config = resolve_config(loaded, &cli.config_override)?;
    let mut session = open_session(&config, false)?;
    let result = session.execute(cli.command, cli.json);
    session.close(cli.json)?;
    result
}

fn run_interactive() -> Result<(), AppError> {
    init_tracing(false);
    let config = resolve_config(load_config_with_fallback(), &[])?;
    let mut session = open_session(&config, true)?;
    session.report_warnings(false)?;
    session.print_view()?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let line = if line == "?" { "help" } else { line };

        let argv = match split_command_line(line).and_then(|args| program_args(args, &config)) {
            Ok(argv) => argv,
            Err(err) => {
                session.report_error(&err);
                continue;
            }
        };

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if is_informational(&err) => {
                print!("{err}");
                continue;
            }
            Err(err) => {
                session.report_error(&normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            session.report_error(&AppError::invalid_input(
                "config overrides only apply at startup",
            ));
            continue;
        }

        if let Err(err) = session.execute(cli.command, cli.json) {
            session.report_error(&err);
        }
    }

    session.close(false)?;
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let result = if args.is_empty() {
        run_interactive()
    } else {
        run_single(args)
    };

    if let Err(err) = result {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
