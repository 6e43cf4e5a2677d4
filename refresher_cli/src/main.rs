mod cli;
mod error_fmt;
#[cfg(all(feature = "rt", target_os = "linux"))]
mod rt;
mod run;

use clap::Parser;
use eyre::WrapErr;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use refresher_config::{Config, Logging};

fn main() {
    // color-eyre makes panics and reports readable; failure to install it
    // is not worth dying over.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            report_error(&e);
            std::process::exit(error_fmt::exit_code_for_error(&e));
        }
    };

    init_tracing(&cli, &cfg.logging);

    let result = match &cli.cmd {
        Commands::Run {
            serial,
            poll_hz,
            rt,
            rt_prio,
        } => run::run_controller(&cfg, serial.as_deref(), *poll_hz, *rt, *rt_prio),
        Commands::Plan { recipe, size } => run::print_plan(&cfg, *recipe, *size, cli.json),
        Commands::SelfCheck => run::self_check(&cfg),
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn report_error(e: &eyre::Report) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        eprintln!("{}", error_fmt::format_error_json(e));
    } else {
        eprintln!("{}", error_fmt::humanize(e));
    }
}

/// Read the TOML (built-in defaults when the file is absent), apply the CSV
/// recipe override, and validate once. Everything downstream may trust the
/// tables.
fn load_config(cli: &Cli) -> eyre::Result<Config> {
    let mut cfg = if cli.config.exists() {
        let content = std::fs::read_to_string(&cli.config)
            .wrap_err_with(|| format!("read config {:?}", cli.config))?;
        refresher_config::load_toml(&content)
            .map_err(|e| eyre::eyre!("parse config {:?}: {e}", cli.config))?
    } else {
        Config::default()
    };

    if let Some(csv) = &cli.recipes {
        cfg.recipes = refresher_config::load_recipes_csv(csv)?;
    }

    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Console logging on stderr (status lines own stdout); optional file
/// logging with rotation per `[logging]` in the config.
fn init_tracing(cli: &Cli, logging: &Logging) {
    use tracing_subscriber::EnvFilter;

    let level = logging.level.as_deref().unwrap_or(&cli.log_level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if let Some(file) = &logging.file {
        let path = std::path::Path::new(file);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => std::path::Path::new("."),
        };
        let name = path
            .file_name()
            .map(|f| f.to_os_string())
            .unwrap_or_else(|| "refresher.log".into());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        if cli.json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        }
    } else if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
