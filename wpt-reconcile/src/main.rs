use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;
use wpt_reconcile::runner;
use wpt_reconcile::validate;

#[derive(Parser, Debug)]
#[command(
  version,
  about = "Reconcile web-platform-tests results against the runtime's override tables"
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reconcile executor results against an override table and gate CI.
  Check(runner::CheckArgs),
  /// Audit override table files without reconciling.
  Validate(validate::ValidateArgs),
}

fn main() -> ExitCode {
  match try_main() {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn try_main() -> Result<ExitCode> {
  let cli = Cli::parse();
  match cli.command {
    Command::Check(args) => {
      init_tracing(args.trace);
      runner::run_cli(args)
    }
    Command::Validate(args) => validate::run_cli(args),
  }
}

fn init_tracing(enable: bool) {
  if !enable {
    return;
  }

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr);
  if let Err(err) = builder.try_init() {
    eprintln!("failed to install tracing subscriber: {err}");
  }
}
