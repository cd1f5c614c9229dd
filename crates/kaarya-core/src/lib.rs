pub mod auth;
pub mod backend;
pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod i18n;
pub mod notify;
pub mod prefs;
pub mod render;
pub mod session;
pub mod store;
pub mod suggest;
pub mod task;

use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub async fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<ExitCode> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting kaarya"
  );
  debug!(overrides = cli.rc_overrides.len(), "rc overrides on the command line");

  let mut cfg = config::Config::load(
    cli.kaaryarc.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let mut app =
    commands::App::open(cfg, &data_dir)
      .with_context(|| {
        format!(
          "failed to open kaarya data \
           at {}",
          data_dir.display()
        )
      })?;

  let mut stdout = std::io::stdout();
  let ok = commands::dispatch(
    &mut app,
    cli.command,
    &mut stdout
  )
  .await?;

  info!(ok, "done");
  Ok(if ok {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}
