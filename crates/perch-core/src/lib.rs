pub mod category;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod ids;
pub mod render;
pub mod session;
pub mod store;
pub mod task;
pub mod views;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting perch CLI");
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.perchrc.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides
            .into_iter()
            .chain(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)))
            .chain(cli.color.map(|value| ("color".to_string(), value))),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = datastore::DataStore::open(&data_dir)
        .with_context(|| format!("failed to open datastore at {}", data_dir.display()))?;

    let mut board = store::Board::open(store);
    if let Some(palette) = cfg.get_list("palette") {
        let palette: Vec<String> = palette
            .into_iter()
            .filter(|hex| category::parse_hex_color(hex).is_some())
            .collect();
        board.categories.set_palette(palette);
    }

    let mut renderer = render::Renderer::new(&cfg)?;
    let inv = cli::Invocation::parse(&cfg, cli.rest)?;

    commands::dispatch(&mut board, &cfg, &mut renderer, inv)?;

    info!("done");
    Ok(())
}
