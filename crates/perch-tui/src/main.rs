mod app;
mod form;
mod view;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, Parser};
use perch_core::cli::{self, KeyVal};
use perch_core::{category, config, datastore, store};

#[derive(Parser, Debug)]
#[command(
    name = "perch-tui",
    version,
    about = "Full-screen terminal board for perch"
)]
struct Cli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    rc_overrides: Vec<KeyVal>,

    #[arg(long = "perchrc")]
    perchrc: Option<PathBuf>,

    #[arg(long = "data")]
    data: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; raise RUST_LOG and redirect stderr to keep the
    // alternate screen clean.
    cli::init_tracing(cli.verbose, cli.quiet)?;

    let mut cfg = config::Config::load(cli.perchrc.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

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

    app::run(board)
}
