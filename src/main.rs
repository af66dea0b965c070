//! asset-bundler CLI: render one asset tag from the command line.
//!
//! The command plays the host side of the tag protocol: it opens the tag, prints the
//! template once per published URL and closes the tag until no pass remains.

use std::path::PathBuf;

use anyhow::{Context, Result};
use asset_bundler::{AssetBuilder, AssetManifest, FilterManager, FsSourceReader, TagParams};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Resolve, filter and write cache-busted assets described by an asset manifest
#[derive(Parser, Debug)]
#[command(name = "asset-bundler")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Directories searched, in order, for assets.json / assets.yaml
  #[arg(long = "config-dir", default_value = ".")]
  config_dirs: Vec<PathBuf>,

  /// Output type, e.g. css or js
  #[arg(short, long)]
  output: String,

  /// Emit one artifact per source instead of one bundle
  #[arg(long)]
  debug: bool,

  /// Bundle name from the manifest
  #[arg(short, long, conflicts_with = "assets", required_unless_present = "assets")]
  bundle: Option<String>,

  /// Comma-separated asset identifiers
  #[arg(short, long)]
  assets: Option<String>,

  /// Comma-separated filters; prefix with ? to skip in debug mode
  #[arg(short, long)]
  filters: Option<String>,

  /// Line printed per artifact; {url} is replaced with the asset URL
  #[arg(short, long, default_value = "{url}")]
  template: String,

  /// Print the build report as JSON instead of rendering the template
  #[arg(long)]
  json: bool,

  /// Verbosity level (-v, -vv)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let manifest = AssetManifest::discover(&cli.config_dirs).context("failed to load asset manifest")?;
  let filters = FilterManager::default();
  let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);

  let params = TagParams {
    output: cli.output.clone(),
    debug: cli.debug,
    bundle: cli.bundle.clone(),
    assets: cli.assets.clone(),
    filters: cli.filters.clone(),
  };

  if cli.json {
    let tag = builder
      .open_tag(&params)
      .with_context(|| format!("failed to build {} assets", cli.output))?;
    let report = serde_json::to_string_pretty(&tag.report().artifacts)
      .context("failed to serialise build report")?;
    println!("{report}");
    return Ok(());
  }

  let rendered = builder
    .render_tag(&params, |url| format!("{}\n", cli.template.replace("{url}", url)))
    .with_context(|| format!("failed to build {} assets", cli.output))?;
  print!("{rendered}");
  Ok(())
}

fn init_logging(verbose: u8) {
  let default_level = match verbose {
    0 => "warn",
    1 => "asset_bundler=debug",
    _ => "trace",
  };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}
