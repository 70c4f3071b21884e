//! Command line arguments of the `tmsource` binary.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, PartialEq, Default)]
#[command(
    about,
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=tmsource=debug. Use TMSOURCE_FORMAT to choose the log format: full, compact, bare, pretty or json.",
    styles = HELP_STYLES
)]
pub struct Args {
    /// Source to load, e.g. `tmsource:///srv/roads` or a directory containing `data.yml`.
    pub source: String,
    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Print the normalized document as YAML instead of the Mapnik XML.
    #[arg(long)]
    pub normalized: bool,
    /// Substitute `${VAR}` references in `data.yml` from the environment.
    #[arg(short = 'e', long)]
    pub env: bool,
}
