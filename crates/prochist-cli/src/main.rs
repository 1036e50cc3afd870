//! historyview: show the processing history stored with a file.
//!
//! Usage:
//!   historyview slope.img                      # fields of the file itself
//!   historyview slope.img --showparents        # its direct parents
//!   historyview slope.img --ancestor 0.1       # fields of an ancestor by path
//!   historyview slope.img --ancestor dem.img   # ... or by file name
//!   historyview slope.img --wholelineage       # the whole tree
//!
//! Logging goes to stderr; set `RUST_LOG=debug` to see store and codec detail.

mod display;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use prochist_core::{
    Access, LineageNode, NodePath, SidecarStore, View, ViewMode, find_by_name, has_history,
    navigate, read_history,
};

const FALLBACK_WIDTH: usize = 80;

/// Display a simple text view of the processing history of a file.
#[derive(Parser, Debug)]
#[command(name = "historyview")]
#[command(about = "Display the processing history stored with a file")]
struct Args {
    /// File to read processing history from
    filename: PathBuf,

    /// Ancestor to view instead of the file itself: a path such as 0.2, or a
    /// file name. A name matching several ancestors lists their paths and fails.
    #[arg(long)]
    ancestor: Option<String>,

    /// Display parents instead of the fields
    #[arg(long)]
    showparents: bool,

    /// Display the parent relationships of the whole lineage
    #[arg(long)]
    wholelineage: bool,

    /// Width of the display in characters (default: terminal width)
    #[arg(short, long)]
    width: Option<usize>,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let store = SidecarStore::open(&args.filename, Access::ReadOnly)
        .with_context(|| format!("cannot open {}", args.filename.display()))?;
    if !has_history(&store)? {
        println!("No processing history found in file {}", args.filename.display());
        return Ok(());
    }
    let root = read_history(&store)
        .with_context(|| format!("cannot read history of {}", args.filename.display()))?;
    tracing::debug!(nodes = root.node_count(), depth = root.depth(), "history loaded");

    if args.wholelineage {
        print_lines(display::lineage_tree(&root));
        return Ok(());
    }

    let path = match &args.ancestor {
        Some(ancestor) => ancestor_path(&root, ancestor)?,
        None => NodePath::root(),
    };
    let mode = if args.showparents {
        ViewMode::Parents
    } else {
        ViewMode::Fields
    };

    match navigate(&root, &path, mode)? {
        View::Fields(fields) => {
            let width = args.width.unwrap_or_else(terminal_width);
            print_lines(display::field_rows(fields, width));
        }
        View::Parents(parents) => {
            let node = prochist_core::resolve(&root, &path)?;
            print_lines(display::parent_rows(node, &parents));
        }
    }
    Ok(())
}

/// Interpret `--ancestor` as a path if it parses as one, else as a file name.
fn ancestor_path(root: &LineageNode, ancestor: &str) -> Result<NodePath> {
    if let Ok(path) = ancestor.parse::<NodePath>() {
        return Ok(path);
    }

    let mut matches = find_by_name(root, ancestor);
    match matches.len() {
        0 => bail!("ancestor '{ancestor}' not found"),
        1 => Ok(matches.remove(0)),
        _ => {
            println!("Multiple ancestors match '{ancestor}'. Specify one by path:");
            for path in &matches {
                println!("    {path}");
            }
            bail!("ancestor '{ancestor}' is ambiguous ({} matches)", matches.len())
        }
    }
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(columns, _)| usize::from(columns))
        .unwrap_or(FALLBACK_WIDTH)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
