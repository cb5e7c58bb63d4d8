//! PolySched Command Line Interface
//!
//! Builds the schedule tree of a single rectangular statement, applies the
//! requested transformations and prints the result.
//!
//! Usage:
//!   polysched [OPTIONS]
//!   polysched --help
//!
//! Examples:
//!   polysched --extents=8 --tile-sizes=4 --shift-point-loops
//!   polysched --extents=16,16 --tile-sizes=4,8 --sync=sync0
//!   polysched --extents=4,4,4 --split-out=1 --emit=schedule

use clap::{Parser, ValueEnum};
use polysched::prelude::*;
use std::path::PathBuf;
use std::fs;
use anyhow::{Result, Context};
use log::{info, debug};

/// PolySched - schedule tree transformations
#[derive(Parser, Debug)]
#[command(name = "polysched")]
#[command(version)]
#[command(about = "Apply schedule tree transformations to a rectangular loop nest", long_about = None)]
struct Cli {
    /// Loop extents of the statement (comma-separated)
    #[arg(long, value_delimiter = ',', num_args = 1.., default_value = "8")]
    extents: Vec<i64>,

    /// Statement name
    #[arg(long, default_value = "S")]
    statement: String,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Tile sizes (comma-separated, 0 leaves a dimension untiled)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    tile_sizes: Option<Vec<i64>>,

    /// Scale tile loops by the tile size
    #[arg(long)]
    scale_tile_loops: bool,

    /// Make point loops relative to the tile origin
    #[arg(long)]
    shift_point_loops: bool,

    /// Isolate this member of the outermost band
    #[arg(long, value_name = "POS")]
    split_out: Option<usize>,

    /// Insert a synchronization label before the innermost band
    #[arg(long, value_name = "LABEL")]
    sync: Option<String>,

    /// What to emit
    #[arg(long, default_value = "tree")]
    emit: EmitKind,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmitKind {
    /// The transformed schedule tree
    Tree,
    /// Active domain of every node
    Domains,
    /// Partial schedule at the innermost band
    Schedule,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("PolySched v{}", polysched::VERSION);
    debug!("Arguments: {:?}", cli);

    let mut tree = build_tree(&cli);
    let root = tree.root();
    let outer = tree
        .child(root, 0)
        .context("tree has no band below the domain")?;

    if let Some(ref sizes) = cli.tile_sizes {
        let options = TileOptions::none()
            .with_scale_tile_loops(cli.scale_tile_loops)
            .with_shift_point_loops(cli.shift_point_loops);
        info!("Tiling with sizes {:?}", sizes);
        tree.band_tile(outer, sizes, options)
            .context("Failed to tile the outer band")?;
    }

    if let Some(pos) = cli.split_out {
        info!("Splitting out member {}", pos);
        tree.band_split_out(outer, pos)
            .context("Failed to split out band member")?;
    }

    if let Some(ref label) = cli.sync {
        let innermost = innermost_band(&tree)?;
        info!("Inserting label {} before band {}", label, innermost);
        tree.insert_extension_label_before(root, innermost, Id::new(label))
            .context("Failed to insert synchronization label")?;
    }

    let output = match cli.emit {
        EmitKind::Tree => tree.to_string(),
        EmitKind::Domains => emit_domains(&tree)?,
        EmitKind::Schedule => {
            let innermost = innermost_band(&tree)?;
            tree.partial_schedule(root, innermost)?.to_string()
        }
    };
    write_output(&cli.output, &output)
}

/// Domain -> permutable identity band over the requested box.
fn build_tree(cli: &Cli) -> ScheduleTree {
    let domain = UnionSet::rectangular(Id::new(&cli.statement), &cli.extents);
    let mupa = MultiUnionPwAff::from_affine(&domain, &AffineExpr::identity(cli.extents.len()));
    let mut tree = ScheduleTree::new(domain);
    let band = tree.make_band(BandElem::from_mupa(mupa).with_permutable(true), vec![]);
    let root = tree.root();
    tree.append_child(root, band);
    tree
}

fn innermost_band(tree: &ScheduleTree) -> Result<NodeId> {
    tree.collect(tree.root(), NodeType::Band)
        .last()
        .copied()
        .context("tree has no band")
}

fn emit_domains(tree: &ScheduleTree) -> Result<String> {
    let root = tree.root();
    let mut lines = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let active = tree.active_domain(root, node)?;
        lines.push(format!("{} {}: {}", node, tree.node_type(node), active));
        stack.extend(tree.children(node).iter().rev());
    }
    Ok(lines.join("\n"))
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
