//! Mindmap CLI
//!
//! Edits a mind map document on disk:
//! - Growing the tree one node at a time (`add-root`, `add`, `edit`, `delete`)
//! - Inspecting it (`show`, `branch`, `render`)
//! - Asking a text-generation service for new branches (`suggest`) or for a
//!   whole map built from a flat idea list (`organize`)
//! - Moving documents around (`import`, `export`)
//!
//! Status lines go to stderr; ids and machine-readable output go to stdout.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use mindmap_core::{
    branch_path, load_from_path, save, save_to_path, LayoutConfig, LayoutStrategy, MindMap,
    MindMapError,
};
use mindmap_suggest::{
    IdeaBoard, OrganizeVariant, Suggester, SuggestionOutcome, SuggestionTracker,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

mod backend;
mod document;

#[derive(Parser)]
#[command(name = "mindmap")]
#[command(author, version, about = "Mind map editor with generated branch suggestions")]
struct Cli {
    /// Mind map document (a missing file is an empty map)
    #[arg(long, global = true, default_value = "mindmap.json")]
    file: PathBuf,

    /// Layout strategy used to position nodes
    #[arg(long, value_enum, global = true, default_value_t = LayoutArg::Depth)]
    layout: LayoutArg,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    backend: backend::BackendArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutArg {
    /// Indent by depth, one row per node
    Depth,
    /// One row per tree level, centred on the canvas
    Level,
    /// Fixed-size grid in id order
    Flat,
}

impl From<LayoutArg> for LayoutStrategy {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Depth => LayoutStrategy::DepthIndented,
            LayoutArg::Level => LayoutStrategy::LevelGrid,
            LayoutArg::Flat => LayoutStrategy::FlatGrid,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum VariantArg {
    Mindmap,
    Organization,
}

impl From<VariantArg> for OrganizeVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Mindmap => OrganizeVariant::MindMap,
            VariantArg::Organization => OrganizeVariant::Organization,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the root node (only one root is allowed). Prints the new id.
    AddRoot { label: String },

    /// Add a child under an existing node. Prints the new id.
    Add { parent: String, label: String },

    /// Replace a node's label
    Edit { id: String, label: String },

    /// Delete a node and its whole subtree
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Print the tree with node ids
    Show {
        /// Include computed positions
        #[arg(long)]
        positions: bool,
    },

    /// Print the labels from the root down to a node
    Branch { id: String },

    /// Print `{nodes, edges}` JSON with computed positions
    Render,

    /// Ask the generation service for new children of a node
    Suggest {
        id: String,
        /// Add the suggestions to the map instead of only printing them
        #[arg(long)]
        accept: bool,
    },

    /// Replace the document with a map built from a file of ideas (one per line)
    Organize {
        ideas: PathBuf,
        #[arg(long, value_enum, default_value_t = VariantArg::Mindmap)]
        variant: VariantArg,
    },

    /// Replace the document with another saved document
    Import { input: PathBuf },

    /// Write the document to another path
    Export { out: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let strategy = LayoutStrategy::from(cli.layout);
    let path = cli.file.as_path();

    match cli.command {
        Commands::AddRoot { label } => cmd_add_root(path, strategy, &label),
        Commands::Add { parent, label } => cmd_add(path, strategy, &parent, &label),
        Commands::Edit { id, label } => cmd_edit(path, strategy, &id, &label),
        Commands::Delete { id, yes } => cmd_delete(path, strategy, &id, yes),
        Commands::Show { positions } => cmd_show(path, strategy, positions),
        Commands::Branch { id } => cmd_branch(path, strategy, &id),
        Commands::Render => cmd_render(path, strategy),
        Commands::Suggest { id, accept } => cmd_suggest(path, strategy, &cli.backend, &id, accept),
        Commands::Organize { ideas, variant } => {
            cmd_organize(path, strategy, &cli.backend, &ideas, variant.into())
        }
        Commands::Import { input } => cmd_import(path, strategy, &input),
        Commands::Export { out } => cmd_export(path, strategy, &out),
    }
}

// ============================================================================
// Editing
// ============================================================================

fn cmd_add_root(path: &Path, strategy: LayoutStrategy, label: &str) -> Result<()> {
    let mut map = document::open(path, strategy)?;
    let id = map.add_root(label)?;
    document::write(&map, path)?;
    eprintln!("{} root {}", "added".green().bold(), label.trim().bold());
    println!("{id}");
    Ok(())
}

fn cmd_add(path: &Path, strategy: LayoutStrategy, parent: &str, label: &str) -> Result<()> {
    let mut map = document::open(path, strategy)?;
    let id = map.add_child(parent, label)?;
    document::write(&map, path)?;
    eprintln!("{} {}", "added".green().bold(), label.trim().bold());
    println!("{id}");
    Ok(())
}

fn cmd_edit(path: &Path, strategy: LayoutStrategy, id: &str, label: &str) -> Result<()> {
    let mut map = document::open(path, strategy)?;
    if map.edit_label(id, label)? {
        document::write(&map, path)?;
        eprintln!("{} {}", "updated".green().bold(), id);
    } else {
        eprintln!("{} label unchanged", "info:".yellow().bold());
    }
    Ok(())
}

fn cmd_delete(path: &Path, strategy: LayoutStrategy, id: &str, yes: bool) -> Result<()> {
    let mut map = document::open(path, strategy)?;
    let label = map
        .node(id)
        .map(|n| n.label.clone())
        .ok_or_else(|| MindMapError::NotFound(id.to_string()))?;
    let below = map.descendants(id)?.len() - 1;

    if !yes {
        let question = format!("Delete \"{label}\" and {below} descendant(s)?");
        let stdin = io::stdin();
        if !confirm(&mut stdin.lock(), &mut io::stderr(), &question)? {
            eprintln!("{} nothing deleted", "info:".yellow().bold());
            return Ok(());
        }
    }

    let removed = map.delete_subtree(id)?;
    document::write(&map, path)?;
    eprintln!("{} {} node(s)", "deleted".green().bold(), removed.len());
    Ok(())
}

/// Ask a yes/no question; only `y` or `yes` counts as yes.
fn confirm(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

// ============================================================================
// Inspection
// ============================================================================

fn cmd_show(path: &Path, strategy: LayoutStrategy, positions: bool) -> Result<()> {
    let map = document::open(path, strategy)?;
    if map.is_empty() {
        eprintln!("{} empty mind map", "info:".yellow().bold());
        return Ok(());
    }

    for (node, depth) in map.outline() {
        let mut line = format!(
            "{}- {} {}",
            "  ".repeat(depth),
            node.label,
            format!("[{}]", node.id).dimmed()
        );
        if positions {
            line.push_str(&format!(" @ ({:.0}, {:.0})", node.position.x, node.position.y));
        }
        println!("{line}");
    }
    Ok(())
}

fn cmd_branch(path: &Path, strategy: LayoutStrategy, id: &str) -> Result<()> {
    let map = document::open(path, strategy)?;
    println!("{}", branch_path(map.node_map(), id)?);
    Ok(())
}

fn cmd_render(path: &Path, strategy: LayoutStrategy) -> Result<()> {
    let map = document::open(path, strategy)?;
    println!("{}", save(&map)?);
    Ok(())
}

// ============================================================================
// Generated suggestions
// ============================================================================

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))
}

fn cmd_suggest(
    path: &Path,
    strategy: LayoutStrategy,
    backend: &backend::BackendArgs,
    id: &str,
    accept: bool,
) -> Result<()> {
    let mut map = document::open(path, strategy)?;
    let suggester = Suggester::new(backend.build()?);
    let mut tracker = SuggestionTracker::new();

    let (ticket, prompt) = tracker.begin(&map, id)?;
    let candidates: Vec<String> = runtime()?
        .block_on(suggester.request_children(&prompt))
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect();

    if candidates.is_empty() {
        tracker.abandon(&ticket);
        eprintln!("{} no suggestions returned", "info:".yellow().bold());
        return Ok(());
    }
    if !accept {
        for candidate in &candidates {
            println!("{candidate}");
        }
        return Ok(());
    }

    match tracker.apply(&mut map, &ticket, &candidates)? {
        SuggestionOutcome::Applied(ids) => {
            document::write(&map, path)?;
            eprintln!("{} {} suggestion(s)", "added".green().bold(), ids.len());
            for new_id in ids {
                let label = map.node(&new_id).map(|n| n.label.as_str()).unwrap_or_default();
                println!("{new_id}\t{label}");
            }
        }
        SuggestionOutcome::Discarded(reason) => {
            eprintln!("{} suggestions discarded ({reason:?})", "info:".yellow().bold());
        }
    }
    Ok(())
}

fn cmd_organize(
    path: &Path,
    strategy: LayoutStrategy,
    backend: &backend::BackendArgs,
    ideas_path: &Path,
    variant: OrganizeVariant,
) -> Result<()> {
    let text = fs::read_to_string(ideas_path)
        .map_err(|e| anyhow!("failed to read {}: {e}", ideas_path.display()))?;
    let mut board = IdeaBoard::from_ideas(text.lines());
    if board.ideas().is_empty() {
        return Err(anyhow!("no ideas found in {}", ideas_path.display()));
    }

    let suggester = Suggester::new(backend.build()?);
    let config = LayoutConfig::default();
    let map = runtime()?.block_on(board.reorganize(&suggester, variant, strategy, &config));
    if map.is_empty() {
        print_new_ideas(&board);
        return Err(anyhow!(
            "generation service returned no usable graph; {} left unchanged",
            path.display()
        ));
    }

    document::write(&map, path)?;
    eprintln!(
        "{} {} idea(s) into {} node(s)",
        "organized".green().bold(),
        board.ideas().len(),
        map.len()
    );
    print_new_ideas(&board);
    Ok(())
}

fn print_new_ideas(board: &IdeaBoard) {
    if board.suggestions().is_empty() {
        return;
    }
    eprintln!("{}", "new ideas:".bold());
    for suggestion in board.suggestions() {
        println!("{suggestion}");
    }
}

// ============================================================================
// Import / export
// ============================================================================

fn cmd_import(path: &Path, strategy: LayoutStrategy, input: &Path) -> Result<()> {
    let mut map = MindMap::with_layout(strategy, Default::default());
    load_from_path(&mut map, input)
        .map_err(|e| anyhow!("failed to import {}: {e}", input.display()))?;
    document::write(&map, path)?;
    eprintln!(
        "{} {} node(s) from {}",
        "imported".green().bold(),
        map.len(),
        input.display()
    );
    Ok(())
}

fn cmd_export(path: &Path, strategy: LayoutStrategy, out: &Path) -> Result<()> {
    let map = document::open(path, strategy)?;
    save_to_path(&map, out).map_err(|e| anyhow!("failed to export {}: {e}", out.display()))?;
    eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
    Ok(())
}
