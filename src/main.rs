use anyhow::{Context, Result};
use block_patcher::config::{apply_plan, load_from_path, preview_plan, PlanError, PlanOutcome};
use block_patcher::edit::{format_hash, read_source, BlockEdit, Change, EditError, EditResult};
use block_patcher::lines::{strip_terminator, LineSequence};
use block_patcher::locate::{BlockLocator, Delimiters, LocateError};
use block_patcher::logging;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "block-patcher")]
#[command(about = "Replace or delete delimiter-balanced blocks in source files", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// File containing the block
    file: PathBuf,

    /// Text identifying the block's first line
    anchor: String,

    /// 1-based line at which the anchor search starts
    #[arg(long, default_value_t = 1)]
    from: usize,

    /// Opening delimiter character
    #[arg(long, default_value_t = '{')]
    open: char,

    /// Closing delimiter character
    #[arg(long, default_value_t = '}')]
    close: char,
}

impl Target {
    fn delimiters(&self) -> Result<Delimiters> {
        Ok(Delimiters::new(self.open, self.close)?)
    }

    fn from_index(&self) -> usize {
        self.from.saturating_sub(1)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the line range of a block
    Locate {
        #[command(flatten)]
        target: Target,

        /// Report every block introduced by the anchor
        #[arg(long)]
        all: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replace a block with new text (read from stdin unless given)
    Replace {
        #[command(flatten)]
        target: Target,

        /// Replacement text
        #[arg(long, conflicts_with = "with_file")]
        with: Option<String>,

        /// File holding the replacement text
        #[arg(long)]
        with_file: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Delete a block
    Delete {
        #[command(flatten)]
        target: Target,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Apply a TOML edit plan to a file
    Plan {
        /// File to edit
        file: PathBuf,

        /// Edit plan (TOML)
        plan: PathBuf,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}", format!("Warning: logging unavailable: {e}").yellow());
    }

    match cli.command {
        Commands::Locate { target, all, json } => cmd_locate(&target, all, json),

        Commands::Replace {
            target,
            with,
            with_file,
            dry_run,
            diff,
        } => {
            let text = match (with, with_file) {
                (Some(text), _) => text,
                (None, Some(path)) => read_source(&path)
                    .with_context(|| format!("reading replacement from {}", path.display()))?,
                (None, None) => io::read_to_string(io::stdin())
                    .context("reading replacement from stdin")?,
            };
            let edit = BlockEdit::replace(&target.file, &target.anchor, text);
            cmd_edit(edit, &target, dry_run, diff)
        }

        Commands::Delete {
            target,
            dry_run,
            diff,
        } => {
            let edit = BlockEdit::delete(&target.file, &target.anchor);
            cmd_edit(edit, &target, dry_run, diff)
        }

        Commands::Plan {
            file,
            plan,
            dry_run,
            diff,
        } => cmd_plan(&file, &plan, dry_run, diff),
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!("{}", "...".cyan());
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", line);
                if change.missing_newline() {
                    println!();
                }
            }
        }
    }
}

/// Helper: Explain locate failures in terms the user can act on
fn print_hints(file: &Path, err: &EditError) {
    match err {
        EditError::Locate(LocateError::AnchorNotFound { .. }) => {
            eprintln!("  {}", "No line contains the anchor; file left unchanged".red());
            eprintln!("  File: {}", file.display());
            eprintln!("  Possible causes:");
            eprintln!("    - Block was renamed or already removed");
            eprintln!("    - Anchor text differs in whitespace");
            eprintln!("    - --from starts past the block");
        }
        EditError::Locate(LocateError::UnbalancedBlock { .. }) => {
            eprintln!("  {}", "Delimiters never balance; file left unchanged".red());
            eprintln!("  Delimiters inside strings or comments are counted too.");
            eprintln!("  Try --open/--close for a different delimiter pair.");
        }
        EditError::VerificationFailed { found, .. } => {
            eprintln!("  Current block text:");
            for line in found.lines() {
                eprintln!("    {}", line.dimmed());
            }
        }
        _ => {}
    }
}

fn cmd_locate(target: &Target, all: bool, json: bool) -> Result<()> {
    let source = LineSequence::parse(&read_source(&target.file)?);
    let locator = BlockLocator::new(target.delimiters()?);

    let spans = if all {
        locator.locate_all(source.lines(), &target.anchor, target.from_index())?
    } else {
        vec![locator.locate(source.lines(), &target.anchor, target.from_index())?]
    };

    if json {
        let records: Vec<_> = spans
            .iter()
            .map(|span| {
                serde_json::json!({
                    "file": target.file.display().to_string(),
                    "anchor": target.anchor,
                    "span": span,
                    "first_line": span.start + 1,
                    "last_line": span.end,
                    "xxh3": format_hash(&source.text_of(*span)),
                })
            })
            .collect();
        let output = if all {
            serde_json::to_string_pretty(&records)?
        } else {
            serde_json::to_string_pretty(&records[0])?
        };
        println!("{output}");
        return Ok(());
    }

    if spans.is_empty() {
        println!("{}", "No blocks found".yellow());
        return Ok(());
    }

    for span in &spans {
        println!(
            "{}:{}-{} {}",
            target.file.display(),
            span.start + 1,
            span.end,
            format!("xxh3 {}", format_hash(&source.text_of(*span))).dimmed()
        );
        if let Some(first) = source.lines().get(span.start) {
            println!("  {}", strip_terminator(first).trim_end());
        }
    }

    Ok(())
}

fn cmd_edit(edit: BlockEdit, target: &Target, dry_run: bool, show_diff: bool) -> Result<()> {
    let edit = edit
        .from_index(target.from_index())
        .delimiters(target.delimiters()?);
    let file = edit.file.display();

    if dry_run {
        let preview = edit.preview().unwrap_or_else(|e| fail(&edit.file, &e));
        match preview.change {
            Change::Replaced { span, inserted } => println!(
                "{} Would replace {} in {} ({} line(s) inserted)",
                "✓".green(),
                span,
                file,
                inserted
            ),
            Change::Removed { span } => {
                println!("{} Would remove {} from {}", "✓".green(), span, file)
            }
            Change::Unchanged { span } => {
                println!("{} Already applied at {} in {}", "⊙".yellow(), span, file)
            }
        }
        if show_diff && !preview.change.is_noop() {
            display_diff(&edit.file, &preview.original, &preview.modified);
        }
        return Ok(());
    }

    let before = if show_diff {
        read_source(&edit.file).ok()
    } else {
        None
    };

    let result = edit.apply().unwrap_or_else(|e| fail(&edit.file, &e));
    match &result {
        EditResult::Replaced { span, inserted, .. } => println!(
            "{} Replaced {} in {} ({} line(s) inserted)",
            "✓".green(),
            span,
            file,
            inserted
        ),
        EditResult::Removed { span, .. } => {
            println!("{} Removed {} from {}", "✓".green(), span, file)
        }
        EditResult::AlreadyApplied { span, .. } => {
            println!("{} Already applied at {} in {}", "⊙".yellow(), span, file)
        }
    }

    if let Some(before) = before {
        if !matches!(result, EditResult::AlreadyApplied { .. }) {
            let after = read_source(&edit.file)?;
            display_diff(&edit.file, &before, &after);
        }
    }

    Ok(())
}

/// Report a failed edit and exit; the file is untouched at this point.
fn fail(file: &Path, err: &EditError) -> ! {
    eprintln!("{} {}", "✗".red(), err);
    print_hints(file, err);
    std::process::exit(1);
}

fn cmd_plan(file: &Path, plan_path: &Path, dry_run: bool, show_diff: bool) -> Result<()> {
    println!("Loading edit plan from {}...", plan_path.display());
    let plan = load_from_path(plan_path)?;

    if dry_run {
        println!("{}", "  [DRY RUN - showing what would be applied]".cyan());
    }

    let result = if dry_run {
        preview_plan(&plan, file)
    } else {
        apply_plan(&plan, file)
    };

    let report = match result {
        Ok(report) => report,
        Err(PlanError::Edit { id, source }) => {
            eprintln!("{} {}: Error - {}", "✗".red(), id, source);
            print_hints(file, &source);
            eprintln!("  {}", "Plan aborted; file left unchanged".red());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let mut total_applied = 0;
    let mut total_already_applied = 0;
    let mut total_skipped = 0;

    for (id, outcome) in &report.outcomes {
        match outcome {
            PlanOutcome::Replaced { .. } | PlanOutcome::Removed { .. } => {
                println!("{} {}: {}", "✓".green(), id, outcome);
                total_applied += 1;
            }
            PlanOutcome::AlreadyApplied { .. } => {
                println!("{} {}: {}", "⊙".yellow(), id, outcome);
                total_already_applied += 1;
            }
            PlanOutcome::SkippedMissing => {
                println!("{} {}: {}", "⊘".cyan(), id, outcome);
                total_skipped += 1;
            }
        }
    }

    if show_diff && report.changed() {
        display_diff(file, &report.original, &report.modified);
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!(
        "  {} already applied",
        format!("{}", total_already_applied).yellow()
    );
    println!("  {} skipped", format!("{}", total_skipped).cyan());

    Ok(())
}
