use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notes::{
    Config, EditOutcome, ExternalEditor, ListNotesOptions, Note, NoteError, NoteService, SortOrder,
    doctor, tui,
};

/// notes - plain-text notes filed by date and indexed by tag
#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Plain-text notes filed by date and indexed by tag")]
#[command(version)]
struct Cli {
    /// Base directory holding `data/` and `tags/` (default: $NOTES_DIR or ~/.notes)
    #[arg(long, global = true, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Write a new note in the editor
    Add,

    /// Delete a note and drop it from its tags
    Remove {
        /// Note identifier, e.g. 20240301/shopping_list.md
        #[arg(value_name = "NOTE_ID")]
        id: String,
    },

    /// Open a note in the editor and re-file it
    Edit {
        /// Note identifier, e.g. 20240301/shopping_list.md
        #[arg(value_name = "NOTE_ID")]
        id: String,
    },

    /// Pick a note interactively and edit it
    Search {
        /// Only offer notes with this tag
        #[arg(short, long, value_name = "TAG")]
        tag: Option<String>,
    },

    /// Print notes, oldest first
    List(ListCommand),

    /// Print every tag with its number of notes
    Tags,

    /// Check the tag index against the notes
    Doctor {
        /// Repair the issues that can be repaired
        #[arg(long)]
        fix: bool,
    },
}

#[derive(Parser)]
struct ListCommand {
    /// Only notes with this tag
    #[arg(short, long, value_name = "TAG")]
    tag: Option<String>,

    /// Show at most this many notes
    #[arg(short = 'n', long, value_name = "N")]
    limit: Option<usize>,

    /// Newest first
    #[arg(short, long)]
    reverse: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr, filtered by `NOTES_LOG` (default `warn`).
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().filter_or("NOTES_LOG", "warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

/// Determines if an error was caused by user input rather than the system.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<NoteError>()
        .is_some_and(NoteError::is_user_error)
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env(cli.dir).context("failed to load configuration")?;
    log::debug!("using base directory {}", config.base_dir().display());
    let service = NoteService::open(config).context("failed to prepare the notes directory")?;

    match cli.command {
        Commands::Add => handle_add(&service),
        Commands::Remove { id } => handle_remove(&service, &id),
        Commands::Edit { id } => handle_edit(&service, &id),
        Commands::Search { tag } => handle_search(&service, tag),
        Commands::List(cmd) => handle_list(&service, &cmd),
        Commands::Tags => handle_tags(&service),
        Commands::Doctor { fix } => handle_doctor(&service, fix),
    }
}

fn editor_for(service: &NoteService) -> ExternalEditor {
    ExternalEditor::new(service.config().editor())
}

fn handle_add(service: &NoteService) -> Result<()> {
    let note = service.create_note(&editor_for(service))?;
    println!("{}", describe_created(&note));
    Ok(())
}

fn handle_remove(service: &NoteService, raw_id: &str) -> Result<()> {
    let id = service.resolve(raw_id)?;
    let note = service.remove_note(&id)?;
    println!("Removed {}", note.id);
    Ok(())
}

fn handle_edit(service: &NoteService, raw_id: &str) -> Result<()> {
    let id = service.resolve(raw_id)?;
    let outcome = service.edit_note(&id, &editor_for(service))?;
    println!("{}", describe_edit(&outcome));
    Ok(())
}

fn handle_search(service: &NoteService, tag: Option<String>) -> Result<()> {
    let notes = service.list_notes(ListNotesOptions {
        tag,
        ..Default::default()
    })?;
    if notes.is_empty() {
        println!("No notes found");
        return Ok(());
    }

    match tui::pick(notes)? {
        Some(id) => handle_edit(service, id.as_str()),
        None => Ok(()),
    }
}

fn handle_list(service: &NoteService, cmd: &ListCommand) -> Result<()> {
    let options = ListNotesOptions {
        tag: cmd.tag.clone(),
        limit: cmd.limit,
        order: if cmd.reverse {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        },
    };
    let notes = service.list_notes(options)?;

    if cmd.json {
        let json = serde_json::to_string_pretty(&notes).context("failed to serialize notes")?;
        println!("{json}");
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes found");
    }
    for note in &notes {
        println!("{}", format_note_line(note));
    }
    Ok(())
}

fn handle_tags(service: &NoteService) -> Result<()> {
    let counts = service.tag_counts()?;
    if counts.is_empty() {
        println!("No tags found");
    }
    for (tag, count) in counts {
        println!("{tag}\t{count}");
    }
    Ok(())
}

fn handle_doctor(service: &NoteService, fix: bool) -> Result<()> {
    let report = doctor::check(service)?;
    doctor::print_report(&report);

    if fix && !report.is_healthy() {
        let result = doctor::fix(service, &report);
        doctor::print_fix_summary(&result);
        if !result.errors.is_empty() {
            anyhow::bail!("{} repair(s) failed", result.errors.len());
        }
    }
    Ok(())
}

/// `<id>  <title>  [tag, tag]`, tags omitted when there are none.
fn format_note_line(note: &Note) -> String {
    if note.tags.is_empty() {
        format!("{}\t{}", note.id, note.title)
    } else {
        format!("{}\t{}\t[{}]", note.id, note.title, note.tag_line())
    }
}

fn describe_created(note: &Note) -> String {
    let mut line = format!("Note created (id: {})", note.id);
    if !note.tags.is_empty() {
        line.push_str(&format!(" with tags: {}", note.tag_line()));
    }
    line
}

fn describe_edit(outcome: &EditOutcome) -> String {
    match outcome {
        EditOutcome::Updated(note) => format!("Updated {}", note.id),
        EditOutcome::Renamed { from, note } => format!("Renamed {from} to {}", note.id),
    }
}
