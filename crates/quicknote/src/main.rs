//! QuickNote CLI - offline notes with categories.

mod storage;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use quicknote_core::{
    format_relative, CategoriesViewModel, Category, CategoryStore, KeyValueStore, NoteFilter,
    NoteStore, NotesViewModel, UpdateCategory, UpdateNote, DEFAULT_PREVIEW_LEN,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use storage::{Backend, Storage};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DATA_DIR: &str = ".quicknote";
const DEFAULT_COLOR: &str = "#FF6B6B";

#[derive(Parser)]
#[command(name = "quicknote", about = "Offline notes with categories", version)]
struct Cli {
    /// Data directory (defaults to the nearest .quicknote directory)
    #[arg(long, env = "QUICKNOTE_DIR", global = true)]
    dir: Option<PathBuf>,

    /// Storage backend
    #[arg(
        long,
        env = "QUICKNOTE_BACKEND",
        value_enum,
        default_value_t = Backend::Files,
        global = true
    )]
    backend: Backend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new note store in the current directory
    Init {
        /// Delete existing data and reinitialize
        #[arg(long)]
        reinitialize: bool,
    },
    /// Add a new note
    Add {
        /// Note title (defaults to "Untitled")
        #[arg(long, default_value = "")]
        title: String,
        /// Note content (reads from stdin if not provided and stdin is not a tty)
        #[arg(long)]
        body: Option<String>,
        /// Category id or name
        #[arg(long)]
        category: Option<String>,
    },
    /// List notes, most recently updated first
    Ls {
        /// Case-insensitive text to find in title, content or category name
        #[arg(short, long, default_value = "")]
        query: String,
        /// Only show notes in these categories (comma-separated ids or names)
        #[arg(short, long)]
        category: Vec<String>,
    },
    /// Show one or more notes
    Show {
        /// Comma-separated note IDs
        ids: String,
    },
    /// Edit a note
    Edit {
        /// Note ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content (reads from stdin if not provided and stdin is not a tty)
        #[arg(long)]
        body: Option<String>,
        /// New category id or name
        #[arg(long, conflicts_with = "no_category")]
        category: Option<String>,
        /// Remove the note's category
        #[arg(long)]
        no_category: bool,
    },
    /// Delete one or more notes
    Rm {
        /// Comma-separated note IDs
        ids: String,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List all categories
    Ls,
    /// Add a category
    Add {
        /// Category name
        name: String,
        /// Display color as hex
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
    },
    /// Rename or recolor a category
    Edit {
        /// Category id or name
        category: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New color as hex
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category. Notes in it are not deleted.
    Rm {
        /// Category id or name
        category: String,
        /// Also remove the category from every note that uses it
        #[arg(long)]
        clear_notes: bool,
    },
}

/// Find the .quicknote directory by searching up from current directory
fn find_data_dir() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let data_path = current.join(DATA_DIR);
        if data_path.is_dir() {
            return Some(data_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Get the data directory path, or error if not initialized
fn get_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        if !dir.is_dir() {
            bail!(
                "Data directory {} does not exist. Run 'quicknote init' to create it.",
                dir.display()
            );
        }
        return Ok(dir);
    }
    match find_data_dir() {
        Some(dir) => Ok(dir),
        None => bail!("No .quicknote directory found. Run 'quicknote init' to initialize."),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf)
}

fn is_stdin_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Resolve a category given by id or (case-insensitive) name.
fn resolve_category<'a>(categories: &'a [Category], arg: &str) -> Result<&'a Category> {
    categories
        .iter()
        .find(|c| c.id == arg)
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(arg)))
        .with_context(|| format!("Unknown category: {}", arg))
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

async fn init(dir: Option<PathBuf>, backend: Backend, reinitialize: bool) -> Result<()> {
    let data_dir = dir.unwrap_or_else(|| PathBuf::from(DATA_DIR));

    if has_data(&data_dir) && !reinitialize {
        bail!(
            "QuickNote is already initialized here. Use --reinitialize to delete and recreate."
        );
    }

    let storage = Storage::open(backend, &data_dir)?;
    let notes = NoteStore::new(&storage);
    let categories = CategoryStore::new(&storage);
    if reinitialize {
        notes
            .reset()
            .await
            .context("Failed to delete existing notes")?;
        categories
            .reset()
            .await
            .context("Failed to delete existing categories")?;
    }
    // Listing once seeds the default categories.
    let seeded = categories.list_all().await;

    let verb = if reinitialize { "Reinitialized" } else { "Initialized" };
    println!(
        "{} quicknote in {} with {}",
        verb,
        data_dir.display(),
        plural(seeded.len(), "category", "categories")
    );
    Ok(())
}

fn has_data(data_dir: &Path) -> bool {
    std::fs::read_dir(data_dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

async fn run_category_command<S: KeyValueStore>(
    command: CategoryCommands,
    categories: &mut CategoriesViewModel<&S>,
    notes: &mut NotesViewModel<&S>,
) -> Result<()> {
    match command {
        CategoryCommands::Ls => {
            for category in categories.categories() {
                let count = notes
                    .notes()
                    .iter()
                    .filter(|n| n.category_id.as_deref() == Some(category.id.as_str()))
                    .count();
                println!(
                    "{}: {} {} ({})",
                    category.id,
                    category.name,
                    category.color,
                    plural(count, "note", "notes")
                );
            }
        }

        CategoryCommands::Add { name, color } => {
            let category = categories.create(&name, &color).await?;
            println!("Added category {} ({})", category.name, category.id);
        }

        CategoryCommands::Edit {
            category,
            name,
            color,
        } => {
            let id = resolve_category(categories.categories(), &category)?.id.clone();
            let update = UpdateCategory { name, color };
            if update.is_empty() {
                eprintln!("Nothing to update");
                std::process::exit(1);
            }
            match categories.update(&id, update).await? {
                Some(updated) => println!("Edited category {}: {}", updated.id, updated.name),
                None => bail!("Category {} not found", id),
            }
        }

        CategoryCommands::Rm {
            category,
            clear_notes,
        } => {
            let target = resolve_category(categories.categories(), &category)?.clone();
            categories.delete(&target.id).await?;
            if clear_notes {
                notes.clear_category_from_notes(&target.id).await?;
                println!(
                    "Deleted category {} and removed it from its notes",
                    target.name
                );
            } else {
                println!(
                    "Deleted category {}. Notes in this category were not deleted.",
                    target.name
                );
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Commands::Init { reinitialize } = cli.command {
        return init(cli.dir, cli.backend, reinitialize).await;
    }

    // All other commands need an initialized store
    let data_dir = get_data_dir(cli.dir)?;
    debug!(dir = %data_dir.display(), backend = ?cli.backend, "opening store");
    let storage = Storage::open(cli.backend, &data_dir)?;
    let mut categories = CategoriesViewModel::open(CategoryStore::new(&storage)).await;
    let mut notes = NotesViewModel::open(NoteStore::new(&storage)).await;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Add {
            title,
            body,
            category,
        } => {
            let body = match body {
                Some(b) => b,
                None if !is_stdin_tty() => read_stdin()?,
                None => String::new(),
            };
            let category_id = category
                .map(|c| resolve_category(categories.categories(), &c).map(|c| c.id.clone()))
                .transpose()?;
            let note = notes.create(&title, &body, category_id).await?;
            println!("Added note {}", note.id);
        }

        Commands::Ls { query, category } => {
            let selected = category
                .iter()
                .flat_map(|c| parse_list(c))
                .map(|c| resolve_category(categories.categories(), &c).map(|c| c.id.clone()))
                .collect::<Result<Vec<_>>>()?;

            let visible = NoteFilter::new()
                .with_query(query)
                .with_categories(selected)
                .apply(notes.notes(), categories.categories());

            let now = Utc::now();
            for note in &visible {
                let preview = note.preview(DEFAULT_PREVIEW_LEN);
                let category = note
                    .with_category(categories.categories())
                    .category
                    .map(|c| format!(" [{}]", c.name))
                    .unwrap_or_default();
                println!(
                    "{}: {}{} ({}) -- {}",
                    preview.id,
                    preview.title,
                    category,
                    format_relative(preview.updated_at, now),
                    preview.preview.replace(['\n', '\r'], " ")
                );
            }
            println!("{}", plural(visible.len(), "note", "notes"));
        }

        Commands::Show { ids } => {
            let ids = parse_list(&ids);
            if ids.is_empty() {
                eprintln!("No note IDs provided");
                std::process::exit(1);
            }

            let mut not_found = Vec::new();
            let mut first = true;

            for id in &ids {
                match notes.get_by_id(id) {
                    Some(note) => {
                        if !first {
                            println!("\n{}\n", "=".repeat(40));
                        }
                        first = false;

                        println!("# {}\n", note.title);
                        println!("{}", note.content);
                        println!("\n---\n");
                        println!("Created: {}", note.created_at.to_rfc3339());
                        println!("Last modified: {}", note.updated_at.to_rfc3339());
                        // A dangling category reference shows as no category
                        let category = note
                            .with_category(categories.categories())
                            .category
                            .map(|c| c.name.as_str())
                            .unwrap_or("none");
                        println!("Category: {}", category);
                    }
                    None => not_found.push(id),
                }
            }

            if !not_found.is_empty() {
                for id in &not_found {
                    eprintln!("Note {} not found", id);
                }
                std::process::exit(1);
            }
        }

        Commands::Edit {
            id,
            title,
            body,
            category,
            no_category,
        } => {
            let body = if body.is_none() && !is_stdin_tty() {
                Some(read_stdin()?)
            } else {
                body
            };
            let category_id = if no_category {
                Some(None)
            } else {
                category
                    .map(|c| {
                        resolve_category(categories.categories(), &c).map(|c| Some(c.id.clone()))
                    })
                    .transpose()?
            };

            let update = UpdateNote {
                title,
                content: body,
                category_id,
            };

            let mut updated_fields = Vec::new();
            if update.title.is_some() {
                updated_fields.push("title");
            }
            if update.content.is_some() {
                updated_fields.push("content");
            }
            if update.category_id.is_some() {
                updated_fields.push("category");
            }

            if update.is_empty() {
                eprintln!("Nothing to update");
                std::process::exit(1);
            }

            if notes.update(&id, update).await?.is_some() {
                println!("Edited note {}: Updated {}", id, updated_fields.join(", "));
            } else {
                eprintln!("Note {} not found", id);
                std::process::exit(1);
            }
        }

        Commands::Rm { ids } => {
            let ids = parse_list(&ids);
            if ids.is_empty() {
                eprintln!("No note IDs provided");
                std::process::exit(1);
            }

            let (found, not_found): (Vec<_>, Vec<_>) =
                ids.iter().partition(|id| notes.get_by_id(id).is_some());

            let deleted = notes.delete_many(&found).await?;
            println!("Deleted {}", plural(deleted, "note", "notes"));

            if !not_found.is_empty() {
                for id in &not_found {
                    eprintln!("Note {} not found", id);
                }
                std::process::exit(1);
            }
        }

        Commands::Categories { command } => {
            run_category_command(command, &mut categories, &mut notes).await?;
        }
    }

    Ok(())
}
