//! NovelCraft - novel-writing assistant
//!
//! Novels, their chapters, characters and world notes live as JSON documents in a
//! workspace directory, with automatic backups and soft-delete archives.

mod app;
mod core;

use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use anyhow::Result;
use app::NovelCraftApp;
use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::chapter::{Chapter, ChapterDraft, ChapterStatus, Scene};
use crate::core::character::Character;
use crate::core::config::Preferences;
use crate::core::document::Novel;
use crate::core::export::ExportFormat;
use crate::core::file_system::Workspace;
use crate::core::store::SortBy;

#[derive(Parser)]
#[command(name = "novelcraft")]
#[command(about = "Write and organise novels stored as JSON documents")]
struct Cli {
    /// Workspace directory (defaults to the platform data directory)
    #[arg(short, long, env = "NOVELCRAFT_ROOT")]
    root: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new novel
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Repeat for several genres
        #[arg(long = "genre", required = true)]
        genres: Vec<String>,
        #[arg(long, default_value = "English")]
        language: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List novels in the workspace
    List {
        /// modified, created or title
        #[arg(long, default_value = "modified")]
        sort: String,
    },
    /// Open a novel and print an overview
    Show {
        path: PathBuf,
        /// Target length in words; prints days left at the daily word goal
        #[arg(long)]
        goal: Option<u64>,
    },
    /// Copy a novel under a new title
    SaveAs { path: PathBuf, title: String },
    /// Archive a novel, or remove it for good with --permanent
    Delete {
        path: PathBuf,
        #[arg(long)]
        permanent: bool,
    },
    /// Export a novel (json, txt, pdf)
    Export { path: PathBuf, format: String },
    /// Check a novel file's structure
    Validate { path: PathBuf },
    /// Back up a novel now
    Backup { path: PathBuf },
    /// List backups, newest first
    Backups,
    /// Overwrite a novel with a backup
    Restore { backup: PathBuf, target: PathBuf },
    /// Add a chapter, or replace one with --number
    Chapter {
        path: PathBuf,
        #[arg(long)]
        title: String,
        /// Read chapter text from this file
        #[arg(long)]
        content: Option<PathBuf>,
        #[arg(long)]
        number: Option<u32>,
        /// outline, draft, revised or final
        #[arg(long, default_value = "draft")]
        status: String,
    },
    /// Remove a chapter
    DeleteChapter { path: PathBuf, number: u32 },
    /// List chapters, optionally only those at one stage
    Chapters {
        path: PathBuf,
        #[arg(long)]
        status: Option<String>,
    },
    /// Append text from stdin to a chapter, auto-saving as configured
    Write {
        path: PathBuf,
        /// Chapter to extend; a new one is started when omitted
        #[arg(long)]
        chapter: Option<u32>,
    },
    /// Add a scene to a chapter
    Scene {
        path: PathBuf,
        chapter: u32,
        #[arg(long)]
        title: String,
        /// Action, Dialogue, Description, Reflection or Transition
        #[arg(long = "type", default_value = "Action")]
        kind: String,
        #[arg(long, default_value = "")]
        purpose: String,
    },
    /// Remove a scene by its position (from 1)
    DeleteScene {
        path: PathBuf,
        chapter: u32,
        position: usize,
    },
    /// Add a character
    Character {
        path: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Supporting")]
        role: String,
    },
    /// Remove a character and every relationship pointing at it
    DeleteCharacter { path: PathBuf, name: String },
    /// Set a relationship between two characters
    Relate {
        path: PathBuf,
        a: String,
        b: String,
        #[arg(long = "type")]
        kind: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        strength: i8,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Clear the relationship between two characters
    Unrelate { path: PathBuf, a: String, b: String },
    /// Show preferences, or restore the defaults with --reset
    Prefs {
        #[arg(long)]
        reset: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let root = match cli.root {
        Some(root) => root,
        None => Workspace::default_root()?,
    };
    tracing::debug!("Workspace: {}", root.display());
    let mut app = NovelCraftApp::new(Workspace::new(root))?;

    run(&mut app, cli.command)
}

fn run(app: &mut NovelCraftApp, command: Command) -> Result<()> {
    match command {
        Command::New {
            title,
            author,
            genres,
            language,
            description,
        } => {
            let mut draft = Novel::new(title, author, genres, language);
            draft.description = description;
            let path = app.new_novel(draft)?;
            println!("{}", path.display());
        }
        Command::List { sort } => {
            let now = SystemTime::now();
            for doc in app.store.list_documents(sort.parse::<SortBy>()?) {
                let version = doc
                    .metadata
                    .as_ref()
                    .map(|m| m.version.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}\t{} by {}\t{}\tv{}\t{} bytes\t{}",
                    doc.filename,
                    doc.title,
                    doc.author,
                    doc.genre.join(", "),
                    version,
                    doc.size,
                    doc.modified_ago(now)
                );
            }
        }
        Command::Show { path, goal } => {
            app.open(&path)?;
            if let Some(novel) = app.novel() {
                print_overview(novel);
                let daily = app.preferences.writing.daily_word_goal;
                if let Some(days) = goal.and_then(|g| novel.days_to_goal(g, daily)) {
                    println!("Estimated completion: {days} days at {daily} words/day");
                }
            }
        }
        Command::SaveAs { path, title } => {
            app.open(&path)?;
            println!("{}", app.save_as(&title)?.display());
        }
        Command::Delete { path, permanent } => {
            println!("{}", app.delete(&path, !permanent)?);
        }
        Command::Export { path, format } => {
            println!("{}", app.store.export(&path, format.parse::<ExportFormat>()?)?);
        }
        Command::Validate { path } => {
            let report = app.store.validate(&path);
            println!("valid: {}", report.valid);
            for error in &report.errors {
                println!("error: {error}");
            }
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            let stats = report.statistics;
            println!(
                "chapters: {}, characters: {}, words: {}, chars: {}",
                stats.total_chapters, stats.total_characters, stats.total_words, stats.total_chars
            );
        }
        Command::Backup { path } => match app.store.create_backup(&path) {
            Some(backup) => println!("{}", backup.display()),
            None => anyhow::bail!("Backup failed for {}", path.display()),
        },
        Command::Backups => {
            println!("Keeping up to {} backups", app.store.backups().keep());
            for backup in app.store.backups().list() {
                println!("{}", backup.path.display());
            }
        }
        Command::Restore { backup, target } => {
            app.store.restore_backup(&backup, &target)?;
            println!("Restored {}", target.display());
        }
        Command::Chapter {
            path,
            title,
            content,
            number,
            status,
        } => {
            let text = match content {
                Some(file) => std::fs::read_to_string(file)?,
                None => String::new(),
            };
            let mut draft = ChapterDraft::new(title, text);
            draft.status = status.parse::<ChapterStatus>()?;
            app.open(&path)?;
            let now = app.store.now();
            let number = app.edit(|novel| Ok(novel.save_chapter(draft, number, now)))?;
            app.save()?;
            println!("Saved chapter {number}");
        }
        Command::DeleteChapter { path, number } => {
            app.open(&path)?;
            let removed = app.edit(|novel| novel.delete_chapter(number))?;
            app.save()?;
            println!("Deleted chapter {}: {}", removed.number, removed.title);
        }
        Command::Chapters { path, status } => {
            app.open(&path)?;
            let status = status.map(|s| s.parse::<ChapterStatus>()).transpose()?;
            if let Some(novel) = app.novel() {
                let chapters: Vec<&Chapter> = match status {
                    Some(status) => novel.chapters_with_status(status),
                    None => novel.chapters.iter().collect(),
                };
                for chapter in chapters {
                    println!(
                        "{}. {} [{}] {} words, {} scenes",
                        chapter.number,
                        chapter.title,
                        chapter.status,
                        chapter.word_count(),
                        chapter.scenes.len()
                    );
                }
            }
        }
        Command::Write { path, chapter } => {
            app.open(&path)?;
            let number = match chapter {
                Some(number) => number,
                None => {
                    let now = app.store.now();
                    app.edit(|novel| {
                        Ok(novel.save_chapter(ChapterDraft::new("Untitled", ""), None, now))
                    })?
                }
            };
            for line in std::io::stdin().lines() {
                let line = line?;
                app.edit(|novel| {
                    let content = &mut novel.chapter_mut(number)?.content;
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(&line);
                    Ok(())
                })?;
                if app.auto_save_tick(Instant::now())? {
                    eprintln!("Auto-saved");
                }
            }
            if app.has_unsaved_changes() {
                app.save()?;
            }
            if let Some(saved) = app.current_path() {
                println!("Chapter {number} saved to {}", saved.display());
            }
        }
        Command::Scene {
            path,
            chapter,
            title,
            kind,
            purpose,
        } => {
            app.open(&path)?;
            let scene = Scene {
                title,
                kind,
                purpose,
                ..Default::default()
            };
            let number = app.edit(|novel| novel.add_scene(chapter, scene))?;
            app.save()?;
            println!("Added scene {number} to chapter {chapter}");
        }
        Command::DeleteScene {
            path,
            chapter,
            position,
        } => {
            app.open(&path)?;
            let index = position.saturating_sub(1);
            let removed = app.edit(|novel| novel.remove_scene(chapter, index))?;
            app.save()?;
            println!("Removed scene '{}'", removed.title);
        }
        Command::DeleteCharacter { path, name } => {
            app.open(&path)?;
            app.edit(|novel| novel.remove_character(&name))?;
            app.save()?;
            println!("Removed {name}");
        }
        Command::Character { path, name, role } => {
            app.open(&path)?;
            let now = app.store.now();
            app.edit(|novel| novel.add_character(Character::new(name.as_str(), role), now))?;
            app.save()?;
            println!("Added {name}");
        }
        Command::Relate {
            path,
            a,
            b,
            kind,
            strength,
            description,
        } => {
            app.open(&path)?;
            let now = app.store.now();
            app.edit(|novel| {
                novel.set_relationship(&a, &b, &kind, strength, &description, now)
            })?;
            app.save()?;
            println!("Relationship set between {a} and {b}");
        }
        Command::Unrelate { path, a, b } => {
            app.open(&path)?;
            app.edit(|novel| novel.clear_relationship(&a, &b))?;
            app.save()?;
            println!("Relationship cleared between {a} and {b}");
        }
        Command::Prefs { reset } => {
            let prefs_path = app.store.workspace().preferences_path();
            if reset {
                app.preferences = Preferences::reset(&prefs_path)?;
            }
            println!("{}", serde_json::to_string_pretty(&app.preferences)?);
        }
    }
    Ok(())
}

fn print_overview(novel: &Novel) {
    println!("{} by {}", novel.title, novel.author);
    println!("Genre: {}  Language: {}", novel.genre.join(", "), novel.language);
    if let Some(meta) = &novel.metadata {
        println!("Version {}  ({})", meta.version, meta.file_id);
    }

    let stats = novel.stats();
    let progress = novel.outline_progress();
    println!(
        "{} chapters ({} final, {} in progress, {} outlined), {} words, {} per chapter",
        novel.chapters.len(),
        progress.completed,
        progress.in_progress,
        progress.outlined,
        stats.total_words,
        stats.average_chapter_words
    );
    for (number, words) in &stats.chapter_words {
        let title = novel
            .chapter(*number)
            .map(|c| c.title.as_str())
            .unwrap_or_default();
        println!("  {number}. {title} ({words} words)");
    }
    for character in &novel.characters {
        println!("  * {} ({})", character.name, character.role);
        for rel in novel.relationships_of(&character.name) {
            println!("      - {}: {} ({})", rel.with, rel.kind, rel.strength);
        }
    }
    for event in novel.world_building.timeline_sorted() {
        let year = event.get("year").and_then(|v| v.as_str()).unwrap_or("?");
        let title = event.get("title").and_then(|v| v.as_str()).unwrap_or("");
        println!("  [{year}] {title}");
    }
}
