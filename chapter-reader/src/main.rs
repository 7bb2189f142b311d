//! chapter-reader - Split book text into chapters and track reading progress

use anyhow::{Context, Result};
use chapter_reader::config::{BookConfig, ReaderConfig};
use chapter_reader::ledger::{FinishOutcome, JsonLedger, RewardLedger, finish_book};
use chapter_reader::loader::{ChapterLoader, ChapterOrigin, LoadedChapters, ReadingDesk};
use chapter_reader::progress::{
    ChapterChange, ChapterProgression, CompletionOutcome, JsonProgressStore, ProgressStore,
    ProgressionState,
};
use chapter_reader::text::Segmenter;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "chapter-reader")]
#[command(about = "Split book text into chapters and track reading progress", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a text file into chapters
    Segment {
        /// Path to a plain text file
        file: PathBuf,

        /// Print chapters as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    #[command(flatten)]
    Book(BookCommand),
}

/// Commands that act on one catalog book
#[derive(Subcommand, Debug)]
enum BookCommand {
    /// List a book's chapters and their unlock status
    Chapters {
        /// Book id from the catalog
        book: String,

        /// Refetch the document even if cached
        #[arg(long)]
        force: bool,
    },
    /// Open a book at its current chapter
    Open { book: String },
    /// Move to a chapter (0-based index)
    Goto {
        book: String,
        #[arg(allow_hyphen_values = true)]
        index: i64,
    },
    /// Mark a chapter (0-based index) complete
    Complete {
        book: String,
        #[arg(allow_hyphen_values = true)]
        index: i64,
    },
    /// Mark the whole book complete and collect the reward
    Finish { book: String },
    /// Take ownership of a book, unlocking its first chapter
    Acquire { book: String },
    /// Show progress for a book
    Status { book: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Add or replace a book in the catalog
    AddBook {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        page_id: Option<String>,
        /// Synopsis text, or @path to read it from a file
        #[arg(long)]
        synopsis: Option<String>,
    },
    /// Configure the document source
    SetSource {
        /// Source kind (none, http, directory)
        kind: String,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        directory: Option<PathBuf>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match &args.command {
        Commands::Segment { file, json } => handle_segment(file, *json),
        Commands::Config { action } => handle_config_command(action),
        Commands::Book(command) => {
            let config = ReaderConfig::load().context("Failed to load configuration")?;
            let mut app = App::new(config)?;
            app.run(command).await
        }
    }
}

fn handle_segment(file: &Path, json: bool) -> Result<()> {
    let config = ReaderConfig::load().context("Failed to load configuration")?;
    let patterns = config.heading_patterns()?;
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let chapters = Segmenter::new(&patterns).segment(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&chapters)?);
        return Ok(());
    }

    if chapters.is_empty() {
        eprintln!("No chapter structure found in {}", file.display());
        return Ok(());
    }
    for (i, chapter) in chapters.iter().enumerate() {
        println!("== {} ==", chapter.display_title(i));
        println!("{}", chapter.body);
        println!();
    }
    Ok(())
}

struct App {
    config: ReaderConfig,
    store: JsonProgressStore,
    ledger: JsonLedger,
    loader: ChapterLoader,
    desk: ReadingDesk,
}

impl App {
    fn new(config: ReaderConfig) -> Result<Self> {
        let data_dir = config.data_dir()?;
        log::debug!("Data directory: {}", data_dir.display());

        let store = JsonProgressStore::open(data_dir.join("progress"))?;
        let ledger = JsonLedger::open(&data_dir)?;
        let source = doc_source::get_source(&config.source)
            .context("Failed to configure document source")?;
        if let Some(source) = &source {
            match source.is_available() {
                Ok(()) => log::debug!("Document source: {}", source.name()),
                Err(e) => log::warn!("{} unavailable: {}", source.name(), e),
            }
        }
        let source = source.map(Arc::from);
        let loader = ChapterLoader::new(source, config.heading_patterns()?);

        Ok(Self {
            config,
            store,
            ledger,
            loader,
            desk: ReadingDesk::new(),
        })
    }

    fn book(&self, id: &str) -> Result<BookConfig> {
        self.config.get_book(id).cloned().ok_or_else(|| {
            anyhow::anyhow!("Unknown book: {}. Add it with 'chapter-reader config add-book'.", id)
        })
    }

    async fn chapters_for(&mut self, book: &BookConfig, force: bool) -> Result<LoadedChapters> {
        let ticket = self.desk.select(&book.id);
        let loaded = self.loader.load(book, force).await;
        if let Some(error) = loaded.error {
            eprintln!("Note: using fallback content for {} ({})", book.id, error);
        }
        if !self.desk.accept(ticket, loaded) {
            anyhow::bail!("Chapter load for {} was superseded", book.id);
        }
        self.desk
            .chapters()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No chapters loaded for {}", book.id))
    }

    fn progression(&self, book_id: &str, chapter_count: usize) -> Result<ChapterProgression> {
        let progress = self.store.load_progress(book_id)?;
        let mut progression = ChapterProgression::new(
            book_id,
            progress,
            self.ledger.is_owned(book_id),
            self.ledger.is_book_completed(book_id),
        );
        progression.sync_chapter_count(chapter_count);
        Ok(progression)
    }

    fn save(&self, progression: &ChapterProgression) -> Result<()> {
        self.store
            .save_progress(progression.book_id(), progression.progress())
            .with_context(|| format!("Failed to save progress for {}", progression.book_id()))?;
        Ok(())
    }

    async fn run(&mut self, command: &BookCommand) -> Result<()> {
        match command {
            BookCommand::Chapters { book, force } => {
                let book = self.book(book)?;
                let loaded = self.chapters_for(&book, *force).await?;
                let progression = self.progression(&book.id, loaded.count())?;
                print_chapters(&book, &loaded, &progression);
            }
            BookCommand::Open { book } => {
                let book = self.book(book)?;
                let loaded = self.chapters_for(&book, false).await?;
                let count = loaded.count();
                let mut progression = self.progression(&book.id, count)?;

                match progression.open(Some(count)) {
                    ProgressionState::Locked => {
                        println!(
                            "{} is locked. Run 'chapter-reader acquire {}' first.",
                            book.display_title(),
                            book.id
                        );
                        return Ok(());
                    }
                    ProgressionState::Unlocked { .. } if count == 0 => {
                        println!("{} has no chapters yet.", book.display_title());
                    }
                    ProgressionState::Unlocked { .. } => {
                        let active = progression.active_index(count) as usize;
                        let chapter = &loaded.chapters[active];
                        println!("{} [{}/{}]", book.display_title(), active + 1, count);
                        println!("== {} ==", chapter.display_title(active));
                        println!("{}", chapter.body);
                    }
                }
                self.save(&progression)?;
            }
            BookCommand::Goto { book, index } => {
                let book = self.book(book)?;
                let count = self.chapters_for(&book, false).await?.count();
                let mut progression = self.progression(&book.id, count)?;

                match progression.change_chapter(*index, count) {
                    ChapterChange::Moved { to, .. } => {
                        self.save(&progression)?;
                        println!("Moved to chapter {}", to);
                    }
                    ChapterChange::Unchanged => println!("Already at chapter {}", index),
                    ChapterChange::Rejected(reason) => println!("Cannot move: {}", reason),
                }
            }
            BookCommand::Complete { book, index } => {
                let book = self.book(book)?;
                let count = self.chapters_for(&book, false).await?.count();
                let mut progression = self.progression(&book.id, count)?;

                match progression.complete_chapter(*index, count) {
                    CompletionOutcome::Completed(event) => {
                        self.save(&progression)?;
                        println!("Completed chapter {}", event.index);
                        if event.book_finishable {
                            println!(
                                "Last chapter done. Run 'chapter-reader finish {}' to claim the reward.",
                                book.id
                            );
                        } else if !event.final_chapter {
                            println!("Next: chapter {}", event.next_active);
                        }
                    }
                    CompletionOutcome::AlreadyDone => {
                        println!("Chapter {} is already complete", index)
                    }
                    CompletionOutcome::Rejected(reason) => println!("Cannot complete: {}", reason),
                }
            }
            BookCommand::Finish { book } => {
                let book = self.book(book)?;
                let count = self.chapters_for(&book, false).await?.count();
                let mut progression = self.progression(&book.id, count)?;

                match finish_book(&mut progression, count, &mut self.ledger)? {
                    FinishOutcome::Finished { tokens } => {
                        println!(
                            "Finished {}! +{} tokens (balance {})",
                            book.display_title(),
                            tokens,
                            self.ledger.tokens()
                        );
                    }
                    FinishOutcome::AlreadyCompleted => {
                        println!("{} is already complete", book.display_title())
                    }
                    FinishOutcome::NotFinishable => {
                        println!(
                            "{} cannot be finished yet: complete every chapter first",
                            book.display_title()
                        );
                    }
                }
            }
            BookCommand::Acquire { book } => {
                let book = self.book(book)?;
                let count = self.chapters_for(&book, false).await?.count();
                let mut progression = self.progression(&book.id, count)?;

                if !self.ledger.grant_ownership(&book.id)? {
                    println!("You already own {}", book.display_title());
                    return Ok(());
                }
                progression.grant_ownership();
                progression.open(Some(count));
                self.save(&progression)?;
                println!("Acquired {}", book.display_title());
            }
            BookCommand::Status { book } => {
                let book = self.book(book)?;
                let count = self.chapters_for(&book, false).await?.count();
                let progression = self.progression(&book.id, count)?;
                print_status(&book, count, &progression);
            }
        }
        Ok(())
    }
}

fn print_chapters(book: &BookConfig, loaded: &LoadedChapters, progression: &ChapterProgression) {
    let origin = match loaded.origin {
        ChapterOrigin::Document => "document",
        ChapterOrigin::Fallback => "synopsis",
    };
    println!("{} ({} chapters, from {})", book.display_title(), loaded.count(), origin);

    let active = progression.active_index(loaded.count());
    for (i, chapter) in loaded.chapters.iter().enumerate() {
        let marker = if progression.is_owned() && i as i64 == active { ">" } else { " " };
        println!(
            "{} {:>3}  {:<10} {}",
            marker,
            i,
            progression.chapter_status(i, loaded.count()).to_string(),
            chapter.display_title(i)
        );
    }
}

fn print_status(book: &BookConfig, count: usize, progression: &ChapterProgression) {
    println!("Book: {} ({})", book.display_title(), book.id);
    match progression.state() {
        ProgressionState::Locked => println!("Status: locked"),
        ProgressionState::Unlocked { completed, .. } => {
            println!("Chapters: {}", count);
            let completed = if completed < 0 {
                "none".to_string()
            } else {
                completed.to_string()
            };
            println!("Completed through: {}", completed);
            println!("Active chapter: {}", progression.active_index(count));
            println!("Unlocked through: {}", progression.unlock_frontier(count));
            println!("Progress: {:.0}%", progression.reading_fraction(count) * 100.0);
            println!(
                "Last updated: {}",
                progression.progress().updated_at().format("%Y-%m-%d %H:%M UTC")
            );
            if progression.is_book_completed() {
                println!("Book complete");
            } else if progression.can_finish_book(count) {
                println!("Ready to finish");
            }
        }
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ReaderConfig::load()?;
            println!("Configuration file: {:?}", ReaderConfig::config_path()?);
            println!();
            println!("data_dir = \"{}\"", config.data_dir()?.display());
            println!("source.kind = \"{}\"", config.source.kind);
            if let Some(url) = &config.source.base_url {
                println!("source.base_url = \"{}\"", url);
            }
            if let Some(dir) = &config.source.directory {
                println!("source.directory = \"{}\"", dir.display());
            }
            println!(
                "source.token = {}",
                if config.source.resolve_api_key().is_some() { "(set)" } else { "(none)" }
            );
            if !config.extra_keywords.is_empty() {
                println!("extra_keywords = {:?}", config.extra_keywords);
            }
            println!();
            println!("Books ({}):", config.books.len());
            for book in &config.books {
                println!(
                    "  {} - {} (page: {})",
                    book.id,
                    book.display_title(),
                    book.page_id.as_deref().unwrap_or("none")
                );
            }
        }
        ConfigAction::Path => {
            println!("{}", ReaderConfig::config_path()?.display());
        }
        ConfigAction::AddBook {
            id,
            title,
            page_id,
            synopsis,
        } => {
            let mut config = ReaderConfig::load()?;
            let mut book = config.get_book(id).cloned().unwrap_or_else(|| BookConfig::new(id));
            if let Some(title) = title {
                book.title = title.clone();
            }
            if let Some(page_id) = page_id {
                book.page_id = Some(page_id.clone()).filter(|p| !p.is_empty());
            }
            if let Some(synopsis) = synopsis {
                book.synopsis = match synopsis.strip_prefix('@') {
                    Some(path) => fs::read_to_string(path)
                        .with_context(|| format!("Failed to read synopsis from {}", path))?,
                    None => synopsis.clone(),
                };
            }
            config.add_book(book);
            config.save()?;
            println!("Saved book: {}", id);
        }
        ConfigAction::SetSource {
            kind,
            base_url,
            directory,
            timeout_secs,
        } => {
            doc_source::SourceKind::parse(kind)?;
            let mut config = ReaderConfig::load()?;
            config.source.kind = kind.to_lowercase();
            if base_url.is_some() {
                config.source.base_url = base_url.clone();
            }
            if directory.is_some() {
                config.source.directory = directory.clone();
            }
            if let Some(timeout) = timeout_secs {
                config.source.timeout_secs = *timeout;
            }
            doc_source::get_source(&config.source).context("Invalid source configuration")?;
            config.save()?;
            println!("Document source set to: {}", config.source.kind);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_commands_parse() {
        let args = Args::try_parse_from(["chapter-reader", "goto", "atomic-habits", "-1"]).unwrap();
        match args.command {
            Commands::Book(BookCommand::Goto { book, index }) => {
                assert_eq!(book, "atomic-habits");
                assert_eq!(index, -1);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::try_parse_from(["chapter-reader", "chapters", "b", "--force"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Book(BookCommand::Chapters { force: true, .. })
        ));
    }

    #[test]
    fn test_top_level_commands_parse() {
        let args = Args::try_parse_from(["chapter-reader", "--debug", "segment", "book.txt"]).unwrap();
        assert!(args.debug);
        assert!(matches!(args.command, Commands::Segment { json: false, .. }));

        let args = Args::try_parse_from(["chapter-reader", "config", "path"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
