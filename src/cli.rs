use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::catalog::{BookPatch, MoveDirection};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Catalog directory (default: $SHELFSCAN_DATA_DIR, then `library-data`).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output (`-v` debug, `-vv` trace). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Book {
        #[command(subcommand)]
        command: BookCommand,
    },
    Shelf {
        #[command(subcommand)]
        command: ShelfCommand,
    },
    /// Identify one photo and print (optionally save) the resulting draft.
    Scan(ScanArgs),
    /// Identify several photos one after another and save them together.
    Batch(BatchArgs),
    /// Write the (filtered) catalog as CSV.
    Export(ExportArgs),
    /// Totals, books per shelf and per genre.
    Stats(StatsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyEngine {
    Noop,
    Command,
    Openai,
}

#[derive(Debug, Clone, Args)]
pub struct IdentifyArgs {
    /// Identification engine.
    #[arg(long, value_enum, default_value_t = IdentifyEngine::Noop)]
    pub engine: IdentifyEngine,

    /// Program to run per call (required when --engine=command).
    #[arg(long)]
    pub command: Option<String>,

    /// Arguments passed to --command (after `--`).
    #[arg(last = true)]
    pub command_args: Vec<String>,

    /// OpenAI API base URL.
    #[arg(long, default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Model used to read photos.
    #[arg(long, default_value = "gpt-4.1-mini")]
    pub openai_model: String,

    /// Model used for metadata lookups (default: --openai-model).
    #[arg(long)]
    pub openai_metadata_model: Option<String>,

    /// Language for looked-up metadata.
    #[arg(long, default_value = "English")]
    pub language: String,

    /// Sampling temperature (ignored for GPT-5 models).
    #[arg(long, default_value_t = 0.2)]
    pub openai_temperature: f32,
}

/// Book fields as typed into the edit form.
#[derive(Debug, Clone, Default, Args)]
pub struct BookFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub isbn: Option<String>,

    #[arg(long)]
    pub publisher: Option<String>,

    #[arg(long)]
    pub year: Option<String>,

    #[arg(long)]
    pub genre: Option<String>,

    /// Shelf id.
    #[arg(long)]
    pub shelf: Option<String>,

    #[arg(long)]
    pub cover_description: Option<String>,
}

impl BookFields {
    pub fn to_patch(&self) -> BookPatch {
        BookPatch {
            isbn: self.isbn.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            publisher: self.publisher.clone(),
            year: self.year.clone(),
            genre: self.genre.clone(),
            shelf_id: self.shelf.clone(),
            cover_description: self.cover_description.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum BookCommand {
    Add(BookAddArgs),
    Edit(BookEditArgs),
    Rm(BookRmArgs),
    List(BookListArgs),
}

#[derive(Debug, Args)]
pub struct BookAddArgs {
    #[command(flatten)]
    pub fields: BookFields,
}

#[derive(Debug, Args)]
pub struct BookEditArgs {
    /// Book id.
    pub id: String,

    #[command(flatten)]
    pub fields: BookFields,
}

#[derive(Debug, Args)]
pub struct BookRmArgs {
    /// Book id.
    pub id: String,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Case-insensitive text matched against title or author.
    #[arg(long, default_value = "")]
    pub search: String,

    /// Shelf id, or `ALL`.
    #[arg(long, default_value = "ALL")]
    pub shelf: String,
}

#[derive(Debug, Args)]
pub struct BookListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print JSON instead of one line per book.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ShelfCommand {
    Add(ShelfAddArgs),
    Edit(ShelfEditArgs),
    Rm(ShelfRmArgs),
    Move(ShelfMoveArgs),
    List(ShelfListArgs),
}

#[derive(Debug, Args)]
pub struct ShelfAddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Args)]
pub struct ShelfEditArgs {
    /// Shelf id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShelfRmArgs {
    /// Shelf id.
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ShelfMoveArgs {
    /// Shelf id.
    pub id: String,

    #[arg(value_enum)]
    pub direction: MoveDirection,
}

#[derive(Debug, Args)]
pub struct ShelfListArgs {
    /// Print JSON instead of one line per shelf.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Photo of a cover, spine or barcode.
    #[arg(long)]
    pub image: PathBuf,

    /// Values that override what was identified.
    #[command(flatten)]
    pub fields: BookFields,

    /// Save the draft into the catalog.
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub identify: IdentifyArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Photos, processed in the given order.
    #[arg(long = "image", required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Shelf for every draft (default: first shelf).
    #[arg(long)]
    pub shelf: Option<String>,

    /// Identify and report, but discard the drafts.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub identify: IdentifyArgs,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output CSV path (default: `library_export_<date>.csv` in the current directory).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Overwrite an existing output file.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long)]
    pub json: bool,
}
