use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const DEFAULT_GENRE: &str = "Other";
pub const UNKNOWN_SHELF: &str = "Unknown Shelf";

pub const GENRES: &[&str] = &[
    "Science Fiction",
    "Novel",
    "History",
    "Philosophy",
    "Comics",
    DEFAULT_GENRE,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: String,
    pub genre: String,
    pub shelf_id: String,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_description: Option<String>,
}

impl Book {
    pub fn to_draft(&self) -> BookDraft {
        BookDraft {
            isbn: self.isbn.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            publisher: self.publisher.clone(),
            year: self.year.clone(),
            genre: self.genre.clone(),
            shelf_id: self.shelf_id.clone(),
            cover_description: self.cover_description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shelf {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Shelf {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn defaults() -> Vec<Shelf> {
        vec![
            Shelf::new("shelf-1", "Billy Left - Shelf 1", "Left bookcase, top shelf"),
            Shelf::new("shelf-2", "Billy Left - Shelf 2", "Left bookcase, 2nd shelf"),
            Shelf::new("shelf-3", "Billy Middle - Shelf 1", "Middle bookcase, top shelf"),
        ]
    }
}

/// Editable, not yet saved book record (the edit form).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: String,
    pub genre: String,
    pub shelf_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_description: Option<String>,
}

impl BookDraft {
    pub fn for_shelf(shelf_id: impl Into<String>) -> Self {
        Self {
            shelf_id: shelf_id.into(),
            ..Self::default()
        }
    }

    pub fn is_committable(&self) -> bool {
        !self.title.trim().is_empty() && !self.shelf_id.trim().is_empty()
    }

    /// Overwrites every field the patch carries, including blank values.
    pub fn apply(&mut self, patch: &BookPatch) {
        let BookPatch {
            isbn,
            title,
            author,
            publisher,
            year,
            genre,
            shelf_id,
            cover_description,
        } = patch;
        assign(&mut self.isbn, isbn);
        assign(&mut self.title, title);
        assign(&mut self.author, author);
        assign(&mut self.publisher, publisher);
        assign(&mut self.year, year);
        assign(&mut self.genre, genre);
        assign(&mut self.shelf_id, shelf_id);
        if let Some(cover) = cover_description {
            self.cover_description = Some(cover.clone());
        }
    }

    /// Enrichment merge: every field the patch carries wins, blanks
    /// included, except ISBN and shelf which only a non-blank value replaces.
    pub fn enrich(&mut self, patch: &BookPatch) {
        let guarded = BookPatch {
            isbn: non_blank(&patch.isbn).map(str::to_owned),
            shelf_id: non_blank(&patch.shelf_id).map(str::to_owned),
            ..patch.clone()
        };
        self.apply(&guarded);
    }

    /// Stamps id and creation time, filling the fallback labels.
    pub fn into_book(self, id: String, added_at: DateTime<Utc>) -> Book {
        Book {
            id,
            isbn: self.isbn,
            title: self.title,
            author: or_fallback(self.author, UNKNOWN_AUTHOR),
            publisher: self.publisher,
            year: self.year,
            genre: or_fallback(self.genre, DEFAULT_GENRE),
            shelf_id: self.shelf_id,
            added_at,
            cover_description: self.cover_description,
        }
    }
}

/// Partial book record: enrichment results and edit-form changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_description: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn assign(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn or_fallback(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_owned()
    } else {
        value
    }
}
