//! Parser for the Goodreads CSV exports.
//!
//! - books.csv: many columns; only `id`, `title` and `authors` are read
//! - ratings.csv: `user_id`, `book_id`, `rating` (any column order)
//!
//! Columns are matched by header name, so extra columns are ignored and a
//! reordered export still loads. Both files may start with a UTF-8 BOM.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

const BOM: char = '\u{feff}';

/// Row of books.csv as it appears on disk
#[derive(Debug, Deserialize)]
struct BookRecord {
    id: BookId,
    title: String,
    authors: String,
}

/// Row of ratings.csv as it appears on disk
#[derive(Debug, Deserialize)]
struct RatingRecord {
    user_id: UserId,
    book_id: BookId,
    rating: Score,
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Open a CSV file and normalise its header row
fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            file: file_label(path),
            source,
        })?
        .clone();
    let cleaned: csv::StringRecord = headers
        .iter()
        .map(|h| h.trim_start_matches(BOM).trim())
        .collect();
    reader.set_headers(cleaned);

    Ok(reader)
}

/// Convert a per-record csv error into a located `ParseError`
fn record_error(file: &str, fallback_line: usize, err: csv::Error) -> DataLoadError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: err.to_string(),
    }
}

/// Parse the books.csv file
///
/// Titles are cleaned with [`clean_title`] on the way in.
pub fn parse_books(path: &Path) -> Result<Vec<Book>> {
    let file = file_label(path);
    let mut reader = open_csv(path)?;
    let mut books = Vec::new();

    for (idx, record) in reader.deserialize::<BookRecord>().enumerate() {
        // header is line 1
        let record = record.map_err(|e| record_error(&file, idx + 2, e))?;
        books.push(Book {
            id: record.id,
            title: clean_title(&record.title),
            authors: record.authors,
        });
    }

    Ok(books)
}

/// Parse the ratings.csv file
///
/// Duplicates are kept here; `RatingIndex::from_ratings` resolves them.
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = file_label(path);
    let mut reader = open_csv(path)?;
    let mut ratings = Vec::new();

    for (idx, record) in reader.deserialize::<RatingRecord>().enumerate() {
        let record = record.map_err(|e| record_error(&file, idx + 2, e))?;
        ratings.push(Rating {
            user_id: record.user_id,
            book_id: record.book_id,
            score: record.rating,
        });
    }

    Ok(ratings)
}

/// Strip a parenthetical subtitle and trailing whitespace from a title
///
/// Everything from the first `(` to the last `)` is removed, so
/// "The Hunger Games (The Hunger Games, #1)" becomes "The Hunger Games".
/// A title with no closing parenthesis after the opening one is left as is
/// (apart from the trailing whitespace).
pub fn clean_title(title: &str) -> String {
    let cleaned = match (title.find('('), title.rfind(')')) {
        (Some(start), Some(end)) if start < end => {
            let mut out = String::with_capacity(title.len());
            out.push_str(&title[..start]);
            out.push_str(&title[end + 1..]);
            out
        }
        _ => title.to_string(),
    };
    cleaned.trim_end().to_string()
}
