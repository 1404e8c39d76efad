//! SQLite stores consumed by the dictionary compiler.
//!
//! Two databases are written side by side:
//!
//! - the full store (`words` + `audio_files`) keeps every pronunciation with
//!   its speaker attribution;
//! - the simple store holds a single `mdx(entry, paraphrase)` table, which is
//!   the layout the compiler reads.
//!
//! Both are built under a `.part` name and renamed into place by
//! [`DictionaryStore::finish`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::core::pronunciation::Pronunciation;

/// Words written between commits.
pub const BATCH_SIZE: usize = 1_000;

const FULL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    language TEXT NOT NULL,
    headword TEXT NOT NULL,
    html_content TEXT NOT NULL,
    audio_count INTEGER NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(language, headword)
);
CREATE TABLE IF NOT EXISTS audio_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word_id INTEGER NOT NULL REFERENCES words(id),
    username TEXT NOT NULL,
    gender TEXT NOT NULL,
    country TEXT NOT NULL,
    votes INTEGER NOT NULL,
    file_path TEXT NOT NULL,
    download_url TEXT NOT NULL,
    audio_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_words_language_headword ON words(language, headword);
CREATE INDEX IF NOT EXISTS idx_audio_files_word_id ON audio_files(word_id);
";

const SIMPLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS mdx (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry TEXT NOT NULL,
    paraphrase TEXT NOT NULL,
    language TEXT NOT NULL,
    audio_count INTEGER NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(entry, language)
);
CREATE INDEX IF NOT EXISTS idx_mdx_entry ON mdx(entry);
CREATE INDEX IF NOT EXISTS idx_mdx_language ON mdx(language);
";

/// One dictionary entry ready to be stored.
#[derive(Debug, Clone)]
pub struct WordRecord<'a> {
    pub language: &'a str,
    pub headword: &'a str,
    pub html: &'a str,
    pub pronunciations: &'a [Pronunciation],
}

/// Row counts written by a [`DictionaryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreTotals {
    pub words: usize,
    pub audio_files: usize,
}

struct Target {
    conn: Connection,
    partial: PathBuf,
    dest: PathBuf,
}

impl Target {
    fn create(dest: &Path, schema: &str) -> Result<Self> {
        let partial = partial_path(dest);
        if partial.exists() {
            fs::remove_file(&partial)
                .with_context(|| format!("remove stale {}", partial.display()))?;
        }
        let conn = Connection::open(&partial)
            .with_context(|| format!("open {}", partial.display()))?;
        conn.execute_batch(schema)
            .with_context(|| format!("create schema in {}", partial.display()))?;
        conn.execute_batch("BEGIN")
            .with_context(|| format!("begin transaction in {}", partial.display()))?;
        Ok(Self {
            conn,
            partial,
            dest: dest.to_path_buf(),
        })
    }

    fn commit(&self, reopen: bool) -> Result<()> {
        let sql = if reopen { "COMMIT; BEGIN" } else { "COMMIT" };
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("commit {}", self.partial.display()))
    }

    fn persist(self) -> Result<()> {
        self.commit(false)?;
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .with_context(|| format!("close {}", self.partial.display()))?;
        fs::rename(&self.partial, &self.dest)
            .with_context(|| format!("move {} into place", self.partial.display()))
    }
}

/// Writer for the full and simple databases.
pub struct DictionaryStore {
    full: Target,
    simple: Target,
    pending: usize,
    totals: StoreTotals,
}

impl DictionaryStore {
    pub fn create(full_path: &Path, simple_path: &Path) -> Result<Self> {
        Ok(Self {
            full: Target::create(full_path, FULL_SCHEMA)?,
            simple: Target::create(simple_path, SIMPLE_SCHEMA)?,
            pending: 0,
            totals: StoreTotals::default(),
        })
    }

    /// Store a word, replacing an earlier row for the same headword.
    pub fn insert_word(&mut self, word: &WordRecord<'_>) -> Result<()> {
        let audio_count = word.pronunciations.len() as i64;
        self.full
            .conn
            .execute(
                "INSERT OR REPLACE INTO words (language, headword, html_content, audio_count)
                 VALUES (?1, ?2, ?3, ?4)",
                params![word.language, word.headword, word.html, audio_count],
            )
            .with_context(|| format!("insert word '{}'", word.headword))?;
        let word_id = self.full.conn.last_insert_rowid();

        let mut insert_audio = self
            .full
            .conn
            .prepare_cached(
                "INSERT INTO audio_files
                 (word_id, username, gender, country, votes, file_path, download_url, audio_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .context("prepare audio insert")?;
        for p in word.pronunciations {
            insert_audio
                .execute(params![
                    word_id,
                    p.username,
                    p.gender,
                    p.country,
                    p.votes,
                    p.file_path,
                    p.download_url,
                    p.audio_id,
                ])
                .with_context(|| format!("insert audio {} for '{}'", p.file_path, word.headword))?;
        }
        drop(insert_audio);

        self.simple
            .conn
            .execute(
                "INSERT OR REPLACE INTO mdx (entry, paraphrase, language, audio_count)
                 VALUES (?1, ?2, ?3, ?4)",
                params![word.headword, word.html, word.language, audio_count],
            )
            .with_context(|| format!("insert entry '{}'", word.headword))?;

        self.totals.words += 1;
        self.totals.audio_files += word.pronunciations.len();
        self.pending += 1;
        if self.pending >= BATCH_SIZE {
            self.full.commit(true)?;
            self.simple.commit(true)?;
            debug!(words = self.totals.words, "committed batch");
            self.pending = 0;
        }
        Ok(())
    }

    /// Commit outstanding rows and move both databases into place.
    pub fn finish(self) -> Result<StoreTotals> {
        self.full.persist()?;
        self.simple.persist()?;
        Ok(self.totals)
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
