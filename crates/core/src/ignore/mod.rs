//! Ignore rules: which audio sources never count as "other audio".

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use arc_swap::ArcSwap;

use crate::{sources::AudioSource, Result};

/// Result of running the current sources through the ignore rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub other_audio_present: bool,
    /// Sources that survived, in enumeration order.
    pub non_ignored: Vec<AudioSource>,
}

impl FilterOutcome {
    pub fn names(&self) -> Vec<&str> {
        self.non_ignored
            .iter()
            .map(|source| source.name.as_str())
            .collect()
    }
}

/// Drops every source whose lower-cased name contains a lower-cased ignore
/// entry. Order is preserved and duplicates are kept.
pub fn filter_ignored(sources: &[AudioSource], ignore: &[String]) -> FilterOutcome {
    let needles: Vec<String> = ignore
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect();

    let non_ignored: Vec<AudioSource> = sources
        .iter()
        .filter(|source| {
            let name = source.name.to_lowercase();
            !needles.iter().any(|needle| name.contains(needle.as_str()))
        })
        .cloned()
        .collect();

    FilterOutcome {
        other_audio_present: !non_ignored.is_empty(),
        non_ignored,
    }
}

/// Splits the comma separated edit format into clean entries.
pub fn parse_ignore_input(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Two-tier ignore list: the managed player's own name, which is always
/// ignored, plus user entries that can be swapped from any thread.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    builtin: Arc<Vec<String>>,
    user: Arc<ArcSwap<Vec<String>>>,
}

impl IgnoreList {
    pub fn new(player_name: impl Into<String>, user: Vec<String>) -> Self {
        Self {
            builtin: Arc::new(vec![player_name.into()]),
            user: Arc::new(ArcSwap::from_pointee(user)),
        }
    }

    /// Atomically replaces the user tier. Readers see either the old or the
    /// new list, never a mix.
    pub fn replace(&self, entries: Vec<String>) {
        tracing::info!(count = entries.len(), "ignore list updated");
        self.user.store(Arc::new(entries));
    }

    pub fn user_entries(&self) -> Arc<Vec<String>> {
        self.user.load_full()
    }

    /// Built-in entries followed by the current user entries.
    pub fn entries(&self) -> Vec<String> {
        let user = self.user.load();
        self.builtin.iter().chain(user.iter()).cloned().collect()
    }

    pub fn filter(&self, sources: &[AudioSource]) -> FilterOutcome {
        filter_ignored(sources, &self.entries())
    }

    pub fn is_ignored(&self, source: &AudioSource) -> bool {
        !self.filter(std::slice::from_ref(source)).other_audio_present
    }
}

/// Flat JSON array of user ignore entries, rewritten wholesale on save.
#[derive(Debug, Clone)]
pub struct IgnoreStore {
    path: PathBuf,
}

impl IgnoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored entries, or an empty list if nothing was saved yet.
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let entries = serde_json::from_str(&raw)?;
        Ok(entries)
    }

    pub fn save(&self, entries: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(entries)?;
        std::fs::write(&self.path, raw)?;
        tracing::debug!(path = ?self.path, count = entries.len(), "saved ignore list");
        Ok(())
    }
}
