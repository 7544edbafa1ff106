// SPDX-License-Identifier: MIT

//! Fuzzy filename matcher: title search plus filename verification.

use crate::adapters::{LibraryRef, TargetApi, TargetItem};
use ssync_core::model::{MatchConfidence, MatchResult, TargetItemRef};
use ssync_core::error::SyncError;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static QUALITY_SUFFIX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?i)\s*[-_]\s*(WEBDL|WEB-DL|HDTV|BluRay|BDRip|DVDRip|720p|1080p|2160p|4K).*$",
    )
    .expect("static matcher regex is valid")
});

#[allow(clippy::expect_used)]
static DATE_SUFFIX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\s*[-_]\s*\d{4}-\d{2}-\d{2}$").expect("static matcher regex is valid")
});

/// Derives a clean search title (and the date-stripped base title) from a
/// filename stem.
fn clean_titles(stem: &str) -> (String, String) {
    let title_search = QUALITY_SUFFIX.replace(stem, "").to_string();
    let title_base = DATE_SUFFIX.replace(&title_search, "").to_string();
    (title_search, title_base)
}

fn file_name(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

/// An item "has" a file if any of its media parts ends with the query
/// filename, compared case-insensitively and stripping the path separator.
fn item_has_file(item: &TargetItem, filename_lower: &str) -> bool {
    item.file_paths.iter().any(|file_path| {
        let lower = file_path.to_lowercase();
        lower.ends_with(&format!("/{filename_lower}"))
            || lower.ends_with(&format!("\\{filename_lower}"))
            || file_name(&lower) == filename_lower
    })
}

pub struct Matcher<'a> {
    target: &'a dyn TargetApi,
}

impl<'a> Matcher<'a> {
    pub fn new(target: &'a dyn TargetApi) -> Self {
        Self { target }
    }

    /// Locate the Target item matching `source_path` within `library`.
    /// Returns `Err(SyncError::NotFound)` when nothing matches at all (the
    /// caller routes this through the normal retry ladder).
    pub async fn find(&self, library: &LibraryRef, source_path: &str) -> Result<MatchResult, SyncError> {
        let filename = file_name(source_path);
        let filename_lower = filename.to_lowercase();

        let stem = filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&filename);
        let (title_search, title_base) = clean_titles(stem);

        let mut candidates = self.search_matching(library, &title_search, &filename_lower).await?;

        if candidates.is_empty() && title_base != title_search {
            candidates = self.search_matching(library, &title_base, &filename_lower).await?;
        }

        match candidates.len() {
            0 => Err(SyncError::not_found(format!("no target item found for filename: {filename}"))),
            1 => {
                let chosen = to_ref(library, &candidates[0]);
                Ok(MatchResult {
                    confidence: MatchConfidence::High,
                    chosen_item: Some(chosen),
                    candidates: candidates.iter().map(|c| to_ref(library, c)).collect(),
                })
            }
            _ => Ok(MatchResult {
                confidence: MatchConfidence::Low,
                chosen_item: None,
                candidates: candidates.iter().map(|c| to_ref(library, c)).collect(),
            }),
        }
    }

    async fn search_matching(
        &self,
        library: &LibraryRef,
        title: &str,
        filename_lower: &str,
    ) -> Result<Vec<TargetItem>, SyncError> {
        let results = self.target.search(library, title).await?;
        Ok(results.into_iter().filter(|item| item_has_file(item, filename_lower)).collect())
    }
}

fn to_ref(library: &LibraryRef, item: &TargetItem) -> TargetItemRef {
    TargetItemRef {
        item_id: item.key.clone(),
        library: library.name.clone(),
        file_names: item.file_paths.iter().map(|p| file_name(p)).collect(),
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
