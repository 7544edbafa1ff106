// SPDX-License-Identifier: MIT

//! Deterministic path obfuscation for privacy-safe logging.

use md5::{Digest, Md5};
use parking_lot::Mutex;
use std::collections::HashMap;

/// 64 visually distinct, memorable words (colors, animals, code words).
const WORD_LIST: [&str; 64] = [
    "Crimson", "Azure", "Emerald", "Golden", "Silver", "Violet", "Amber", "Coral", "Ivory",
    "Onyx", "Scarlet", "Teal", "Copper", "Indigo", "Jade", "Maroon", "Sage", "Bronze", "Cobalt",
    "Pearl", "Tiger", "Phoenix", "Falcon", "Raven", "Wolf", "Eagle", "Cobra", "Panther", "Lynx",
    "Hawk", "Otter", "Viper", "Crane", "Bison", "Fox", "Owl", "Elk", "Bear", "Lion", "Dove",
    "Atlas", "Beacon", "Cipher", "Delta", "Echo", "Forge", "Granite", "Harbor", "Icon", "Jetty",
    "Keystone", "Lantern", "Meridian", "Nexus", "Orbit", "Prism", "Quartz", "Ridge", "Summit",
    "Torch", "Vault", "Zenith", "Apex", "Bastion",
];

/// Per-process, per-instance path obfuscator. Segment→word mappings are
/// stable for the lifetime of the instance so repeated log lines about the
/// same path correlate, but reset on process restart (no persistence).
pub struct PathObfuscator {
    enabled: bool,
    segment_map: Mutex<HashMap<String, String>>,
}

impl PathObfuscator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, segment_map: Mutex::new(HashMap::new()) }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Obfuscate a file path with deterministic word substitutions.
    /// Returns the path unchanged when obfuscation is disabled or the path
    /// is empty. Preserves the file extension on the final segment and a
    /// leading separator.
    pub fn obfuscate(&self, path: &str) -> String {
        if !self.enabled || path.is_empty() {
            return path.to_string();
        }

        let (sep, parts) = split_path(path);
        if parts.is_empty() {
            return path.to_string();
        }

        let last = parts.len() - 1;
        let mut obfuscated = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if i == last {
                let (stem, ext) = split_extension(part);
                obfuscated.push(format!("{}{}", self.word_for(stem), ext));
            } else {
                obfuscated.push(self.word_for(part));
            }
        }

        let joined = obfuscated.join(&sep.to_string());
        if path.starts_with('/') || path.starts_with('\\') {
            format!("{sep}{joined}")
        } else {
            joined
        }
    }

    fn word_for(&self, segment: &str) -> String {
        let mut map = self.segment_map.lock();
        if let Some(word) = map.get(segment) {
            return word.clone();
        }

        let mut hasher = Md5::new();
        hasher.update(segment.as_bytes());
        let digest = hasher.finalize();
        let idx = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
            % WORD_LIST.len();
        let base = WORD_LIST[idx];

        let existing: std::collections::HashSet<&str> =
            map.values().map(|s| s.as_str()).collect();
        let word = if existing.contains(base) {
            let mut counter = 2;
            loop {
                let candidate = format!("{base}{counter}");
                if !existing.contains(candidate.as_str()) {
                    break candidate;
                }
                counter += 1;
            }
        } else {
            base.to_string()
        };

        map.insert(segment.to_string(), word.clone());
        word
    }
}

/// Split a path into its separator (`/` vs `\`) and non-empty,
/// non-root-marker segments.
fn split_path(path: &str) -> (char, Vec<&str>) {
    let sep = if path.contains('\\') { '\\' } else { '/' };
    let parts = path
        .split(sep)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();
    (sep, parts)
}

fn split_extension(segment: &str) -> (&str, &str) {
    match segment.rfind('.') {
        Some(idx) if idx > 0 => (&segment[..idx], &segment[idx..]),
        _ => (segment, ""),
    }
}

#[cfg(test)]
#[path = "obfuscate_tests.rs"]
mod tests;
