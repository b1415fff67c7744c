//! Library index
//!
//! One-time scan of the source folder into an ordered list of tracks. The
//! order is whatever the listing command prints and never changes while the
//! process runs, so position `i + 1` is always the track that follows `i`.

use std::collections::HashMap;

use remplay_common::{CommandTemplate, ProcessError, ProcessRunner};
use thiserror::Error;
use tracing::{debug, info};

/// File extensions recognized as playable
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3"];

/// Library scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// The listing command failed
    #[error("Listing '{root}' failed: {source}")]
    Listing {
        root: String,
        #[source]
        source: ProcessError,
    },
}

/// One playable audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Index within the library order
    pub position: usize,
    /// Absolute path handed to the player
    pub path: String,
    /// Path relative to the source root, shown to and sent back by clients
    pub short_path: String,
}

impl Track {
    /// Leading folder of the short path (the artist, by convention)
    pub fn artist(&self) -> Option<&str> {
        let mut segments = self.short_path.split('/');
        let first = segments.next()?;
        segments.next().map(|_| first)
    }

    /// Second folder of the short path (the album, by convention)
    pub fn album(&self) -> Option<&str> {
        let segments: Vec<&str> = self.short_path.split('/').collect();
        if segments.len() >= 3 {
            Some(segments[1])
        } else {
            None
        }
    }
}

/// Ordered, immutable set of tracks
#[derive(Debug, Default)]
pub struct LibraryIndex {
    root: String,
    tracks: Vec<Track>,
    by_short_path: HashMap<String, usize>,
}

impl LibraryIndex {
    /// Build an index from line-oriented listing output
    ///
    /// Lines that do not end in an audio extension, or that do not contain
    /// `root`, are skipped. Anything before the first occurrence of `root`
    /// on a line (tree drawing characters) is dropped.
    pub fn from_listing(root: &str, listing: &str) -> Self {
        let prefix = format!("{}/", root.trim_end_matches('/'));
        let mut tracks = Vec::new();
        let mut by_short_path = HashMap::new();

        for line in listing.lines() {
            let line = line.trim_end();
            if !is_audio_file(line) {
                continue;
            }
            let Some(start) = line.find(&prefix) else {
                debug!(line, "Skipping listing line outside source root");
                continue;
            };

            let path = &line[start..];
            let short_path = &path[prefix.len()..];
            if by_short_path.contains_key(short_path) {
                continue;
            }

            let position = tracks.len();
            by_short_path.insert(short_path.to_string(), position);
            tracks.push(Track {
                position,
                path: path.to_string(),
                short_path: short_path.to_string(),
            });
        }

        Self {
            root: root.to_string(),
            tracks,
            by_short_path,
        }
    }

    /// Index with no tracks, used when the scan fails
    pub fn empty(root: &str) -> Self {
        Self {
            root: root.to_string(),
            ..Self::default()
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Track> {
        self.tracks.get(position)
    }

    pub fn find_by_short_path(&self, short_path: &str) -> Option<&Track> {
        self.by_short_path
            .get(short_path)
            .and_then(|&position| self.tracks.get(position))
    }

    /// Track after `position`, or None at the end of the library
    pub fn successor(&self, position: usize) -> Option<&Track> {
        self.tracks.get(position.checked_add(1)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }
}

fn is_audio_file(line: &str) -> bool {
    AUDIO_EXTENSIONS.iter().any(|ext| line.ends_with(ext))
}

/// Scan `root` with the listing command and index the result
pub async fn build_index(
    runner: &dyn ProcessRunner,
    list_command: &CommandTemplate,
    root: &str,
) -> Result<LibraryIndex, ScanError> {
    let invocation = list_command.render(&[("root", root)]);
    info!(command = %invocation, "Scanning library");

    let listing = runner
        .run(&invocation, None)
        .await
        .map_err(|source| ScanError::Listing {
            root: root.to_string(),
            source,
        })?;

    let index = LibraryIndex::from_listing(root, &listing);
    info!(tracks = index.len(), root, "Library indexed");
    Ok(index)
}
