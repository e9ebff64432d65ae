use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

/// Section names whose content is retained; every other bracketed section is skipped.
pub const RECOGNIZED_SECTIONS: [&str; 9] = [
    "MOLDEN FORMAT",
    "Atoms",
    "N_GEO",
    "GEOCONV",
    "GEOMETRIES",
    "FREQ",
    "FR-COORD",
    "FR-NORM-COORD",
    "INT",
];

#[derive(Debug, Error)]
pub enum SectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Required section [{0}] is missing")]
    MissingSection(String),
}

/// Raw text of the recognized sections of a Molden file, keyed by section name.
///
/// Names are case- and whitespace-sensitive. A section's text is every line following
/// its header up to the next header, each terminated by `'\n'`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoldenSections {
    sections: HashMap<String, String>,
}

impl MoldenSections {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Returns the section text or a [`SectionError::MissingSection`].
    pub fn require(&self, name: &str) -> Result<&str, SectionError> {
        self.get(name)
            .ok_or_else(|| SectionError::MissingSection(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReaderState {
    SeekingTag,
    Accumulating(String),
    Skipping,
}

/// Line-driven tokenizer splitting Molden text into [`MoldenSections`].
///
/// Lines before the first header are ignored. A repeated recognized header restarts
/// that section with empty text.
#[derive(Debug)]
pub struct SectionedTextReader {
    state: ReaderState,
    sections: HashMap<String, String>,
}

impl Default for SectionedTextReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionedTextReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::SeekingTag,
            sections: HashMap::new(),
        }
    }

    /// Feeds one line, without its terminator.
    pub fn feed_line(&mut self, line: &str) {
        if let Some(tag) = section_tag(line) {
            self.state = if RECOGNIZED_SECTIONS.contains(&tag) {
                self.sections.insert(tag.to_string(), String::new());
                ReaderState::Accumulating(tag.to_string())
            } else {
                ReaderState::Skipping
            };
            return;
        }

        if let ReaderState::Accumulating(tag) = &self.state {
            if let Some(text) = self.sections.get_mut(tag) {
                text.push_str(line);
                text.push('\n');
            }
        }
    }

    pub fn finish(self) -> MoldenSections {
        debug!(
            sections = self.sections.len(),
            "Finished splitting Molden text into sections."
        );
        MoldenSections {
            sections: self.sections,
        }
    }

    /// Reads the whole stream; hitting the end before any header yields an empty mapping.
    pub fn read_from(reader: &mut impl BufRead) -> Result<MoldenSections, SectionError> {
        let mut tokenizer = Self::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            tokenizer.feed_line(line.trim_end_matches(['\n', '\r']));
        }
        Ok(tokenizer.finish())
    }

    pub fn parse_str(text: &str) -> MoldenSections {
        let mut tokenizer = Self::new();
        for line in text.lines() {
            tokenizer.feed_line(line);
        }
        tokenizer.finish()
    }
}

/// Extracts the text between the first `[` and the last `]` of a line.
fn section_tag(line: &str) -> Option<&str> {
    let start = line.find('[')?;
    let end = line.rfind(']')?;
    (end > start).then(|| &line[start + 1..end])
}
