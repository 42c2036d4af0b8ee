//! Game record type and its field limits

use serde::{Deserialize, Serialize};

/// Box art used when a record has no `<image>` entry
pub const DEFAULT_BOX_IMAGE: &str = "box_image.png";

/// Release year shown when a record has no `<year>` entry
pub const DEFAULT_YEAR_TEXT: &str = "19XX";

pub const MAX_GENRES: usize = 2;
pub const MAX_INFO_LINES: usize = 5;

pub const TITLE_MAX_CHARS: usize = 63;
pub const ROM_MAX_CHARS: usize = 127;
pub const IMAGE_MAX_CHARS: usize = 127;
pub const INFO_LINE_MAX_CHARS: usize = 63;
pub const YEAR_MAX_CHARS: usize = 4;
pub const GENRE_MAX_CHARS: usize = 31;

/// One playable title in the catalog
///
/// Only records that carried both a title and a ROM path when their
/// `</record>` tag closed ever reach the [`CatalogStore`](super::CatalogStore).
/// Optional fields stay `None` when the document omits them; the accessors
/// substitute the display defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub title: String,
    pub rom: String,
    pub image: Option<String>,
    pub year: Option<String>,
    pub genres: Vec<String>,
    pub info_lines: Vec<String>,
}

impl GameRecord {
    /// Box art path, falling back to [`DEFAULT_BOX_IMAGE`]
    pub fn image_path(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_BOX_IMAGE)
    }

    /// Release year, falling back to [`DEFAULT_YEAR_TEXT`]
    pub fn year_text(&self) -> &str {
        self.year.as_deref().unwrap_or(DEFAULT_YEAR_TEXT)
    }
}

/// Copies at most `max_chars` characters of `text` into a new string.
pub(crate) fn bounded(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_apply_to_absent_fields() {
        let mut record = GameRecord {
            title: "Pilotwings".to_string(),
            rom: "pilotwings.smc".to_string(),
            ..Default::default()
        };
        assert_eq!(record.image_path(), DEFAULT_BOX_IMAGE);
        assert_eq!(record.year_text(), DEFAULT_YEAR_TEXT);

        record.year = Some("1990".to_string());
        record.image = Some("boxes/pilotwings.png".to_string());
        assert_eq!(record.year_text(), "1990");
        assert_eq!(record.image_path(), "boxes/pilotwings.png");
    }

    #[test]
    fn bounded_cuts_on_char_boundaries() {
        assert_eq!(bounded("1991-11-21", YEAR_MAX_CHARS), "1991");
        assert_eq!(bounded("Pokémon", 5), "Pokém");
        assert_eq!(bounded("F-Zero", TITLE_MAX_CHARS), "F-Zero");
    }
}
