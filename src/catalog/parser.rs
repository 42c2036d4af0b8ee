//! Tag/depth validated state machine for catalog documents
//!
//! The parser knows nothing about streams. It is fed element boundaries and
//! character data by the loader (or directly by tests) and appends records to
//! a [`CatalogStore`] as they pass validation.
//!
//! # Grammar
//!
//! ```text
//! depth 1: root
//! depth 2: record                      (repeatable)
//! depth 3: title rom image year        (once per record)
//!          genre text                  (repeatable, capped)
//! ```
//!
//! Tag names match case-insensitively and only at their own depth. Anything
//! else is ignored, but still moves the depth counter so recognized tags stay
//! in sync.
//!
//! # Recovery
//!
//! Problems inside a record never abort the parse. They are reported as
//! [`CatalogDiagnostic`]s and either leave the field unset or drop the whole
//! record; records committed earlier are never touched.

use tracing::{debug, trace, warn};

use super::error::CatalogDiagnostic;
use super::record::{
    bounded, GameRecord, GENRE_MAX_CHARS, IMAGE_MAX_CHARS, INFO_LINE_MAX_CHARS, MAX_GENRES,
    MAX_INFO_LINES, ROM_MAX_CHARS, TITLE_MAX_CHARS, YEAR_MAX_CHARS,
};
use super::store::CatalogStore;

/// Characters of element text kept between two tag boundaries
pub const WORK_BUFFER_CHARS: usize = 255;

/// Elements of the catalog grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogTag {
    Root,
    Record,
    Title,
    Rom,
    Image,
    Year,
    Genre,
    Text,
}

impl CatalogTag {
    pub const ALL: [CatalogTag; 8] = [
        CatalogTag::Root,
        CatalogTag::Record,
        CatalogTag::Title,
        CatalogTag::Rom,
        CatalogTag::Image,
        CatalogTag::Year,
        CatalogTag::Genre,
        CatalogTag::Text,
    ];

    const LEAVES: [CatalogTag; 6] = [
        CatalogTag::Title,
        CatalogTag::Rom,
        CatalogTag::Image,
        CatalogTag::Year,
        CatalogTag::Genre,
        CatalogTag::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CatalogTag::Root => "root",
            CatalogTag::Record => "record",
            CatalogTag::Title => "title",
            CatalogTag::Rom => "rom",
            CatalogTag::Image => "image",
            CatalogTag::Year => "year",
            CatalogTag::Genre => "genre",
            CatalogTag::Text => "text",
        }
    }

    /// Nesting depth at which the tag is legal (root element is depth 1)
    pub fn depth(self) -> usize {
        match self {
            CatalogTag::Root => 1,
            CatalogTag::Record => 2,
            _ => 3,
        }
    }

    /// Recognizes `name` if it is a grammar tag legal at `depth`.
    pub fn identify(name: &str, depth: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.depth() == depth && tag.name().eq_ignore_ascii_case(name))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for CatalogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

/// One flag per grammar tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagFlags([bool; CatalogTag::ALL.len()]);

impl TagFlags {
    pub fn get(&self, tag: CatalogTag) -> bool {
        self.0[tag.index()]
    }

    pub fn set(&mut self, tag: CatalogTag, value: bool) {
        self.0[tag.index()] = value;
    }

    fn first_open_leaf(&self) -> Option<CatalogTag> {
        CatalogTag::LEAVES.into_iter().find(|tag| self.get(*tag))
    }
}

/// Transient per-parse state
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    pub depth: usize,
    /// Tags currently open at their own depth
    pub open: TagFlags,
    /// Fields already defined for the record being built
    pub defined: TagFlags,
    pub genre_count: usize,
    pub info_count: usize,
    text: String,
    text_chars: usize,
}

impl ParserState {
    /// Clears everything scoped to a single record. The root flag survives.
    fn reset_record_scope(&mut self) {
        let root_open = self.open.get(CatalogTag::Root);
        self.open = TagFlags::default();
        self.open.set(CatalogTag::Root, root_open);
        self.defined = TagFlags::default();
        self.genre_count = 0;
        self.info_count = 0;
    }

    fn clear_text(&mut self) {
        self.text.clear();
        self.text_chars = 0;
    }

    /// Appends character data, returns the number of characters dropped.
    fn push_text(&mut self, data: &str) -> usize {
        let room = WORK_BUFFER_CHARS - self.text_chars;
        let mut kept = 0;
        for ch in data.chars().take(room) {
            self.text.push(ch);
            kept += 1;
        }
        self.text_chars += kept;
        data.chars().count() - kept
    }
}

/// Event-driven catalog builder
#[derive(Debug, Default)]
pub struct CatalogParser {
    state: ParserState,
    pending: Option<GameRecord>,
    committed: usize,
    diagnostics: Vec<CatalogDiagnostic>,
}

impl CatalogParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Records committed by this parser so far
    pub fn committed(&self) -> usize {
        self.committed
    }

    /// Every problem reported so far, in order
    pub fn diagnostics(&self) -> &[CatalogDiagnostic] {
        &self.diagnostics
    }

    /// True while a `<record>` is being built
    pub fn in_record(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start_element(&mut self, name: &str) {
        self.state.depth += 1;
        self.state.clear_text();

        let Some(tag) = CatalogTag::identify(name, self.state.depth) else {
            trace!("Ignoring <{}> at depth {}", name, self.state.depth);
            return;
        };

        if self.state.open.get(tag) {
            self.report(CatalogDiagnostic::DuplicateOpen { tag });
            return;
        }
        self.state.open.set(tag, true);

        if tag == CatalogTag::Record {
            self.state.reset_record_scope();
            self.state.open.set(CatalogTag::Record, true);
            self.pending = Some(GameRecord::default());
            debug!("Started record at depth {}", self.state.depth);
        }
    }

    pub fn character_data(&mut self, data: &str) {
        let dropped = self.state.push_text(data);
        if dropped > 0 {
            self.report(CatalogDiagnostic::TextTruncated {
                dropped,
                limit: WORK_BUFFER_CHARS,
            });
        }
    }

    pub fn end_element(&mut self, name: &str, store: &mut CatalogStore) {
        if let Some(tag) = CatalogTag::identify(name, self.state.depth) {
            if self.state.open.get(tag) {
                self.state.open.set(tag, false);
                match tag {
                    CatalogTag::Root => debug!("Closed catalog root"),
                    CatalogTag::Record => self.finish_record(store),
                    leaf => self.store_field(leaf),
                }
            } else {
                self.report(CatalogDiagnostic::MismatchedClose { tag });
            }
        } else {
            trace!("Ignoring </{}> at depth {}", name, self.state.depth);
        }
        self.state.depth = self.state.depth.saturating_sub(1);
    }

    fn finish_record(&mut self, store: &mut CatalogStore) {
        let record = self.pending.take();

        if let Some(tag) = self.state.open.first_open_leaf() {
            self.report(CatalogDiagnostic::UnclosedChild { tag });
        } else if let Some(record) = record {
            let has_title = self.state.defined.get(CatalogTag::Title);
            let has_rom = self.state.defined.get(CatalogTag::Rom);
            if has_title && has_rom {
                store.commit(record);
                self.committed += 1;
            } else {
                self.report(CatalogDiagnostic::MissingRequiredField {
                    tag: if has_title {
                        CatalogTag::Rom
                    } else {
                        CatalogTag::Title
                    },
                });
            }
        }

        self.state.reset_record_scope();
    }

    fn store_field(&mut self, tag: CatalogTag) {
        if self.pending.is_none() {
            self.report(CatalogDiagnostic::OrphanField { tag });
            return;
        }
        let single_valued = !matches!(tag, CatalogTag::Genre | CatalogTag::Text);
        if single_valued && self.state.defined.get(tag) {
            self.report(CatalogDiagnostic::DuplicateField { tag });
            return;
        }

        let state = &mut self.state;
        let Some(record) = self.pending.as_mut() else {
            return;
        };
        let text = state.text.trim();

        match tag {
            CatalogTag::Title => record.title = bounded(text, TITLE_MAX_CHARS),
            CatalogTag::Rom => record.rom = bounded(text, ROM_MAX_CHARS),
            CatalogTag::Image => record.image = Some(bounded(text, IMAGE_MAX_CHARS)),
            CatalogTag::Year => record.year = Some(bounded(text, YEAR_MAX_CHARS)),
            CatalogTag::Genre => {
                if state.genre_count < MAX_GENRES {
                    record.genres.push(bounded(text, GENRE_MAX_CHARS));
                } else {
                    debug!("Dropping extra genre '{}'", text);
                }
                state.genre_count += 1;
            }
            CatalogTag::Text => {
                if state.info_count < MAX_INFO_LINES {
                    record.info_lines.push(bounded(text, INFO_LINE_MAX_CHARS));
                } else {
                    debug!("Dropping extra info line '{}'", text);
                }
                state.info_count += 1;
            }
            CatalogTag::Root | CatalogTag::Record => {}
        }
        state.defined.set(tag, true);
    }

    fn report(&mut self, diagnostic: CatalogDiagnostic) {
        warn!("Catalog: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
