//! Streaming catalog loader with statum state machine
//!
//! # State Machine
//!
//! ```text
//! Pending ──open()──► Streaming ──stream_into()──► record count
//!    │                    │
//!    ▼                    ▼
//! SourceUnavailable   MalformedDocument (committed records kept)
//! ```
//!
//! The source is read through a fixed-size buffer and fed to quick-xml one
//! event at a time; the [`CatalogParser`] does all validation. End-tag name
//! checking is left to the parser so that a single bad tag costs at most one
//! record instead of the whole document.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::error::LoadError;
use super::parser::CatalogParser;
use super::store::CatalogStore;

/// Bytes pulled from the source per read
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Byte stream the catalog is read from
pub trait CatalogSource {
    /// Human readable origin used in logs and errors
    fn describe(&self) -> String;

    fn open(&self) -> std::io::Result<Box<dyn Read>>;
}

/// Catalog stored in a file on the boot partition
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// Catalog held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }
}

impl CatalogSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn open(&self) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum LoaderState {
    Pending,
    Streaming,
}

#[machine]
pub struct CatalogLoader<S: LoaderState> {
    origin: String,
    chunk_size: usize,
    input: Option<Box<dyn Read>>,
}

impl<S: LoaderState> CatalogLoader<S> {
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl CatalogLoader<Pending> {
    pub fn create(chunk_size: usize) -> Self {
        Self::new(String::new(), chunk_size.max(1), None)
    }

    /// Opens the source and transitions to Streaming
    pub fn open(
        mut self,
        source: &dyn CatalogSource,
    ) -> Result<CatalogLoader<Streaming>, LoadError> {
        let origin = source.describe();
        match source.open() {
            Ok(input) => {
                debug!("Opened catalog source {}", origin);
                self.origin = origin;
                self.input = Some(input);
                Ok(self.transition())
            }
            Err(e) => {
                error!("Unable to open catalog source {}: {}", origin, e);
                Err(LoadError::unavailable(origin, e))
            }
        }
    }
}

impl CatalogLoader<Streaming> {
    /// Feeds the whole document through `parser`, committing into `store`.
    ///
    /// Returns the number of records this parser committed. On a syntax
    /// error the parse stops and everything committed so far stays put.
    pub fn stream_into(
        mut self,
        parser: &mut CatalogParser,
        store: &mut CatalogStore,
    ) -> Result<usize, LoadError> {
        let input = self
            .input
            .take()
            .ok_or_else(|| LoadError::malformed(0, "catalog stream already consumed"))?;

        let mut xml = Reader::from_reader(BufReader::with_capacity(self.chunk_size, input));
        xml.config_mut().trim_text(true);
        xml.config_mut().check_end_names = false;

        let mut buf = Vec::with_capacity(self.chunk_size);
        let mut saw_element = false;

        loop {
            let event = match xml.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    let position = xml.buffer_position() as u64;
                    error!("{}: {} at byte {}", self.origin, e, position);
                    return Err(LoadError::malformed(position, e.to_string()));
                }
            };

            match event {
                Event::Start(ref e) => {
                    saw_element = true;
                    parser.start_element(&element_name(e.name()));
                }
                Event::Empty(ref e) => {
                    saw_element = true;
                    let name = element_name(e.name());
                    parser.start_element(&name);
                    parser.end_element(&name, store);
                }
                Event::End(ref e) => parser.end_element(&element_name(e.name()), store),
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(|err| {
                        let position = xml.buffer_position() as u64;
                        error!("{}: {} at byte {}", self.origin, err, position);
                        LoadError::malformed(position, err.to_string())
                    })?;
                    parser.character_data(&text);
                }
                Event::CData(ref e) => parser.character_data(&String::from_utf8_lossy(e)),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let position = xml.buffer_position() as u64;
        if !saw_element {
            return Err(LoadError::malformed(position, "no element found"));
        }
        if parser.state().depth != 0 {
            warn!(
                "{} ended with {} element(s) still open",
                self.origin,
                parser.state().depth
            );
            return Err(LoadError::malformed(position, "unclosed element at end of document"));
        }

        Ok(parser.committed())
    }
}

fn element_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

/// Replaces the contents of `store` with the catalog read from `source`.
///
/// An unopenable source leaves the store empty; a malformed document leaves
/// the records committed before the failure.
pub fn load_catalog(source: &dyn CatalogSource, store: &mut CatalogStore) -> Result<usize, LoadError> {
    store.clear();
    let mut parser = CatalogParser::new();

    let result = CatalogLoader::create(CHUNK_SIZE)
        .open(source)
        .and_then(|loader| loader.stream_into(&mut parser, store));

    match &result {
        Ok(count) => info!(
            "Loaded {} games from {} ({} problems reported)",
            count,
            source.describe(),
            parser.diagnostics().len()
        ),
        Err(e) => warn!(
            "Catalog load from {} stopped with {} games: {}",
            source.describe(),
            store.count(),
            e
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDiagnostic, CatalogTag, GameRecord};

    const FULL_CATALOG: &str = r#"<?xml version="1.0"?>
<root>
  <record>
    <title>Super Mario World</title>
    <rom>smw.smc</rom>
    <image>boxes/smw.png</image>
    <year>1990</year>
    <genre>Platformer</genre>
    <text>Mario and Luigi head to Dinosaur Land.</text>
  </record>
  <record>
    <title>F-Zero</title>
    <rom>fzero.smc</rom>
  </record>
</root>"#;

    fn load_str(xml: &str) -> (CatalogStore, Result<usize, LoadError>) {
        let mut store = CatalogStore::new();
        let result = load_catalog(&MemorySource::new("test", xml), &mut store);
        (store, result)
    }

    #[test]
    fn loads_well_formed_catalog() {
        let (store, result) = load_str(FULL_CATALOG);
        assert_eq!(result.unwrap(), 2);
        assert_eq!(store.count(), 2);

        let smw = store.record_at(0).unwrap();
        assert_eq!(smw.title, "Super Mario World");
        assert_eq!(smw.image_path(), "boxes/smw.png");
        assert_eq!(smw.genres, vec!["Platformer"]);
        assert_eq!(smw.info_lines, vec!["Mario and Luigi head to Dinosaur Land."]);

        let fzero = store.record_at(1).unwrap();
        assert_eq!(fzero.year_text(), "19XX");
        assert!(fzero.image.is_none());
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let xml = "<ROOT><Record><TITLE>Axelay</TITLE><Rom>axelay.smc</Rom></Record></ROOT>";
        let (store, result) = load_str(xml);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(store.record_at(0).unwrap().rom, "axelay.smc");
    }

    #[test]
    fn count_matches_complete_records() {
        let xml = r#"<root>
  <record><title>A</title><rom>a.smc</rom></record>
  <record><title>B only</title></record>
  <record><rom>c.smc</rom></record>
  <record><title>D</title><rom>d.smc</rom><image/></record>
</root>"#;
        let (store, result) = load_str(xml);
        assert_eq!(result.unwrap(), 2);
        let titles: Vec<_> = store.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "D"]);
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = "<root><record><title>Tom &amp; Jerry</title><rom>tj.smc</rom></record></root>";
        let (store, _) = load_str(xml);
        assert_eq!(store.record_at(0).unwrap().title, "Tom & Jerry");
    }

    #[test]
    fn stray_close_tag_only_costs_one_record() {
        let xml = r#"<root>
  <record><title>Contra III</title><rom>contra.smc</rom></record>
  <record><title>Broken</oops><rom>broken.smc</rom></record>
  <record><title>Gradius III</title><rom>gradius.smc</rom></record>
</root>"#;
        let mut store = CatalogStore::new();
        let mut parser = CatalogParser::new();
        let count = CatalogLoader::create(CHUNK_SIZE)
            .open(&MemorySource::new("stray", xml))
            .unwrap()
            .stream_into(&mut parser, &mut store)
            .unwrap();

        assert_eq!(count, 2);
        assert!(parser.diagnostics().contains(&CatalogDiagnostic::UnclosedChild {
            tag: CatalogTag::Title
        }));
        let first = store.cursor(0).unwrap();
        assert_eq!(first.next().unwrap().record().title, "Gradius III");
    }

    #[test]
    fn missing_source_leaves_store_empty() {
        let mut store = CatalogStore::new();
        store.commit(GameRecord {
            title: "Stale".to_string(),
            rom: "stale.smc".to_string(),
            ..Default::default()
        });

        let result = load_catalog(&FileSource::new("/nonexistent/gamedeck/games.xml"), &mut store);
        assert!(matches!(result, Err(LoadError::SourceUnavailable { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn syntax_error_keeps_committed_records() {
        let xml = r#"<root>
  <record><title>Kept</title><rom>kept.smc</rom></record>
  <record><title>Lost &bogus;</title><rom>lost.smc</rom></record>
</root>"#;
        let (store, result) = load_str(xml);
        assert!(matches!(result, Err(LoadError::MalformedDocument { .. })));
        assert_eq!(store.count(), 1);
        assert_eq!(store.record_at(0).unwrap().title, "Kept");
    }

    #[test]
    fn truncated_document_is_malformed_but_partial() {
        let xml = "<root><record><title>Kept</title><rom>kept.smc</rom></record><record><title>Cut";
        let (store, result) = load_str(xml);
        assert!(matches!(result, Err(LoadError::MalformedDocument { .. })));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn empty_document_is_malformed() {
        let (store, result) = load_str("");
        assert!(matches!(result, Err(LoadError::MalformedDocument { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn small_chunks_give_the_same_catalog() {
        let mut store = CatalogStore::new();
        let mut parser = CatalogParser::new();
        let count = CatalogLoader::create(7)
            .open(&MemorySource::new("chunks", FULL_CATALOG))
            .unwrap()
            .stream_into(&mut parser, &mut store)
            .unwrap();

        let (reference, _) = load_str(FULL_CATALOG);
        assert_eq!(count, 2);
        assert!(store.iter().eq(reference.iter()));
    }

    #[test]
    fn written_catalog_reloads_identically() {
        let (original, _) = load_str(FULL_CATALOG);
        let mut out = Vec::new();
        original.write_xml(&mut out).unwrap();

        let mut reloaded = CatalogStore::new();
        let count = load_catalog(&MemorySource::new("roundtrip", out), &mut reloaded).unwrap();
        assert_eq!(count, original.count());
        assert!(reloaded.iter().eq(original.iter()));
        assert!(reloaded.record_at(1).unwrap().year.is_none());
    }
}
