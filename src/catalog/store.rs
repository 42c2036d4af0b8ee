//! Committed game records in document order
//!
//! The store only ever grows by appending a fully validated record, so readers
//! never observe a half-built entry. Neighbour navigation is index based:
//!
//! ```text
//! [0] ◄──► [1] ◄──► [2] ◄──► ... ◄──► [count - 1]
//! ```

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, info};

use super::parser::CatalogTag;
use super::record::GameRecord;

#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    records: Vec<GameRecord>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in document order. Every call starts from the first record.
    pub fn iter(&self) -> std::slice::Iter<'_, GameRecord> {
        self.records.iter()
    }

    /// Record at a 0-based position, `None` when out of range
    pub fn record_at(&self, index: usize) -> Option<&GameRecord> {
        self.records.get(index)
    }

    /// Cursor positioned on `index` for prev/next walking
    pub fn cursor(&self, index: usize) -> Option<CatalogCursor<'_>> {
        (index < self.records.len()).then_some(CatalogCursor { store: self, index })
    }

    pub(crate) fn commit(&mut self, record: GameRecord) {
        debug!(
            "Committing record #{}: '{}' ({})",
            self.records.len(),
            record.title,
            record.rom
        );
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Writes the catalog back out in the launcher's markup format.
    ///
    /// Absent optional fields are omitted rather than written with their
    /// display defaults, so loading the output yields the same records.
    pub fn write_xml<W: Write>(&self, sink: W) -> std::io::Result<()> {
        let mut writer = Writer::new_with_indent(sink, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(CatalogTag::Root.name())))?;

        for record in &self.records {
            writer.write_event(Event::Start(BytesStart::new(CatalogTag::Record.name())))?;
            write_leaf(&mut writer, CatalogTag::Title, &record.title)?;
            write_leaf(&mut writer, CatalogTag::Rom, &record.rom)?;
            if let Some(image) = &record.image {
                write_leaf(&mut writer, CatalogTag::Image, image)?;
            }
            if let Some(year) = &record.year {
                write_leaf(&mut writer, CatalogTag::Year, year)?;
            }
            for genre in &record.genres {
                write_leaf(&mut writer, CatalogTag::Genre, genre)?;
            }
            for line in &record.info_lines {
                write_leaf(&mut writer, CatalogTag::Text, line)?;
            }
            writer.write_event(Event::End(BytesEnd::new(CatalogTag::Record.name())))?;
        }

        writer.write_event(Event::End(BytesEnd::new(CatalogTag::Root.name())))?;
        info!("Wrote {} catalog records", self.records.len());
        Ok(())
    }
}

fn write_leaf<W: Write>(writer: &mut Writer<W>, tag: CatalogTag, text: &str) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag.name())))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag.name())))?;
    Ok(())
}

impl<'a> IntoIterator for &'a CatalogStore {
    type Item = &'a GameRecord;
    type IntoIter = std::slice::Iter<'a, GameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Position inside a [`CatalogStore`] with neighbour access
#[derive(Debug, Clone, Copy)]
pub struct CatalogCursor<'a> {
    store: &'a CatalogStore,
    index: usize,
}

impl<'a> CatalogCursor<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> &'a GameRecord {
        &self.store.records[self.index]
    }

    pub fn next(&self) -> Option<CatalogCursor<'a>> {
        self.store.cursor(self.index + 1)
    }

    pub fn prev(&self) -> Option<CatalogCursor<'a>> {
        self.index
            .checked_sub(1)
            .and_then(|index| self.store.cursor(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> GameRecord {
        GameRecord {
            title: title.to_string(),
            rom: format!("{}.smc", title.to_lowercase()),
            ..Default::default()
        }
    }

    fn store_of(titles: &[&str]) -> CatalogStore {
        let mut store = CatalogStore::new();
        for title in titles {
            store.commit(record(title));
        }
        store
    }

    #[test]
    fn record_at_is_bounds_checked() {
        let store = store_of(&["Contra", "Axelay"]);
        assert_eq!(store.count(), 2);
        assert_eq!(store.record_at(1).map(|r| r.title.as_str()), Some("Axelay"));
        assert!(store.record_at(2).is_none());
        assert!(CatalogStore::new().record_at(0).is_none());
    }

    #[test]
    fn iteration_is_restartable() {
        let store = store_of(&["Contra", "Axelay", "Gradius"]);
        let first: Vec<_> = store.iter().map(|r| r.title.clone()).collect();
        let second: Vec<_> = store.iter().map(|r| r.title.clone()).collect();
        assert_eq!(first, vec!["Contra", "Axelay", "Gradius"]);
        assert_eq!(first, second);
    }

    #[test]
    fn cursor_neighbours_agree() {
        let store = store_of(&["Contra", "Axelay", "Gradius"]);
        let middle = store.cursor(1).unwrap();
        let next = middle.next().unwrap();
        let prev = middle.prev().unwrap();

        assert_eq!(next.record().title, "Gradius");
        assert_eq!(prev.record().title, "Contra");
        assert_eq!(next.prev().unwrap().index(), middle.index());
        assert_eq!(prev.next().unwrap().index(), middle.index());
        assert!(prev.prev().is_none());
        assert!(next.next().is_none());
    }

    #[test]
    fn empty_store_writes_bare_root() {
        let mut out = Vec::new();
        CatalogStore::new().write_xml(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<root>"));
        assert!(text.contains("</root>"));
        assert!(!text.contains("<record>"));
    }
}
