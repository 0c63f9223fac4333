//! Turning the download page into an ordered, de-duplicated catalog.
//!
//! The page has no structured markup for releases. Headings and wrapper
//! `div`s carry ids such as `featured`, `stable`, `unstable` or `archive`,
//! and every download link after such an id belongs to that section until
//! the next one. The document is walked once in reading order with a
//! [`SectionCursor`] remembering the last section seen.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};
use url::Url;

use crate::entry::{DownloadEntry, Sections};
use crate::platform::Platform;

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(archive|featured|stable|unstable)").expect("valid section pattern")
});
static DOWNLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"download").expect("valid download pattern"));
static ARCHIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"archive").expect("valid archive pattern"));
static FEATURED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"featured").expect("valid featured pattern"));
static UNSTABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unstable").expect("valid unstable pattern"));

/// The id of the most recently entered page section.
///
/// Lives for a single extraction pass only.
#[derive(Debug, Clone, Default)]
pub struct SectionCursor {
    current: String,
}

impl SectionCursor {
    /// Id of the section currently being read; empty before the first one.
    pub fn current(&self) -> &str {
        &self.current
    }

    fn enter(&mut self, id: &str) {
        if self.current != id {
            debug!(section = id, "entering section");
            self.current = id.to_owned();
        }
    }

    /// Flags for links found while this section is current. Each flag is
    /// tested on its own; an id like `archive-unstable` sets two.
    pub fn sections(&self) -> Sections {
        Sections {
            archived: ARCHIVE_RE.is_match(&self.current),
            featured: FEATURED_RE.is_match(&self.current),
            unstable: UNSTABLE_RE.is_match(&self.current),
        }
    }
}

/// Classify one element by its own attributes.
///
/// An `h2` or `div` whose `id` names a section moves the cursor. An `a`
/// whose `class` mentions `download` and that has an `href` becomes an
/// entry tagged with the cursor's current section.
pub fn classify(
    element: &Element,
    cursor: &mut SectionCursor,
    base: &Url,
) -> Option<DownloadEntry> {
    match element.name() {
        "h2" | "div" => {
            if let Some(id) = element.attr("id").filter(|id| SECTION_RE.is_match(id)) {
                cursor.enter(id);
            }
            None
        }
        "a" => {
            let is_download = element.attr("class").is_some_and(|c| DOWNLOAD_RE.is_match(c));
            let href = element.attr("href")?;
            if !is_download {
                return None;
            }
            let entry = DownloadEntry::from_link(base, href, cursor.sections());
            trace!(url = entry.url(), section = cursor.current(), "found download link");
            Some(entry)
        }
        _ => None,
    }
}

/// Ordered download entries with unique URLs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<DownloadEntry>,
    seen: HashSet<String>,
}

impl Catalog {
    /// Parse `markup` and extract every download link from it.
    pub fn from_html(markup: &str, base: &Url) -> Self {
        extract(&Html::parse_document(markup), base)
    }

    /// Collect entries, keeping the first occurrence of each URL.
    pub fn from_entries(entries: impl IntoIterator<Item = DownloadEntry>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.push(entry);
        }
        catalog
    }

    /// Append `entry` unless its URL is already present.
    fn push(&mut self, entry: DownloadEntry) -> bool {
        if !self.seen.insert(entry.url().to_owned()) {
            trace!(url = entry.url(), "skipping duplicate download link");
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// All entries in page order.
    pub fn entries(&self) -> &[DownloadEntry] {
        &self.entries
    }

    /// Iterate over the entries in page order.
    pub fn iter(&self) -> std::slice::Iter<'_, DownloadEntry> {
        self.entries.iter()
    }

    /// Number of unique download links.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the page had no download links at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries worth showing to a user on `host`: installable ones, and
    /// archived releases only when asked for.
    pub fn listing<'a>(
        &'a self,
        host: &'a Platform,
        include_archived: bool,
    ) -> impl Iterator<Item = &'a DownloadEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| host.can_install(e) && (include_archived || !e.is_archived()))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a DownloadEntry;
    type IntoIter = std::slice::Iter<'a, DownloadEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Walk `document` in reading order and collect one entry per download
/// link, dropping links whose URL was already collected. The section
/// cursor is created here and dropped when the walk ends.
pub fn extract(document: &Html, base: &Url) -> Catalog {
    let mut cursor = SectionCursor::default();
    let mut catalog = Catalog::default();
    walk(document.root_element(), base, &mut cursor, &mut catalog);
    debug!(entries = catalog.len(), "extracted download catalog");
    catalog
}

fn walk(element: ElementRef<'_>, base: &Url, cursor: &mut SectionCursor, catalog: &mut Catalog) {
    if let Some(entry) = classify(element.value(), cursor, base) {
        // download links are leaves
        catalog.push(entry);
        return;
    }

    for child in element.children().filter_map(ElementRef::wrap) {
        walk(child, base, cursor, catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Os;

    const PAGE: &str = r#"
<html><body>
  <h2 id="featured">Featured downloads</h2>
  <div class="downloadWrapper">
    <a class="download downloadBox" href="/dl/go1.19.4.linux-amd64.tar.gz">Linux</a>
    <a class="download downloadBox" href="/dl/go1.19.4.darwin-amd64.pkg">Apple macOS</a>
  </div>
  <h2 id="stable">Stable versions</h2>
  <div class="toggleVisible" id="go1.19.4">
    <table class="downloadtable">
      <tr><td class="filename"><a class="download" href="/dl/go1.19.4.src.tar.gz">go1.19.4.src.tar.gz</a></td></tr>
      <tr><td class="filename"><a class="download" href="/dl/go1.19.4.linux-amd64.tar.gz">go1.19.4.linux-amd64.tar.gz</a></td></tr>
      <tr><td class="filename"><a class="download" href="/dl/go1.19.4.linux-arm64.tar.gz">go1.19.4.linux-arm64.tar.gz</a></td></tr>
    </table>
  </div>
  <h2 id="unstable">Unstable version</h2>
  <div class="toggle" id="go1.20rc1">
    <a class="download" href="/dl/go1.20rc1.linux-amd64.tar.gz">go1.20rc1.linux-amd64.tar.gz</a>
  </div>
  <div class="toggle" id="archive">
    <div class="toggle" id="go1.18.9">
      <a class="download" href="/dl/go1.18.9.linux-amd64.tar.gz">go1.18.9.linux-amd64.tar.gz</a>
      <a href="/dl/go1.18.9.linux-amd64.tar.gz.sha256">checksum</a>
    </div>
  </div>
</body></html>
"#;

    fn base() -> Url {
        Url::parse("https://go.dev/dl/").unwrap()
    }

    fn urls(catalog: &Catalog) -> Vec<&str> {
        catalog.iter().map(DownloadEntry::url).collect()
    }

    #[test]
    fn extracts_in_document_order_without_duplicates() {
        let catalog = Catalog::from_html(PAGE, &base());
        assert_eq!(
            urls(&catalog),
            vec![
                "https://go.dev/dl/go1.19.4.linux-amd64.tar.gz",
                "https://go.dev/dl/go1.19.4.darwin-amd64.tar.gz",
                "https://go.dev/dl/go1.19.4.src.tar.gz",
                "https://go.dev/dl/go1.19.4.linux-arm64.tar.gz",
                "https://go.dev/dl/go1.20rc1.linux-amd64.tar.gz",
                "https://go.dev/dl/go1.18.9.linux-amd64.tar.gz",
            ]
        );
    }

    #[test]
    fn first_occurrence_keeps_its_section() {
        let catalog = Catalog::from_html(PAGE, &base());
        let first = &catalog.entries()[0];
        assert!(first.is_featured());
        assert!(!first.is_unstable());
        assert!(!first.is_archived());
    }

    #[test]
    fn entries_carry_the_section_they_were_found_in() {
        let catalog = Catalog::from_html(PAGE, &base());
        let by_url = |suffix: &str| {
            catalog
                .iter()
                .find(|e| e.url().ends_with(suffix))
                .unwrap()
                .sections()
        };

        assert_eq!(by_url("go1.19.4.linux-arm64.tar.gz"), Sections::default());
        assert!(by_url("go1.20rc1.linux-amd64.tar.gz").unstable);
        let archived = by_url("go1.18.9.linux-amd64.tar.gz");
        assert!(archived.archived);
        assert!(!archived.featured);
        assert!(!archived.unstable);
    }

    #[test]
    fn ignores_links_that_are_not_downloads() {
        let catalog = Catalog::from_html(PAGE, &base());
        assert!(catalog.iter().all(|e| !e.url().ends_with(".sha256")));
    }

    #[test]
    fn download_links_without_href_are_skipped() {
        let page = r#"<div id="featured"><a class="download">nothing</a></div>"#;
        assert!(Catalog::from_html(page, &base()).is_empty());
    }

    #[test]
    fn does_not_descend_into_download_links() {
        let page = r#"
            <h2 id="stable"></h2>
            <a class="download" href="/dl/go1.1.linux-amd64.tar.gz">
              <div id="unstable">never visited</div>
            </a>
            <a class="download" href="/dl/go1.2.linux-amd64.tar.gz">next</a>"#;
        let catalog = Catalog::from_html(page, &base());
        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|e| !e.is_unstable()));
    }

    #[test]
    fn classify_updates_cursor_only_for_section_ids() {
        let document = Html::parse_fragment(
            r#"<div id="go1.19.4"></div><h2 id="unstable"></h2><span id="archive"></span>"#,
        );
        let mut cursor = SectionCursor::default();
        for node in document.root_element().descendants().filter_map(ElementRef::wrap) {
            assert!(classify(node.value(), &mut cursor, &base()).is_none());
        }
        // span ids don't start sections
        assert_eq!(cursor.current(), "unstable");
        assert!(cursor.sections().unstable);
        assert!(!cursor.sections().featured);
    }

    #[test]
    fn classify_builds_entry_from_current_section() {
        let document = Html::parse_fragment(
            r#"<a class="download" href="/dl/go1.4.linux-386.tar.gz">x</a>"#,
        );
        let anchor = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "a")
            .unwrap();

        let mut cursor = SectionCursor::default();
        cursor.enter("archive");
        let entry = classify(anchor.value(), &mut cursor, &base()).unwrap();
        assert!(entry.is_archived());
        assert_eq!(entry.os(), Some(Os::Linux));
        assert_eq!(entry.arch(), Some("386"));
    }

    #[test]
    fn listing_hides_archived_and_foreign_entries() {
        let catalog = Catalog::from_html(PAGE, &base());
        let host = Platform::new(Some(Os::Linux), Some("amd64"));

        let shown: Vec<_> = catalog.listing(&host, false).filter_map(|e| e.version()).collect();
        assert_eq!(shown, vec!["1.19.4", "1.20rc1"]);

        let shown: Vec<_> = catalog.listing(&host, true).filter_map(|e| e.version()).collect();
        assert_eq!(shown, vec!["1.19.4", "1.20rc1", "1.18.9"]);
    }

    #[test]
    fn from_entries_keeps_first_url() {
        let a = DownloadEntry::from_link(&base(), "go1.1.linux-amd64.tar.gz", Sections::default());
        let b = DownloadEntry::from_link(
            &base(),
            "/other/go1.1.linux-amd64.tar.gz",
            Sections {
                featured: true,
                ..Sections::default()
            },
        );
        let catalog = Catalog::from_entries([a.clone(), b]);
        assert_eq!(catalog.entries(), &[a]);
    }
}
