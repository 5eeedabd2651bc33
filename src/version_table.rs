//! Version mapping table: declared version code to schema file name(s).
//!
//! The authoritative mapping lives on an externally maintained HTML page.
//! The page is fetched at most once per process; an unreachable or malformed
//! page yields an empty table rather than an error, which callers treat as
//! "no table-based resolution possible" and continue down the source chain.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::http_client::HttpClient;
use crate::output::Diagnostics;

static ROW_REGEX: OnceLock<Regex> = OnceLock::new();
static CELL_REGEX: OnceLock<Regex> = OnceLock::new();
static BREAK_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn row_regex() -> &'static Regex {
    ROW_REGEX
        .get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("Failed to compile row regex"))
}

fn cell_regex() -> &'static Regex {
    CELL_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").expect("Failed to compile cell regex")
    })
}

fn break_regex() -> &'static Regex {
    BREAK_REGEX
        .get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("Failed to compile line break regex"))
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]+>").expect("Failed to compile tag regex"))
}

/// Immutable mapping from normalized version label to the sub-entries of the
/// designated trailing cell of the matching row.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, Vec<String>>,
}

impl MappingTable {
    /// Build a table from an HTML page.
    ///
    /// Only the row/cell structure is assumed: the first cell is the version
    /// label, the last cell carries the schema file entries, one per line
    /// break. Anything else on the page is ignored.
    pub fn parse(html: &str) -> Self {
        let mut entries = HashMap::new();
        for row in row_regex().captures_iter(html) {
            let cells: Vec<&str> = cell_regex()
                .captures_iter(&row[1])
                .filter_map(|cell| cell.get(1).map(|m| m.as_str()))
                .collect();
            if cells.len() < 2 {
                continue;
            }
            let label = normalize(&strip_markup(cells[0]));
            if label.is_empty() {
                continue;
            }
            let files: Vec<String> = break_regex()
                .split(cells[cells.len() - 1])
                .map(strip_markup)
                .filter(|entry| !entry.is_empty())
                .collect();
            if files.is_empty() {
                continue;
            }
            entries.insert(label, files);
        }
        Self { entries }
    }

    /// Build a table from literal (version, files) entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(code, files)| {
                (
                    normalize(&code.into()),
                    files.into_iter().map(Into::into).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Entries recorded for `code`, empty when no row matches.
    pub fn get(&self, code: &str) -> &[String] {
        self.entries
            .get(&normalize(code))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Version codes are zero-padded two-digit strings whose table entries are
/// stored without the leading zero; comparison also ignores case.
fn normalize(code: &str) -> String {
    let code = code.trim();
    let code = code.strip_prefix('0').unwrap_or(code);
    code.to_ascii_lowercase()
}

fn strip_markup(fragment: &str) -> String {
    let text = tag_regex().replace_all(fragment, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Where the mapping table comes from.
#[async_trait]
pub trait VersionTableSource: Send + Sync {
    async fn load(&self) -> Result<MappingTable>;
}

/// Live source scraping the authoritative mapping page.
pub struct HttpVersionTable {
    http: HttpClient,
    url: String,
}

impl HttpVersionTable {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl VersionTableSource for HttpVersionTable {
    async fn load(&self) -> Result<MappingTable> {
        let page = self.http.fetch_windows1250(&self.url).await?;
        Ok(MappingTable::parse(&page))
    }
}

/// Fixed table for offline use and deterministic tests.
pub struct StaticVersionTable {
    table: MappingTable,
}

impl StaticVersionTable {
    pub fn new(table: MappingTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl VersionTableSource for StaticVersionTable {
    async fn load(&self) -> Result<MappingTable> {
        Ok(self.table.clone())
    }
}

/// Caches the mapping table for the process lifetime and answers lookups.
pub struct VersionTableClient {
    source: Box<dyn VersionTableSource>,
    table: OnceCell<MappingTable>,
}

impl VersionTableClient {
    pub fn new(source: Box<dyn VersionTableSource>) -> Self {
        Self {
            source,
            table: OnceCell::new(),
        }
    }

    /// Schema file names recorded for `code`, empty when the table has no
    /// row for it or could not be built at all.
    ///
    /// The first call loads the table; concurrent first calls share one load
    /// and later calls never re-fetch, even after a failed attempt.
    pub async fn lookup(&self, code: &str, diag: &Diagnostics) -> Vec<String> {
        let table = self
            .table
            .get_or_init(|| async {
                match self.source.load().await {
                    Ok(table) => {
                        diag.say(2, &format!("version table loaded, {} rows", table.len()));
                        table
                    }
                    Err(err) => {
                        diag.say(1, &format!("version table unavailable ({err})"));
                        MappingTable::default()
                    }
                }
            })
            .await;
        table.get(code).to_vec()
    }
}

/// DTD file name for one table sub-entry: a literal `.dtd` name is used
/// as-is, otherwise the leading digit run is templated into the repository
/// naming scheme.
pub fn dtd_file_name(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.to_ascii_lowercase().ends_with(".dtd") {
        return Some(entry.to_string());
    }
    let digits: String = entry.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!digits.is_empty()).then(|| format!("ds0{digits}.dtd"))
}

/// DTD file name derived straight from the version attribute when the table
/// has no row for it.
pub fn dtd_name_from_version(code: &str) -> String {
    format!("ds{}.dtd", code.trim().replace('.', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SAMPLE_PAGE: &str = r#"
<html><body>
<table border="1">
  <tr><th>verze</th><th>platnost</th><th>soubory</th></tr>
  <tr><td>3</td><td>2002</td><td><a href="ds030101.dtd">30101</a></td></tr>
  <tr><td>4</td><td>2006</td>
      <td><a href="ds_dasta.xsd">ds_dasta.xsd</a><br/>
          <a href="ds_type.xsd">ds_type.xsd</a></td></tr>
</table>
</body></html>"#;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        table: MappingTable,
    }

    #[async_trait]
    impl VersionTableSource for CountingSource {
        async fn load(&self) -> Result<MappingTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl VersionTableSource for FailingSource {
        async fn load(&self) -> Result<MappingTable> {
            Err(crate::error::ValidateError::HttpStatus {
                url: "http://example.com/verze_ds.htm".to_string(),
                status: 503,
            })
        }
    }

    #[test]
    fn test_parse_sample_page() {
        let table = MappingTable::parse(SAMPLE_PAGE);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("3"), ["30101"]);
        assert_eq!(table.get("4"), ["ds_dasta.xsd", "ds_type.xsd"]);
    }

    #[test]
    fn test_malformed_page_yields_empty_table() {
        let table = MappingTable::parse("<html>no tables here</html>");
        assert!(table.is_empty());
        assert!(table.get("3").is_empty());
    }

    #[test]
    fn test_zero_padding_insensitive_lookup() {
        let table = MappingTable::from_entries([("03", vec!["30101"])]);
        assert_eq!(table.get("03"), table.get("3"));
        assert_eq!(table.get("3"), ["30101"]);
        assert_eq!(table.get(" 03 "), ["30101"]);
    }

    #[test]
    fn test_dtd_file_name_templating() {
        assert_eq!(dtd_file_name("30101"), Some("ds030101.dtd".to_string()));
        assert_eq!(
            dtd_file_name("30101 (archiv)"),
            Some("ds030101.dtd".to_string())
        );
        assert_eq!(dtd_file_name("ds4.dtd"), Some("ds4.dtd".to_string()));
        assert_eq!(dtd_file_name("bez verze"), None);
    }

    #[test]
    fn test_dtd_name_from_version() {
        assert_eq!(dtd_name_from_version("3.01.01"), "ds30101.dtd");
        assert_eq!(dtd_name_from_version("04"), "ds04.dtd");
    }

    #[tokio::test]
    async fn test_lookup_loads_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = VersionTableClient::new(Box::new(CountingSource {
            calls: calls.clone(),
            table: MappingTable::from_entries([("4", vec!["ds4.dtd"])]),
        }));
        let diag = Diagnostics::silent();

        assert_eq!(client.lookup("04", &diag).await, ["ds4.dtd"]);
        assert_eq!(client.lookup("4", &diag).await, ["ds4.dtd"]);
        assert_eq!(client.lookup("9", &diag).await, Vec::<String>::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_source_yields_empty_without_retry() {
        let client = VersionTableClient::new(Box::new(FailingSource));
        let diag = Diagnostics::silent();

        assert!(client.lookup("3", &diag).await.is_empty());
        // Second lookup must not re-fetch; the empty table is cached.
        assert!(client.lookup("3", &diag).await.is_empty());
    }
}
