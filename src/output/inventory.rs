//! Inventory records and their CSV representation
//!
//! Discovery reads a list of seed URLs and writes a `link,title,status` inventory. Conversion
//! and sync read a curated inventory with placement metadata (`link,title,tags,frag1..frag5`).

use crate::state::DiscoveryStatus;
use crate::{CorpusError, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::io::{Read, Write};
use std::path::Path;

/// Number of hierarchy fragments a conversion record carries
pub const FRAGMENT_COUNT: usize = 5;

/// Title given to seeds that could not be resolved to a document
pub const INVALID_URL_TITLE: &str = "INVALID_URL";

/// One discovered document
///
/// Fields are private so the status assigned at emission can never be revised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    link: String,
    title: String,
    status: DiscoveryStatus,
}

impl DiscoveryRecord {
    pub fn new(link: impl Into<String>, title: impl Into<String>, status: DiscoveryStatus) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            status,
        }
    }

    /// Record for a seed URL that does not resolve to a document id
    pub fn invalid_seed(url: &str) -> Self {
        Self::new(url, INVALID_URL_TITLE, DiscoveryStatus::Invalid)
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> DiscoveryStatus {
        self.status
    }
}

/// One document to materialize, with its placement in the output tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionRecord {
    pub link: String,
    pub title: String,
    /// Comma-separated tags
    pub tags: String,
    /// Directory components, outermost first; empty entries are skipped
    pub fragments: [String; FRAGMENT_COUNT],
}

impl ConversionRecord {
    pub fn new(link: &str, title: &str) -> Self {
        Self {
            link: link.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Sets the leading fragments; extra entries beyond five are ignored
    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        for (slot, fragment) in self.fragments.iter_mut().zip(fragments) {
            *slot = fragment.to_string();
        }
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    /// Returns the non-empty fragments in order
    pub fn fragments(&self) -> Vec<&str> {
        self.fragments
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Splits the tag string, dropping blanks
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input)
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

fn field(row: &StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .unwrap_or_default()
        .to_string()
}

/// Reads seed URLs from a CSV with a `url` or `link` column (case-insensitive)
///
/// Blank values are skipped.
pub fn read_seeds(path: &Path) -> Result<Vec<String>> {
    read_seeds_from(std::fs::File::open(path)?)
}

pub fn read_seeds_from<R: Read>(input: R) -> Result<Vec<String>> {
    let mut reader = reader(input);
    let headers = reader.headers()?.clone();
    let url_column = column(&headers, &["url", "link"]).ok_or_else(|| {
        CorpusError::Inventory("no 'url' or 'link' column found in seed file".to_string())
    })?;

    let mut seeds = Vec::new();
    for row in reader.records() {
        let url = field(&row?, Some(url_column));
        if !url.is_empty() {
            seeds.push(url);
        }
    }
    Ok(seeds)
}

/// Reads conversion records from a CSV with `link`, `title`, `tags` and `frag1`..`frag5`
///
/// `link` and `title` columns are required; rows missing either value are skipped.
pub fn read_conversion_records(path: &Path) -> Result<Vec<ConversionRecord>> {
    read_conversion_records_from(std::fs::File::open(path)?)
}

pub fn read_conversion_records_from<R: Read>(input: R) -> Result<Vec<ConversionRecord>> {
    let mut reader = reader(input);
    let headers = reader.headers()?.clone();

    let link_column = column(&headers, &["link"])
        .ok_or_else(|| CorpusError::Inventory("required column 'link' not found".to_string()))?;
    let title_column = column(&headers, &["title"])
        .ok_or_else(|| CorpusError::Inventory("required column 'title' not found".to_string()))?;
    let tags_column = column(&headers, &["tags"]);
    let fragment_columns: Vec<Option<usize>> = (1..=FRAGMENT_COUNT)
        .map(|i| column(&headers, &[format!("frag{}", i).as_str()]))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = ConversionRecord {
            link: field(&row, Some(link_column)),
            title: field(&row, Some(title_column)),
            tags: field(&row, tags_column),
            ..ConversionRecord::default()
        };
        for (slot, index) in record.fragments.iter_mut().zip(&fragment_columns) {
            *slot = field(&row, *index);
        }

        if record.link.is_empty() || record.title.is_empty() {
            tracing::debug!("Skipping inventory row without link or title: {:?}", row);
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Writes the discovery inventory as `link,title,status`
pub fn write_discovery_records(path: &Path, records: &[DiscoveryRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_discovery_records_to(std::fs::File::create(path)?, records)
}

pub fn write_discovery_records_to<W: Write>(output: W, records: &[DiscoveryRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(output);
    writer.write_record(["link", "title", "status"])?;
    for record in records {
        writer.write_record([record.link(), record.title(), record.status().csv_value()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_seeds_url_or_link_column() {
        let seeds = read_seeds_from("URL\nhttps://a\n\nhttps://b\n".as_bytes()).unwrap();
        assert_eq!(seeds, vec!["https://a", "https://b"]);

        let seeds = read_seeds_from("title,Link\nx, https://c \n".as_bytes()).unwrap();
        assert_eq!(seeds, vec!["https://c"]);
    }

    #[test]
    fn test_read_seeds_without_column() {
        let result = read_seeds_from("name,value\na,b\n".as_bytes());
        assert!(matches!(result, Err(CorpusError::Inventory(_))));
    }

    #[test]
    fn test_read_conversion_records() {
        let csv = "link,title,tags,frag1,frag2,frag3,frag4,frag5\n\
                   https://d/1,Intro,\"a, b\",guides,,tutorials,,\n\
                   ,Missing link,,,,,,\n\
                   https://d/2,,,,,,,\n\
                   https://d/3,Short row\n";
        let records = read_conversion_records_from(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Intro");
        assert_eq!(records[0].fragments(), vec!["guides", "tutorials"]);
        assert_eq!(records[0].tag_list(), vec!["a", "b"]);
        assert_eq!(records[1].link, "https://d/3");
        assert!(records[1].fragments().is_empty());
    }

    #[test]
    fn test_conversion_requires_link_and_title_columns() {
        let result = read_conversion_records_from("link,tags\nx,y\n".as_bytes());
        assert!(matches!(result, Err(CorpusError::Inventory(_))));
    }

    #[test]
    fn test_write_discovery_records() {
        let records = vec![
            DiscoveryRecord::new("https://d/1", "Doc, One", DiscoveryStatus::Available),
            DiscoveryRecord::invalid_seed("not a url"),
            DiscoveryRecord::new("https://d/2", "d2", DiscoveryStatus::PermissionDenied),
        ];
        let mut out = Vec::new();
        write_discovery_records_to(&mut out, &records).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "link,title,status\n\
             https://d/1,\"Doc, One\",\n\
             not a url,INVALID_URL,invalid\n\
             https://d/2,d2,permission_denied\n"
        );
    }

    #[test]
    fn test_tag_list_drops_blanks() {
        let record = ConversionRecord::new("l", "t").with_tags(" x ,, y,");
        assert_eq!(record.tag_list(), vec!["x", "y"]);
        assert!(ConversionRecord::new("l", "t").tag_list().is_empty());
    }

    #[test]
    fn test_with_fragments() {
        let record = ConversionRecord::new("l", "t").with_fragments(&["a", "", "c"]);
        assert_eq!(record.fragments(), vec!["a", "c"]);
    }
}
