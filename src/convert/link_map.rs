use crate::output::ConversionRecord;
use crate::paths::{build_output_path, components_under, PathReservations};
use crate::url::LinkGrammar;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A record together with where it is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub record: ConversionRecord,
    /// Document id, when the record's link carries one
    pub id: Option<String>,
    /// Reserved output path
    pub path: PathBuf,
    /// `path` relative to the output directory, split into components (file name last)
    pub components: Vec<String>,
}

impl LinkTarget {
    /// Directory components of the target, relative to the output directory
    pub fn directory(&self) -> &[String] {
        self.components
            .split_last()
            .map(|(_, dir)| dir)
            .unwrap_or_default()
    }
}

/// Index from store links to the documents of a run
///
/// Every record is indexed by its literal link and by its document id. When two records share
/// a link or an id, the first one is the link target.
#[derive(Debug, Default)]
pub struct LinkMap {
    targets: Vec<LinkTarget>,
    by_link: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl LinkMap {
    /// Plans the output path of every record and indexes the records
    ///
    /// Paths are reserved in input order, so collision suffixes only depend on that order.
    ///
    /// # Arguments
    ///
    /// * `records` - The run's records, in order
    /// * `grammar` - Resolves record links to document ids
    /// * `output_dir` - Output directory
    /// * `reservations` - The run's path reservations
    pub fn build(
        records: &[ConversionRecord],
        grammar: &LinkGrammar,
        output_dir: &Path,
        reservations: &PathReservations,
    ) -> Self {
        let mut map = Self::default();

        for record in records {
            let index = map.targets.len();

            let id = match grammar.extract_id(&record.link) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(
                        "{} is reachable only by its literal link: {}",
                        record.title,
                        e
                    );
                    None
                }
            };

            let planned = build_output_path(output_dir, &record.title, &record.fragments());
            let path = reservations.reserve(&planned);
            if path != planned {
                tracing::debug!("{} collides, using {}", planned.display(), path.display());
            }
            let components = components_under(output_dir, &path).unwrap_or_default();

            map.by_link.entry(record.link.clone()).or_insert(index);
            if let Some(id) = &id {
                map.by_id.entry(id.clone()).or_insert(index);
            }

            map.targets.push(LinkTarget {
                record: record.clone(),
                id,
                path,
                components,
            });
        }

        map
    }

    /// Finds the target of a link, by literal URL first and document id second
    pub fn resolve(&self, url: &str, grammar: &LinkGrammar) -> Option<&LinkTarget> {
        if let Some(&index) = self.by_link.get(url) {
            return self.targets.get(index);
        }
        let id = grammar.extract_id(url).ok()?;
        self.resolve_id(&id)
    }

    pub fn resolve_id(&self, id: &str) -> Option<&LinkTarget> {
        self.by_id.get(id).and_then(|&index| self.targets.get(index))
    }

    pub fn target(&self, index: usize) -> Option<&LinkTarget> {
        self.targets.get(index)
    }

    pub fn targets(&self) -> &[LinkTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Everything one conversion or sync run shares between its workers
#[derive(Debug)]
pub struct ConversionSession {
    pub grammar: LinkGrammar,
    pub output_dir: PathBuf,
    pub reservations: PathReservations,
    pub link_map: LinkMap,
}

impl ConversionSession {
    /// Plans a run over `records`
    pub fn plan(records: &[ConversionRecord], grammar: LinkGrammar, output_dir: &Path) -> Self {
        let reservations = PathReservations::new();
        let link_map = LinkMap::build(records, &grammar, output_dir, &reservations);
        tracing::info!(
            "Planned {} documents under {}",
            link_map.len(),
            output_dir.display()
        );

        Self {
            grammar,
            output_dir: output_dir.to_path_buf(),
            reservations,
            link_map,
        }
    }

    /// Finds the target of a link
    pub fn resolve(&self, url: &str) -> Option<&LinkTarget> {
        self.link_map.resolve(url, &self.grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> LinkGrammar {
        LinkGrammar::new(&["docs.google.com".to_string()]).unwrap()
    }

    fn doc(id: &str) -> String {
        format!("https://docs.google.com/document/d/{}/edit", id)
    }

    #[test]
    fn test_paths_planned_in_input_order() {
        let records = vec![
            ConversionRecord::new(&doc("a"), "Guide").with_fragments(&["docs"]),
            ConversionRecord::new(&doc("b"), "Guide").with_fragments(&["docs"]),
            ConversionRecord::new(&doc("c"), "Other"),
        ];
        let session = ConversionSession::plan(&records, grammar(), Path::new("out"));
        let paths: Vec<&Path> = session
            .link_map
            .targets()
            .iter()
            .map(|t| t.path.as_path())
            .collect();

        assert_eq!(
            paths,
            vec![
                Path::new("out/docs/guide.md"),
                Path::new("out/docs/guide_1.md"),
                Path::new("out/other.md"),
            ]
        );
        assert_eq!(session.link_map.target(1).unwrap().directory(), ["docs".to_string()]);
        assert!(session.link_map.target(2).unwrap().directory().is_empty());
    }

    #[test]
    fn test_resolve_by_link_then_id() {
        let records = vec![
            ConversionRecord::new(&doc("a"), "A"),
            ConversionRecord::new("https://docs.google.com/document/d/b/view", "B"),
        ];
        let session = ConversionSession::plan(&records, grammar(), Path::new("out"));

        assert_eq!(session.resolve(&doc("a")).unwrap().record.title, "A");
        assert_eq!(session.resolve(&doc("b")).unwrap().record.title, "B");
        assert!(session.resolve(&doc("zzz")).is_none());
        assert!(session.resolve("https://docs.google.com/nothing").is_none());
    }

    #[test]
    fn test_first_record_wins() {
        let records = vec![
            ConversionRecord::new(&doc("a"), "First"),
            ConversionRecord::new(&doc("a"), "Second"),
        ];
        let session = ConversionSession::plan(&records, grammar(), Path::new("out"));

        assert_eq!(session.resolve(&doc("a")).unwrap().record.title, "First");
        assert_eq!(session.link_map.len(), 2);
    }

    #[test]
    fn test_unresolvable_link_still_planned() {
        let records = vec![ConversionRecord::new("https://example.com/page", "Elsewhere")];
        let session = ConversionSession::plan(&records, grammar(), Path::new("out"));

        let target = session.link_map.target(0).unwrap();
        assert_eq!(target.id, None);
        assert_eq!(target.path, PathBuf::from("out/elsewhere.md"));
        assert_eq!(
            session.resolve("https://example.com/page").unwrap().record.title,
            "Elsewhere"
        );
    }
}
