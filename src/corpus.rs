use crate::domain::DomainUtils;
use anyhow::{anyhow, Result};
use std::collections::HashSet;

/// Built-in top-sites dataset, used when no corpus file is configured.
const DEFAULT_CORPUS: &str = include_str!("../data/top-domains.csv");

#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub rank: u32,
    pub domain: String,
    /// Second-level component of the domain (segment before the public suffix).
    pub label: String,
}

/// Immutable table of known-legitimate domains, loaded once at startup and
/// shared read-only across requests.
#[derive(Debug)]
pub struct ReferenceCorpus {
    entries: Vec<CorpusEntry>,
    domains: HashSet<String>,
    labels: HashSet<String>,
}

impl ReferenceCorpus {
    /// Parse a "rank,domain" CSV. Blank lines and '#' comments are skipped;
    /// duplicate labels collapse into the unique label set.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut domains = HashSet::new();
        let mut labels = HashSet::new();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (rank_str, domain) = line
                .split_once(',')
                .ok_or_else(|| anyhow!("corpus line {} is not rank,domain: {line}", lineno + 1))?;
            let rank: u32 = rank_str
                .trim()
                .parse()
                .map_err(|_| anyhow!("corpus line {} has invalid rank: {rank_str}", lineno + 1))?;

            let domain = domain.trim().to_lowercase();
            let label = Self::second_level_label(&domain)
                .ok_or_else(|| anyhow!("corpus line {} has no usable label: {domain}", lineno + 1))?;

            domains.insert(domain.clone());
            labels.insert(label.clone());
            entries.push(CorpusEntry {
                rank,
                domain,
                label,
            });
        }

        if entries.is_empty() {
            return Err(anyhow!("corpus is empty"));
        }

        log::info!(
            "Loaded reference corpus: {} domains, {} unique labels",
            entries.len(),
            labels.len()
        );

        Ok(Self {
            entries,
            domains,
            labels,
        })
    }

    /// Load the embedded default dataset.
    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_CORPUS)
    }

    /// Load a corpus from an operator-supplied file.
    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Second-level label of a domain: the segment just before the public
    /// suffix of its registrable domain.
    fn second_level_label(domain: &str) -> Option<String> {
        let registrable = DomainUtils::registrable_domain(domain);
        let label = registrable.split('.').next()?;
        if label.is_empty() {
            None
        } else {
            Some(label.to_lowercase())
        }
    }

    /// Whether the (canonicalized) domain appears verbatim in the corpus.
    pub fn contains_domain(&self, domain: &str) -> bool {
        self.domains.contains(&DomainUtils::canonicalize(domain))
    }

    /// Unique second-level labels, for similarity matching.
    pub fn labels(&self) -> &HashSet<String> {
        &self.labels
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
