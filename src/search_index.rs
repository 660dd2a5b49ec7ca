//! Relevance-ranked search over flattened (app, version) records.
use crate::models::{App, SearchRecord};
use std::cmp::Ordering;

pub const DEFAULT_LIMIT: usize = 50;

const MIN_QUERY_CHARS: usize = 2;
const NAME_WEIGHT: f64 = 0.8;
const BUNDLE_WEIGHT: f64 = 0.2;
/// Worst per-field score (edits per query character) still counted as a match.
const MATCH_THRESHOLD: f64 = 0.4;

const EXACT_NAME_BONUS: f64 = 0.7;
const PREFIX_NAME_BONUS: f64 = 0.4;
const SUBSTRING_NAME_BONUS: f64 = 0.18;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: SearchRecord,
    pub relevance: f64,
}

/// Approximate match of `query` anywhere in `field`, both lowercased.
/// Returns 0.0 for a clean substring hit, up to `MATCH_THRESHOLD` for typos.
fn field_score(query: &str, field: &str) -> Option<f64> {
    if field.is_empty() {
        return None;
    }
    if field.contains(query) {
        return Some(0.0);
    }

    let q_len = query.chars().count();
    let chars: Vec<char> = field.chars().collect();
    let mut best = usize::MAX;

    if chars.len() + 1 < q_len {
        best = strsim::osa_distance(query, field);
    } else {
        for width in [q_len.saturating_sub(1), q_len, q_len + 1] {
            if width == 0 || width > chars.len() {
                continue;
            }
            for window in chars.windows(width) {
                let candidate: String = window.iter().collect();
                best = best.min(strsim::osa_distance(query, &candidate));
            }
        }
    }

    let score = (best as f64 / q_len as f64).min(1.0);
    (score <= MATCH_THRESHOLD).then_some(score)
}

/// Weighted fuzzy score across name and bundle identifier; lower is better.
fn fuzzy_score(query: &str, record: &SearchRecord) -> Option<f64> {
    let name = field_score(query, &record.name.to_lowercase());
    let bundle = field_score(query, &record.bundle_id.to_lowercase())
        .map(|s| 1.0 - (1.0 - s) * (BUNDLE_WEIGHT / NAME_WEIGHT));

    match (name, bundle) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn name_bonus(query: &str, name: &str) -> f64 {
    let name = name.to_lowercase();
    if name == query {
        EXACT_NAME_BONUS
    } else if name.starts_with(query) {
        PREFIX_NAME_BONUS
    } else if name.contains(query) {
        SUBSTRING_NAME_BONUS
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    records: Vec<SearchRecord>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SearchRecord>) -> Self {
        Self { records }
    }

    /// Replaces the index contents with the flattened form of `apps`.
    pub fn build(&mut self, apps: &[App]) {
        self.records = SearchRecord::flatten(apps);
    }

    pub fn add_apps(&mut self, apps: &[App]) {
        self.records.extend(SearchRecord::flatten(apps));
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn search(
        &self,
        query: &str,
        candidates: Option<&[SearchRecord]>,
        limit: usize,
    ) -> Vec<SearchRecord> {
        self.search_scored(query, candidates, limit)
            .into_iter()
            .map(|hit| hit.record)
            .collect()
    }

    /// Ranks `candidates` (or the whole index) against `query`.
    ///
    /// A blank query returns the first `limit` candidates in input order with
    /// zero relevance. A subset that differs from the index is searched
    /// through a throwaway index so this one stays untouched.
    pub fn search_scored(
        &self,
        query: &str,
        candidates: Option<&[SearchRecord]>,
        limit: usize,
    ) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        let pool = candidates.unwrap_or(&self.records);

        if query.is_empty() {
            return pool
                .iter()
                .take(limit)
                .cloned()
                .map(|record| SearchHit {
                    record,
                    relevance: 0.0,
                })
                .collect();
        }

        if let Some(subset) = candidates {
            if subset != self.records.as_slice() {
                return SearchIndex::from_records(subset.to_vec()).rank(&query, limit);
            }
        }
        self.rank(&query, limit)
    }

    fn rank(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .records
            .iter()
            .filter_map(|record| {
                let fuzzy = fuzzy_score(query, record)?;
                Some(SearchHit {
                    relevance: 1.0 - fuzzy + name_bonus(query, &record.name),
                    record: record.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(limit);
        hits
    }
}
