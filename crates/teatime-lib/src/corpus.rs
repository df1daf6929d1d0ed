//! Corpus store: the dated `topic` table loaded once per engine.
//!
//! Rows are validated one by one; a row without a date or topic is dropped and
//! counted, never fatal. The only load failure is ending up with no rows at all
//! (or not being able to read the source in the first place).

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::timeline::{TopicSummary, TopicTimeline};
use crate::model::trend_record::{RawTrendRow, TrendRecord};
use crate::temporal::DateWindow;

/// Number of example dates kept per topic summary.
const EXAMPLE_DATES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("corpus contains no usable rows")]
    Empty,

    #[error("malformed row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("failed to open corpus at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus table is unreadable: {0}")]
    Csv(#[from] csv::Error),
}

/// Earliest and latest date present anywhere in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusBounds {
    pub start: String,
    pub end: String,
}

/// Immutable topic/date index built from the corpus rows.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    records: Vec<TrendRecord>,
    /// topic -> ascending, de-duplicated dates.
    topic_dates: BTreeMap<String, Vec<String>>,
    bounds: CorpusBounds,
    rows_skipped: usize,
}

impl CorpusStore {
    /// Build the store from raw rows, skipping malformed ones.
    ///
    /// # Errors
    ///
    /// `CorpusError::Empty` when no row survives validation.
    pub fn from_rows<I>(rows: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = RawTrendRow>,
    {
        let mut records = Vec::new();
        let mut rows_skipped = 0usize;
        for (i, raw) in rows.into_iter().enumerate() {
            match parse_row(i + 1, raw) {
                Ok(rec) => records.push(rec),
                Err(err) => {
                    debug!(%err, "skipping corpus row");
                    rows_skipped += 1;
                }
            }
        }
        Self::from_records(records, rows_skipped)
    }

    /// Read a `date,rank,topic` CSV table from any reader.
    ///
    /// Rows the CSV layer cannot decode are treated like malformed rows. A broken
    /// header is fatal.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CorpusError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        rdr.headers()?;

        let mut rows = Vec::new();
        let mut undecodable = 0usize;
        for result in rdr.deserialize::<RawTrendRow>() {
            match result {
                Ok(row) => rows.push(row),
                Err(err) => {
                    debug!(%err, "undecodable corpus row");
                    undecodable += 1;
                }
            }
        }

        let mut store = Self::from_rows(rows)?;
        store.rows_skipped += undecodable;
        Ok(store)
    }

    /// Open and load a corpus CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            path = %path.display(),
            records = store.records.len(),
            topics = store.topic_count(),
            rows_skipped = store.rows_skipped,
            "loaded trend corpus"
        );
        Ok(store)
    }

    fn from_records(records: Vec<TrendRecord>, rows_skipped: usize) -> Result<Self, CorpusError> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for rec in &records {
            grouped
                .entry(rec.topic.clone())
                .or_default()
                .insert(rec.date.clone());
        }

        let start = records.iter().map(|r| r.date.as_str()).min();
        let end = records.iter().map(|r| r.date.as_str()).max();
        let bounds = match (start, end) {
            (Some(s), Some(e)) => CorpusBounds {
                start: s.to_string(),
                end: e.to_string(),
            },
            _ => return Err(CorpusError::Empty),
        };

        let topic_dates = grouped
            .into_iter()
            .map(|(topic, dates)| (topic, dates.into_iter().collect()))
            .collect();

        Ok(Self {
            records,
            topic_dates,
            bounds,
            rows_skipped,
        })
    }

    pub fn bounds(&self) -> &CorpusBounds {
        &self.bounds
    }

    /// Sorted distinct dates for `topic`; empty for unknown topics.
    pub fn dates_for(&self, topic: &str) -> &[String] {
        self.topic_dates
            .get(topic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn topic_count(&self) -> usize {
        self.topic_dates.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    pub fn records(&self) -> &[TrendRecord] {
        &self.records
    }

    /// Topics in ascending name order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topic_dates.keys().map(String::as_str)
    }

    /// True when the topic appeared on at least one date inside `window`.
    pub fn seen_within(&self, topic: &str, window: &DateWindow) -> bool {
        self.dates_for(topic).iter().any(|d| window.contains(d))
    }

    pub fn timeline(&self, topic: &str) -> TopicTimeline {
        TopicTimeline::from_dates(topic, self.dates_for(topic))
    }

    /// One summary per topic, sorted by topic name.
    pub fn topic_summaries(&self) -> Vec<TopicSummary> {
        self.topic_dates
            .iter()
            .filter_map(|(topic, dates)| {
                let first = dates.first()?;
                let last = dates.last()?;
                let years: BTreeSet<String> = dates
                    .iter()
                    .map(|d| d.chars().take(4).collect())
                    .collect();
                Some(TopicSummary {
                    topic: topic.clone(),
                    first_seen: first.clone(),
                    last_seen: last.clone(),
                    days_seen: dates.len(),
                    years_active: years.into_iter().collect(),
                    example_dates: dates.iter().take(EXAMPLE_DATES).cloned().collect(),
                })
            })
            .collect()
    }
}

fn parse_row(line: usize, raw: RawTrendRow) -> Result<TrendRecord, CorpusError> {
    TrendRecord::from_raw(raw).map_err(|reason| CorpusError::MalformedRow {
        line,
        reason: reason.to_string(),
    })
}
