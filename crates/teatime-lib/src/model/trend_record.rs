// Dates are kept as `YYYY-MM-DD` strings: window filtering compares them
// lexicographically, so no calendar type sits between the CSV and the index.
use serde::{Deserialize, Serialize};

/// One corpus row as it appears in the `date,rank,topic` table.
///
/// Every column is optional so that a short or blank row deserializes and can
/// be rejected by [`TrendRecord::from_raw`] instead of aborting the whole load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrendRow {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl RawTrendRow {
    pub fn new(date: &str, rank: &str, topic: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            rank: Some(rank.to_string()),
            topic: Some(topic.to_string()),
        }
    }
}

/// A single trending observation: `topic` was trending at `rank` on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub date: String,
    /// Position in that day's trend list. `None` when the source cell was
    /// missing or not a positive integer.
    pub rank: Option<u32>,
    pub topic: String,
}

impl TrendRecord {
    /// Validate a raw row. Returns the name of the first missing field on failure.
    pub fn from_raw(raw: RawTrendRow) -> Result<Self, &'static str> {
        let date = non_empty(raw.date).ok_or("missing date")?;
        let topic = non_empty(raw.topic).ok_or("missing topic")?;
        let rank = non_empty(raw.rank)
            .and_then(|r| r.parse::<u32>().ok())
            .filter(|r| *r > 0);
        Ok(Self { date, rank, topic })
    }
}

/// Text following a leading `#` tag marker, if the topic carries one.
pub fn tag_body(topic: &str) -> Option<&str> {
    topic.strip_prefix('#')
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}
