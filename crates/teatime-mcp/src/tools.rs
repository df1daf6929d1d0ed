use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    schemars,
};
use serde::Deserialize;
use teatime::temporal::normalize_date;
use teatime::{EngineConfig, Ingredient, RetrievalEngine};

/// Dates listed in a timeline before the rest are summarised as a count.
const MAX_TIMELINE_DATES: usize = 30;

/// Input for retrieving topics.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchTrendsInput {
    #[schemars(description = "Free-text query, used for keyword matching")]
    pub query: String,
    #[schemars(description = "Number of topics to return (default: 10, max: 50)")]
    pub k: Option<usize>,
    #[schemars(description = "Earliest date to include (YYYY-MM-DD or RFC3339)")]
    pub start: Option<String>,
    #[schemars(description = "Latest date to include (YYYY-MM-DD or RFC3339)")]
    pub end: Option<String>,
    #[schemars(
        description = "Optional precomputed query embedding; must match the index width"
    )]
    pub embedding: Option<Vec<f32>>,
}

/// Input for a topic timeline.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TopicTimelineInput {
    #[schemars(description = "Exact topic name (case-sensitive)")]
    pub topic: String,
}

/// MCP server exposing a preloaded retrieval engine as compact markdown tools.
#[derive(Debug, Clone)]
pub struct TeatimeMcpServer {
    pub tool_router: ToolRouter<Self>,
    engine: Arc<RetrievalEngine>,
    config: Arc<EngineConfig>,
}

#[rmcp::tool_router]
impl TeatimeMcpServer {
    /// Construct a server around an already loaded engine.
    pub fn new(engine: Arc<RetrievalEngine>, config: Arc<EngineConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
            config,
        }
    }

    /// Retrieve trending topics for a query and date window.
    #[rmcp::tool(
        description = "Find trending topics for a query within an optional date window; returns a markdown table with first/last seen dates"
    )]
    fn search_trends(&self, Parameters(input): Parameters<SearchTrendsInput>) -> String {
        match self.search_trends_impl(input) {
            Ok(output) => output,
            Err(err) => format!("Error: {err}"),
        }
    }

    /// Show when a topic trended.
    #[rmcp::tool(description = "Return first seen, last seen and the dates a topic trended on")]
    fn topic_timeline(&self, Parameters(input): Parameters<TopicTimelineInput>) -> String {
        self.topic_timeline_impl(input)
    }

    /// Corpus size, date bounds and snapshot status.
    #[rmcp::tool(description = "Return compact summary metadata for the loaded trend corpus")]
    fn corpus_summary(&self) -> String {
        self.corpus_summary_impl()
    }
}

impl TeatimeMcpServer {
    fn parse_date(name: &str, value: Option<&str>) -> anyhow::Result<Option<String>> {
        value
            .map(|v| normalize_date(v).map_err(|e| anyhow::anyhow!("{name}: {e}")))
            .transpose()
    }

    fn cell(text: &str) -> String {
        text.replace('|', "\\|")
    }

    fn ingredient_row(idx: usize, ing: &Ingredient) -> String {
        format!(
            "| {} | {} | {:.4} | {} | {} | {} |\n",
            idx + 1,
            Self::cell(&ing.topic),
            ing.score,
            ing.first_seen.as_deref().unwrap_or("-"),
            ing.last_seen.as_deref().unwrap_or("-"),
            ing.days_seen
        )
    }

    fn search_trends_impl(&self, input: SearchTrendsInput) -> anyhow::Result<String> {
        let start = Self::parse_date("start", input.start.as_deref())?;
        let end = Self::parse_date("end", input.end.as_deref())?;
        let k = self.config.clamp_k(input.k);

        let r = self.engine.retrieve(
            input.embedding.as_deref(),
            &input.query,
            k,
            start.as_deref(),
            end.as_deref(),
        );

        let mut out = String::new();
        out.push_str(&format!("# Trends: `{}`\n", input.query));
        out.push_str(&format!("- window: {} .. {}\n", r.window.start, r.window.end));
        out.push_str(&format!("- mode: {:?}\n", r.mode).to_lowercase());
        out.push_str(&format!("- hits: {}\n\n", r.ingredients.len()));

        if r.ingredients.is_empty() {
            out.push_str("No matching topics.\n");
            return Ok(out);
        }

        out.push_str("| # | topic | score | first_seen | last_seen | days_seen |\n");
        out.push_str("|---|-------|-------|------------|-----------|-----------|\n");
        for (idx, ing) in r.ingredients.iter().enumerate() {
            out.push_str(&Self::ingredient_row(idx, ing));
        }
        Ok(out)
    }

    fn topic_timeline_impl(&self, input: TopicTimelineInput) -> String {
        let tl = self.engine.topic_timeline(&input.topic);

        let mut out = String::new();
        out.push_str(&format!("# Timeline: `{}`\n", tl.topic));
        if tl.days_seen == 0 {
            out.push_str("Topic does not appear in the corpus.\n");
            return out;
        }
        out.push_str(&format!(
            "- first_seen: {}\n",
            tl.first_seen.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!(
            "- last_seen: {}\n",
            tl.last_seen.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!("- days_seen: {}\n", tl.days_seen));

        let shown: Vec<&str> = tl
            .dates
            .iter()
            .take(MAX_TIMELINE_DATES)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("- dates: {}", shown.join(", ")));
        if tl.dates.len() > MAX_TIMELINE_DATES {
            out.push_str(&format!(" (+{} more)", tl.dates.len() - MAX_TIMELINE_DATES));
        }
        out.push('\n');
        out
    }

    fn corpus_summary_impl(&self) -> String {
        let s = self.engine.summary();

        let mut out = String::new();
        out.push_str("# Corpus Summary\n");
        out.push_str(&format!("- topics: {}\n", s.topics));
        out.push_str(&format!("- records: {}\n", s.records));
        out.push_str(&format!("- rows_skipped: {}\n", s.rows_skipped));
        out.push_str(&format!("- date_range: {} .. {}\n", s.bounds.start, s.bounds.end));
        out.push_str(&format!("- has_embeddings: {}\n", s.has_embeddings));
        out.push_str(&format!("- embedding_count: {}\n", s.embedding_count));
        if let Some(dim) = self.engine.embedding_dim() {
            out.push_str(&format!("- embedding_dim: {}\n", dim));
        }
        out
    }
}
