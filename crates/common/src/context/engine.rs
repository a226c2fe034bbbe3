//! Context Engine - Answers one question end to end
//!
//! question -> rows -> terms/type -> filtered rows -> context -> prompt -> answer

use serde::Serialize;
use std::sync::Arc;

use super::formatter::{ContextFormatter, ContextFormatterConfig};
use super::keyword_search::KeywordSearch;
use super::prompt::build_system_prompt;
use super::query_parser::{QueryParser, QueryType};
use super::row_filter::RowFilter;
use super::synthesizer::AnswerService;
use crate::config::{SearchConfig, SearchMode};
use crate::errors::{AppError, Result};
use crate::metrics::{self, QuestionMetrics};
use crate::rows::{Row, RowStore};

/// Everything the answer service needs for one question
#[derive(Debug, Clone, Serialize)]
pub struct PreparedPrompt {
    pub system_prompt: String,

    /// Rows placed in the context
    pub item_count: usize,

    /// Query type; `None` in keyword mode
    pub query_type: Option<QueryType>,

    /// Extracted terms; empty in keyword mode
    pub terms: Vec<String>,
}

/// Final answer with the context summary that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub item_count: usize,
    pub query_type: Option<QueryType>,
    pub terms: Vec<String>,
}

/// Question answering pipeline
pub struct ContextEngine {
    store: Arc<dyn RowStore>,
    answerer: Arc<dyn AnswerService>,
    parser: QueryParser,
    filter: RowFilter,
    formatter: ContextFormatter,
    keyword_search: KeywordSearch,
    mode: SearchMode,
}

impl ContextEngine {
    pub fn new(
        store: Arc<dyn RowStore>,
        answerer: Arc<dyn AnswerService>,
        search: &SearchConfig,
    ) -> Self {
        let formatter = ContextFormatter::new(ContextFormatterConfig {
            availability_description_chars: search.availability_description_chars,
            history_description_chars: search.history_description_chars,
        });

        Self {
            store,
            answerer,
            parser: QueryParser::new(),
            filter: RowFilter::new(),
            formatter,
            keyword_search: KeywordSearch::new(search.max_rows),
            mode: search.mode,
        }
    }

    /// Answer a question. Rows are reloaded on every call.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let metrics = QuestionMetrics::start(mode_label(self.mode));

        match self.run(question).await {
            Ok(answer) => {
                metrics.finish("success");
                Ok(answer)
            }
            Err(e) => {
                metrics.finish(e.kind().as_str());
                Err(e)
            }
        }
    }

    /// The question reaches the answer service exactly as received; trimming
    /// only decides emptiness.
    async fn run(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(AppError::empty_question());
        }

        let rows = self.store.load().await?;
        metrics::record_rows_loaded(rows.len());

        let prepared = self.prepare(question, &rows);

        tracing::info!(
            rows = rows.len(),
            items = prepared.item_count,
            terms = ?prepared.terms,
            query_type = prepared.query_type.map(|q| q.as_str()).unwrap_or("none"),
            "Context prepared"
        );

        let text = self.answerer.answer(&prepared.system_prompt, question).await?;

        Ok(Answer {
            text,
            item_count: prepared.item_count,
            query_type: prepared.query_type,
            terms: prepared.terms,
        })
    }

    /// Build the system prompt for a question over the given rows
    pub fn prepare(&self, question: &str, rows: &[Row]) -> PreparedPrompt {
        match self.mode {
            SearchMode::Classified => {
                let understanding = self.parser.parse(question);
                let results = self.filter.filter(
                    &understanding.terms,
                    understanding.query_type,
                    rows,
                );

                let context = self.formatter.format(&results, understanding.query_type);
                let item_count = results.total_items();
                metrics::record_context_items(understanding.query_type.as_str(), item_count);

                PreparedPrompt {
                    system_prompt: build_system_prompt(
                        item_count,
                        &context,
                        Some(understanding.query_type),
                    ),
                    item_count,
                    query_type: Some(understanding.query_type),
                    terms: understanding.terms,
                }
            }
            SearchMode::Keyword => {
                let selected = self.keyword_search.select(question, rows);
                let context = self.formatter.format_rows(&selected);
                metrics::record_context_items("keyword", selected.len());

                PreparedPrompt {
                    system_prompt: build_system_prompt(selected.len(), &context, None),
                    item_count: selected.len(),
                    query_type: None,
                    terms: Vec::new(),
                }
            }
        }
    }

    /// Load the spreadsheet once and report its size (readiness checks)
    pub async fn check_store(&self) -> Result<usize> {
        self.store.load().await.map(|rows| rows.len())
    }

    pub fn store_location(&self) -> String {
        self.store.location()
    }
}

fn mode_label(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Classified => "classified",
        SearchMode::Keyword => "keyword",
    }
}
