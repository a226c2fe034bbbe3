//! Context Engine Core Components
//!
//! The Context Engine turns a question into a grounded answer:
//! - Query understanding (terms, availability vs. history)
//! - Per-term row filtering, or keyword selection
//! - Context formatting and prompt assembly
//! - Answer synthesis

mod engine;
mod formatter;
mod keyword_search;
mod prompt;
mod query_parser;
mod row_filter;
mod synthesizer;

pub use engine::{Answer, ContextEngine, PreparedPrompt};
pub use formatter::{truncate_description, ContextFormatter, ContextFormatterConfig, ELLIPSIS};
pub use keyword_search::{KeywordSearch, SEARCH_KEYWORDS};
pub use prompt::build_system_prompt;
pub use query_parser::{QueryParser, QueryType, QueryUnderstanding};
pub use row_filter::{AvailabilityItem, HistoryItem, ResultItem, ResultsByTerm, RowFilter, TermResults};
pub use synthesizer::{AnswerService, AnthropicSynthesizer};
