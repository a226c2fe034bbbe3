//! Keyword Search - Coarse row selection over a fixed vocabulary
//!
//! Looks for known product and status keywords in the question and keeps
//! rows mentioning any of them in any column. Falls back to the first rows
//! of the spreadsheet when nothing matches.

use crate::rows::Row;

/// Vocabulary recognized in questions (stems, so "eletric" covers
/// "elétrica" spelled without accents)
pub const SEARCH_KEYWORDS: &[&str] = &[
    "cimento", "tinta", "parafuso", "ferramenta", "eletric", "hidraulic",
    "construcao", "escritorio", "limpeza", "papel", "caneta", "computador",
    "pendente", "entregue", "cancelad", "aguardando", "sem entrega",
];

/// Keyword-based row selection
#[derive(Debug, Clone)]
pub struct KeywordSearch {
    max_rows: usize,
}

impl KeywordSearch {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// Keywords present in the question, in vocabulary order
    pub fn keywords_in(question: &str) -> Vec<&'static str> {
        let lowered = question.to_lowercase();
        SEARCH_KEYWORDS
            .iter()
            .copied()
            .filter(|kw| lowered.contains(kw))
            .collect()
    }

    /// Select at most `max_rows` rows for the question
    pub fn select<'a>(&self, question: &str, rows: &'a [Row]) -> Vec<&'a Row> {
        let keywords = Self::keywords_in(question);

        if keywords.is_empty() {
            tracing::debug!(max_rows = self.max_rows, "No keyword found, using leading rows");
            return rows.iter().take(self.max_rows).collect();
        }

        let relevant: Vec<&Row> = rows
            .iter()
            .filter(|row| {
                let text = row.searchable_text();
                keywords.iter().any(|kw| text.contains(kw))
            })
            .take(self.max_rows)
            .collect();

        tracing::debug!(
            keywords = ?keywords,
            matches = relevant.len(),
            "Keyword search completed"
        );

        if relevant.is_empty() {
            rows.iter().take(self.max_rows).collect()
        } else {
            relevant
        }
    }
}
