//! Context Formatter - Renders selected rows as plain text for the model
//!
//! Output is prose meant for the language model, not a machine-readable
//! format; nothing parses it back.

use super::query_parser::QueryType;
use super::row_filter::{AvailabilityItem, HistoryItem, ResultItem, ResultsByTerm};
use crate::rows::{Column, Row};

/// Marker appended to every rendered description
pub const ELLIPSIS: &str = "...";

/// Shown for absent values
const MISSING: &str = "-";

/// Columns rendered in keyword mode, in order
const KEYWORD_MODE_COLUMNS: &[Column] = &[
    Column::Description,
    Column::Group,
    Column::Subgroup,
    Column::Registered,
    Column::Authorized,
    Column::Saldo,
    Column::UnitValue,
    Column::PurchaseQuantity,
    Column::PurchaseValue,
    Column::Status,
    Column::PurchaseDate,
    Column::Executor,
    Column::Destination,
];

/// Context formatter configuration
#[derive(Debug, Clone)]
pub struct ContextFormatterConfig {
    /// Description budget for availability items (characters)
    pub availability_description_chars: usize,

    /// Description budget for history items (characters)
    pub history_description_chars: usize,
}

impl Default for ContextFormatterConfig {
    fn default() -> Self {
        Self {
            availability_description_chars: 100,
            history_description_chars: 80,
        }
    }
}

/// Renders filter results into the context block of the system prompt
pub struct ContextFormatter {
    config: ContextFormatterConfig,
}

impl ContextFormatter {
    pub fn new(config: ContextFormatterConfig) -> Self {
        Self { config }
    }

    /// Render per-term results
    pub fn format(&self, results: &ResultsByTerm, query_type: QueryType) -> String {
        if results.is_empty() {
            return "Nenhum termo específico identificado na pergunta.".to_string();
        }

        let mut sections = Vec::with_capacity(results.len());

        for entry in results.iter() {
            let mut lines = vec![Self::header(&entry.term, entry.items.len(), query_type)];

            if entry.items.is_empty() {
                lines.push(Self::empty_message(query_type).to_string());
            }

            for (i, item) in entry.items.iter().enumerate() {
                let block = match item {
                    ResultItem::Availability(item) => self.availability_block(i + 1, item),
                    ResultItem::History(item) => self.history_block(i + 1, item),
                };
                lines.push(block);
            }

            sections.push(lines.join("\n"));
        }

        sections.join("\n\n")
    }

    /// Render keyword-mode rows as one line each
    pub fn format_rows(&self, rows: &[&Row]) -> String {
        if rows.is_empty() {
            return "Nenhum dado encontrado.".to_string();
        }

        rows.iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let parts: Vec<String> = KEYWORD_MODE_COLUMNS
                    .iter()
                    .filter_map(|column| {
                        row.get(*column)
                            .map(|value| format!("{}: {}", column.header(), value))
                    })
                    .collect();

                (!parts.is_empty()).then(|| format!("Item {}: {}", i + 1, parts.join(" | ")))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn header(term: &str, count: usize, query_type: QueryType) -> String {
        let what = match (query_type, count) {
            (QueryType::Availability, 1) => "item disponível",
            (QueryType::Availability, _) => "itens disponíveis",
            (QueryType::History, 1) => "compra encontrada",
            (QueryType::History, _) => "compras encontradas",
        };
        format!("### {} ({} {})", term.to_uppercase(), count, what)
    }

    fn empty_message(query_type: QueryType) -> &'static str {
        match query_type {
            QueryType::Availability => {
                "Nenhum item disponível (vencido ou totalmente utilizado)."
            }
            QueryType::History => "Nenhuma compra encontrada.",
        }
    }

    fn availability_block(&self, index: usize, item: &AvailabilityItem) -> String {
        format!(
            "{}. {}: {}\n   {}: {} | {}: {}\n   {}: {} | {}: {} | {}: {}\n   {}: {} | {}: {:.1}%",
            index,
            Column::Description.header(),
            truncate_description(&item.description, self.config.availability_description_chars),
            Column::Arp.header(),
            or_missing(&item.arp),
            Column::Fonte.header(),
            or_missing(&item.fonte),
            Column::Saldo.header(),
            or_missing(&item.saldo),
            Column::Authorized.header(),
            or_missing(&item.authorized),
            Column::UnitValue.header(),
            or_missing(&item.unit_value),
            Column::DaysRemaining.header(),
            item.days_remaining,
            Column::PercentUsed.header(),
            item.percent_used * 100.0,
        )
    }

    fn history_block(&self, index: usize, item: &HistoryItem) -> String {
        format!(
            "{}. {}: {}\n   {}: {} | {}: {} | {}: {}\n   {}: {} | {}: {} | {}: {}",
            index,
            Column::Description.header(),
            truncate_description(&item.description, self.config.history_description_chars),
            Column::PurchaseQuantity.header(),
            or_missing(&item.purchase_quantity),
            Column::PurchaseDate.header(),
            or_missing(&item.purchase_date),
            Column::PurchaseValue.header(),
            or_missing(&item.purchase_value),
            Column::Status.header(),
            or_missing(&item.status),
            Column::Destination.header(),
            or_missing(&item.destination),
            Column::Sheet.header(),
            or_missing(&item.sheet),
        )
    }
}

impl Default for ContextFormatter {
    fn default() -> Self {
        Self::new(ContextFormatterConfig::default())
    }
}

/// Keep at most `budget` characters and append the ellipsis marker.
/// The marker is appended even when nothing was cut.
pub fn truncate_description(description: &str, budget: usize) -> String {
    let mut truncated: String = description.chars().take(budget).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}
