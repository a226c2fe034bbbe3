//! Row Filter - Selects the spreadsheet rows relevant to each search term
//!
//! A row matches a term when the term is a case-insensitive substring of the
//! row description. Matches are then narrowed by query type:
//! - availability: days remaining > 0 and percent used < 100%
//! - history: purchase quantity present

use serde::Serialize;

use super::query_parser::QueryType;
use crate::rows::{Column, Row};

/// Projection of a row for availability questions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityItem {
    pub description: String,
    pub arp: Option<String>,
    pub fonte: Option<String>,
    pub saldo: Option<String>,
    pub authorized: Option<String>,
    pub unit_value: Option<String>,
    pub days_remaining: i64,
    /// Fraction, 0.0..1.0 for included rows
    pub percent_used: f64,
}

/// Projection of a row for purchase history questions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub description: String,
    pub purchase_quantity: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_value: Option<String>,
    pub status: Option<String>,
    pub destination: Option<String>,
    pub sheet: Option<String>,
}

/// One matching row, projected for the query type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultItem {
    Availability(AvailabilityItem),
    History(HistoryItem),
}

impl ResultItem {
    pub fn description(&self) -> &str {
        match self {
            ResultItem::Availability(item) => &item.description,
            ResultItem::History(item) => &item.description,
        }
    }
}

impl From<&Row> for AvailabilityItem {
    fn from(row: &Row) -> Self {
        Self {
            description: row.get_owned(Column::Description).unwrap_or_default(),
            arp: row.get_owned(Column::Arp),
            fonte: row.get_owned(Column::Fonte),
            saldo: row.get_owned(Column::Saldo),
            authorized: row.get_owned(Column::Authorized),
            unit_value: row.get_owned(Column::UnitValue),
            days_remaining: row.days_remaining(),
            percent_used: row.percent_used(),
        }
    }
}

impl From<&Row> for HistoryItem {
    fn from(row: &Row) -> Self {
        Self {
            description: row.get_owned(Column::Description).unwrap_or_default(),
            purchase_quantity: row.get_owned(Column::PurchaseQuantity),
            purchase_date: row.get_owned(Column::PurchaseDate),
            purchase_value: row.get_owned(Column::PurchaseValue),
            status: row.get_owned(Column::Status),
            destination: row.get_owned(Column::Destination),
            sheet: row.get_owned(Column::Sheet),
        }
    }
}

/// Matches for a single search term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermResults {
    pub term: String,
    pub items: Vec<ResultItem>,
}

/// Term -> matches, in the order the terms appeared in the question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsByTerm {
    entries: Vec<TermResults>,
}

impl ResultsByTerm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert results for a term. A term already present keeps its first entry.
    pub fn insert(&mut self, term: String, items: Vec<ResultItem>) {
        if self.get(&term).is_none() {
            self.entries.push(TermResults { term, items });
        }
    }

    pub fn get(&self, term: &str) -> Option<&[ResultItem]> {
        self.entries
            .iter()
            .find(|entry| entry.term == term)
            .map(|entry| entry.items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermResults> {
        self.entries.iter()
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches across all terms
    pub fn total_items(&self) -> usize {
        self.entries.iter().map(|entry| entry.items.len()).sum()
    }
}

/// Per-term row filter
#[derive(Debug, Clone, Default)]
pub struct RowFilter;

impl RowFilter {
    pub fn new() -> Self {
        Self
    }

    /// Filter rows for every term. No terms gives an empty mapping; there is
    /// no fallback sample.
    pub fn filter(&self, terms: &[String], query_type: QueryType, rows: &[Row]) -> ResultsByTerm {
        let mut results = ResultsByTerm::new();

        for term in terms {
            if results.get(term).is_some() {
                continue;
            }

            let needle = term.to_lowercase();
            let items: Vec<ResultItem> = rows
                .iter()
                .filter(|row| Self::description_matches(row, &needle))
                .filter_map(|row| Self::project(row, query_type))
                .collect();

            tracing::debug!(
                term = %term,
                query_type = query_type.as_str(),
                matches = items.len(),
                "Term filtered"
            );

            results.insert(term.clone(), items);
        }

        results
    }

    /// Not expired and not fully consumed
    pub fn is_available(row: &Row) -> bool {
        row.days_remaining() > 0 && row.percent_used() < 1.0
    }

    /// Has a recorded purchase quantity
    pub fn has_purchase(row: &Row) -> bool {
        row.get(Column::PurchaseQuantity).is_some()
    }

    fn description_matches(row: &Row, needle: &str) -> bool {
        row.raw(Column::Description).to_lowercase().contains(needle)
    }

    fn project(row: &Row, query_type: QueryType) -> Option<ResultItem> {
        match query_type {
            QueryType::Availability => Self::is_available(row)
                .then(|| ResultItem::Availability(AvailabilityItem::from(row))),
            QueryType::History => Self::has_purchase(row)
                .then(|| ResultItem::History(HistoryItem::from(row))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(description: &str, days: &str, pct: &str, qty: &str) -> Row {
        Row {
            description: description.to_string(),
            days_remaining: days.to_string(),
            percent_used: pct.to_string(),
            purchase_quantity: qty.to_string(),
            ..Default::default()
        }
    }

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_availability_filters() {
        let rows = vec![
            row("Cimento CP-II", "5", "0.5", ""),
            row("Cimento branco", "0", "0.1", ""),
            row("Cimento cola", "10", "1.0", ""),
            row("Cimento refratário", "10", "100", ""),
            row("Cimento rápido", "nan", "", ""),
        ];

        let results = RowFilter::new().filter(&terms(&["cimento"]), QueryType::Availability, &rows);
        let items = results.get("cimento").unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description(), "Cimento CP-II");
        match &items[0] {
            ResultItem::Availability(item) => {
                assert_eq!(item.days_remaining, 5);
                assert!((item.percent_used - 0.5).abs() < 1e-9);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_percent_given_as_whole_number() {
        let rows = vec![row("Tinta látex", "30", "80", "")];

        let results = RowFilter::new().filter(&terms(&["tinta"]), QueryType::Availability, &rows);
        match &results.get("tinta").unwrap()[0] {
            ResultItem::Availability(item) => assert!((item.percent_used - 0.8).abs() < 1e-9),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_history_requires_purchase_quantity() {
        let rows = vec![
            row("Tinta acrílica", "0", "1", "20"),
            row("Tinta esmalte", "0", "1", ""),
            row("Tinta spray", "0", "1", "nan"),
        ];

        let results = RowFilter::new().filter(&terms(&["tinta"]), QueryType::History, &rows);
        let items = results.get("tinta").unwrap();

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], ResultItem::History(h) if h.purchase_quantity.as_deref() == Some("20")));
    }

    #[test]
    fn test_match_is_case_insensitive_substring_of_description() {
        let rows = vec![
            Row {
                description: "PARAFUSO sextavado".to_string(),
                days_remaining: "3".to_string(),
                ..Default::default()
            },
            Row {
                description: "Porca".to_string(),
                status: "parafuso".to_string(),
                days_remaining: "3".to_string(),
                ..Default::default()
            },
        ];

        let results = RowFilter::new().filter(&terms(&["parafuso"]), QueryType::Availability, &rows);
        let items = results.get("parafuso").unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description(), "PARAFUSO sextavado");
    }

    #[test]
    fn test_terms_keep_order_and_row_order() {
        let rows = vec![
            row("Tinta A", "1", "0", ""),
            row("Cimento A", "1", "0", ""),
            row("Tinta B", "1", "0", ""),
        ];

        let results = RowFilter::new().filter(
            &terms(&["tinta", "cimento", "areia"]),
            QueryType::Availability,
            &rows,
        );

        let order: Vec<&str> = results.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(order, vec!["tinta", "cimento", "areia"]);

        let tinta: Vec<&str> = results.get("tinta").unwrap().iter().map(|i| i.description()).collect();
        assert_eq!(tinta, vec!["Tinta A", "Tinta B"]);
        assert!(results.get("areia").unwrap().is_empty());
        assert_eq!(results.total_items(), 3);
    }

    #[test]
    fn test_no_terms_gives_empty_mapping() {
        let rows = vec![row("Cimento", "5", "0", "")];

        let results = RowFilter::new().filter(&[], QueryType::Availability, &rows);
        assert!(results.is_empty());
        assert_eq!(results.total_items(), 0);
    }

    #[test]
    fn test_repeated_term_maps_once() {
        let rows = vec![row("Cimento", "5", "0", "")];

        let results = RowFilter::new().filter(
            &terms(&["cimento", "cimento"]),
            QueryType::Availability,
            &rows,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results.total_items(), 1);
    }
}
