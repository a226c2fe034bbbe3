//! Spreadsheet rows
//!
//! Provides:
//! - The typed `Row` read from the procurement spreadsheet export
//! - `Column` metadata (header text and display label)
//! - A single presence predicate for blank / "nan" cells
//! - Best-effort numeric coercion for days-remaining and percent-used

mod store;

pub use store::{CsvRowStore, MemoryRowStore, RowStore};

use serde::{Deserialize, Serialize};

/// Columns the service knows about, in spreadsheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Description,
    Arp,
    Fonte,
    Group,
    Subgroup,
    Registered,
    Authorized,
    Saldo,
    UnitValue,
    DaysRemaining,
    PercentUsed,
    PurchaseQuantity,
    PurchaseDate,
    PurchaseValue,
    Status,
    Executor,
    Destination,
    Sheet,
}

impl Column {
    pub const ALL: [Column; 18] = [
        Column::Description,
        Column::Arp,
        Column::Fonte,
        Column::Group,
        Column::Subgroup,
        Column::Registered,
        Column::Authorized,
        Column::Saldo,
        Column::UnitValue,
        Column::DaysRemaining,
        Column::PercentUsed,
        Column::PurchaseQuantity,
        Column::PurchaseDate,
        Column::PurchaseValue,
        Column::Status,
        Column::Executor,
        Column::Destination,
        Column::Sheet,
    ];

    /// Header text in the CSV export; also used as the label shown to the model
    pub fn header(&self) -> &'static str {
        match self {
            Column::Description => "Descrição",
            Column::Arp => "ARP",
            Column::Fonte => "Fonte",
            Column::Group => "Grupo",
            Column::Subgroup => "Subgrupo",
            Column::Registered => "Registrado",
            Column::Authorized => "Autorizado",
            Column::Saldo => "Saldo",
            Column::UnitValue => "Valor unitário",
            Column::DaysRemaining => "Dias restantes",
            Column::PercentUsed => "% utilizado",
            Column::PurchaseQuantity => "Compra QT.",
            Column::PurchaseDate => "Compra Data",
            Column::PurchaseValue => "Compra Valor",
            Column::Status => "Status",
            Column::Executor => "Executor",
            Column::Destination => "Destino",
            Column::Sheet => "Aba",
        }
    }

    /// Alternate header spellings accepted on read
    const HEADER_ALIASES: [&'static str; 5] = [
        "Descricao",
        "Valor unitario",
        "Dias Restantes",
        "% Utilizado",
        "Compra QT",
    ];

    /// Whether a CSV header maps onto one of the typed columns
    pub fn is_known_header(header: &str) -> bool {
        Column::ALL.iter().any(|column| column.header() == header)
            || Column::HEADER_ALIASES.contains(&header)
    }
}

/// One spreadsheet row. Missing columns deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Row {
    #[serde(rename = "Descrição", alias = "Descricao")]
    pub description: String,

    #[serde(rename = "ARP")]
    pub arp: String,

    #[serde(rename = "Fonte")]
    pub fonte: String,

    #[serde(rename = "Grupo")]
    pub group: String,

    #[serde(rename = "Subgrupo")]
    pub subgroup: String,

    #[serde(rename = "Registrado")]
    pub registered: String,

    #[serde(rename = "Autorizado")]
    pub authorized: String,

    #[serde(rename = "Saldo")]
    pub saldo: String,

    #[serde(rename = "Valor unitário", alias = "Valor unitario")]
    pub unit_value: String,

    #[serde(rename = "Dias restantes", alias = "Dias Restantes")]
    pub days_remaining: String,

    #[serde(rename = "% utilizado", alias = "% Utilizado")]
    pub percent_used: String,

    #[serde(rename = "Compra QT.", alias = "Compra QT")]
    pub purchase_quantity: String,

    #[serde(rename = "Compra Data")]
    pub purchase_date: String,

    #[serde(rename = "Compra Valor")]
    pub purchase_value: String,

    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "Executor")]
    pub executor: String,

    #[serde(rename = "Destino")]
    pub destination: String,

    #[serde(rename = "Aba")]
    pub sheet: String,

    /// Cells under headers with no typed column, in file order
    #[serde(skip)]
    pub extra: Vec<(String, String)>,
}

impl Row {
    /// Raw cell text, exactly as read
    pub fn raw(&self, column: Column) -> &str {
        match column {
            Column::Description => &self.description,
            Column::Arp => &self.arp,
            Column::Fonte => &self.fonte,
            Column::Group => &self.group,
            Column::Subgroup => &self.subgroup,
            Column::Registered => &self.registered,
            Column::Authorized => &self.authorized,
            Column::Saldo => &self.saldo,
            Column::UnitValue => &self.unit_value,
            Column::DaysRemaining => &self.days_remaining,
            Column::PercentUsed => &self.percent_used,
            Column::PurchaseQuantity => &self.purchase_quantity,
            Column::PurchaseDate => &self.purchase_date,
            Column::PurchaseValue => &self.purchase_value,
            Column::Status => &self.status,
            Column::Executor => &self.executor,
            Column::Destination => &self.destination,
            Column::Sheet => &self.sheet,
        }
    }

    /// Trimmed cell text, or `None` when the cell is blank or "nan"
    pub fn get(&self, column: Column) -> Option<&str> {
        let value = self.raw(column);
        is_present(value).then(|| value.trim())
    }

    /// Owned variant of [`Row::get`]
    pub fn get_owned(&self, column: Column) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    /// Days until the purchase agreement expires (0 when unknown)
    pub fn days_remaining(&self) -> i64 {
        parse_days(self.raw(Column::DaysRemaining))
    }

    /// Consumed fraction of the authorized amount, 0.0..=1.0 for sane data
    pub fn percent_used(&self) -> f64 {
        parse_percent(self.raw(Column::PercentUsed))
    }

    /// Lowercased concatenation of every cell, typed or not, for keyword scans
    pub fn searchable_text(&self) -> String {
        Column::ALL
            .iter()
            .map(|column| self.raw(*column))
            .chain(self.extra.iter().map(|(_, value)| value.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// A cell is present unless it is blank or the literal "nan" left by
/// spreadsheet exports of empty numeric cells.
pub fn is_present(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("nan")
}

/// Parse a loosely formatted number: "12", "12.0", "0,8", "80%", "1.234,5".
fn parse_number(value: &str) -> Option<f64> {
    if !is_present(value) {
        return None;
    }

    let mut text = value.trim().trim_end_matches('%').trim().to_string();
    if text.contains(',') {
        // Brazilian formatting: '.' groups thousands, ',' marks decimals
        text = text.replace('.', "").replace(',', ".");
    }

    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Days remaining as an integer; unparseable input yields 0
pub fn parse_days(value: &str) -> i64 {
    parse_number(value).map(|days| days.trunc() as i64).unwrap_or(0)
}

/// Percent used as a fraction. Values above 1 are read as percentages
/// ("80" -> 0.8); values up to 1 are already fractions. Unparseable -> 0.0
pub fn parse_percent(value: &str) -> f64 {
    match parse_number(value) {
        Some(pct) if pct > 1.0 => pct / 100.0,
        Some(pct) => pct,
        None => 0.0,
    }
}
