//! Query Parser - Turns a question into search terms and a query type
//!
//! Provides:
//! - Term extraction (list splitting, stopword removal)
//! - Query classification (availability vs. purchase history)

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What the user wants to know about the matched items
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Unexpired agreements with unused balance
    #[default]
    Availability,
    /// Past purchase records
    History,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Availability => "availability",
            QueryType::History => "history",
        }
    }
}

/// Query understanding result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryUnderstanding {
    /// Original question text
    pub original_query: String,

    /// Normalized search terms, in question order
    pub terms: Vec<String>,

    /// Detected query type
    pub query_type: QueryType,
}

impl QueryUnderstanding {
    pub fn has_terms(&self) -> bool {
        !self.terms.is_empty()
    }
}

/// Keywords that mark a question about past purchases
const HISTORY_KEYWORDS: &[&str] = &[
    "comprou", "compramos", "comprado", "comprada", "compraram",
    "adquirimos", "adquirido", "adquirida",
    "quando",
    "última", "ultima", "último", "ultimo",
    "histórico", "historico",
];

/// Characters that separate list items in a question
const SEGMENT_SEPARATORS: &[char] = &[';', '\n', '\r', '\t', '?', '!'];

/// Punctuation stripped from the edges of each word
const WORD_PUNCTUATION: &[char] = &['.', ':', '"', '\'', '(', ')'];

/// Words never worth searching for
const STOP_WORDS: &[&str] = &[
    // articles
    "o", "a", "os", "as", "um", "uma", "uns", "umas",
    // prepositions and contractions
    "de", "da", "do", "das", "dos", "em", "no", "na", "nos", "nas",
    "para", "pra", "pro", "por", "pelo", "pela", "pelos", "pelas",
    "com", "sem", "ao", "aos", "à", "às", "até", "ate", "sobre", "entre",
    // pronouns and fillers
    "que", "qual", "quais", "quem", "onde", "como", "se", "eu", "nós",
    "você", "voce", "vocês", "voces", "meu", "minha", "nosso", "nossa",
    "nossos", "nossas", "esse", "essa", "esses", "essas", "este", "esta",
    "isso", "isto", "algum", "alguma", "alguns", "algumas", "mais",
    "muito", "também", "tambem", "ainda", "já", "ja", "não", "nao",
    "sim", "todo", "toda", "todos", "todas",
    // query verbs
    "tem", "temos", "tenho", "têm", "há", "ha", "existe", "existem",
    "possui", "possuimos", "possuímos", "quero", "queria", "gostaria",
    "preciso", "precisamos", "pode", "podemos", "posso", "saber", "ver",
    "mostrar", "mostre", "mostra", "liste", "listar", "lista", "informe",
    "informar", "diga", "buscar", "busque", "procurar", "consultar",
    "verificar", "quanto", "quantos", "quanta", "quantas", "está",
    "estão", "estao", "são", "sao", "foi", "foram", "ser", "fazer",
    // purchase verbs
    "comprar", "compra", "compras", "comprou", "compramos", "comprado",
    "comprada", "comprados", "compradas", "compraram", "adquirir",
    "adquirimos", "adquirido", "adquirida", "pedido", "pedidos",
    // temporal words
    "quando", "última", "ultima", "último", "ultimo", "últimas",
    "ultimas", "últimos", "ultimos", "vez", "vezes", "hoje", "ontem",
    "agora", "ano", "anos", "mês", "mes", "meses", "dia", "dias",
    "semana", "recente", "recentes", "recentemente", "atual",
    "atualmente", "histórico", "historico", "data", "datas", "período",
    "periodo",
    // availability words
    "disponível", "disponivel", "disponíveis", "disponiveis",
    "disponibilidade", "saldo", "saldos", "vigente", "vigentes",
    "válido", "valido", "ata", "atas", "arp", "item", "itens",
];

/// Query parser for procurement questions
pub struct QueryParser {
    /// Stop words to filter
    stop_words: HashSet<&'static str>,

    /// Standalone "e" / "ou" between list items
    conjunctions: Regex,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    /// Create a new query parser
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            conjunctions: Regex::new(r"\s+(?:e|ou)\s+").expect("conjunction pattern is valid"),
        }
    }

    /// Parse a question into terms and a query type
    pub fn parse(&self, question: &str) -> QueryUnderstanding {
        let terms = self.extract_terms(question);
        let query_type = self.classify(question);

        tracing::debug!(
            terms = ?terms,
            query_type = query_type.as_str(),
            "Question parsed"
        );

        QueryUnderstanding {
            original_query: question.to_string(),
            terms,
            query_type,
        }
    }

    /// Split a question into normalized search terms.
    ///
    /// "tem cimento e tinta?" yields `["cimento", "tinta"]`. Returns an empty
    /// list when only stopwords and short words remain.
    pub fn extract_terms(&self, question: &str) -> Vec<String> {
        let lowered = question.to_lowercase();

        let separated: String = lowered
            .chars()
            .map(|c| if SEGMENT_SEPARATORS.contains(&c) { ',' } else { c })
            .collect();
        let separated = self.conjunctions.replace_all(&separated, ",");

        separated
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.clean_segment(segment))
            .filter(|term| !term.is_empty())
            .collect()
    }

    /// Decide between availability and history. First keyword hit wins.
    pub fn classify(&self, question: &str) -> QueryType {
        let lowered = question.to_lowercase();

        match HISTORY_KEYWORDS.iter().find(|kw| lowered.contains(*kw)) {
            Some(keyword) => {
                tracing::trace!(keyword, "History keyword matched");
                QueryType::History
            }
            None => QueryType::Availability,
        }
    }

    fn clean_segment(&self, segment: &str) -> String {
        segment
            .split_whitespace()
            .map(|word| word.trim_matches(WORD_PUNCTUATION))
            .filter(|word| word.chars().count() > 2 && !self.is_stop_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}
