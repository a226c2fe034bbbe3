//! System prompt assembly

use super::query_parser::QueryType;

/// Build the system prompt sent with the user's question.
///
/// `query_type` is `None` in keyword mode, where rows are not classified.
pub fn build_system_prompt(item_count: usize, context: &str, query_type: Option<QueryType>) -> String {
    let guidance = match query_type {
        Some(QueryType::Availability) => {
            "Os itens listados estão dentro da vigência e ainda têm saldo. \
            Informe ARP, fonte, saldo e valor unitário quando forem relevantes.\n\n"
        }
        Some(QueryType::History) => {
            "Os itens listados são compras já registradas. \
            Informe quantidade, data, valor e destino quando forem relevantes.\n\n"
        }
        None => "",
    };

    format!(
        "Voce e um assistente da SEAPE (Secretaria de Administracao Penitenciaria do DF) \
        que responde perguntas sobre compras e materiais.\n\n\
        Dados encontrados na planilha ({} itens):\n\n\
        {}\n\n\
        {}\
        Responda de forma clara e objetiva. Use R$ para valores.",
        item_count, context, guidance
    )
}
