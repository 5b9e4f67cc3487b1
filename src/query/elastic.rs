//! Search-engine dialect: `term`/`range`/`terms` filters nested under
//! `query.filtered`, sent as the `source` query parameter.

use super::ast::{CompareOp, Comparison, Filter, Query, SortDirective};
use super::parser::{parse_filter, ParseError};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEngineQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<FilteredQuery>,
    pub sort: Vec<SortDirective>,
    pub size: u64,
    pub from: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredQuery {
    pub filtered: Filtered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filtered {
    pub filter: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<FullTextQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullTextQuery {
    pub query_string: QueryString,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryString {
    pub query: String,
    pub lenient: bool,
    pub default_operator: &'static str,
}

impl QueryString {
    fn new(text: &str) -> Self {
        Self {
            query: text.to_string(),
            lenient: true,
            default_operator: "AND",
        }
    }
}

impl SearchEngineQuery {
    /// JSON text for the `source` query parameter.
    pub fn to_source_param(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub fn to_filter(filter: &Filter) -> Value {
    match filter {
        Filter::And(children) => logical(Some(children.as_slice()), None),
        Filter::Or(children) => logical(None, Some(children.as_slice())),
        Filter::AndOr(and, or) => logical(Some(and.as_slice()), Some(or.as_slice())),
        Filter::Compare(cmp) => comparison(cmp),
    }
}

fn logical(and: Option<&[Filter]>, or: Option<&[Filter]>) -> Value {
    let mut doc = Map::new();
    if let Some(children) = and {
        doc.insert("and".to_string(), children.iter().map(to_filter).collect());
    }
    if let Some(children) = or {
        doc.insert("or".to_string(), children.iter().map(to_filter).collect());
    }
    Value::Object(doc)
}

fn comparison(cmp: &Comparison) -> Value {
    let Comparison { field, op, value } = cmp;
    match op {
        CompareOp::Eq => json!({"term": {field: value}}),
        CompareOp::Ne => json!({"not": {"term": {field: value}}}),
        CompareOp::Gt => json!({"range": {field: {"gt": value}}}),
        CompareOp::Gte => json!({"range": {field: {"gte": value}}}),
        CompareOp::Lt => json!({"range": {field: {"lt": value}}}),
        CompareOp::Lte => json!({"range": {field: {"lte": value}}}),
        CompareOp::In => json!({"terms": {field: value}}),
    }
}

/// Parses a raw generic filter document and translates it.
pub fn filter_from_json(raw: &Value) -> Result<Value, ParseError> {
    let filter = parse_filter(raw)?;
    Ok(to_filter(&filter))
}

pub fn build_query(query: &Query) -> SearchEngineQuery {
    let filtered = query.filter.as_ref().map(|filter| {
        log::trace!("translating filter for search engine");
        FilteredQuery {
            filtered: Filtered {
                filter: to_filter(filter),
                query: query.full_text_search.as_deref().map(|text| FullTextQuery {
                    query_string: QueryString::new(text),
                }),
            },
        }
    });

    if filtered.is_none() && query.full_text_search.is_some() {
        log::debug!("full text search ignored: query has no filter");
    }

    SearchEngineQuery {
        query: filtered,
        sort: query.sort.clone(),
        size: query.max_results,
        from: query.offset(),
    }
}
