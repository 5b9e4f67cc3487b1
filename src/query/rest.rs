//! REST dialect: a `where` document keeping `$`-prefixed operators and a
//! `sort` string of `("field", 1|-1)` tuples.

use super::ast::{CompareOp, Comparison, Filter, SortDirection, SortDirective};
use super::parser::{parse_filter, ParseError};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestQuery {
    pub sort: String,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl RestQuery {
    /// Query-string parameters in request order, with `where` as JSON text.
    pub fn to_query_pairs(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(filter) = &self.filter {
            pairs.push(("where", serde_json::to_string(filter)?));
        }
        pairs.push(("sort", self.sort.clone()));
        Ok(pairs)
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
        doc.insert("$and".to_string(), children.iter().map(to_filter).collect());
    }
    if let Some(children) = or {
        doc.insert("$or".to_string(), children.iter().map(to_filter).collect());
    }
    Value::Object(doc)
}

fn comparison(cmp: &Comparison) -> Value {
    let Comparison { field, op, value } = cmp;
    match op {
        CompareOp::Eq => json!({field: value}),
        _ => json!({field: {(op.key()): value}}),
    }
}

/// Parses a raw generic filter document and translates it.
pub fn filter_from_json(raw: &Value) -> Result<Value, ParseError> {
    let filter = parse_filter(raw)?;
    Ok(to_filter(&filter))
}

/// Renders `[("a", 1),("b", -1)]`.
pub fn encode_sort(sort: &[SortDirective]) -> String {
    let tuples: Vec<String> = sort
        .iter()
        .map(|directive| {
            let direction = match directive.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            format!("(\"{}\", {})", directive.field, direction)
        })
        .collect();
    format!("[{}]", tuples.join(","))
}

pub fn build_query(filter: Option<&Filter>, sort: &[SortDirective]) -> RestQuery {
    RestQuery {
        sort: encode_sort(sort),
        filter: filter.map(to_filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn translate(raw: Value) -> Value {
        filter_from_json(&raw).unwrap()
    }

    #[test]
    fn test_eq_is_bare() {
        assert_eq!(
            translate(json!({"state": {"$eq": "published"}})),
            json!({"state": "published"})
        );
    }

    #[test]
    fn test_every_operator() {
        let cases = [
            ("$eq", json!({"f": 1})),
            ("$ne", json!({"f": {"$ne": 1}})),
            ("$gt", json!({"f": {"$gt": 1}})),
            ("$gte", json!({"f": {"$gte": 1}})),
            ("$lt", json!({"f": {"$lt": 1}})),
            ("$lte", json!({"f": {"$lte": 1}})),
            ("$in", json!({"f": {"$in": 1}})),
        ];
        assert_eq!(cases.len(), CompareOp::ALL.len());

        for (op, expected) in cases {
            assert_eq!(translate(json!({"f": {op: 1}})), expected, "operator {}", op);
        }
    }

    #[test]
    fn test_unsupported_operator() {
        let err = filter_from_json(&json!({"$or": [{"f": {"$nin": [1]}}]})).unwrap_err();
        assert_eq!(err.unsupported_operator(), Some("$nin"));
    }

    #[test]
    fn test_logical_keys_mirror_input() {
        let only_or = translate(json!({"$or": [{"a": {"$eq": 1}}, {"b": {"$in": [2, 3]}}]}));
        assert_eq!(
            only_or,
            json!({"$or": [{"a": 1}, {"b": {"$in": [2, 3]}}]})
        );
        assert!(only_or.get("$and").is_none());

        let both = translate(json!({
            "$and": [{"a": {"$gte": 1}}],
            "$or": [{"b": {"$eq": 2}}]
        }));
        assert_eq!(
            both,
            json!({"$and": [{"a": {"$gte": 1}}], "$or": [{"b": 2}]})
        );
    }

    #[test]
    fn test_sort_encoding() {
        let sort = [SortDirective::asc("a"), SortDirective::desc("b")];
        assert_eq!(encode_sort(&sort), r#"[("a", 1),("b", -1)]"#);
        assert_eq!(encode_sort(&[]), "[]");
    }

    #[test]
    fn test_build_without_filter() {
        let query = build_query(None, &[SortDirective::asc("x")]);
        let doc = serde_json::to_value(&query).unwrap();
        assert_eq!(doc, json!({"sort": r#"[("x", 1)]"#}));
        assert!(!doc.as_object().unwrap().contains_key("where"));
    }

    #[test]
    fn test_build_with_filter() {
        let filter = parse_filter(&json!({"y": {"$eq": 1}})).unwrap();
        let query = build_query(Some(&filter), &[SortDirective::desc("x")]);
        let doc = serde_json::to_value(&query).unwrap();
        assert_eq!(doc, json!({"sort": r#"[("x", -1)]"#, "where": {"y": 1}}));
    }

    #[test]
    fn test_query_pairs() {
        let filter = parse_filter(&json!({"y": {"$gt": 1}})).unwrap();
        let pairs = build_query(Some(&filter), &[SortDirective::asc("x")])
            .to_query_pairs()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("where", r#"{"y":{"$gt":1}}"#.to_string()),
                ("sort", r#"[("x", 1)]"#.to_string()),
            ]
        );

        let pairs = build_query(None, &[]).to_query_pairs().unwrap();
        assert_eq!(pairs, vec![("sort", "[]".to_string())]);
    }
}
