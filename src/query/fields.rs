use super::ast::Filter;
use std::collections::BTreeSet;

/// Every field name referenced anywhere in `filter`.
///
/// Walks with an explicit stack, so nesting depth is bounded by the heap
/// rather than the call stack.
pub fn collect_fields(filter: &Filter) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    let mut stack = vec![filter];

    while let Some(node) = stack.pop() {
        match node {
            Filter::And(children) | Filter::Or(children) => stack.extend(children),
            Filter::AndOr(and, or) => {
                stack.extend(and);
                stack.extend(or);
            }
            Filter::Compare(cmp) => {
                if !fields.contains(&cmp.field) {
                    fields.insert(cmp.field.clone());
                }
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_filter;
    use serde_json::json;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nested_fields_collapse() {
        let filter = parse_filter(&json!({
            "$and": [
                {"a": {"$eq": 1}},
                {"$or": [{"b": {"$gt": 2}}, {"a": {"$lt": 5}}]}
            ]
        }))
        .unwrap();

        assert_eq!(collect_fields(&filter), set(&["a", "b"]));
        assert_eq!(collect_fields(&filter), collect_fields(&filter));
    }

    #[test]
    fn test_order_independent() {
        let left = parse_filter(&json!({
            "$or": [{"x": {"$eq": 1}}, {"$and": [{"y": {"$in": [1]}}, {"z": {"$ne": 0}}]}]
        }))
        .unwrap();
        let right = parse_filter(&json!({
            "$or": [{"$and": [{"z": {"$ne": 0}}, {"y": {"$in": [1]}}]}, {"x": {"$eq": 1}}]
        }))
        .unwrap();

        assert_eq!(collect_fields(&left), collect_fields(&right));
        assert_eq!(collect_fields(&left), set(&["x", "y", "z"]));
    }

    #[test]
    fn test_both_branches_counted() {
        let filter = parse_filter(&json!({
            "$and": [{"headline": {"$eq": "x"}}],
            "$or": [{"slugline": {"$eq": "y"}}]
        }))
        .unwrap();
        assert_eq!(collect_fields(&filter), set(&["headline", "slugline"]));
    }

    #[test]
    fn test_empty_logical_node() {
        assert!(collect_fields(&Filter::And(vec![])).is_empty());
        assert!(collect_fields(&Filter::AndOr(vec![], vec![])).is_empty());
    }

    #[test]
    fn test_single_comparison() {
        let filter = parse_filter(&json!({"priority": {"$lte": 3}})).unwrap();
        assert_eq!(collect_fields(&filter), set(&["priority"]));
    }

    #[test]
    fn test_deep_nesting() {
        let mut filter = Filter::compare("leaf", crate::query::CompareOp::Eq, 1);
        for _ in 0..2_000 {
            filter = Filter::Or(vec![filter]);
        }
        assert_eq!(collect_fields(&filter), set(&["leaf"]));
    }
}
