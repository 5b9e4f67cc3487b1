use super::ast::{CompareOp, Comparison, Filter, Query, SortDirection, SortDirective};
use serde_json::{Map, Value};

const AND_KEY: &str = "$and";
const OR_KEY: &str = "$or";

/// Nesting limit for logical nodes. Matches serde_json's own recursion limit
/// and keeps parsing plus both encoders within a 2 MiB thread stack.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnsupportedOperator(String),
    MultipleFields(Vec<String>),
    EmptyComparison,
    MissingOperator(String),
    MultipleOperators(String),
    NotAnObject,
    NotAnArray,
    InvalidSort(String),
    TooDeep,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Location in the input document, e.g. `$.filter.$and[1]`.
    pub path: String,
}

impl ParseError {
    /// Operator name when this is an unsupported operator error.
    pub fn unsupported_operator(&self) -> Option<&str> {
        match &self.kind {
            ParseErrorKind::UnsupportedOperator(op) => Some(op),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::UnsupportedOperator(op) => {
                write!(f, "Unsupported operator '{}'", op)
            }
            ParseErrorKind::MultipleFields(fields) => write!(
                f,
                "Comparison must name exactly one field, found {}",
                fields.join(", ")
            ),
            ParseErrorKind::EmptyComparison => {
                write!(f, "Expected '$and', '$or' or a field comparison")
            }
            ParseErrorKind::MissingOperator(field) => {
                write!(f, "No operator given for field '{}'", field)
            }
            ParseErrorKind::MultipleOperators(field) => {
                write!(f, "Field '{}' must have exactly one operator", field)
            }
            ParseErrorKind::NotAnObject => write!(f, "Expected an object"),
            ParseErrorKind::NotAnArray => write!(f, "Expected an array"),
            ParseErrorKind::InvalidSort(message) => write!(f, "Invalid sort: {}", message),
            ParseErrorKind::TooDeep => {
                write!(f, "Filter nesting exceeds {} levels", MAX_DEPTH)
            }
            ParseErrorKind::Invalid(message) => write!(f, "{}", message),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error at {}: {}", self.path, self.kind)
    }
}

impl std::error::Error for ParseError {}

fn error(kind: ParseErrorKind, path: &str) -> ParseError {
    ParseError {
        kind,
        path: path.to_string(),
    }
}

/// Raw nodes are logical when `$and` or `$or` is present and non-null.
/// Checked before anything else, so field keys next to them are ignored.
pub fn is_logical(node: &Map<String, Value>) -> bool {
    logical_branch(node, AND_KEY).is_some() || logical_branch(node, OR_KEY).is_some()
}

fn logical_branch<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    node.get(key).filter(|v| !v.is_null())
}

pub fn parse_filter(value: &Value) -> Result<Filter, ParseError> {
    parse_node(value, "$", 0)
}

fn parse_node(value: &Value, path: &str, depth: usize) -> Result<Filter, ParseError> {
    if depth > MAX_DEPTH {
        return Err(error(ParseErrorKind::TooDeep, path));
    }

    let Some(node) = value.as_object() else {
        return Err(error(ParseErrorKind::NotAnObject, path));
    };

    if is_logical(node) {
        return parse_logical(node, path, depth);
    }

    parse_comparison(node, path).map(Filter::Compare)
}

fn parse_logical(
    node: &Map<String, Value>,
    path: &str,
    depth: usize,
) -> Result<Filter, ParseError> {
    let and = logical_branch(node, AND_KEY)
        .map(|v| parse_children(v, &format!("{}.{}", path, AND_KEY), depth))
        .transpose()?;
    let or = logical_branch(node, OR_KEY)
        .map(|v| parse_children(v, &format!("{}.{}", path, OR_KEY), depth))
        .transpose()?;

    match (and, or) {
        (Some(and), Some(or)) => Ok(Filter::AndOr(and, or)),
        (Some(and), None) => Ok(Filter::And(and)),
        (None, Some(or)) => Ok(Filter::Or(or)),
        (None, None) => Err(error(ParseErrorKind::EmptyComparison, path)),
    }
}

fn parse_children(value: &Value, path: &str, depth: usize) -> Result<Vec<Filter>, ParseError> {
    let Some(children) = value.as_array() else {
        return Err(error(ParseErrorKind::NotAnArray, path));
    };

    children
        .iter()
        .enumerate()
        .map(|(i, child)| parse_node(child, &format!("{}[{}]", path, i), depth + 1))
        .collect()
}

fn parse_comparison(node: &Map<String, Value>, path: &str) -> Result<Comparison, ParseError> {
    // A null `$and`/`$or` is not a field.
    let fields: Vec<(&String, &Value)> = node
        .iter()
        .filter(|(key, _)| key.as_str() != AND_KEY && key.as_str() != OR_KEY)
        .collect();

    let (field, options) = match fields.as_slice() {
        [] => return Err(error(ParseErrorKind::EmptyComparison, path)),
        [single] => *single,
        _ => {
            let names = fields.iter().map(|(name, _)| name.to_string()).collect();
            return Err(error(ParseErrorKind::MultipleFields(names), path));
        }
    };

    let field_path = format!("{}.{}", path, field);
    let Some(options) = options.as_object() else {
        return Err(error(ParseErrorKind::NotAnObject, &field_path));
    };

    let mut entries = options.iter();
    let (key, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => {
            return Err(error(
                ParseErrorKind::MissingOperator(field.clone()),
                &field_path,
            ))
        }
        (Some(_), Some(_)) => {
            return Err(error(
                ParseErrorKind::MultipleOperators(field.clone()),
                &field_path,
            ))
        }
    };

    let op = CompareOp::from_key(key).ok_or_else(|| {
        error(
            ParseErrorKind::UnsupportedOperator(key.clone()),
            &field_path,
        )
    })?;

    Ok(Comparison {
        field: field.clone(),
        op,
        value: value.clone(),
    })
}

/// Sort directives: an array of single-key objects, `[{"field": "asc"}]`.
pub fn parse_sort(value: &Value) -> Result<Vec<SortDirective>, ParseError> {
    parse_sort_at(value, "$")
}

fn parse_sort_at(value: &Value, path: &str) -> Result<Vec<SortDirective>, ParseError> {
    let Some(items) = value.as_array() else {
        return Err(error(ParseErrorKind::NotAnArray, path));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_sort_directive(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn parse_sort_directive(value: &Value, path: &str) -> Result<SortDirective, ParseError> {
    let Some(obj) = value.as_object() else {
        return Err(error(ParseErrorKind::NotAnObject, path));
    };

    let mut entries = obj.iter();
    let (field, direction) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(error(
                ParseErrorKind::InvalidSort("expected exactly one field".to_string()),
                path,
            ))
        }
    };

    let direction = match direction.as_str() {
        Some("asc") => SortDirection::Asc,
        Some("desc") => SortDirection::Desc,
        _ => {
            return Err(error(
                ParseErrorKind::InvalidSort(format!(
                    "direction for '{}' must be \"asc\" or \"desc\"",
                    field
                )),
                path,
            ))
        }
    };

    Ok(SortDirective::new(field.clone(), direction))
}

/// Parses a whole query document:
/// `{filter?, fullTextSearch?, sort, page, max_results}`.
pub fn parse_query(value: &Value) -> Result<Query, ParseError> {
    let Some(obj) = value.as_object() else {
        return Err(error(ParseErrorKind::NotAnObject, "$"));
    };

    let filter = obj
        .get("filter")
        .filter(|v| !v.is_null())
        .map(|v| parse_node(v, "$.filter", 0))
        .transpose()?;

    let full_text_search = match obj.get("fullTextSearch") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(error(
                ParseErrorKind::Invalid("Expected a string".to_string()),
                "$.fullTextSearch",
            ))
        }
    };

    let sort = match obj.get("sort") {
        Some(v) => parse_sort_at(v, "$.sort")?,
        None => {
            return Err(error(
                ParseErrorKind::Invalid("Missing required key 'sort'".to_string()),
                "$",
            ))
        }
    };

    let page = required_count(obj, "page")?;
    let max_results = required_count(obj, "max_results")?;

    Ok(Query {
        filter,
        full_text_search,
        sort,
        page,
        max_results,
    })
}

fn required_count(obj: &Map<String, Value>, key: &str) -> Result<u64, ParseError> {
    match obj.get(key) {
        Some(v) => v.as_u64().ok_or_else(|| {
            error(
                ParseErrorKind::Invalid("Expected a non-negative integer".to_string()),
                &format!("$.{}", key),
            )
        }),
        None => Err(error(
            ParseErrorKind::Invalid(format!("Missing required key '{}'", key)),
            "$",
        )),
    }
}
