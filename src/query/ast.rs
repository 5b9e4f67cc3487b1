use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// A logical node carrying both `$and` and `$or`.
    AndOr(Vec<Filter>, Vec<Filter>),
    Compare(Comparison),
}

impl Filter {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare(Comparison {
            field: field.into(),
            op,
            value: value.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl CompareOp {
    pub const ALL: [CompareOp; 7] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::In,
    ];

    /// Operator key as written in generic query documents.
    pub fn key(self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Ne => "$ne",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
            CompareOp::In => "$in",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDirective {
    pub field: String,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

// Wire form is a single-key object: {"field": "asc"}
impl Serialize for SortDirective {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, self.direction.as_str())?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub full_text_search: Option<String>,
    pub sort: Vec<SortDirective>,
    /// 1-based.
    pub page: u64,
    pub max_results: u64,
}

impl Query {
    pub fn new(page: u64, max_results: u64) -> Self {
        Self {
            filter: None,
            full_text_search: None,
            sort: Vec::new(),
            page,
            max_results,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_full_text_search(mut self, text: impl Into<String>) -> Self {
        self.full_text_search = Some(text.into());
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortDirective>) -> Self {
        self.sort = sort;
        self
    }

    /// Zero-based offset of the first result on `page`, clamped to `u64::MAX`.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.max_results)
    }
}
