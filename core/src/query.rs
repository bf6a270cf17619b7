//! Asset search queries
//!
//! A query is a set of typed filters plus optional sort and paging controls.
//! Filters are validated when they are built, so a malformed query never
//! reaches the metadata store. The store evaluates the query; this module
//! only builds and translates its shape.
//!
//! Semantics expected from the store:
//! - `price`: closed range `[low, high]`, inclusive at both ends
//! - `text`: free-text match against the metadata name and description
//! - several filters combine with logical AND

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{to_query_error, CoreError, Result};

/// Kind of a query filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    /// Price range
    Price,
    /// Free text
    Text,
}

impl FilterKind {
    /// Field name on the wire
    pub fn field(&self) -> &'static str {
        match self {
            FilterKind::Price => "price",
            FilterKind::Text => "text",
        }
    }
}

/// A single validated filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Price within `[low, high]`
    PriceRange {
        /// Lower bound, inclusive
        low: u64,
        /// Upper bound, inclusive
        high: u64,
    },

    /// Any of the terms appears in the name or description
    Text(Vec<String>),
}

impl QueryFilter {
    /// Price range filter; `low` must not exceed `high`
    pub fn price_range(low: u64, high: u64) -> Result<Self> {
        if low > high {
            return Err(CoreError::InvalidQuery(format!(
                "price range lower bound {} exceeds upper bound {}",
                low, high
            )));
        }
        Ok(QueryFilter::PriceRange { low, high })
    }

    /// Text filter; at least one non-blank term
    pub fn text<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        if terms.is_empty() {
            return Err(CoreError::InvalidQuery("text filter needs at least one term".to_string()));
        }
        if terms.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::InvalidQuery("text filter terms must not be blank".to_string()));
        }
        Ok(QueryFilter::Text(terms))
    }

    /// Kind of this filter
    pub fn kind(&self) -> FilterKind {
        match self {
            QueryFilter::PriceRange { .. } => FilterKind::Price,
            QueryFilter::Text(_) => FilterKind::Text,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            QueryFilter::PriceRange { low, high } => Value::from(vec![*low, *high]),
            QueryFilter::Text(terms) => Value::from(terms.clone()),
        }
    }

    fn from_field(field: &str, value: &Value) -> Result<Self> {
        match field {
            "price" => {
                let bounds = value
                    .as_array()
                    .filter(|a| a.len() == 2)
                    .ok_or_else(|| {
                        to_query_error(format!("price expects [low, high], got {}", value))
                    })?;
                let bound = |v: &Value| {
                    v.as_u64().ok_or_else(|| {
                        to_query_error(format!(
                            "price bound must be a non-negative integer, got {}",
                            v
                        ))
                    })
                };
                QueryFilter::price_range(bound(&bounds[0])?, bound(&bounds[1])?)
            }
            "text" => match value {
                Value::String(term) => QueryFilter::text([term.clone()]),
                Value::Array(items) => {
                    let terms = items
                        .iter()
                        .map(|v| {
                            v.as_str().map(str::to_string).ok_or_else(|| {
                                to_query_error(format!("text term must be a string, got {}", v))
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    QueryFilter::text(terms)
                }
                other => Err(to_query_error(format!(
                    "text expects a list of terms, got {}",
                    other
                ))),
            },
            other => Err(CoreError::InvalidQuery(format!("unsupported filter: {}", other))),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// Sort on one metadata field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field name
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

/// Request body sent to the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Filters by field name
    pub query: Map<String, Value>,

    /// Sort order, `{field: 1 | -1}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Map<String, Value>>,

    /// Page size
    #[serde(default)]
    pub offset: usize,

    /// Page index
    #[serde(default)]
    pub page: usize,
}

/// Declarative asset query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetQuery {
    filters: Vec<QueryFilter>,
    sort: Option<Sort>,
    offset: usize,
    page: usize,
}

impl AssetQuery {
    /// Query matching every asset
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a filter, replacing any filter of the same kind
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filters.retain(|f| f.kind() != filter.kind());
        self.filters.push(filter);
        self.filters.sort_by_key(QueryFilter::kind);
        self
    }

    /// Add a price range filter
    pub fn with_price(self, low: u64, high: u64) -> Result<Self> {
        Ok(self.with_filter(QueryFilter::price_range(low, high)?))
    }

    /// Add a text filter
    pub fn with_text<I, S>(self, terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.with_filter(QueryFilter::text(terms)?))
    }

    /// Sort the results
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    /// Page size and page index
    pub fn paged(mut self, offset: usize, page: usize) -> Self {
        self.offset = offset;
        self.page = page;
        self
    }

    /// Filters, ordered by kind
    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    /// Filter of the given kind
    pub fn filter(&self, kind: FilterKind) -> Option<&QueryFilter> {
        self.filters.iter().find(|f| f.kind() == kind)
    }

    /// Sort order
    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Page size, zero for unpaged
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Page index
    pub fn page(&self) -> usize {
        self.page
    }

    /// Whether the query matches every asset
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }

    /// Wire request for the metadata store
    pub fn to_request(&self) -> QueryRequest {
        let query = self
            .filters
            .iter()
            .map(|f| (f.kind().field().to_string(), f.to_value()))
            .collect();

        let sort = self.sort.as_ref().map(|s| {
            let mut map = Map::new();
            let direction = match s.direction {
                SortDirection::Ascending => 1,
                SortDirection::Descending => -1,
            };
            map.insert(s.field.clone(), Value::from(direction));
            map
        });

        QueryRequest {
            query,
            sort,
            offset: self.offset,
            page: self.page,
        }
    }

    /// Parse the loose JSON form
    ///
    /// Accepts either bare filters (`{"price":[0,20]}`) or the full request
    /// (`{"query":{...},"sort":{...},"offset":n,"page":p}`).
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| to_query_error(format!("query must be a JSON object, got {}", value)))?;

        let (filters, controls) = match object.get("query") {
            Some(Value::Object(filters)) => (filters, Some(object)),
            Some(other) => {
                return Err(to_query_error(format!("\"query\" must be an object, got {}", other)));
            }
            None => (object, None),
        };

        let mut query = AssetQuery::all();
        for (field, value) in filters {
            let filter = QueryFilter::from_field(field, value)?;
            if query.filter(filter.kind()).is_some() {
                return Err(CoreError::InvalidQuery(format!("duplicate filter: {}", field)));
            }
            query = query.with_filter(filter);
        }

        if let Some(controls) = controls {
            for key in controls.keys() {
                if !matches!(key.as_str(), "query" | "sort" | "offset" | "page") {
                    return Err(CoreError::InvalidQuery(format!("unsupported query key: {}", key)));
                }
            }
            if let Some(sort) = controls.get("sort") {
                let (field, direction) = sort
                    .as_object()
                    .filter(|m| m.len() == 1)
                    .and_then(|m| m.iter().next())
                    .ok_or_else(|| {
                        to_query_error(format!("sort expects {{field: 1|-1}}, got {}", sort))
                    })?;
                let direction = match direction.as_i64() {
                    Some(1) => SortDirection::Ascending,
                    Some(-1) => SortDirection::Descending,
                    _ => {
                        return Err(to_query_error(format!(
                            "sort direction must be 1 or -1, got {}",
                            direction
                        )));
                    }
                };
                query = query.sorted_by(field.clone(), direction);
            }
            let control = |key: &str| -> Result<usize> {
                match controls.get(key) {
                    None => Ok(0),
                    Some(v) => v.as_u64().map(|n| n as usize).ok_or_else(|| {
                        to_query_error(format!("{} must be a non-negative integer, got {}", key, v))
                    }),
                }
            };
            query = query.paged(control("offset")?, control("page")?);
        }

        Ok(query)
    }

    /// Parse the loose JSON form from text
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(to_query_error)?;
        Self::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_price_range_validation() {
        assert!(QueryFilter::price_range(0, 20).is_ok());
        assert!(QueryFilter::price_range(5, 5).is_ok());
        assert!(matches!(QueryFilter::price_range(21, 20), Err(CoreError::InvalidQuery(_))));
    }

    #[test]
    fn test_text_validation() {
        assert!(QueryFilter::text(["Weather"]).is_ok());
        assert!(QueryFilter::text(Vec::<String>::new()).is_err());
        assert!(QueryFilter::text(["Weather", " "]).is_err());
    }

    #[test]
    fn test_same_kind_replaces() {
        let query = AssetQuery::all()
            .with_price(0, 20)
            .unwrap()
            .with_price(5, 6)
            .unwrap();

        assert_eq!(query.filters().len(), 1);
        assert_eq!(
            query.filter(FilterKind::Price),
            Some(&QueryFilter::PriceRange { low: 5, high: 6 })
        );
    }

    #[test]
    fn test_wire_request() {
        let query = AssetQuery::all()
            .with_text(["Weather"])
            .unwrap()
            .with_price(0, 11)
            .unwrap()
            .sorted_by("price", SortDirection::Descending)
            .paged(100, 0);

        let value = serde_json::to_value(query.to_request()).unwrap();
        assert_eq!(
            value,
            json!({
                "query": {"price": [0, 11], "text": ["Weather"]},
                "sort": {"price": -1},
                "offset": 100,
                "page": 0
            })
        );
    }

    #[test]
    fn test_empty_query_request() {
        let value = serde_json::to_value(AssetQuery::all().to_request()).unwrap();
        assert_eq!(value, json!({"query": {}, "offset": 0, "page": 0}));
        assert!(AssetQuery::all().is_unfiltered());
    }

    #[test]
    fn test_parse_bare_filters() {
        let query = AssetQuery::parse(r#"{"text":["Weather"],"price":[0,11]}"#).unwrap();
        assert_eq!(
            query,
            AssetQuery::all().with_price(0, 11).unwrap().with_text(["Weather"]).unwrap()
        );
    }

    #[test]
    fn test_parse_full_request() {
        let query = AssetQuery::parse(
            r#"{"query":{"price":[0,20]},"sort":{"name":1},"offset":10,"page":2}"#,
        )
        .unwrap();

        assert_eq!(
            query.filter(FilterKind::Price),
            Some(&QueryFilter::PriceRange { low: 0, high: 20 })
        );
        assert_eq!(
            query.sort(),
            Some(&Sort { field: "name".to_string(), direction: SortDirection::Ascending })
        );
        assert_eq!(query.offset(), 10);
        assert_eq!(query.page(), 2);
    }

    #[test]
    fn test_parse_single_text_term() {
        let query = AssetQuery::parse(r#"{"text":"Weather"}"#).unwrap();
        assert_eq!(
            query.filter(FilterKind::Text),
            Some(&QueryFilter::Text(vec!["Weather".to_string()]))
        );
    }

    #[rstest]
    #[case::unknown_field(r#"{"colour":["red"]}"#)]
    #[case::inverted_range(r#"{"price":[20,0]}"#)]
    #[case::short_range(r#"{"price":[20]}"#)]
    #[case::negative_bound(r#"{"price":[-1,5]}"#)]
    #[case::fractional_bound(r#"{"price":[0.5,5]}"#)]
    #[case::numeric_term(r#"{"text":[42]}"#)]
    #[case::empty_terms(r#"{"text":[]}"#)]
    #[case::bad_sort(r#"{"query":{},"sort":{"price":2}}"#)]
    #[case::unknown_control(r#"{"query":{},"limit":5}"#)]
    #[case::not_an_object(r#"["price"]"#)]
    #[case::not_json(r#"price between 0 and 20"#)]
    fn test_parse_rejects_malformed(#[case] text: &str) {
        assert!(matches!(AssetQuery::parse(text), Err(CoreError::InvalidQuery(_))));
    }
}
