//! Query model for the document store: a conjunction of field conditions,
//! an optional single-field sort, and a skip/limit window.

use std::cmp::Ordering;

use serde_json::Value;

/// Comparison operators supported by a filter condition.
#[derive(Debug, Clone)]
pub enum MatchOp {
    /// Exact match on the field value.
    Eq,
    /// Case-insensitive substring match on a string field.
    ContainsIgnoreCase,
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: MatchOp,
    pub value: Value,
}

/// A filter predicate: every condition must match (conjunction). An empty
/// filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op: MatchOp::Eq,
            value: value.into(),
        });
        self
    }

    pub fn contains_ignore_case(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op: MatchOp::ContainsIgnoreCase,
            value: Value::String(needle.into()),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates this filter against a document. A condition on a missing
    /// field never matches.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|cond| {
            let Some(field_value) = doc.get(&cond.field) else {
                return false;
            };
            match cond.op {
                MatchOp::Eq => Comparable::from(field_value) == Comparable::from(&cond.value),
                MatchOp::ContainsIgnoreCase => match (field_value.as_str(), cond.value.as_str()) {
                    (Some(haystack), Some(needle)) => {
                        haystack.to_lowercase().contains(&needle.to_lowercase())
                    }
                    _ => false,
                },
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// A full store query. Sort is applied before the skip/limit window.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Orders two documents by this query's sort field. Documents missing the
    /// sort field, and values of differing types, compare as equal.
    pub fn order(&self, a: &Value, b: &Value) -> Ordering {
        let Some(sort) = &self.sort else {
            return Ordering::Equal;
        };
        let left = a.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = b.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);
        let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Comparable view over JSON scalars. Numbers are normalized to f64 so
/// integer and float representations of the same value compare equal.
#[derive(Debug)]
enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => Comparable::Bool(*b),
            Value::Number(n) => Comparable::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Comparable::String(s),
            _ => Comparable::Null,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        let doc = json!({"title": "Dune"});
        assert!(Filter::new().matches(&doc));
    }

    #[test]
    fn eq_matches_exact_values_only() {
        let doc = json!({"publishYear": 1965, "title": "Dune"});
        assert!(Filter::new().eq("publishYear", 1965).matches(&doc));
        assert!(!Filter::new().eq("publishYear", 1966).matches(&doc));
        assert!(!Filter::new().eq("title", "dune").matches(&doc));
    }

    #[test]
    fn contains_ignore_case_is_substring_and_case_insensitive() {
        let doc = json!({"genre": "Science Fiction"});
        assert!(Filter::new().contains_ignore_case("genre", "science").matches(&doc));
        assert!(Filter::new().contains_ignore_case("genre", "FICT").matches(&doc));
        assert!(!Filter::new().contains_ignore_case("genre", "fantasy").matches(&doc));
    }

    #[test]
    fn condition_on_missing_field_never_matches() {
        let doc = json!({"title": "Dune"});
        assert!(!Filter::new().eq("genre", "sf").matches(&doc));
        assert!(!Filter::new().contains_ignore_case("genre", "sf").matches(&doc));
    }

    #[test]
    fn conditions_are_conjunctive() {
        let doc = json!({"title": "Dune", "publishYear": 1965});
        let both = Filter::new().contains_ignore_case("title", "dun").eq("publishYear", 1965);
        assert!(both.matches(&doc));
        let one_off = Filter::new().contains_ignore_case("title", "dun").eq("publishYear", 1900);
        assert!(!one_off.matches(&doc));
    }

    #[test]
    fn order_sorts_numbers_and_reverses_for_desc() {
        let a = json!({"publishYear": 1954});
        let b = json!({"publishYear": 1955});
        let asc = Query::new().sort("publishYear", SortDirection::Asc);
        assert_eq!(asc.order(&a, &b), Ordering::Less);
        let desc = Query::new().sort("publishYear", SortDirection::Desc);
        assert_eq!(desc.order(&a, &b), Ordering::Greater);
    }

    #[test]
    fn order_treats_missing_field_as_equal() {
        let a = json!({"title": "A"});
        let b = json!({"publishYear": 1955});
        let q = Query::new().sort("publishYear", SortDirection::Asc);
        assert_eq!(q.order(&a, &b), Ordering::Equal);
    }
}
