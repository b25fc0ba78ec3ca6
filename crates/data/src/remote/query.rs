//! Query builder shared by every backend adapter.
//!
//! A [`Query`] is a table, a conjunction of [`Filter`]s, an optional
//! disjunction group (`any_of`), a multi-column order and a limit. The REST
//! adapter renders it as PostgREST query parameters; the in-memory adapter
//! evaluates it directly with [`Filter::matches`] and [`compare_values`].

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::Table;

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    /// Case-insensitive substring match.
    Contains,
    Gte,
    Lte,
    /// Value is one of an array of candidates.
    In,
}

/// A single column condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    fn new(column: &str, op: FilterOp, value: Value) -> Self {
        Self {
            column: column.to_string(),
            op,
            value,
        }
    }

    /// `column = value`
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq, value.into())
    }

    /// `column <> value`
    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Neq, value.into())
    }

    /// `column ILIKE %term%`
    pub fn contains(column: &str, term: &str) -> Self {
        Self::new(column, FilterOp::Contains, Value::String(term.to_string()))
    }

    /// `column >= value`
    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Gte, value.into())
    }

    /// `column <= value`
    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Lte, value.into())
    }

    /// `column IN (values...)`
    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(column, FilterOp::In, Value::Array(values))
    }

    /// Render as a PostgREST operator expression, e.g. `eq.Hoodies`.
    #[must_use]
    pub fn to_postgrest(&self) -> String {
        match self.op {
            FilterOp::Eq => format!("eq.{}", scalar_param(&self.value)),
            FilterOp::Neq => format!("neq.{}", scalar_param(&self.value)),
            FilterOp::Gte => format!("gte.{}", scalar_param(&self.value)),
            FilterOp::Lte => format!("lte.{}", scalar_param(&self.value)),
            FilterOp::Contains => format!("ilike.*{}*", sanitize_term(&scalar_param(&self.value))),
            FilterOp::In => {
                let items = match &self.value {
                    Value::Array(items) => items.iter().map(scalar_param).collect::<Vec<_>>(),
                    other => vec![scalar_param(other)],
                };
                format!("in.({})", items.join(","))
            }
        }
    }

    /// Whether a JSON row satisfies this filter.
    #[must_use]
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        let field = row.get(&self.column).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => values_equal(field, &self.value),
            FilterOp::Neq => !values_equal(field, &self.value),
            FilterOp::Gte => compare_values(field, &self.value) != Ordering::Less,
            FilterOp::Lte => compare_values(field, &self.value) != Ordering::Greater,
            FilterOp::Contains => match (field, &self.value) {
                (Value::String(haystack), Value::String(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => false,
            },
            FilterOp::In => match &self.value {
                Value::Array(candidates) => candidates.iter().any(|c| values_equal(field, c)),
                other => values_equal(field, other),
            },
        }
    }
}

/// One `ORDER BY` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// A select against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    /// Rows must match at least one of these (ignored when empty).
    pub any_of: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query selecting every row of `table`.
    #[must_use]
    pub const fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            any_of: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Add a conjunctive filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for `filter(Filter::eq(column, value))`.
    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Require at least one of `filters` to match.
    #[must_use]
    pub fn any_of(mut self, filters: Vec<Filter>) -> Self {
        self.any_of = filters;
        self
    }

    /// Append an ascending order column.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(OrderBy {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    /// Append a descending order column.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(OrderBy {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    /// Cap the number of rows returned.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a row satisfies every filter and the `any_of` group.
    #[must_use]
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.filters.iter().all(|f| f.matches(row))
            && (self.any_of.is_empty() || self.any_of.iter().any(|f| f.matches(row)))
    }

    /// Compare two rows according to the order columns.
    #[must_use]
    pub fn compare_rows(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        for order in &self.order {
            let left = a.get(&order.column).unwrap_or(&Value::Null);
            let right = b.get(&order.column).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = if order.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Render as PostgREST query parameters.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(
            self.filters
                .iter()
                .map(|f| (f.column.clone(), f.to_postgrest())),
        );
        if !self.any_of.is_empty() {
            let group = self
                .any_of
                .iter()
                .map(|f| format!("{}.{}", f.column, f.to_postgrest()))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("or".to_string(), format!("({group})")));
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Render filters alone (for update/delete requests).
#[must_use]
pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), f.to_postgrest()))
        .collect()
}

fn scalar_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// PostgREST reserves `,().*` inside operator values.
fn sanitize_term(term: &str) -> String {
    term.chars()
        .map(|c| if matches!(c, ',' | '(' | ')' | '*' | '.') { ' ' } else { c })
        .collect()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total order over JSON scalars: nulls last, then booleans, numbers, strings.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    const fn rank(v: &Value) -> u8 {
        match v {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
            Value::Null => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .total_cmp(&y.as_f64().unwrap_or(0.0)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
