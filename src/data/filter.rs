//! Query filters: (field, operator, value) predicates combined by AND.

use serde_json::Value;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum FilterOp {
    /// `field = value`
    Equals(Value),
    /// `field <> value`
    NotEquals(Value),
    /// `field IN (values)`; an empty set matches nothing.
    InSet(Vec<Value>),
    /// Inclusive bounds; either side may be open.
    Range { min: Option<Value>, max: Option<Value> },
    /// Substring match, case-sensitive.
    Contains(String),
    /// Substring match, case-insensitive.
    IContains(String),
}

/// One predicate on a column. `field` is the snake_case column name.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Filter {
            field: field.into(),
            op,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Equals(value.into()))
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::NotEquals(value.into()))
    }

    pub fn in_set<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(field, FilterOp::InSet(values.into_iter().map(Into::into).collect()))
    }

    pub fn range(field: impl Into<String>, min: Option<Value>, max: Option<Value>) -> Self {
        Self::new(field, FilterOp::Range { min, max })
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Contains(needle.into()))
    }

    pub fn icontains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IContains(needle.into()))
    }

    pub fn targets(&self, column: &str) -> bool {
        self.field == column
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            FilterOp::Equals(v) => write!(f, "{} == {}", self.field, v),
            FilterOp::NotEquals(v) => write!(f, "{} != {}", self.field, v),
            FilterOp::InSet(vs) => write!(f, "{} IN {:?}", self.field, vs),
            FilterOp::Range { min, max } => {
                let show = |b: &Option<Value>| b.as_ref().map(Value::to_string).unwrap_or_else(|| "*".into());
                write!(f, "{} in [{}, {}]", self.field, show(min), show(max))
            }
            FilterOp::Contains(s) => write!(f, "{:?} in {}", s, self.field),
            FilterOp::IContains(s) => write!(f, "{} icontains {:?}", self.field, s),
        }
    }
}
