//! Filter expressions for querying features of a source.

use std::cmp::Ordering;

use geojson::feature::Id;
use geojson::{Feature, Value as GeometryValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property key that refers to the feature id instead of a property.
pub const ID_KEY: &str = "$id";

/// Kind of a feature geometry. Multi-geometries have the kind of their parts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Point or multi-point.
    Point,
    /// Line string or multi-line string.
    LineString,
    /// Polygon or multi-polygon.
    Polygon,
}

/// Predicate over a feature's properties and geometry.
///
/// Keys refer to feature properties, except [`ID_KEY`] which refers to the feature id.
/// Comparisons only succeed between values of the same JSON type: numbers are compared
/// numerically, strings lexicographically. A missing property fails every comparison except
/// [`Filter::Ne`] and [`Filter::NotIn`].
///
/// Filters can be read from JSON:
///
/// ```
/// use tilefeed::Filter;
///
/// let filter: Filter = serde_json::from_str(r#"
///     {"all": [{"eq": ["kind", "park"]}, {"ge": ["area", 1000]}]}
/// "#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// All inner filters match. Matches if empty.
    All(Vec<Filter>),
    /// At least one inner filter matches.
    Any(Vec<Filter>),
    /// Inner filter does not match.
    Not(Box<Filter>),
    /// Property is present.
    Has(String),
    /// Property is absent.
    NotHas(String),
    /// Property equals the value.
    Eq(String, Value),
    /// Property is absent or does not equal the value.
    Ne(String, Value),
    /// Property is less than the value.
    Lt(String, Value),
    /// Property is less than or equal to the value.
    Le(String, Value),
    /// Property is greater than the value.
    Gt(String, Value),
    /// Property is greater than or equal to the value.
    Ge(String, Value),
    /// Property equals one of the values.
    In(String, Vec<Value>),
    /// Property is absent or equals none of the values.
    NotIn(String, Vec<Value>),
    /// Geometry is of the given kind.
    GeometryType(GeometryKind),
}

impl Filter {
    /// Returns true if the feature satisfies the filter.
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Filter::All(filters) => filters.iter().all(|f| f.matches(feature)),
            Filter::Any(filters) => filters.iter().any(|f| f.matches(feature)),
            Filter::Not(filter) => !filter.matches(feature),
            Filter::Has(key) => property(feature, key).is_some(),
            Filter::NotHas(key) => property(feature, key).is_none(),
            Filter::Eq(key, value) => compare_property(feature, key, value, Ordering::is_eq),
            Filter::Ne(key, value) => !compare_property(feature, key, value, Ordering::is_eq),
            Filter::Lt(key, value) => compare_property(feature, key, value, Ordering::is_lt),
            Filter::Le(key, value) => compare_property(feature, key, value, Ordering::is_le),
            Filter::Gt(key, value) => compare_property(feature, key, value, Ordering::is_gt),
            Filter::Ge(key, value) => compare_property(feature, key, value, Ordering::is_ge),
            Filter::In(key, values) => values
                .iter()
                .any(|value| compare_property(feature, key, value, Ordering::is_eq)),
            Filter::NotIn(key, values) => !values
                .iter()
                .any(|value| compare_property(feature, key, value, Ordering::is_eq)),
            Filter::GeometryType(kind) => geometry_kind(feature) == Some(*kind),
        }
    }
}

fn property(feature: &Feature, key: &str) -> Option<Value> {
    if key == ID_KEY {
        return match feature.id.as_ref()? {
            Id::String(id) => Some(Value::String(id.clone())),
            Id::Number(id) => Some(Value::Number(id.clone())),
        };
    }

    feature.properties.as_ref()?.get(key).cloned()
}

fn compare_property(
    feature: &Feature,
    key: &str,
    value: &Value,
    check: impl Fn(Ordering) -> bool,
) -> bool {
    property(feature, key)
        .and_then(|property| compare(&property, value))
        .is_some_and(check)
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn geometry_kind(feature: &Feature) -> Option<GeometryKind> {
    match &feature.geometry.as_ref()?.value {
        GeometryValue::Point(_) | GeometryValue::MultiPoint(_) => Some(GeometryKind::Point),
        GeometryValue::LineString(_) | GeometryValue::MultiLineString(_) => {
            Some(GeometryKind::LineString)
        }
        GeometryValue::Polygon(_) | GeometryValue::MultiPolygon(_) => Some(GeometryKind::Polygon),
        GeometryValue::GeometryCollection(_) => None,
    }
}
