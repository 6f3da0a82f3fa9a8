//! Query-parameter encoding.
//!
//! Every endpoint owns a parameter struct. Encoding it produces a
//! [`ParamMap`]: an ordered string-to-string map that omits every parameter
//! left unset. The per-type rules live in [`ParamValue`]; `#[derive(Params)]`
//! only wires field names to those rules.
//!
//! | Type | Encoded when | Value |
//! |------|--------------|-------|
//! | `bool` | `true` | `"true"` |
//! | `Option<bool>` | `Some` | `"true"` / `"false"` |
//! | `Option<integer>` | `Some` | decimal |
//! | `Duration` | non-zero | shortest exact unit (`500ms`, `30s`, `5m`) |
//! | `String` | non-empty | as is |
//! | `Vec<String>` | non-empty | comma-joined |
//! | selector | differs from default | selector name |

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::Duration;

/// Encoded query parameters, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap(BTreeMap<String, String>);

impl ParamMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert `key` if `value` encodes to something.
    pub fn push<V: ParamValue + ?Sized>(&mut self, key: &str, value: &V) {
        if let Some(value) = value.param_value() {
            self.0.insert(key.to_string(), value);
        }
    }

    /// Value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as an `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Parse a query string back into canonical form.
    ///
    /// Later duplicates win, matching how the map is built.
    #[must_use]
    pub fn parse_query(query: &str) -> Self {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    /// Consume into the inner map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, String)> for ParamMap {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ParamMap {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Encoding traits
// ============================================================================

/// Textual form of a single parameter value.
///
/// Returns `None` when the value is unset or equal to its default, in which
/// case the parameter is left out of the query string.
pub trait ParamValue {
    /// Encoded value, or `None` to omit the parameter.
    fn param_value(&self) -> Option<String>;
}

/// A parameter struct that can be encoded into a [`ParamMap`].
///
/// Usually implemented with `#[derive(Params)]`.
pub trait EncodeParams {
    /// Write every set parameter into `out`.
    fn encode_into(&self, out: &mut ParamMap);

    /// Encode into a fresh map.
    fn encode(&self) -> ParamMap {
        let mut out = ParamMap::new();
        self.encode_into(&mut out);
        out
    }
}

impl EncodeParams for () {
    fn encode_into(&self, _out: &mut ParamMap) {}
}

impl EncodeParams for ParamMap {
    fn encode_into(&self, out: &mut ParamMap) {
        out.extend(self.0.clone());
    }
}

impl<T: EncodeParams + ?Sized> EncodeParams for &T {
    fn encode_into(&self, out: &mut ParamMap) {
        (**self).encode_into(out);
    }
}

impl ParamValue for bool {
    fn param_value(&self) -> Option<String> {
        self.then(|| "true".to_string())
    }
}

impl ParamValue for Option<bool> {
    fn param_value(&self) -> Option<String> {
        self.map(|b| b.to_string())
    }
}

macro_rules! optional_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for Option<$ty> {
                fn param_value(&self) -> Option<String> {
                    self.map(|n| n.to_string())
                }
            }
        )*
    };
}

optional_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

// NaN and the infinities have no wire form the server accepts; they are omitted.
macro_rules! optional_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for Option<$ty> {
                fn param_value(&self) -> Option<String> {
                    self.filter(|n| n.is_finite()).map(|n| n.to_string())
                }
            }
        )*
    };
}

optional_float!(f32, f64);

impl ParamValue for str {
    fn param_value(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_string())
    }
}

impl ParamValue for String {
    fn param_value(&self) -> Option<String> {
        self.as_str().param_value()
    }
}

impl ParamValue for Option<String> {
    fn param_value(&self) -> Option<String> {
        self.as_deref().and_then(ParamValue::param_value)
    }
}

impl ParamValue for Vec<String> {
    fn param_value(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.join(","))
    }
}

impl ParamValue for Duration {
    fn param_value(&self) -> Option<String> {
        format_duration(*self)
    }
}

impl ParamValue for Option<Duration> {
    fn param_value(&self) -> Option<String> {
        self.and_then(format_duration)
    }
}

const UNITS: [(u128, &str); 7] = [
    (86_400_000_000_000, "d"),
    (3_600_000_000_000, "h"),
    (60_000_000_000, "m"),
    (1_000_000_000, "s"),
    (1_000_000, "ms"),
    (1_000, "micros"),
    (1, "nanos"),
];

/// Format a duration with the largest OpenSearch time unit that represents it
/// exactly. Zero formats to `None`.
///
/// ```
/// use std::time::Duration;
/// use osprey_core::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(500)).as_deref(), Some("500ms"));
/// assert_eq!(format_duration(Duration::from_secs(300)).as_deref(), Some("5m"));
/// assert_eq!(format_duration(Duration::ZERO), None);
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> Option<String> {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return None;
    }
    UNITS
        .iter()
        .find(|(size, _)| nanos % size == 0)
        .map(|(size, unit)| format!("{}{unit}", nanos / size))
}

/// Join path segments with commas, the convention for multi-value segments
/// (`/idx-a,idx-b/_search`).
#[must_use]
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Common parameters
// ============================================================================

/// Flags accepted by every endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonParams {
    /// Pretty-print the server response.
    pub pretty: bool,
    /// Add human-readable units next to raw numbers.
    pub human: bool,
    /// Include the server stack trace in structured errors.
    pub error_trace: bool,
    /// JSON paths the server keeps in its reply.
    pub filter_path: Vec<String>,
}

impl EncodeParams for CommonParams {
    fn encode_into(&self, out: &mut ParamMap) {
        out.push("pretty", &self.pretty);
        out.push("human", &self.human);
        out.push("error_trace", &self.error_trace);
        out.push("filter_path", &self.filter_path);
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn booleans() {
        check!(true.param_value().as_deref() == Some("true"));
        check!(false.param_value().is_none());
        check!(Some(false).param_value().as_deref() == Some("false"));
        check!(Some(true).param_value().as_deref() == Some("true"));
        check!(None::<bool>.param_value().is_none());
    }

    #[test]
    fn integers() {
        check!(Some(50_u32).param_value().as_deref() == Some("50"));
        check!(Some(-1_i64).param_value().as_deref() == Some("-1"));
        check!(Some(0_usize).param_value().as_deref() == Some("0"));
        check!(None::<u64>.param_value().is_none());
    }

    #[test]
    fn floats() {
        check!(Some(12.5_f64).param_value().as_deref() == Some("12.5"));
        check!(Some(-1.0_f64).param_value().as_deref() == Some("-1"));
        check!(Some(0.5_f32).param_value().as_deref() == Some("0.5"));
        check!(Some(f64::NAN).param_value().is_none());
        check!(Some(f64::INFINITY).param_value().is_none());
        check!(Some(f32::NEG_INFINITY).param_value().is_none());
    }

    #[test]
    fn strings_and_lists() {
        check!(String::new().param_value().is_none());
        check!("_local".to_string().param_value().as_deref() == Some("_local"));
        check!(Some(String::new()).param_value().is_none());
        check!(Vec::<String>::new().param_value().is_none());
        check!(
            vec!["took".to_string(), "hits.hits._id".to_string()]
                .param_value()
                .as_deref()
                == Some("took,hits.hits._id")
        );
    }

    #[test]
    fn durations_use_shortest_exact_unit() {
        let cases = [
            (Duration::from_millis(500), "500ms"),
            (Duration::from_secs(30), "30s"),
            (Duration::from_secs(300), "5m"),
            (Duration::from_secs(90), "90s"),
            (Duration::from_secs(7200), "2h"),
            (Duration::from_secs(86_400 * 2), "2d"),
            (Duration::from_micros(1500), "1500micros"),
            (Duration::from_nanos(7), "7nanos"),
        ];
        for (duration, expected) in cases {
            check!(format_duration(duration).as_deref() == Some(expected));
        }
        check!(Duration::ZERO.param_value().is_none());
        check!(Some(Duration::ZERO).param_value().is_none());
    }

    #[test]
    fn default_common_params_encode_to_nothing() {
        check!(CommonParams::default().encode().is_empty());
    }

    #[test]
    fn common_params() {
        let params = CommonParams {
            pretty: true,
            human: true,
            error_trace: true,
            filter_path: vec!["took".to_string(), "hits.total".to_string()],
        };
        insta::assert_snapshot!(
            params.encode().to_query_string(),
            @"error_trace=true&filter_path=took%2Chits.total&human=true&pretty=true"
        );
    }

    #[test]
    fn query_string_round_trip() {
        let mut params = ParamMap::new();
        params.insert("q", "title:\"rust & search\"");
        params.insert("timeout", "30s");
        params.insert("filter_path", "a,b");

        let parsed = ParamMap::parse_query(&params.to_query_string());
        check!(parsed == params);
        check!(ParamMap::parse_query(&parsed.to_query_string()) == parsed);
    }

    #[test]
    fn join_segments_with_commas() {
        check!(join_segments(&["a", "b", "c"]) == "a,b,c");
        check!(join_segments::<&str>(&[]).is_empty());
    }
}
