//! Enumerated query-parameter values.
//!
//! A bare selector field is encoded only when it differs from the documented
//! default. Wrap it in `Option` when the endpoint has no default or a
//! different one, and it is encoded whenever set.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::ParamValue;

macro_rules! selector {
    (
        $(#[$meta:meta])*
        $name:ident $(default $default:ident)? {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Wire form of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ParamValue for Option<$name> {
            fn param_value(&self) -> Option<String> {
                self.map(|v| v.as_str().to_string())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                match value.as_str() {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(de::Error::unknown_variant(other, &[$($text),+])),
                }
            }
        }

        $(
            impl Default for $name {
                fn default() -> Self {
                    Self::$default
                }
            }

            impl ParamValue for $name {
                fn param_value(&self) -> Option<String> {
                    (*self != Self::$default).then(|| self.as_str().to_string())
                }
            }
        )?
    };
}

selector! {
    /// Write visibility (`refresh`).
    Refresh default False {
        /// Refresh the affected shards immediately.
        True => "true",
        /// Do not refresh.
        False => "false",
        /// Wait for the next scheduled refresh.
        WaitFor => "wait_for",
    }
}

selector! {
    /// Index operation type (`op_type`).
    OpType default Index {
        /// Create or replace.
        Index => "index",
        /// Fail if the document already exists.
        Create => "create",
    }
}

selector! {
    /// Versioning scheme (`version_type`).
    VersionType default Internal {
        /// Versions managed by the cluster.
        Internal => "internal",
        /// Versions supplied by the caller, must be greater.
        External => "external",
        /// Versions supplied by the caller, must be greater or equal.
        ExternalGte => "external_gte",
    }
}

selector! {
    /// Conflict handling for by-query operations (`conflicts`).
    Conflicts default Abort {
        /// Abort on the first version conflict.
        Abort => "abort",
        /// Count conflicts and continue.
        Proceed => "proceed",
    }
}

selector! {
    /// Search execution strategy (`search_type`).
    SearchType default QueryThenFetch {
        /// Score with shard-local term frequencies.
        QueryThenFetch => "query_then_fetch",
        /// Collect global term frequencies first.
        DfsQueryThenFetch => "dfs_query_then_fetch",
    }
}

selector! {
    /// Boolean operator for query-string queries (`default_operator`).
    DefaultOperator default Or {
        /// Any term may match.
        Or => "OR",
        /// All terms must match.
        And => "AND",
    }
}

selector! {
    /// Detail level of cluster health (`level`).
    HealthLevel default Cluster {
        /// Cluster-wide summary.
        Cluster => "cluster",
        /// Per-index detail.
        Indices => "indices",
        /// Per-shard detail.
        Shards => "shards",
    }
}

selector! {
    /// Cluster health colour (`wait_for_status`, `health`).
    HealthStatus {
        /// All shards allocated.
        Green => "green",
        /// All primaries allocated.
        Yellow => "yellow",
        /// Some primaries unallocated.
        Red => "red",
    }
}

selector! {
    /// Unit for byte values in cat output (`bytes`).
    ByteUnit {
        /// Bytes.
        B => "b",
        /// Kilobytes.
        Kb => "kb",
        /// Megabytes.
        Mb => "mb",
        /// Gigabytes.
        Gb => "gb",
        /// Terabytes.
        Tb => "tb",
        /// Petabytes.
        Pb => "pb",
    }
}

selector! {
    /// Unit for time values in cat output (`time`).
    TimeUnit {
        /// Days.
        Days => "d",
        /// Hours.
        Hours => "h",
        /// Minutes.
        Minutes => "m",
        /// Seconds.
        Seconds => "s",
        /// Milliseconds.
        Millis => "ms",
        /// Microseconds.
        Micros => "micros",
        /// Nanoseconds.
        Nanos => "nanos",
    }
}

// ============================================================================
// Expand wildcards
// ============================================================================

/// Which indices wildcard expressions match (`expand_wildcards`).
///
/// Values combine with `|` and render comma-separated:
///
/// ```
/// use osprey_core::ExpandWildcards;
///
/// let value = ExpandWildcards::OPEN | ExpandWildcards::CLOSED;
/// assert_eq!(value.to_string(), "open,closed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpandWildcards(u8);

impl ExpandWildcards {
    /// Match no index.
    pub const NONE: Self = Self(0);
    /// Open indices.
    pub const OPEN: Self = Self(1);
    /// Closed indices.
    pub const CLOSED: Self = Self(1 << 1);
    /// Hidden indices.
    pub const HIDDEN: Self = Self(1 << 2);
    /// Every index.
    pub const ALL: Self = Self(0b111);

    const NAMES: [(Self, &'static str); 3] = [
        (Self::OPEN, "open"),
        (Self::CLOSED, "closed"),
        (Self::HIDDEN, "hidden"),
    ];

    /// Returns `true` if every state in `other` is included.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ExpandWildcards {
    fn default() -> Self {
        Self::OPEN
    }
}

impl BitOr for ExpandWildcards {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ExpandWildcards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return f.write_str("none");
        }
        if *self == Self::ALL {
            return f.write_str("all");
        }
        let names = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>();
        f.write_str(&names.join(","))
    }
}

impl ParamValue for ExpandWildcards {
    fn param_value(&self) -> Option<String> {
        (*self != Self::default()).then(|| self.to_string())
    }
}

impl ParamValue for Option<ExpandWildcards> {
    fn param_value(&self) -> Option<String> {
        self.map(|v| v.to_string())
    }
}

// ============================================================================
// Wait for active shards
// ============================================================================

/// Number of active shard copies required before a write proceeds
/// (`wait_for_active_shards`). The server default is one copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitForActiveShards {
    /// At least this many copies.
    Count(u32),
    /// Every copy.
    All,
}

impl Default for WaitForActiveShards {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl fmt::Display for WaitForActiveShards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::All => f.write_str("all"),
        }
    }
}

impl ParamValue for WaitForActiveShards {
    fn param_value(&self) -> Option<String> {
        (*self != Self::default()).then(|| self.to_string())
    }
}

impl ParamValue for Option<WaitForActiveShards> {
    fn param_value(&self) -> Option<String> {
        self.map(|v| v.to_string())
    }
}
