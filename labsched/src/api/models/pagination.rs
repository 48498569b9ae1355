//! Offset pagination for list endpoints that can grow without bound (users, notifications).
//!
//! Catalog and schedule listings are naturally small per semester and are returned whole.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 200;

/// `skip`/`limit` query parameters.
///
/// Values arrive as strings so the struct can be `#[serde(flatten)]`ed into other query types.
/// `limit` is clamped to `1..=MAX_LIMIT` and `skip` to non-negative values.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 50, max: 200)
    #[param(default = 50, minimum = 1, maximum = 200)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        assert_eq!(Pagination::default().params(), (0, DEFAULT_LIMIT));
    }

    #[rstest]
    #[case(Some(0), 1)]
    #[case(Some(-5), 1)]
    #[case(Some(1000), MAX_LIMIT)]
    #[case(Some(25), 25)]
    fn test_limit_clamping(#[case] limit: Option<i64>, #[case] expected: i64) {
        let p = Pagination { skip: None, limit };
        assert_eq!(p.limit(), expected);
    }

    #[test]
    fn test_negative_skip_is_zero() {
        let p = Pagination {
            skip: Some(-10),
            limit: None,
        };
        assert_eq!(p.skip(), 0);
    }
}
