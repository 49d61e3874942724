use crate::version::compare::compare_versions;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version range '{token}': {reason}")]
    InvalidRange { token: String, reason: String },
}

fn invalid(token: &str, reason: &str) -> VersionError {
    VersionError::InvalidRange {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

/// One end of an interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: String,
    pub inclusive: bool,
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// The empty token: matches every version.
    Any,
    /// A single version, treated as the closed interval `[v,v]`.
    Exact(String),
    /// An interval; `None` is unbounded on that side.
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
}

impl VersionSpec {
    fn lower(&self) -> Option<(&str, bool)> {
        match self {
            VersionSpec::Any => None,
            VersionSpec::Exact(version) => Some((version, true)),
            VersionSpec::Range { lower, .. } => {
                lower.as_ref().map(|b| (b.version.as_str(), b.inclusive))
            }
        }
    }

    fn upper(&self) -> Option<(&str, bool)> {
        match self {
            VersionSpec::Any => None,
            VersionSpec::Exact(version) => Some((version, true)),
            VersionSpec::Range { upper, .. } => {
                upper.as_ref().map(|b| (b.version.as_str(), b.inclusive))
            }
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Any => Ok(()),
            VersionSpec::Exact(version) => write!(f, "{version}"),
            VersionSpec::Range { lower, upper } => {
                let open = match lower {
                    Some(Bound { inclusive: true, .. }) => '[',
                    _ => '(',
                };
                let close = match upper {
                    Some(Bound { inclusive: false, .. }) => ')',
                    Some(_) => ']',
                    None => ')',
                };
                let low = lower.as_ref().map(|b| b.version.as_str()).unwrap_or("");
                let high = upper.as_ref().map(|b| b.version.as_str()).unwrap_or("");
                write!(f, "{open}{low},{high}{close}")
            }
        }
    }
}

/// Parse a plain version, a bracketed range or the empty token.
///
/// # Examples
///
/// ```
/// use pom_patcher::version::{parse_version_spec, VersionSpec};
///
/// assert_eq!(parse_version_spec("").unwrap(), VersionSpec::Any);
/// assert_eq!(
///     parse_version_spec("1.0.8").unwrap(),
///     VersionSpec::Exact("1.0.8".to_string())
/// );
/// assert!(parse_version_spec("[1.0,").is_err());
/// ```
pub fn parse_version_spec(token: &str) -> Result<VersionSpec, VersionError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Ok(VersionSpec::Any);
    }

    let first = trimmed.chars().next();
    let last = trimmed.chars().last();
    let opens = matches!(first, Some('[' | '('));
    let closes = matches!(last, Some(']' | ')'));

    if !opens && !closes {
        if trimmed.contains(['[', ']', '(', ')', ',']) {
            return Err(invalid(token, "range delimiter inside a plain version"));
        }
        return Ok(VersionSpec::Exact(trimmed.to_string()));
    }

    if !opens || !closes || trimmed.len() < 2 {
        return Err(invalid(token, "unbalanced range brackets"));
    }

    let inner = &trimmed[1..trimmed.len() - 1];
    if inner.contains(['[', ']', '(', ')']) {
        return Err(invalid(token, "multiple ranges are not supported"));
    }

    let lower_inclusive = first == Some('[');
    let upper_inclusive = last == Some(']');

    let Some((low, high)) = inner.split_once(',') else {
        let version = inner.trim();
        if lower_inclusive && upper_inclusive && !version.is_empty() {
            return Ok(VersionSpec::Exact(version.to_string()));
        }
        return Err(invalid(token, "a single-version range must be written [version]"));
    };

    if high.contains(',') {
        return Err(invalid(token, "expected exactly one comma"));
    }

    let lower = bound(low, lower_inclusive);
    let upper = bound(high, upper_inclusive);

    if let (Some(lower), Some(upper)) = (&lower, &upper) {
        match compare_versions(&lower.version, &upper.version) {
            Ordering::Greater => {
                return Err(invalid(token, "lower bound exceeds upper bound"));
            }
            Ordering::Equal if !(lower.inclusive && upper.inclusive) => {
                return Err(invalid(token, "range is empty"));
            }
            _ => {}
        }
    }

    Ok(VersionSpec::Range { lower, upper })
}

fn bound(text: &str, inclusive: bool) -> Option<Bound> {
    let version = text.trim();
    if version.is_empty() {
        None
    } else {
        Some(Bound {
            version: version.to_string(),
            inclusive,
        })
    }
}

/// `true` when `low` does not lie above `high`.
fn reaches(low: Option<(&str, bool)>, high: Option<(&str, bool)>) -> bool {
    let (Some((low, low_inclusive)), Some((high, high_inclusive))) = (low, high) else {
        return true;
    };
    match compare_versions(low, high) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => low_inclusive && high_inclusive,
    }
}

/// Whether two specs share at least one version.
pub fn is_overlap(left: &VersionSpec, right: &VersionSpec) -> bool {
    if matches!(left, VersionSpec::Any) || matches!(right, VersionSpec::Any) {
        return true;
    }
    reaches(left.lower(), right.upper()) && reaches(right.lower(), left.upper())
}

/// Overlap check on raw tokens.
///
/// # Examples
///
/// ```
/// use pom_patcher::version::is_version_overlap;
///
/// assert!(is_version_overlap("1.0.8", "[1.0.3,1.1.0]").unwrap());
/// assert!(!is_version_overlap("1.0.8", "[,1.0.0]").unwrap());
/// assert!(is_version_overlap("1.0.8", "").unwrap());
/// ```
pub fn is_version_overlap(left: &str, right: &str) -> Result<bool, VersionError> {
    let left = parse_version_spec(left)?;
    let right = parse_version_spec(right)?;
    Ok(is_overlap(&left, &right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn overlap(left: &str, right: &str) -> bool {
        is_version_overlap(left, right).unwrap()
    }

    #[test]
    fn version_version() {
        assert!(overlap("1.0.8", "1.0.8"));
        assert!(!overlap("1.0.8", "1.0.0"));
        assert!(overlap("1.0", "1.0.0"));
    }

    #[test]
    fn version_range() {
        assert!(overlap("1.0.8", "[1.0.3,1.1.0]"));
        assert!(!overlap("1.0.8", "[0.0.1,1.0.0]"));
        assert!(!overlap("1.0.8", "[,1.0.0]"));
        assert!(!overlap("1.0.8", "[1.1.0,)"));
        assert!(overlap("[1.0.0,2.0.0]", "1.0.8"));
        assert!(!overlap("[1.0.5,1.0.6]", "1.0.8"));
    }

    #[test]
    fn empty_token_matches_everything() {
        assert!(overlap("1.0.8", ""));
        assert!(overlap("[1.0.5,1.0.8]", ""));
        assert!(overlap("", ""));
    }

    #[test]
    fn range_range() {
        assert!(overlap("[1.0.5,1.0.8]", "[1.0.7,1.1.0]"));
        assert!(!overlap("[1.0.5,1.0.6]", "[1.0.7,1.1.0]"));
    }

    #[test]
    fn boundary_inclusivity() {
        assert!(overlap("[1.0,2.0]", "[2.0,3.0]"));
        assert!(!overlap("[1.0,2.0)", "[2.0,3.0]"));
        assert!(!overlap("[1.0,2.0]", "(2.0,3.0]"));
        assert!(!overlap("2.0", "(2.0,)"));
        assert!(overlap("2.0", "[2.0,)"));
        assert!(overlap("(,1.0)", "(,0.5]"));
    }

    #[test]
    fn component_order_is_numeric() {
        assert!(overlap("1.10", "[1.9,)"));
        assert!(!overlap("1.10", "(,1.9]"));
    }

    #[test]
    fn qualified_versions_ignore_padding_zeros() {
        assert!(overlap("1.0-SNAPSHOT", "[1.0.0-SNAPSHOT]"));
        assert!(overlap("1-rc1", "1.0-rc1"));
        assert!(overlap("1.0-SNAPSHOT", "[1.0-alpha,1.0)"));
        assert!(!overlap("1.0-SNAPSHOT", "[1.0.0,)"));
    }

    #[test]
    fn parses_range_shapes() {
        assert_eq!(
            parse_version_spec("(,1.0]").unwrap(),
            VersionSpec::Range {
                lower: None,
                upper: Some(Bound {
                    version: "1.0".to_string(),
                    inclusive: true
                }),
            }
        );
        assert_eq!(
            parse_version_spec("[1.5]").unwrap(),
            VersionSpec::Exact("1.5".to_string())
        );
        assert_eq!(parse_version_spec("[1.0,2.0)").unwrap().to_string(), "[1.0,2.0)");
    }

    #[test]
    fn malformed_ranges_fail_closed() {
        for token in [
            "[1.0", "1.0]", "(1.0)", "[1,2,3]", "[2.0,1.0]", "(1.0,1.0]", "[1.0],[2.0,)", "1,0",
            "[", "()",
        ] {
            let result = parse_version_spec(token);
            assert!(
                matches!(result, Err(VersionError::InvalidRange { .. })),
                "expected {token:?} to be rejected, got {result:?}"
            );
        }
        assert!(is_version_overlap("1.0", "[1.0").is_err());
    }

    fn version() -> impl Strategy<Value = String> {
        "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}(-(alpha|rc|SNAPSHOT)[0-9]?)?"
    }

    fn range_token() -> impl Strategy<Value = String> {
        (
            proptest::option::of(version()),
            proptest::option::of(version()),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(low, high, low_inclusive, high_inclusive)| {
                format!(
                    "{}{},{}{}",
                    if low_inclusive { '[' } else { '(' },
                    low.unwrap_or_default(),
                    high.unwrap_or_default(),
                    if high_inclusive { ']' } else { ')' },
                )
            })
            .prop_filter("range must be non-empty", |token| {
                parse_version_spec(token).is_ok()
            })
    }

    fn spec_token() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), version(), range_token()]
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(left in spec_token(), right in spec_token()) {
            prop_assert_eq!(overlap(&left, &right), overlap(&right, &left));
        }

        #[test]
        fn version_overlaps_itself(v in version()) {
            prop_assert!(overlap(&v, &v));
        }

        #[test]
        fn empty_token_absorbs(token in spec_token()) {
            prop_assert!(overlap(&token, ""));
            prop_assert!(overlap("", &token));
        }

        #[test]
        fn range_overlaps_its_own_bounds(low in version(), high in version()) {
            let (low, high) = if compare_versions(&low, &high) == Ordering::Greater {
                (high, low)
            } else {
                (low, high)
            };
            let range = format!("[{low},{high}]");
            prop_assert!(overlap(&low, &range));
            prop_assert!(overlap(&high, &range));
        }
    }
}
