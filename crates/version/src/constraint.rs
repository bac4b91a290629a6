//! Constraint expressions over versions.
//!
//! An expression is a comma-separated list of clauses, each an optional
//! operator followed by a version. A version satisfies the expression when
//! it satisfies every clause. Supported operators are `=`, `!=`, `>`, `>=`,
//! `<`, `<=` and the pessimistic `~>`; a bare version means `=`.

use crate::error::{Result, VersionError};
use crate::version::{Version, parse_with_precision};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` or no operator.
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `~>`: at least the given version, within its last written component.
    Pessimistic,
}

impl Operator {
    /// Longest operators first so `>=` is not read as `>`.
    const TOKENS: &'static [(&'static str, Self)] = &[
        ("~>", Self::Pessimistic),
        (">=", Self::GreaterOrEqual),
        ("<=", Self::LessOrEqual),
        ("!=", Self::NotEqual),
        (">", Self::Greater),
        ("<", Self::Less),
        ("=", Self::Equal),
    ];

    fn split(clause: &str) -> (Self, &str) {
        Self::TOKENS
            .iter()
            .find_map(|(token, operator)| {
                clause
                    .strip_prefix(token)
                    .map(|rest| (*operator, rest.trim_start()))
            })
            .unwrap_or((Self::Equal, clause))
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Pessimistic => "~>",
        }
    }
}

/// A single `operator version` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    operator: Operator,
    version: Version,
    precision: usize,
}

impl Constraint {
    /// The clause operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// The clause version.
    #[must_use]
    pub const fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `candidate` satisfies this clause.
    ///
    /// A pre-release candidate only satisfies a clause whose own version is a
    /// pre-release of the same `major.minor.patch`; release clauses never
    /// admit pre-releases.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        if candidate.is_prerelease()
            && (!self.version.is_prerelease() || !candidate.same_release(&self.version))
        {
            return false;
        }

        let target = &self.version;
        match self.operator {
            Operator::Equal => candidate == target,
            Operator::NotEqual => candidate != target,
            Operator::Greater => candidate > target,
            Operator::GreaterOrEqual => candidate >= target,
            Operator::Less => candidate < target,
            Operator::LessOrEqual => candidate <= target,
            Operator::Pessimistic => candidate >= target && self.within_pessimistic_bound(candidate),
        }
    }

    /// `~> 1.2.3` pins `1.2` and `~> 1.2` pins the major. `~> 1` has no
    /// upper bound, as in HashiCorp's constraint syntax.
    fn within_pessimistic_bound(&self, candidate: &Version) -> bool {
        let target = &self.version;
        match self.precision {
            0 | 1 => true,
            2 => candidate.major() == target.major(),
            _ => candidate.major() == target.major() && candidate.minor() == target.minor(),
        }
    }
}

impl FromStr for Constraint {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self> {
        let clause = value.trim();
        if clause.is_empty() {
            return Err(VersionError::EmptyConstraint);
        }
        let (operator, raw_version) = Operator::split(clause);
        let (version, precision) =
            parse_with_precision(raw_version).map_err(|err| VersionError::InvalidConstraint {
                value: clause.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            operator,
            version,
            precision,
        })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.operator.symbol();
        let version = &self.version;
        // The pessimistic bound depends on how many components were written.
        match (self.operator, self.precision) {
            (Operator::Pessimistic, 0 | 1) => write!(f, "{symbol} {}", version.major())?,
            (Operator::Pessimistic, 2) => {
                write!(f, "{symbol} {}.{}", version.major(), version.minor())?;
            }
            _ => return write!(f, "{symbol} {version}"),
        }
        if let Some(pre) = version.pre_release() {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = version.build() {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

/// A conjunction of constraint clauses.
///
/// # Examples
///
/// ```
/// use tvm_version::{ConstraintSet, Version};
///
/// let set: ConstraintSet = ">=1.5.0, <2.0.0".parse().expect("valid constraint");
/// assert!(set.matches(&"1.9.9".parse::<Version>().expect("valid")));
/// assert!(!set.matches(&"2.0.0".parse::<Version>().expect("valid")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    clauses: Vec<Constraint>,
}

impl ConstraintSet {
    /// Whether the set has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The individual clauses.
    #[must_use]
    pub fn clauses(&self) -> &[Constraint] {
        &self.clauses
    }

    /// Combine two sets; the result is satisfied only when both are.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    /// Whether `candidate` satisfies every clause.
    ///
    /// With no clauses, pre-releases are still rejected so that an empty
    /// requirement behaves like "latest stable".
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        if self.clauses.is_empty() {
            return !candidate.is_prerelease();
        }
        self.clauses.iter().all(|clause| clause.matches(candidate))
    }

    /// Parse and combine several expressions, as gathered from multiple files.
    ///
    /// # Errors
    ///
    /// Returns the first expression that fails to parse.
    pub fn parse_all<I, S>(expressions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        expressions
            .into_iter()
            .try_fold(Self::default(), |set, expression| {
                Ok(set.and(expression.as_ref().parse()?))
            })
    }
}

impl FromStr for ConstraintSet {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self> {
        let clauses = value
            .split(',')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Constraint>>>()?;
        if clauses.is_empty() {
            return Err(VersionError::EmptyConstraint);
        }
        Ok(Self { clauses })
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.clauses.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn version(value: &str) -> Version {
        value.parse().expect("valid version")
    }

    fn set(value: &str) -> ConstraintSet {
        value.parse().expect("valid constraint")
    }

    #[rstest]
    #[case::bare("1.6.0", "1.6.0", true)]
    #[case::equal("= 1.6.0", "v1.6.0", true)]
    #[case::not_equal("!=1.6.0", "1.6.1", true)]
    #[case::not_equal_rejects("!=1.6.0", "1.6.0", false)]
    #[case::greater(">1.6.0", "1.6.1", true)]
    #[case::greater_rejects_equal(">1.6.0", "1.6.0", false)]
    #[case::greater_or_equal(">=1.6.0", "1.6.0", true)]
    #[case::less("<1.6.0", "1.5.9", true)]
    #[case::less_or_equal("<=1.6.0", "1.6.0", true)]
    #[case::pessimistic_patch("~>1.6.2", "1.6.9", true)]
    #[case::pessimistic_patch_upper("~> 1.6.2", "1.7.0", false)]
    #[case::pessimistic_patch_lower("~> 1.6.2", "1.6.1", false)]
    #[case::pessimistic_minor("~> 1.6", "1.9.0", true)]
    #[case::pessimistic_minor_upper("~> 1.6", "2.0.0", false)]
    #[case::pessimistic_major("~> 1", "1.99.0", true)]
    #[case::pessimistic_major_unbounded("~> 1", "2.0.0", true)]
    #[case::pessimistic_major_lower("~> 1", "0.9.0", false)]
    fn evaluates_single_clause(#[case] expression: &str, #[case] candidate: &str, #[case] expected: bool) {
        assert_eq!(set(expression).matches(&version(candidate)), expected);
    }

    #[test]
    fn combined_range_selects_expected_members() {
        let range = set(">=1.5.0,<2.0.0");
        let accepted: Vec<&str> = ["1.4.9", "1.5.2", "1.9.9", "2.0.0"]
            .into_iter()
            .filter(|candidate| range.matches(&version(candidate)))
            .collect();
        assert_eq!(accepted, vec!["1.5.2", "1.9.9"]);
    }

    #[test]
    fn pre_releases_need_a_matching_pre_release_clause() {
        assert!(!set(">=1.5.0").matches(&version("1.6.0-rc1")));
        assert!(set(">=1.6.0-alpha1").matches(&version("1.6.0-rc1")));
        assert!(!set(">=1.6.0-alpha1").matches(&version("1.7.0-rc1")));
        assert!(set(">=1.6.0-alpha1").matches(&version("1.7.0")));
    }

    #[test]
    fn parse_all_builds_a_conjunction() {
        let combined = ConstraintSet::parse_all([">= 1.2", "< 1.8.0", "!= 1.5.0"])
            .expect("valid constraints");
        assert_eq!(combined.clauses().len(), 3);
        assert!(combined.matches(&version("1.7.3")));
        assert!(!combined.matches(&version("1.5.0")));
        assert!(!combined.matches(&version("1.8.0")));
    }

    #[test]
    fn empty_set_rejects_pre_releases_only() {
        let empty = ConstraintSet::default();
        assert!(empty.matches(&version("1.0.0")));
        assert!(!empty.matches(&version("1.0.0-beta1")));
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_commas(" , ,")]
    #[case::bad_version(">= one")]
    #[case::dangling_operator(">=")]
    fn rejects_malformed_expressions(#[case] expression: &str) {
        assert!(expression.parse::<ConstraintSet>().is_err());
    }

    #[test]
    fn displays_normalised_clauses() {
        assert_eq!(set(">=v1.5, <2").to_string(), ">= 1.5.0, < 2.0.0");
        assert_eq!(set("~>1.6, ~> 1.6.2").to_string(), "~> 1.6, ~> 1.6.2");
    }

    #[rstest]
    #[case::minor_pre_release("~> 1.6-beta", "1.6.0-beta2")]
    #[case::major_pre_release("~> 1-rc1", "1.0.0-rc2")]
    fn short_pessimistic_clauses_keep_their_suffix(#[case] expression: &str, #[case] candidate: &str) {
        let original = set(expression);
        assert_eq!(original.to_string(), expression);

        let reparsed = set(&original.to_string());
        assert_eq!(reparsed, original);
        assert!(reparsed.matches(&version(candidate)));
    }
}
