//! Version-constraint translation between shorthand and explicit operator form.
//!
//! Poetry-style constraints use caret/tilde shorthand and `||` unions; PEP 440
//! specifiers use explicit comparison operators joined by commas. Translation
//! is one-way: rendering always emits explicit operator form and never
//! reconstructs shorthand.

use std::fmt;

/// Comparison operator inside a constraint clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `==`
    Exact,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `~=` (compatible release)
    Compatible,
    /// Any other glyph, passed through unchanged (e.g. `!=`)
    Other(String),
}

impl ConstraintOp {
    fn from_glyph(glyph: &str) -> Self {
        match glyph {
            "" | "==" => ConstraintOp::Exact,
            ">" => ConstraintOp::Greater,
            ">=" => ConstraintOp::GreaterEq,
            "<" => ConstraintOp::Less,
            "<=" => ConstraintOp::LessEq,
            "~" | "~=" => ConstraintOp::Compatible,
            other => ConstraintOp::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOp::Exact => write!(f, "=="),
            ConstraintOp::Greater => write!(f, ">"),
            ConstraintOp::GreaterEq => write!(f, ">="),
            ConstraintOp::Less => write!(f, "<"),
            ConstraintOp::LessEq => write!(f, "<="),
            ConstraintOp::Compatible => write!(f, "~="),
            ConstraintOp::Other(glyph) => write!(f, "{}", glyph),
        }
    }
}

/// One (operator, version) pair inside an AND-joined clause list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub op: ConstraintOp,
    pub version: String,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A version constraint: a union (OR) of AND-joined clause lists
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionConstraint {
    pub branches: Vec<Vec<Clause>>,
}

impl VersionConstraint {
    /// Check whether the constraint carries no clauses at all
    pub fn is_empty(&self) -> bool {
        self.branches.iter().all(|branch| branch.is_empty())
    }

    /// The first clause of the first non-empty branch, if any
    pub fn first_clause(&self) -> Option<&Clause> {
        self.branches.iter().find_map(|branch| branch.first())
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .branches
            .iter()
            .map(|branch| {
                branch
                    .iter()
                    .map(Clause::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        write!(f, "{}", rendered.join(" || "))
    }
}

/// Translate a shorthand constraint into explicit operator clauses.
///
/// The input is split on `||` into OR-branches; within a branch, tokens are
/// comma-separated `operator-glyph + dotted-numeric-version` pairs. Tokens
/// without a digit payload (e.g. a bare `*`) are dropped.
pub fn translate(input: &str) -> VersionConstraint {
    let mut branches = Vec::new();
    for branch in input.split("||") {
        let mut clauses = Vec::new();
        for token in branch.split(',') {
            let token = token.trim();
            let Some(digit_at) = token.find(|c: char| c.is_ascii_digit()) else {
                continue;
            };
            let (glyph, version) = token.split_at(digit_at);
            let glyph = glyph.trim();
            let version = version.trim();
            if glyph == "^" {
                clauses.push(Clause {
                    op: ConstraintOp::GreaterEq,
                    version: version.to_string(),
                });
                clauses.push(Clause {
                    op: ConstraintOp::Less,
                    version: next_major(version),
                });
            } else {
                clauses.push(Clause {
                    op: ConstraintOp::from_glyph(glyph),
                    version: version.to_string(),
                });
            }
        }
        branches.push(clauses);
    }
    VersionConstraint { branches }
}

/// Increment the first version component and zero-fill the rest, keeping the
/// input's arity: `1.2.3` -> `2.0.0`, `0.2` -> `1.0`.
fn next_major(version: &str) -> String {
    let mut parts = version.split('.');
    let major = parts.next().unwrap_or("0");
    let major: u64 = major
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0);
    let mut out = vec![(major + 1).to_string()];
    out.extend(parts.map(|_| "0".to_string()));
    out.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_expansion() {
        assert_eq!(translate("^1.2.3").to_string(), ">=1.2.3,<2.0.0");
        assert_eq!(translate("^0.2").to_string(), ">=0.2,<1.0");
    }

    #[test]
    fn test_tilde_rewrite() {
        assert_eq!(translate("~1.2").to_string(), "~=1.2");
        assert_eq!(translate("~=2.1").to_string(), "~=2.1");
    }

    #[test]
    fn test_bare_version_is_exact() {
        assert_eq!(translate("1.2.3").to_string(), "==1.2.3");
    }

    #[test]
    fn test_or_branches() {
        let constraint = translate("^1.0 || ^2.0");
        assert_eq!(constraint.branches.len(), 2);
        assert_eq!(constraint.to_string(), ">=1.0,<2.0 || >=2.0,<3.0");
    }

    #[test]
    fn test_explicit_operators_pass_through() {
        assert_eq!(translate(">=1.0,<2.0").to_string(), ">=1.0,<2.0");
        assert_eq!(translate("!=1.5").to_string(), "!=1.5");
        assert_eq!(translate("<=3.11").to_string(), "<=3.11");
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(translate(">= 1.0 , < 2.0").to_string(), ">=1.0,<2.0");
        assert_eq!(translate("~ 1.2").to_string(), "~=1.2");
    }

    #[test]
    fn test_tokens_without_digits_are_dropped() {
        assert!(translate("*").is_empty());
        assert!(translate("").is_empty());
        assert_eq!(translate("*, >=1.0").to_string(), ">=1.0");
    }

    #[test]
    fn test_first_clause() {
        let constraint = translate(">=3.9,<3.13");
        let first = constraint.first_clause().unwrap();
        assert_eq!(first.op, ConstraintOp::GreaterEq);
        assert_eq!(first.version, "3.9");
    }

    #[test]
    fn test_next_major_arity() {
        assert_eq!(next_major("1.2.3"), "2.0.0");
        assert_eq!(next_major("0.2"), "1.0");
        assert_eq!(next_major("9"), "10");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Caret always expands to a half-open range on the next major line
        #[test]
        fn caret_expands_to_range(major in 0u64..100, minor in 0u64..100, patch in 0u64..100) {
            let input = format!("^{}.{}.{}", major, minor, patch);
            let expected = format!(">={}.{}.{},<{}.0.0", major, minor, patch, major + 1);
            prop_assert_eq!(translate(&input).to_string(), expected);
        }
    }

    proptest! {
        // Bare versions always render in explicit == form
        #[test]
        fn bare_version_renders_exact(version in "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}") {
            let rendered = translate(&version).to_string();
            prop_assert_eq!(rendered, format!("=={}", version));
        }
    }
}
