//! PEP 508 requirement-line parsing and marker combination.
//!
//! Covers the subset of the requirement grammar the engine needs:
//! `name[extras] (@ url | specifier) (; marker)`. Environment markers are
//! carried as opaque strings; only mechanical AND-combination is provided.

use crate::error::{CompatError, CompatResult};
use indexmap::IndexSet;

/// A parsed requirement line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: IndexSet<String>,
    /// Specifier with surrounding parens and internal whitespace stripped;
    /// empty when the requirement carries a URL or no constraint at all
    pub specifier: String,
    pub url: Option<String>,
    pub marker: Option<String>,
}

impl Requirement {
    /// Parse a PEP 508-style requirement line
    pub fn parse(line: &str) -> CompatResult<Self> {
        let (body, marker) = match line.split_once(';') {
            Some((body, marker)) => {
                let marker = marker.trim();
                (body, (!marker.is_empty()).then(|| marker.to_string()))
            }
            None => (line, None),
        };
        let body = body.trim();

        let name_end = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
            .unwrap_or(body.len());
        let name = &body[..name_end];
        if name.is_empty() {
            return Err(CompatError::InvalidRequirement {
                line: line.to_string(),
                reason: "missing package name".to_string(),
            });
        }

        let mut rest = body[name_end..].trim_start();
        let mut extras = IndexSet::new();
        if let Some(bracketed) = rest.strip_prefix('[') {
            let Some((inner, after)) = bracketed.split_once(']') else {
                return Err(CompatError::InvalidRequirement {
                    line: line.to_string(),
                    reason: "unterminated extras list".to_string(),
                });
            };
            for extra in inner.split(',') {
                let extra = extra.trim();
                if !extra.is_empty() {
                    extras.insert(extra.to_string());
                }
            }
            rest = after.trim_start();
        }

        let (specifier, url) = if let Some(url) = rest.strip_prefix('@') {
            (String::new(), Some(url.trim().to_string()))
        } else {
            let cleaned: String = rest
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split_whitespace()
                .collect();
            (cleaned, None)
        };

        Ok(Requirement {
            name: name.to_string(),
            extras,
            specifier,
            url,
            marker,
        })
    }
}

/// Combine marker expressions with logical AND into one expression string.
///
/// Operands containing an `or` are parenthesized so the combined expression
/// keeps its meaning; double quotes are normalized to single quotes. Returns
/// `None` when no non-empty markers are supplied.
pub fn combine_markers<I>(markers: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let parts: Vec<String> = markers
        .into_iter()
        .filter(|marker| !marker.trim().is_empty())
        .map(|marker| marker.replace('"', "'"))
        .map(|marker| {
            if marker.contains(" or ") {
                format!("({})", marker)
            } else {
                marker
            }
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_specifier() {
        let req = Requirement::parse("foo>=1,<2").unwrap();
        assert_eq!(req.name, "foo");
        assert_eq!(req.specifier, ">=1,<2");
        assert!(req.extras.is_empty());
        assert_eq!(req.url, None);
        assert_eq!(req.marker, None);
    }

    #[test]
    fn test_parse_extras_and_marker() {
        let req = Requirement::parse("foo[x]>=1; python_version<'3.12'").unwrap();
        assert_eq!(req.name, "foo");
        assert_eq!(req.specifier, ">=1");
        assert!(req.extras.contains("x"));
        assert_eq!(req.marker.as_deref(), Some("python_version<'3.12'"));
    }

    #[test]
    fn test_parse_multiple_extras_keep_order() {
        let req = Requirement::parse("foo[b, a]>=1").unwrap();
        let extras: Vec<&String> = req.extras.iter().collect();
        assert_eq!(extras, ["b", "a"]);
    }

    #[test]
    fn test_parse_url_requirement() {
        let req = Requirement::parse("foo @ git+https://x/y@v1").unwrap();
        assert_eq!(req.name, "foo");
        assert_eq!(req.specifier, "");
        assert_eq!(req.url.as_deref(), Some("git+https://x/y@v1"));
    }

    #[test]
    fn test_parse_parenthesized_specifier() {
        let req = Requirement::parse("foo (>= 1.0)").unwrap();
        assert_eq!(req.specifier, ">=1.0");
    }

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("foo").unwrap();
        assert_eq!(req.name, "foo");
        assert_eq!(req.specifier, "");
    }

    #[test]
    fn test_parse_missing_name() {
        assert!(Requirement::parse(">=1.0").is_err());
        assert!(Requirement::parse("").is_err());
    }

    #[test]
    fn test_parse_unterminated_extras() {
        assert!(Requirement::parse("foo[x>=1").is_err());
    }

    #[test]
    fn test_combine_markers() {
        assert_eq!(combine_markers(Vec::new()), None);
        assert_eq!(
            combine_markers(vec!["python_version >= \"3.8\"".to_string()]),
            Some("python_version >= '3.8'".to_string())
        );
        assert_eq!(
            combine_markers(vec![
                "python_version >= '3.8'".to_string(),
                "sys_platform == 'linux' or sys_platform == 'darwin'".to_string(),
            ]),
            Some(
                "python_version >= '3.8' and (sys_platform == 'linux' or sys_platform == 'darwin')"
                    .to_string()
            )
        );
    }
}
