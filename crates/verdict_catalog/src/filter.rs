//! Run filters: `--tag` and `--where` pruning of controls at build time.
//!
//! The two filter kinds are mutually exclusive. Tag filters are a list of
//! `key=value` pairs that must all match a control's tags. Where filters are
//! a small predicate expression over control metadata:
//!
//! ```text
//! severity = 'high' or severity = 'critical' and tag:service != 'ec2'
//! ```
//!
//! Fields are `name`, `title`, `severity` and `tag:<key>`; operators are `=`
//! and `!=`; terms combine with `and`/`or`, where `and` binds tighter.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::models::ControlDefinition;

/// A filter restricting which controls are included in a run.
#[derive(Debug, Clone, Default)]
pub enum RunFilter {
    /// No filtering, every control qualifies
    #[default]
    None,
    /// All listed `key=value` pairs must be present in the control's tags
    Tags(Vec<TagFilter>),
    /// Predicate expression over control metadata
    Where(WhereExpr),
}

impl RunFilter {
    /// Build a filter from raw CLI arguments.
    ///
    /// Fails with [`CatalogError::InvalidFilter`] if both a where clause and
    /// tag filters are supplied.
    pub fn from_args(where_clause: Option<&str>, tags: &[String]) -> CatalogResult<Self> {
        match (where_clause, tags.is_empty()) {
            (Some(_), false) => Err(CatalogError::InvalidFilter(
                "'--where' cannot be combined with '--tag'".to_string(),
            )),
            (Some(clause), true) => Ok(RunFilter::Where(WhereExpr::parse(clause)?)),
            (None, false) => {
                let parsed = tags
                    .iter()
                    .map(|raw| TagFilter::parse(raw))
                    .collect::<CatalogResult<Vec<_>>>()?;
                Ok(RunFilter::Tags(parsed))
            }
            (None, true) => Ok(RunFilter::None),
        }
    }

    /// Whether the given control passes this filter.
    pub fn matches(&self, control: &ControlDefinition) -> bool {
        match self {
            RunFilter::None => true,
            RunFilter::Tags(tags) => tags.iter().all(|t| {
                control
                    .tags
                    .get(&t.key)
                    .is_some_and(|value| *value == t.value)
            }),
            RunFilter::Where(expr) => expr.matches(control),
        }
    }

    /// Whether this filter excludes anything at all.
    pub fn is_none(&self) -> bool {
        matches!(self, RunFilter::None)
    }
}

/// A single `key=value` tag requirement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    /// Parse a raw `key=value` argument.
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        match raw.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Self {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(CatalogError::InvalidFilter(format!(
                "tag filter must be 'key=value', got '{raw}'"
            ))),
        }
    }
}

/// Metadata field a where term compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhereField {
    Name,
    Title,
    Severity,
    Tag(String),
}

/// Comparison operator in a where term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
}

/// A single `field op 'value'` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereTerm {
    pub field: WhereField,
    pub op: CompareOp,
    pub value: String,
}

impl WhereTerm {
    fn matches(&self, control: &ControlDefinition) -> bool {
        let actual = match &self.field {
            WhereField::Name => Some(control.name.clone()),
            WhereField::Title => Some(control.title.clone()),
            WhereField::Severity => control.severity.map(|s| s.as_str().to_string()),
            WhereField::Tag(key) => control.tags.get(key).cloned(),
        };
        let equal = actual.as_deref() == Some(self.value.as_str());
        match self.op {
            CompareOp::Eq => equal,
            CompareOp::NotEq => !equal,
        }
    }
}

/// A parsed where expression in disjunctive form: any clause matching means
/// the control matches, and a clause matches when all of its terms do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereExpr {
    clauses: Vec<Vec<WhereTerm>>,
}

impl WhereExpr {
    /// Parse a where clause string.
    pub fn parse(input: &str) -> CatalogResult<Self> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(CatalogError::WhereParse("empty expression".to_string()));
        }

        let mut clauses = Vec::new();
        let mut current = Vec::new();
        let mut pos = 0;

        loop {
            let term = parse_term(&tokens, &mut pos)?;
            current.push(term);

            match tokens.get(pos) {
                None => break,
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => {
                    pos += 1;
                }
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("or") => {
                    pos += 1;
                    clauses.push(std::mem::take(&mut current));
                }
                Some(other) => {
                    return Err(CatalogError::WhereParse(format!(
                        "expected 'and' or 'or', got {other}"
                    )));
                }
            }
        }
        clauses.push(current);

        Ok(Self { clauses })
    }

    /// Whether the given control satisfies this expression.
    pub fn matches(&self, control: &ControlDefinition) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.iter().all(|term| term.matches(control)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Eq,
    NotEq,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{w}'"),
            Token::Quoted(q) => write!(f, "'{q}'"),
            Token::Eq => f.write_str("'='"),
            Token::NotEq => f.write_str("'!='"),
        }
    }
}

fn tokenize(input: &str) -> CatalogResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '\'' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(CatalogError::WhereParse(
                        "unterminated quoted string".to_string(),
                    ));
                }
                tokens.push(Token::Quoted(value));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(CatalogError::WhereParse("expected '!='".to_string()));
                }
                tokens.push(Token::NotEq);
            }
            '<' => {
                chars.next();
                if chars.next() != Some('>') {
                    return Err(CatalogError::WhereParse("expected '<>'".to_string()));
                }
                tokens.push(Token::NotEq);
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '=' | '!' | '<' | '\'') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

fn parse_term(tokens: &[Token], pos: &mut usize) -> CatalogResult<WhereTerm> {
    let field = match tokens.get(*pos) {
        Some(Token::Word(w)) => parse_field(w)?,
        other => {
            return Err(CatalogError::WhereParse(format!(
                "expected field name, got {}",
                other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            )));
        }
    };
    *pos += 1;

    let op = match tokens.get(*pos) {
        Some(Token::Eq) => CompareOp::Eq,
        Some(Token::NotEq) => CompareOp::NotEq,
        other => {
            return Err(CatalogError::WhereParse(format!(
                "expected comparison operator, got {}",
                other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".to_string())
            )));
        }
    };
    *pos += 1;

    let value = match tokens.get(*pos) {
        Some(Token::Quoted(v)) => v.clone(),
        Some(Token::Word(v)) => v.clone(),
        None => {
            return Err(CatalogError::WhereParse(
                "expected comparison value, got end of input".to_string(),
            ));
        }
        Some(other) => {
            return Err(CatalogError::WhereParse(format!(
                "expected comparison value, got {other}"
            )));
        }
    };
    *pos += 1;

    Ok(WhereTerm { field, op, value })
}

fn parse_field(word: &str) -> CatalogResult<WhereField> {
    if let Some(key) = word.strip_prefix("tag:") {
        if key.is_empty() {
            return Err(CatalogError::WhereParse("empty tag key".to_string()));
        }
        return Ok(WhereField::Tag(key.to_string()));
    }
    match word.to_ascii_lowercase().as_str() {
        "name" => Ok(WhereField::Name),
        "title" => Ok(WhereField::Title),
        "severity" => Ok(WhereField::Severity),
        other => Err(CatalogError::WhereParse(format!(
            "unknown field '{other}' (expected name, title, severity or tag:<key>)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn control() -> ControlDefinition {
        ControlDefinition::new("s3_encrypted", "Buckets encrypted", "select 1")
            .with_severity(Severity::High)
            .with_tag("service", "s3")
            .with_tag("cis_level", "1")
    }

    #[test]
    fn test_where_and_tag_are_exclusive() {
        let result = RunFilter::from_args(Some("severity = 'high'"), &["service=s3".to_string()]);
        assert!(matches!(result, Err(CatalogError::InvalidFilter(_))));
    }

    #[test]
    fn test_tag_filter_matching() {
        let filter = RunFilter::from_args(None, &["service=s3".to_string()]).unwrap();
        assert!(filter.matches(&control()));

        let filter = RunFilter::from_args(None, &["service=ec2".to_string()]).unwrap();
        assert!(!filter.matches(&control()));

        // all listed tags must match
        let filter =
            RunFilter::from_args(None, &["service=s3".to_string(), "cis_level=2".to_string()])
                .unwrap();
        assert!(!filter.matches(&control()));
    }

    #[test]
    fn test_tag_filter_requires_key_value() {
        assert!(TagFilter::parse("no-equals-sign").is_err());
        assert!(TagFilter::parse("=value").is_err());
        assert_eq!(
            TagFilter::parse("service=s3").unwrap(),
            TagFilter {
                key: "service".to_string(),
                value: "s3".to_string()
            }
        );
    }

    #[test]
    fn test_where_single_term() {
        let expr = WhereExpr::parse("severity = 'high'").unwrap();
        assert!(expr.matches(&control()));

        let expr = WhereExpr::parse("severity = 'low'").unwrap();
        assert!(!expr.matches(&control()));
    }

    #[test]
    fn test_where_not_equals_on_absent_severity() {
        let expr = WhereExpr::parse("severity != 'high'").unwrap();
        let no_severity = ControlDefinition::new("c", "C", "select 1");
        // absent severity is not equal to any value
        assert!(expr.matches(&no_severity));
        assert!(!expr.matches(&control()));
    }

    #[test]
    fn test_where_and_binds_tighter_than_or() {
        // parsed as: (severity = 'low') or (severity = 'high' and tag:service = 's3')
        let expr =
            WhereExpr::parse("severity = 'low' or severity = 'high' and tag:service = 's3'")
                .unwrap();
        assert!(expr.matches(&control()));

        let expr =
            WhereExpr::parse("severity = 'low' or severity = 'high' and tag:service = 'ec2'")
                .unwrap();
        assert!(!expr.matches(&control()));
    }

    #[test]
    fn test_where_tag_field() {
        let expr = WhereExpr::parse("tag:cis_level = '1'").unwrap();
        assert!(expr.matches(&control()));

        let expr = WhereExpr::parse("tag:missing = '1'").unwrap();
        assert!(!expr.matches(&control()));
    }

    #[test]
    fn test_where_parse_errors() {
        assert!(WhereExpr::parse("").is_err());
        assert!(WhereExpr::parse("severity >= 'high'").is_err());
        assert!(WhereExpr::parse("severity = 'high").is_err());
        assert!(WhereExpr::parse("rank = 'high'").is_err());
        assert!(WhereExpr::parse("severity = 'high' and").is_err());
    }
}
