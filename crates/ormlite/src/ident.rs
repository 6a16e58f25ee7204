//! Validated SQL identifiers for table and column names.
//!
//! Table and column names are interpolated into statement text (they cannot be
//! bound as parameters), so every name in a [`Mapping`](crate::Mapping) goes
//! through [`Ident::parse`] first.
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts (`"Name"`) allow anything except NUL; `"` is escaped as `""`
//! - Parts are joined with `.` (`schema.table`)

use crate::error::{OrmError, OrmResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Part {
    Plain(String),
    Quoted(String),
}

impl Part {
    fn name(&self) -> &str {
        match self {
            Part::Plain(s) | Part::Quoted(s) => s,
        }
    }
}

/// A table or column name that is safe to splice into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<Part>,
    rendered: String,
}

impl Ident {
    /// Parse an identifier such as `users`, `app.users` or `"Order Items"`.
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OrmError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut rest = s;
        loop {
            let (part, tail) = parse_part(rest, s)?;
            parts.push(part);
            match tail.strip_prefix('.') {
                Some("") => {
                    return Err(OrmError::validation(format!(
                        "Trailing '.' in identifier '{s}'"
                    )));
                }
                Some(next) => rest = next,
                None if tail.is_empty() => break,
                None => {
                    return Err(OrmError::validation(format!(
                        "Unexpected text after quoted part in identifier '{s}'"
                    )));
                }
            }
        }

        let rendered = render(&parts);
        Ok(Self { parts, rendered })
    }

    /// Create a single-part quoted identifier from a raw name.
    pub fn quoted(name: &str) -> OrmResult<Self> {
        if name.is_empty() {
            return Err(OrmError::validation("Empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(OrmError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        let parts = vec![Part::Quoted(name.to_string())];
        let rendered = render(&parts);
        Ok(Self { parts, rendered })
    }

    /// The identifier as it appears in SQL text.
    pub fn as_sql(&self) -> &str {
        &self.rendered
    }

    /// The unescaped last part, i.e. the name a result column comes back as.
    pub fn name(&self) -> &str {
        self.parts.last().map(Part::name).unwrap_or_default()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

fn parse_part<'a>(input: &'a str, whole: &str) -> OrmResult<(Part, &'a str)> {
    if let Some(body) = input.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = body.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '"' {
                name.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '"'))) {
                chars.next();
                name.push('"');
                continue;
            }
            if name.is_empty() {
                return Err(OrmError::validation("Empty quoted identifier"));
            }
            return Ok((Part::Quoted(name), &body[i + 1..]));
        }
        return Err(OrmError::validation(format!(
            "Unclosed quoted identifier '{whole}'"
        )));
    }

    let end = input.find('.').unwrap_or(input.len());
    let segment = &input[..end];
    if segment.is_empty() {
        return Err(OrmError::validation(format!(
            "Empty identifier segment in '{whole}'"
        )));
    }
    let mut chars = segment.chars();
    let first = chars.next().unwrap_or_default();
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(OrmError::validation(format!(
            "Invalid identifier start character '{first}' in '{whole}'"
        )));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(OrmError::validation(format!(
            "Invalid character '{bad}' in identifier '{whole}'"
        )));
    }
    Ok((Part::Plain(segment.to_string()), &input[end..]))
}

fn render(parts: &[Part]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match part {
            Part::Plain(s) => out.push_str(s),
            Part::Quoted(s) => {
                out.push('"');
                out.push_str(&s.replace('"', "\"\""));
                out.push('"');
            }
        }
    }
    out
}

/// Check that `name` can be used as a record field name.
///
/// Field names double as named-parameter names (`:field`) in finder queries,
/// so they follow the unquoted identifier rule without `$`.
pub fn validate_field_name(name: &str) -> OrmResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first == '_' || first.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(OrmError::validation(format!("Invalid field name '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_dotted() {
        assert_eq!(Ident::parse("users").unwrap().as_sql(), "users");
        let dotted = Ident::parse("app.users").unwrap();
        assert_eq!(dotted.as_sql(), "app.users");
        assert_eq!(dotted.name(), "users");
    }

    #[test]
    fn quoted_parts_keep_escapes() {
        let ident = Ident::parse(r#"app."Order ""Items""""#).unwrap();
        assert_eq!(ident.as_sql(), r#"app."Order ""Items""""#);
        assert_eq!(ident.name(), r#"Order "Items""#);

        let q = Ident::quoted("weird name").unwrap();
        assert_eq!(q.to_string(), "\"weird name\"");
    }

    #[test]
    fn rejects_injection_attempts() {
        assert!(Ident::parse("users; DROP TABLE users").is_err());
        assert!(Ident::parse("name--").is_err());
        assert!(Ident::parse("a b").is_err());
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "1col", "a..b", "a.", r#""open"#, r#""""#, r#""x"y"#] {
            assert!(Ident::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn field_names() {
        assert!(validate_field_name("user_id").is_ok());
        assert!(validate_field_name("_hidden2").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("a$b").is_err());
        assert!(validate_field_name("9lives").is_err());
    }
}
