//! # Link Resolver
//!
//! Expands the URI templates that LSD servers publish on interaction links,
//! e.g. `https://lsd.example.com/licenses/42/register{?id,name}`.
//!
//! Only the query-expansion operators are understood (`{?...}` and the
//! continuation form `{&...}`), and only the variable names the protocol
//! defines: `id`, `name` and `end`. Unknown names are dropped. Variables
//! without a value are omitted entirely, and when nothing is emitted the
//! whole block collapses to the empty string.
//!
//! Values are inserted verbatim. Callers percent-encode them first (the
//! `end` date in particular carries `:` and `+`).

use crate::error::TemplateError;

/// Values available for template expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateParams<'a> {
    /// Device identifier (`id`).
    pub id: Option<&'a str>,
    /// Human-readable device name (`name`).
    pub name: Option<&'a str>,
    /// Requested license end date (`end`), already percent-encoded.
    pub end: Option<&'a str>,
}

impl<'a> TemplateParams<'a> {
    /// Parameters identifying a device.
    pub fn device(id: &'a str, name: &'a str) -> Self {
        Self {
            id: Some(id),
            name: Some(name),
            end: None,
        }
    }

    /// Add an encoded end date.
    pub fn with_end(mut self, end: &'a str) -> Self {
        self.end = Some(end);
        self
    }

    fn lookup(&self, var: &str) -> Option<&'a str> {
        match var {
            "id" => self.id,
            "name" => self.name,
            "end" => self.end,
            _ => None,
        }
    }
}

/// Whether `href` carries an expansion block at all.
pub fn is_templated(href: &str) -> bool {
    find_block(href).is_some()
}

/// Expand the first `{?...}` block of `template`.
///
/// ```
/// use lsd_core::template::{expand, TemplateParams};
///
/// let params = TemplateParams { id: Some("d1"), ..Default::default() };
/// assert_eq!(expand("http://h/p{?id,name}", &params).unwrap(), "http://h/p?id=d1");
/// ```
///
/// # Errors
///
/// Returns [`TemplateError::MalformedTemplate`] if no `{...}` block is
/// found, or the block does not use a query operator.
pub fn expand(template: &str, params: &TemplateParams<'_>) -> Result<String, TemplateError> {
    let malformed = || TemplateError::MalformedTemplate {
        template: template.to_string(),
    };

    let (open, close) = find_block(template).ok_or_else(malformed)?;
    let body = &template[open + 1..close];

    let (prefix, vars) = match body.chars().next() {
        Some(op @ ('?' | '&')) => (op, &body[1..]),
        _ => return Err(malformed()),
    };

    let pairs: Vec<String> = vars
        .split(',')
        .map(str::trim)
        .filter_map(|var| params.lookup(var).map(|value| format!("{var}={value}")))
        .collect();

    let expansion = if pairs.is_empty() {
        String::new()
    } else {
        format!("{prefix}{}", pairs.join("&"))
    };

    let mut out = String::with_capacity(template.len() + expansion.len());
    out.push_str(&template[..open]);
    out.push_str(&expansion);
    out.push_str(&template[close + 1..]);
    Ok(out)
}

/// Byte offsets of the first `{` and the first `}` after it.
fn find_block(s: &str) -> Option<(usize, usize)> {
    let open = s.find('{')?;
    let close = s[open..].find('}')? + open;
    Some((open, close))
}
