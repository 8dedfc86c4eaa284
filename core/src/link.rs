//! Hyperlinks found under a resource's `_links`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed reference to another resource, not yet fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    href: String,
    #[serde(default)]
    templated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deprecation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hreflang: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: false,
            name: None,
            title: None,
            media_type: None,
            deprecation: None,
            profile: None,
            hreflang: None,
        }
    }

    /// Decode one link object. Fails on non-objects, a missing `href`, or
    /// attributes of the wrong JSON type.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Link::deserialize(value)
    }

    /// The raw target, possibly an unexpanded URI template.
    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn templated(&self) -> bool {
        self.templated
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The `type` attribute: a hint of the target's media type.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecation.as_deref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn hreflang(&self) -> Option<&str> {
        self.hreflang.as_deref()
    }

    /// Target URI with template variables substituted.
    ///
    /// Non-templated links return `href` untouched. Templated links are
    /// expanded per RFC 6570 level 4: every operator (`+ # . / ; ? &`) and
    /// the prefix (`:N`) and explode (`*`) modifiers. Values are strings, so
    /// explode behaves like a plain variable. Undefined variables expand to
    /// nothing; an expression that does not parse is copied literally.
    pub fn expand(&self, variables: &BTreeMap<String, String>) -> String {
        if !self.templated {
            return self.href.clone();
        }
        let mut out = String::with_capacity(self.href.len());
        let mut rest = self.href.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let Some(len) = rest[start..].find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let end = start + len;
            if !expand_expression(&rest[start + 1..end], variables, &mut out) {
                out.push_str(&rest[start..=end]);
            }
            rest = &rest[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// How one expression operator joins and encodes its variables.
struct Operator {
    first: &'static str,
    sep: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

impl Operator {
    /// Split the operator off `expr`. `None` for an empty expression or one of
    /// the operators RFC 6570 reserves for future use.
    fn parse(expr: &str) -> Option<(Self, &str)> {
        let operator = match expr.as_bytes().first()? {
            b'+' => Operator::new("", ",", false, "", true),
            b'#' => Operator::new("#", ",", false, "", true),
            b'.' => Operator::new(".", ".", false, "", false),
            b'/' => Operator::new("/", "/", false, "", false),
            b';' => Operator::new(";", ";", true, "", false),
            b'?' => Operator::new("?", "&", true, "=", false),
            b'&' => Operator::new("&", "&", true, "=", false),
            b'=' | b',' | b'!' | b'@' | b'|' => return None,
            _ => return Some((Operator::new("", ",", false, "", false), expr)),
        };
        Some((operator, &expr[1..]))
    }

    const fn new(
        first: &'static str,
        sep: &'static str,
        named: bool,
        if_empty: &'static str,
        allow_reserved: bool,
    ) -> Self {
        Self {
            first,
            sep,
            named,
            if_empty,
            allow_reserved,
        }
    }
}

/// Variable name and optional prefix length of one varspec.
fn parse_varspec(spec: &str) -> Option<(&str, Option<usize>)> {
    let spec = spec.trim();
    let (name, prefix) = if let Some(name) = spec.strip_suffix('*') {
        (name, None)
    } else if let Some((name, len)) = spec.split_once(':') {
        let len = len.parse::<usize>().ok().filter(|len| (1..10_000).contains(len))?;
        (name, Some(len))
    } else {
        (spec, None)
    };
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'%'));
    valid.then_some((name, prefix))
}

/// Write the expansion of `expr` to `out`. Returns `false`, writing
/// nothing, when the expression is malformed.
fn expand_expression(expr: &str, variables: &BTreeMap<String, String>, out: &mut String) -> bool {
    let Some((operator, list)) = Operator::parse(expr) else {
        return false;
    };
    let Some(specs) = list.split(',').map(parse_varspec).collect::<Option<Vec<_>>>() else {
        return false;
    };

    let mut first = true;
    for (name, prefix) in specs {
        let Some(value) = variables.get(name) else {
            continue;
        };
        out.push_str(if first { operator.first } else { operator.sep });
        first = false;

        let value = match prefix {
            Some(len) => value.char_indices().nth(len).map_or(value.as_str(), |(i, _)| &value[..i]),
            None => value.as_str(),
        };
        if operator.named {
            out.push_str(name);
            if value.is_empty() {
                out.push_str(operator.if_empty);
                continue;
            }
            out.push('=');
        }
        encode_into(out, value, operator.allow_reserved);
    }
    true
}

const RESERVED: &[u8] = b":/?#[]@!$&'()*+,;=";

/// Percent-encode everything outside the unreserved set, and outside the
/// reserved set too unless `allow_reserved`. With `allow_reserved`, existing
/// `%XX` triplets pass through.
fn encode_into(out: &mut String, value: &str, allow_reserved: bool) {
    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        let unreserved = b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~');
        let reserved = allow_reserved
            && (RESERVED.contains(&b)
                || (b == b'%'
                    && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)));
        if unreserved || reserved {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
}
