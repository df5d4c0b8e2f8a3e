//! # Path Template Compiler
//!
//! Turns a template such as `/student/{name:str}/grade/{id:int}` into a
//! matcher plus the per-placeholder decoders.
//!
//! Templates without placeholders stay literal and match by string equality.
//! Everything else becomes an anchored regex in which each placeholder is a
//! named group over its type's character class and literal text is escaped.

use crate::error::{Error, Result};
use crate::types::{CapturedVars, ParamType};
use regex::Regex;
use std::sync::OnceLock;

/// `{name}` or `{name:type}`
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    // Constant literal, covered by `test_placeholder_regex_compiles`
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([^{}:]+)(?::([^{}:]*))?\}").expect("placeholder regex is valid")
    })
}

/// Compiled recognizer for one template
#[derive(Debug, Clone)]
pub enum Matcher {
    /// No placeholders: the remainder must equal the template
    Literal(String),
    /// Anchored regex with one named group per placeholder
    Pattern(Regex),
}

impl Matcher {
    /// Whether `path` conforms to the template
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        match self {
            Self::Literal(lit) => lit == path,
            Self::Pattern(re) => re.is_match(path),
        }
    }
}

/// A template compiled once at registration time
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    matcher: Matcher,
    /// Placeholder name and type, in order of appearance
    params: Vec<(String, ParamType)>,
}

impl PathPattern {
    /// Compile a path template
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` when a placeholder name is not an
    /// identifier or appears twice in the same template.
    pub fn compile(template: &str) -> Result<Self> {
        let (matcher, params) = compile(template)?;
        Ok(Self {
            template: template.to_string(),
            matcher,
            params,
        })
    }

    /// The template this pattern was compiled from
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled matcher
    #[must_use]
    pub const fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Placeholders in order of appearance
    #[must_use]
    pub fn params(&self) -> &[(String, ParamType)] {
        &self.params
    }

    /// Declared type of a placeholder
    #[must_use]
    pub fn param_type(&self, name: &str) -> Option<ParamType> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    /// Match `path` and decode every capture
    ///
    /// Returns `Ok(None)` when the path does not conform to the template.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if a capture matched its class but cannot be
    /// converted (for instance an `int` that overflows `i64`).
    pub fn captures(&self, path: &str) -> Result<Option<CapturedVars>> {
        match &self.matcher {
            Matcher::Literal(lit) => Ok((lit == path).then(CapturedVars::new)),
            Matcher::Pattern(re) => {
                let Some(caps) = re.captures(path) else {
                    return Ok(None);
                };
                self.params
                    .iter()
                    .filter_map(|(name, ty)| {
                        caps.name(name)
                            .map(|m| ty.decode(name, m.as_str()).map(|v| (name.clone(), v)))
                    })
                    .collect::<Result<CapturedVars>>()
                    .map(Some)
            }
        }
    }
}

/// Compile a template into its matcher and ordered decoder list
///
/// # Errors
///
/// See [`PathPattern::compile`].
pub fn compile(template: &str) -> Result<(Matcher, Vec<(String, ParamType)>)> {
    let mut params: Vec<(String, ParamType)> = Vec::new();
    let mut source = String::with_capacity(template.len() + 16);
    source.push('^');
    let mut start = 0;

    for caps in placeholder_regex().captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let name = caps.get(1).map_or("", |m| m.as_str().trim());
        let ty = caps
            .get(2)
            .map_or(ParamType::Word, |m| ParamType::from_specifier(m.as_str().trim()));

        if !is_identifier(name) {
            return Err(invalid(template, format!("placeholder name '{name}' is not an identifier")));
        }
        if params.iter().any(|(n, _)| n == name) {
            return Err(invalid(template, format!("duplicate placeholder '{name}'")));
        }

        source.push_str(&regex::escape(&template[start..whole.start()]));
        source.push_str("(?P<");
        source.push_str(name);
        source.push('>');
        source.push_str(ty.class());
        source.push(')');
        params.push((name.to_string(), ty));
        start = whole.end();
    }

    if params.is_empty() {
        return Ok((Matcher::Literal(template.to_string()), params));
    }

    source.push_str(&regex::escape(&template[start..]));
    source.push('$');
    let re = Regex::new(&source).map_err(|e| invalid(template, e.to_string()))?;
    Ok((Matcher::Pattern(re), params))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(template: &str, reason: String) -> Error {
    Error::InvalidRoutePattern {
        pattern: template.to_string(),
        reason,
    }
}
