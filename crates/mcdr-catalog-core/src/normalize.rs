// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tolerant wire shapes for author and description fields.
//!
//! Plugin authors publish these fields as a bare string, a single object, or a
//! list/mapping. Each shape is accepted here and collapsed into the canonical
//! [`Author`] list or [`LocalizedText`] pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{Author, Description, LocalizedText};

/// Profile link prefix used for bare author names.
pub const GITHUB_PROFILE_BASE: &str = "https://github.com/";

const EN_US_KEYS: &[&str] = &["en_us", "en-us", "en"];
const ZH_CN_KEYS: &[&str] = &["zh_cn", "zh-cn", "zh"];

/// Any of the author shapes seen in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AuthorField {
    /// `"Fallen_Breath"`
    Name(String),
    /// `["a", {"name": "b"}]`
    List(Vec<AuthorField>),
    /// `{"name": "a", "link": "https://..."}`
    Entry(AuthorEntry),
    /// `{"a": "https://...", "b": null}`
    Mapping(BTreeMap<String, Value>),
    /// Anything else (numbers, booleans); normalizes to nothing.
    Other(Value),
}

/// A single author object.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorEntry {
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl AuthorField {
    /// Flattens the field into canonical authors, dropping blank names.
    pub fn into_authors(self) -> Vec<Author> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(self, out: &mut Vec<Author>) {
        match self {
            AuthorField::Name(name) => {
                if let Some(author) = Author::from_bare_name(&name) {
                    out.push(author);
                }
            }
            AuthorField::List(items) => {
                for item in items {
                    item.collect_into(out);
                }
            }
            AuthorField::Entry(entry) => {
                let name = entry.name.trim();
                if !name.is_empty() {
                    out.push(Author {
                        name: name.to_string(),
                        link: entry.link.filter(|l| !l.trim().is_empty()),
                    });
                }
            }
            AuthorField::Mapping(map) => {
                for (name, link) in map {
                    match link {
                        Value::String(link) if !link.trim().is_empty() => {
                            let name = name.trim();
                            if !name.is_empty() {
                                out.push(Author {
                                    name: name.to_string(),
                                    link: Some(link),
                                });
                            }
                        }
                        _ => {
                            if let Some(author) = Author::from_bare_name(&name) {
                                out.push(author);
                            }
                        }
                    }
                }
            }
            AuthorField::Other(_) => {}
        }
    }
}

/// Any of the description shapes seen in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DescriptionField {
    /// A single string, used for both locales.
    Text(String),
    /// A list of descriptions; earlier entries win per locale.
    List(Vec<DescriptionField>),
    /// `{"en_us": "...", "zh_cn": "..."}`
    Localized(BTreeMap<String, Value>),
    /// Anything else; normalizes to nothing.
    Other(Value),
}

impl DescriptionField {
    /// Collapses the field into per-locale optional strings.
    pub fn into_localized(self) -> LocalizedText {
        match self {
            DescriptionField::Text(text) => {
                let text = non_blank(text);
                LocalizedText {
                    en_us: text.clone(),
                    zh_cn: text,
                }
            }
            DescriptionField::List(items) => {
                items
                    .into_iter()
                    .map(DescriptionField::into_localized)
                    .fold(LocalizedText::default(), |acc, next| LocalizedText {
                        en_us: acc.en_us.or(next.en_us),
                        zh_cn: acc.zh_cn.or(next.zh_cn),
                    })
            }
            DescriptionField::Localized(map) => LocalizedText {
                en_us: pick_locale(&map, EN_US_KEYS),
                zh_cn: pick_locale(&map, ZH_CN_KEYS),
            },
            DescriptionField::Other(_) => LocalizedText::default(),
        }
    }
}

fn pick_locale(map: &BTreeMap<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_str())
            .and_then(|s| non_blank(s.to_string()))
    })
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Returns true when the string is already a link rather than a handle.
pub fn looks_like_url(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Deserializes an optional author field of any shape.
pub fn authors_opt<'de, D>(deserializer: D) -> Result<Option<Vec<Author>>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<AuthorField>::deserialize(deserializer)?;
    Ok(field.map(AuthorField::into_authors))
}

/// Deserializes an author field of any shape, treating null as empty.
pub fn authors_lenient<'de, D>(deserializer: D) -> Result<Vec<Author>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(authors_opt(deserializer)?.unwrap_or_default())
}

/// Deserializes an optional description field of any shape.
pub fn description_opt<'de, D>(deserializer: D) -> Result<LocalizedText, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<DescriptionField>::deserialize(deserializer)?;
    Ok(field
        .map(DescriptionField::into_localized)
        .unwrap_or_default())
}

/// Deserializes a persisted description, filling absent locales with "".
pub fn description_lenient<'de, D>(deserializer: D) -> Result<Description, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(description_opt(deserializer)?.into_description())
}

/// Deserializes `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a dependency map whose constraints may be strings, numbers, or lists.
pub fn dependencies_opt<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = raw else {
        return Ok(None);
    };
    let deps = map
        .into_iter()
        .map(|(name, constraint)| {
            let constraint = match constraint {
                Value::String(s) => s,
                Value::Null => "*".to_string(),
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };
            (name, constraint)
        })
        .collect();
    Ok(Some(deps))
}
