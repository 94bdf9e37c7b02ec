use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::element::Element;

// `[id*=menu]`, `[class*="comment"]`
static SUBSTRING_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[\s*(id|class)\s*\*=\s*["']?([^"'\]\s]+)["']?\s*\]"#)
        .expect("Failed to compile attribute selector pattern - this is a bug")
});

static IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+").expect("Failed to compile identifier pattern - this is a bug")
});

/// Typed predicate over an [`Element`], parsed from a small CSS subset.
///
/// Each form keeps the semantics of the CSS it came from: `#x` is exact id
/// equality and `.x` is class-token membership, while `[id*=x]` and
/// `[class*=x]` are substring tests on the raw attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContainerSelector {
    Tag(String),
    IdEquals(String),
    HasClass(String),
    IdContains(String),
    ClassContains(String),
    AllOf(Vec<ContainerSelector>),
}

impl ContainerSelector {
    pub fn matches<E: Element>(&self, element: &E) -> bool {
        match self {
            Self::Tag(name) => element.is_tag(name),
            Self::IdEquals(id) => element.id() == Some(id.as_str()),
            Self::HasClass(class) => element.has_class(class),
            Self::IdContains(needle) => element.id().is_some_and(|id| id.contains(needle.as_str())),
            Self::ClassContains(needle) => element
                .class_attr()
                .is_some_and(|classes| classes.contains(needle.as_str())),
            Self::AllOf(parts) => parts.iter().all(|part| part.matches(element)),
        }
    }
}

impl FromStr for ContainerSelector {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut rest = input.trim();
        if rest.is_empty() {
            bail!("empty selector");
        }

        let mut parts = Vec::new();

        if let Some(m) = IDENT.find(rest) {
            parts.push(Self::Tag(m.as_str().to_ascii_lowercase()));
            rest = &rest[m.end()..];
        }

        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('#') {
                let m = IDENT.find(tail).with_context(|| format!("missing id in {}", input))?;
                parts.push(Self::IdEquals(m.as_str().to_string()));
                rest = &tail[m.end()..];
            } else if let Some(tail) = rest.strip_prefix('.') {
                let m = IDENT.find(tail).with_context(|| format!("missing class in {}", input))?;
                parts.push(Self::HasClass(m.as_str().to_string()));
                rest = &tail[m.end()..];
            } else if let Some(caps) = SUBSTRING_ATTR.captures(rest) {
                let value = caps[2].to_string();
                parts.push(match &caps[1] {
                    "id" => Self::IdContains(value),
                    _ => Self::ClassContains(value),
                });
                rest = &rest[caps[0].len()..];
            } else {
                bail!("unsupported selector syntax at '{}' in {}", rest, input);
            }
        }

        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Self::AllOf(parts)
        })
    }
}

impl fmt::Display for ContainerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "{}", name),
            Self::IdEquals(id) => write!(f, "#{}", id),
            Self::HasClass(class) => write!(f, ".{}", class),
            Self::IdContains(needle) => write!(f, "[id*={}]", needle),
            Self::ClassContains(needle) => write!(f, "[class*={}]", needle),
            Self::AllOf(parts) => parts.iter().try_for_each(|part| write!(f, "{}", part)),
        }
    }
}

impl TryFrom<String> for ContainerSelector {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ContainerSelector> for String {
    fn from(selector: ContainerSelector) -> Self {
        selector.to_string()
    }
}
