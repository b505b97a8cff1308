//! Object names of the form `domain:key=value[,key=value]*`, with the
//! `*`/`?` domain wildcards and the trailing `,*` property wildcard used
//! for queries.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{ManagementError, ManagementResult};

lazy_static! {
    /// Keys and values may not contain the name syntax characters
    static ref TOKEN: Regex = Regex::new(r#"^[^:,=*?"\n]+$"#).unwrap();
}

#[derive(Debug, Clone)]
pub struct ObjectName {
    domain: String,
    properties: BTreeMap<String, String>,
    property_pattern: bool,
    canonical: String,
    /// Compiled domain wildcard, present only for domain patterns
    domain_regex: Option<Regex>,
}

impl ObjectName {
    pub fn parse(name: &str) -> ManagementResult<Self> {
        let malformed = |reason: &str| ManagementError::MalformedObjectName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let (domain, property_list) = name
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' between domain and key properties"))?;
        if domain.contains('\n') {
            return Err(malformed("domain contains a newline"));
        }
        if property_list.is_empty() {
            return Err(malformed("empty key property list"));
        }

        let mut properties = BTreeMap::new();
        let mut property_pattern = false;
        for part in property_list.split(',') {
            if part == "*" {
                if property_pattern {
                    return Err(malformed("property wildcard given twice"));
                }
                property_pattern = true;
                continue;
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| malformed("key property without '='"))?;
            if key.is_empty() {
                return Err(malformed("empty key"));
            }
            if !TOKEN.is_match(key) || !TOKEN.is_match(value) {
                return Err(malformed("key or value contains a reserved character"));
            }
            if properties.insert(key.to_string(), value.to_string()).is_some() {
                return Err(malformed("duplicate key"));
            }
        }

        Ok(Self::assemble(domain.to_string(), properties, property_pattern))
    }

    fn assemble(domain: String, properties: BTreeMap<String, String>, property_pattern: bool) -> Self {
        let mut parts: Vec<String> = properties.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        if property_pattern {
            parts.push("*".to_string());
        }
        let canonical = format!("{}:{}", domain, parts.join(","));
        let domain_regex = if domain.contains(['*', '?']) { glob_regex(&domain) } else { None };
        Self {
            domain,
            properties,
            property_pattern,
            canonical,
            domain_regex,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn key_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }

    pub fn is_domain_pattern(&self) -> bool {
        self.domain.contains(['*', '?'])
    }

    pub fn is_property_pattern(&self) -> bool {
        self.property_pattern
    }

    pub fn is_pattern(&self) -> bool {
        self.is_domain_pattern() || self.property_pattern
    }

    /// Same properties under another domain
    pub fn with_domain(&self, domain: impl Into<String>) -> Self {
        Self::assemble(domain.into(), self.properties.clone(), self.property_pattern)
    }

    /// Whether `name` is selected by this name used as a pattern
    pub fn matches(&self, name: &ObjectName) -> bool {
        let domain_matches = if self.is_domain_pattern() {
            self.domain_regex.as_ref().is_some_and(|re| re.is_match(&name.domain))
        } else {
            self.domain == name.domain
        };
        if !domain_matches {
            return false;
        }

        if self.property_pattern {
            self.properties
                .iter()
                .all(|(k, v)| name.properties.get(k) == Some(v))
        } else {
            self.properties == name.properties
        }
    }
}

fn glob_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

impl FromStr for ObjectName {
    type Err = ManagementError;

    fn from_str(s: &str) -> ManagementResult<Self> {
        Self::parse(s)
    }
}

impl PartialEq for ObjectName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ObjectName {}

impl Hash for ObjectName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for ObjectName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Serialize for ObjectName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
