use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A validated, fully qualified domain name without the trailing dot.
/// The first label may be a single `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainName(String);

impl DomainName {
    pub fn new(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let normalized = lowered.strip_suffix('.').unwrap_or(&lowered);
        let err = |reason: &str| Err(Error::InvalidDomainName {
            name: name.to_string(),
            reason: reason.to_string(),
        });
        if normalized.is_empty() || normalized.len() > 253 {
            return err("Must be between 1 and 253 characters");
        }
        let labels: Vec<&str> = normalized.split('.').collect();
        if labels.len() < 2 {
            return err("Must be fully qualified, eg: mysite.com");
        }
        for (i, label) in labels.iter().enumerate() {
            if *label == "*" {
                if i != 0 {
                    return err("A wildcard may only be the first label, eg: *.mysite.com");
                }
                continue;
            }
            if label.is_empty() || label.len() > 63 {
                return err("Each label must be between 1 and 63 characters");
            }
            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return err("Labels may only contain letters, numbers, and hyphens");
            }
            if label.starts_with('-') || label.ends_with('-') {
                return err("Labels may not start or end with a hyphen");
            }
        }
        Ok(Self(normalized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// the name with a trailing dot, as route53 reports it.
    pub fn fqdn(&self) -> String {
        format!("{}.", self.0)
    }

    /// `www` -> `www.mysite.com`
    pub fn subdomain(&self, label: &str) -> Result<Self> {
        Self::new(&format!("{label}.{}", self.0))
    }

    /// true if this name is `zone` itself or somewhere below it.
    pub fn is_within(&self, zone: &DomainName) -> bool {
        self.0 == zone.0 || self.0.ends_with(&format!(".{}", zone.0))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DomainName {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
