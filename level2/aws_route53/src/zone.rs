use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use infra_lib::{DomainName, Error, Result};
use serde::{Deserialize, Serialize};

pub const CONTEXT_FILE: &str = "molta.context.json";

/// An existing public hosted zone. Never created or deleted by a stack,
/// only looked up and referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// without the `/hostedzone/` prefix
    pub id: String,
    pub name: DomainName,
}

impl HostedZone {
    pub fn new(id: &str, name: &str) -> Result<Self> {
        let id = id.strip_prefix("/hostedzone/").unwrap_or(id);
        if id.is_empty() {
            return Err(Error::construct("aws_route53", format!("Hosted zone for {name} has an empty id")));
        }
        Ok(Self { id: id.to_string(), name: DomainName::new(name)? })
    }
}

/// Finds the hosted zone for a domain. Synthesis only ever goes through
/// this trait, so it never needs network access.
pub trait HostedZoneLookup {
    fn find_zone(&self, account: &str, region: &str, domain: &DomainName) -> Result<HostedZone>;
}

/// zones known up front. Useful in tests, or when the zone id is configured by hand.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup(pub Vec<HostedZone>);

impl HostedZoneLookup for StaticLookup {
    fn find_zone(&self, _account: &str, _region: &str, domain: &DomainName) -> Result<HostedZone> {
        self.0.iter()
            .find(|z| &z.name == domain)
            .cloned()
            .ok_or_else(|| Error::HostedZoneNotFound { domain: domain.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneEntry {
    id: String,
    name: String,
}

/// Cached environment lookups, keyed the same way for every synth so
/// the output is reproducible without talking to AWS.
#[derive(Debug, Clone, Default)]
pub struct ContextFile {
    path: PathBuf,
    entries: BTreeMap<String, serde_json::Value>,
}

pub fn zone_context_key(account: &str, region: &str, domain: &DomainName) -> String {
    format!("hosted-zone:account={account}:domainName={domain}:region={region}")
}

impl ContextFile {
    /// a missing file is an empty context
    pub fn load(path: &Path) -> Result<Self> {
        let entries = match std::fs::read_to_string(path) {
            Ok(body) => serde_json::from_str(&body)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded context");
        Ok(Self { path: path.to_path_buf(), entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert_zone(&mut self, account: &str, region: &str, zone: &HostedZone) -> Result<()> {
        let entry = ZoneEntry { id: zone.id.clone(), name: zone.name.fqdn() };
        let key = zone_context_key(account, region, &zone.name);
        self.entries.insert(key, serde_json::to_value(entry)?);
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let mut body = serde_json::to_string_pretty(&self.entries)?;
        body.push('\n');
        std::fs::write(&self.path, body)?;
        tracing::info!(path = %self.path.display(), "saved context");
        Ok(())
    }
}

impl HostedZoneLookup for ContextFile {
    fn find_zone(&self, account: &str, region: &str, domain: &DomainName) -> Result<HostedZone> {
        let key = zone_context_key(account, region, domain);
        let value = self.entries.get(&key)
            .ok_or_else(|| Error::HostedZoneNotFound { domain: domain.to_string() })?;
        let entry: ZoneEntry = serde_json::from_value(value.clone())?;
        HostedZone::new(&entry.id, &entry.name)
    }
}
