//! Route 53 queries used to fill the context file.

use infra_lib::{DomainName, Error, Result};

use crate::HostedZone;

pub async fn make_client(region: &str) -> aws_sdk_route53::Client {
    let region = aws_types::region::Region::new(region.to_string());
    let shared_config = aws_config::from_env().region(region).load().await;
    aws_sdk_route53::Client::new(&shared_config)
}

/// the public hosted zone named exactly `domain`.
/// private zones with the same name are skipped.
pub async fn find_public_zone(client: &aws_sdk_route53::Client, domain: &DomainName) -> Result<HostedZone> {
    let fqdn = domain.fqdn();
    let resp = client.list_hosted_zones_by_name()
        .dns_name(&fqdn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("{:#?}", e)))?;
    for zone in resp.hosted_zones().unwrap_or_default() {
        let (Some(id), Some(name)) = (zone.id(), zone.name()) else {
            continue;
        };
        let is_private = zone.config().map_or(false, |c| c.private_zone());
        if name != fqdn || is_private {
            continue;
        }
        tracing::info!(domain = %domain, zone = %id, "found hosted zone");
        return HostedZone::new(id, name);
    }
    Err(Error::HostedZoneNotFound { domain: domain.to_string() })
}
