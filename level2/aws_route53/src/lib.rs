//! Hosted zone lookups and alias records.

use aws_cfn_stack::Resource;
use infra_lib::{
    get_att,
    naming::verify_resource_name,
    types::route53::{AliasTarget, CfnRecordSet, RecordType, CLOUDFRONT_HOSTED_ZONE_ID},
    DomainName, Error, Result,
};

mod zone;
pub use zone::*;

#[cfg(feature = "aws")]
pub mod lookup;

const CONSTRUCT: &str = "aws_route53";

/// An alias record inside an existing hosted zone.
pub struct Input {
    pub logical_id: String,
    pub zone: HostedZone,
    /// None means the zone apex. Otherwise either a label relative
    /// to the zone (`www`), or a name that already ends with the zone name.
    pub record_name: Option<String>,
    pub target: AliasTarget,
    pub record_type: RecordType,
}

/// routes a name to a cloudfront distribution in this stack.
pub fn cloudfront_alias_target(distribution_logical_id: &str) -> AliasTarget {
    AliasTarget {
        dns_name: get_att(distribution_logical_id, "DomainName").into(),
        hosted_zone_id: CLOUDFRONT_HOSTED_ZONE_ID.to_string(),
        evaluate_target_health: None,
    }
}

/// resolves the record name against the zone, the same way route53 does
/// in its console: relative names get the zone appended.
pub fn fully_qualified_record_name(record_name: Option<&str>, zone: &DomainName) -> Result<DomainName> {
    let name = match record_name {
        None => return Ok(zone.clone()),
        Some(n) if n.ends_with('.') => DomainName::new(n)?,
        Some(n) => {
            let candidate = DomainName::new(n);
            match candidate {
                Ok(d) if d.is_within(zone) => d,
                _ => DomainName::new(&format!("{n}.{zone}"))?,
            }
        }
    };
    if !name.is_within(zone) {
        return Err(Error::construct(CONSTRUCT, format!("Record {name} is not inside the hosted zone {zone}")));
    }
    Ok(name)
}

pub fn config(input: &Input, stackinp: &mut aws_cfn_stack::Input) -> Result<String> {
    verify_resource_name(&input.logical_id)?;
    let name = fully_qualified_record_name(input.record_name.as_deref(), &input.zone.name)?;
    let record = CfnRecordSet {
        alias_target: Some(input.target.clone()),
        hosted_zone_id: Some(input.zone.id.clone().into()),
        name: name.fqdn(),
        record_type: input.record_type,
        ..Default::default()
    };
    tracing::debug!(record = %input.logical_id, name = %name, "alias record");
    stackinp.push(Resource::new(&input.logical_id, record));
    Ok(input.logical_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_cfn_stack::Environment;
    use infra_lib::types::cloud_front::{CfnDistribution, DefaultCacheBehavior, DistributionConfig, Origin};
    use serde_json::json;

    fn zone() -> HostedZone {
        HostedZone::new("Z0ABC", "moltabakery.com").unwrap()
    }

    fn zone_name() -> DomainName {
        zone().name
    }

    #[test]
    fn record_names_resolve_against_the_zone() {
        let z = zone_name();
        assert_eq!(fully_qualified_record_name(None, &z).unwrap().fqdn(), "moltabakery.com.");
        assert_eq!(fully_qualified_record_name(Some("www"), &z).unwrap().fqdn(), "www.moltabakery.com.");
        assert_eq!(fully_qualified_record_name(Some("www.moltabakery.com"), &z).unwrap().fqdn(), "www.moltabakery.com.");
        assert_eq!(fully_qualified_record_name(Some("www.moltabakery.com."), &z).unwrap().fqdn(), "www.moltabakery.com.");
        assert!(fully_qualified_record_name(Some("www.example.com."), &z).is_err());
    }

    #[test]
    fn alias_record_points_at_distribution() {
        let mut stackinp = aws_cfn_stack::Input::new("stack", Environment::new("120086452202", "us-east-1").unwrap());
        stackinp.push(Resource::new("Dist", CfnDistribution {
            distribution_config: DistributionConfig {
                enabled: true,
                origins: vec![Origin { id: "o".into(), domain_name: "example.com".into(), ..Default::default() }],
                default_cache_behavior: DefaultCacheBehavior { target_origin_id: "o".into(), ..Default::default() },
                ..Default::default()
            },
        }));
        for (id, name) in [("Root", None), ("Www", Some("www".to_string()))] {
            config(&Input {
                logical_id: id.into(),
                zone: zone(),
                record_name: name,
                target: cloudfront_alias_target("Dist"),
                record_type: RecordType::A,
            }, &mut stackinp).unwrap();
        }
        let template = stackinp.synth().unwrap().template;
        assert_eq!(template.resources["Root"].properties, json!({
            "AliasTarget": {
                "DNSName": { "Fn::GetAtt": ["Dist", "DomainName"] },
                "HostedZoneId": "Z2FDTNDATAQYW2",
            },
            "HostedZoneId": "Z0ABC",
            "Name": "moltabakery.com.",
            "Type": "A",
        }));
        assert_eq!(template.resources["Www"].properties["Name"], "www.moltabakery.com.");
    }
}
