use serde::{Deserialize, Serialize};

use crate::{cfn_resource, StrVal};

/// every alias that points at a cloudfront distribution uses this hosted zone id.
/// https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-properties-route53-aliastarget.html#cfn-route53-aliastarget-hostedzoneid
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    #[default]
    A,
    AAAA,
    CNAME,
    TXT,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTarget {
    #[serde(rename = "DNSName")]
    pub dns_name: StrVal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluate_target_health: Option<bool>,
    pub hosted_zone_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRecordSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<StrVal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_name: Option<String>,
    /// fully qualified, with the trailing dot
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_records: Vec<String>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
}

fn validate_record_set(record: &CfnRecordSet) -> Result<(), String> {
    match (&record.hosted_zone_id, &record.hosted_zone_name) {
        (Some(_), Some(_)) => return Err("Specify either HostedZoneId or HostedZoneName, not both".into()),
        (None, None) => return Err("Must specify HostedZoneId or HostedZoneName".into()),
        _ => {}
    }
    if !record.name.ends_with('.') {
        return Err(format!("Record name {} must be fully qualified and end with '.'", record.name));
    }
    match &record.alias_target {
        Some(_) => {
            if !record.resource_records.is_empty() {
                return Err("Alias records cannot also have resource records".into());
            }
            if record.ttl.is_some() {
                return Err("Alias records cannot have a TTL".into());
            }
        }
        None => {
            if record.resource_records.is_empty() {
                return Err("Must provide either an alias target or resource records".into());
            }
        }
    }
    Ok(())
}

cfn_resource!(CfnRecordSet, "AWS::Route53::RecordSet", validate_record_set);
