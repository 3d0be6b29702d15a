//! The assertions a synthesized site template has to pass before it is
//! worth deploying.

use std::fmt;

use infra_lib::{
    assertions::{AssertionError, Match, Template},
    get_att, get_ref, DomainName,
};
use serde_json::json;

use crate::stack::{logical_ids, INDEX_DOCUMENT, SUBDOMAIN};

pub const BUCKET_TYPE: &str = "AWS::S3::Bucket";
pub const BUCKET_POLICY_TYPE: &str = "AWS::S3::BucketPolicy";
pub const DISTRIBUTION_TYPE: &str = "AWS::CloudFront::Distribution";
pub const CERTIFICATE_TYPE: &str = "AWS::CertificateManager::Certificate";
pub const RECORD_SET_TYPE: &str = "AWS::Route53::RecordSet";

/// the outcome of one named assertion
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: &'static str,
    pub outcome: Result<(), AssertionError>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(()) => write!(f, "PASS {}", self.name),
            Err(e) => write!(f, "FAIL {}\n  {}", self.name, e.to_string().replace('\n', "\n  ")),
        }
    }
}

pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(CheckResult::passed)
}

/// runs every site assertion. They are independent: one failing
/// does not stop or change the others.
pub fn check_site_template(template: &Template, domain: &DomainName) -> Vec<CheckResult> {
    let www = format!("{SUBDOMAIN}.{domain}");
    let checks: Vec<(&'static str, Box<dyn Fn() -> Result<(), AssertionError> + '_>)> = vec![
        ("origin bucket", Box::new(|| check_bucket(template, domain))),
        ("bucket is publicly readable", Box::new(|| check_bucket_policy(template))),
        ("bucket is emptied on teardown", Box::new(|| check_bucket_teardown(template))),
        ("single distribution", Box::new(|| check_distribution(template, domain, &www))),
        ("single certificate", Box::new(|| check_certificate(template, domain, &www))),
        ("alias records", Box::new(|| check_alias_records(template, domain, &www))),
        ("stack outputs", Box::new(|| check_outputs(template))),
    ];
    checks.into_iter()
        .map(|(name, check)| {
            let outcome = check();
            match &outcome {
                Ok(()) => tracing::debug!(check = name, "passed"),
                Err(e) => tracing::debug!(check = name, error = %e, "failed"),
            }
            CheckResult { name, outcome }
        })
        .collect()
}

fn check_bucket(template: &Template, domain: &DomainName) -> Result<(), AssertionError> {
    template.resource_count_is(BUCKET_TYPE, 1)?;
    template.has_resource_properties(BUCKET_TYPE, Match::object_like([
        ("BucketName", Match::from(domain.as_str())),
        ("PublicAccessBlockConfiguration", Match::exact(json!({
            "BlockPublicAcls": false,
            "BlockPublicPolicy": false,
            "IgnorePublicAcls": false,
            "RestrictPublicBuckets": false,
        }))),
        ("WebsiteConfiguration", Match::from(json!({ "IndexDocument": INDEX_DOCUMENT }))),
    ]))
}

fn check_bucket_policy(template: &Template) -> Result<(), AssertionError> {
    template.has_resource_properties(BUCKET_POLICY_TYPE, Match::object_like([
        ("Bucket", Match::from(get_ref(logical_ids::BUCKET))),
        ("PolicyDocument", Match::object_like([
            ("Statement", Match::array_with([Match::from(json!({
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
            }))])),
        ])),
    ]))
}

fn check_bucket_teardown(template: &Template) -> Result<(), AssertionError> {
    template.has_resource(BUCKET_TYPE, json!({
        "DeletionPolicy": "Delete",
        "UpdateReplacePolicy": "Delete",
    }))?;
    template.has_resource(aws_s3::CLEANUP_RESOURCE_TYPE, Match::object_like([
        ("Properties", Match::object_like([
            ("ServiceToken", Match::any_value()),
            ("BucketName", Match::from(get_ref(logical_ids::BUCKET))),
        ])),
    ]))
}

fn check_distribution(template: &Template, domain: &DomainName, www: &str) -> Result<(), AssertionError> {
    template.resource_count_is(DISTRIBUTION_TYPE, 1)?;
    template.has_resource_properties(DISTRIBUTION_TYPE, json!({
        "DistributionConfig": {
            "Aliases": [domain.as_str(), www],
            "DefaultRootObject": INDEX_DOCUMENT,
            "Enabled": true,
            "ViewerCertificate": {
                "AcmCertificateArn": get_ref(logical_ids::CERTIFICATE),
                "SslSupportMethod": "sni-only",
            },
            "DefaultCacheBehavior": {
                "AllowedMethods": ["GET", "HEAD", "OPTIONS"],
                "ViewerProtocolPolicy": "redirect-to-https",
            },
        },
    }))
}

fn check_certificate(template: &Template, domain: &DomainName, www: &str) -> Result<(), AssertionError> {
    template.resource_count_is(CERTIFICATE_TYPE, 1)?;
    template.has_resource_properties(CERTIFICATE_TYPE, json!({
        "DomainName": domain.as_str(),
        "SubjectAlternativeNames": [www],
        "ValidationMethod": "DNS",
    }))
}

fn check_alias_records(template: &Template, domain: &DomainName, www: &str) -> Result<(), AssertionError> {
    template.resource_count_is(RECORD_SET_TYPE, 2)?;
    let alias = |name: String| Match::object_like([
        ("Name", Match::from(json!(name))),
        ("Type", Match::from("A")),
        ("HostedZoneId", Match::any_value()),
        ("AliasTarget", Match::from(json!({
            "DNSName": get_att(logical_ids::DISTRIBUTION, "DomainName"),
        }))),
    ]);
    template.has_resource_properties(RECORD_SET_TYPE, alias(domain.fqdn()))?;
    template.has_resource_properties(RECORD_SET_TYPE, alias(format!("{www}.")))
}

fn check_outputs(template: &Template) -> Result<(), AssertionError> {
    template.has_output("DistributionDomainName", json!({
        "Value": get_att(logical_ids::DISTRIBUTION, "DomainName"),
    }))?;
    template.has_output("DistributionId", json!({ "Value": get_ref(logical_ids::DISTRIBUTION) }))?;
    template.has_output("BucketWebsiteURL", json!({ "Value": get_att(logical_ids::BUCKET, "WebsiteURL") }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> DomainName {
        DomainName::new("moltabakery.com").unwrap()
    }

    #[test]
    fn empty_template_fails_every_check() {
        let results = check_site_template(&Template::from_json(json!({ "Resources": {} })), &domain());
        assert_eq!(results.len(), 7);
        assert!(results.iter().all(|r| !r.passed()));
        assert!(!all_passed(&results));
    }

    #[test]
    fn failure_display_names_the_check() {
        let result = CheckResult {
            name: "single certificate",
            outcome: Err(AssertionError::ResourceCount { ty: CERTIFICATE_TYPE.into(), expected: 1, actual: 0 }),
        };
        let shown = result.to_string();
        assert!(shown.starts_with("FAIL single certificate"));
        assert!(shown.contains("Expected 1 resource(s) of type AWS::CertificateManager::Certificate but found 0"));
    }
}
