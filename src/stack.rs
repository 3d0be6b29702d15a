//! The Molta website stack: an S3 website bucket behind a cloudfront
//! distribution, served on the apex domain and `www` with a DNS validated
//! certificate.

use aws_cfn_stack::{Environment, SynthesizedStack};
use aws_cloudfront_distribution::{s3_website_distribution, Certificate, CustomDomainSettings};
use aws_route53::{cloudfront_alias_target, HostedZone, HostedZoneLookup};
use infra_lib::{
    get_att, get_ref,
    types::{cloud_front::{AllowedMethods, ViewerProtocolPolicy}, route53::RecordType, s3::PublicAccessBlockConfiguration},
    DomainName, RemovalPolicy, Result,
};

pub const DOMAIN_NAME: &str = "moltabakery.com";
pub const ACCOUNT: &str = "120086452202";
pub const REGION: &str = "us-east-1";
pub const STACK_NAME: &str = "MoltaWebsiteInfraStack";
pub const SUBDOMAIN: &str = "www";
pub const CERTIFICATE_NAME: &str = "Molta Website Certificate";
pub const INDEX_DOCUMENT: &str = "index.html";

pub mod logical_ids {
    pub const BUCKET: &str = "DomainBucket";
    pub const CERTIFICATE: &str = "WebsiteCertificate";
    pub const DISTRIBUTION: &str = "SiteDistribution";
    pub const ROOT_RECORD: &str = "SiteAliasRecord";
    pub const WWW_RECORD: &str = "WWWSiteAliasRecord";
}

pub mod output_names {
    pub const DISTRIBUTION_DOMAIN_NAME: &str = "DistributionDomainName";
    pub const DISTRIBUTION_ID: &str = "DistributionId";
    pub const BUCKET_WEBSITE_URL: &str = "BucketWebsiteURL";
}

/// what the stack is parameterized by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackProps {
    pub stack_name: String,
    pub domain_name: DomainName,
    pub env: Environment,
}

impl StackProps {
    pub fn new(stack_name: &str, domain_name: &str, account: &str, region: &str) -> Result<Self> {
        Ok(Self {
            stack_name: stack_name.to_string(),
            domain_name: DomainName::new(domain_name)?,
            env: Environment::new(account, region)?,
        })
    }

    /// the moltabakery.com production stack
    pub fn from_constants() -> Result<Self> {
        Self::new(STACK_NAME, DOMAIN_NAME, ACCOUNT, REGION)
    }
}

/// The described stack. Every resource is created once, wired to what it
/// depends on by logical id, and never revisited.
pub struct MoltaInfraStack {
    pub hosted_zone: HostedZone,
    pub bucket: aws_s3::Outputs,
    pub certificate: String,
    pub distribution: String,
    pub records: Vec<String>,
    input: aws_cfn_stack::Input,
}

impl MoltaInfraStack {
    pub fn new(props: &StackProps, lookup: &dyn HostedZoneLookup) -> Result<Self> {
        let domain = &props.domain_name;
        let www = domain.subdomain(SUBDOMAIN)?;
        let mut input = aws_cfn_stack::Input::new(&props.stack_name, props.env.clone());
        input.description = format!("Static website for {domain}");

        let hosted_zone = lookup.find_zone(&props.env.account, &props.env.region, domain)?;
        tracing::info!(zone = %hosted_zone.id, domain = %domain, "using hosted zone");

        let bucket = aws_s3::config(&aws_s3::Input {
            logical_id: logical_ids::BUCKET.to_string(),
            bucket_name: Some(domain.to_string()),
            index_document: Some(INDEX_DOCUMENT.to_string()),
            error_document: None,
            public_read_access: true,
            block_public_access: Some(PublicAccessBlockConfiguration::NONE),
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: true,
        }, &mut input)?;

        let certificate = aws_acm_cert::config(&aws_acm_cert::Input {
            logical_id: logical_ids::CERTIFICATE.to_string(),
            domain_name: domain.to_string(),
            subject_alternative_names: vec![www.to_string()],
            certificate_name: Some(CERTIFICATE_NAME.to_string()),
            hosted_zone_id: Some(hosted_zone.id.clone()),
        }, &mut input)?;
        tracing::warn!(
            certificate = %certificate,
            "the certificate stays PENDING_VALIDATION until DNS validation for {} and {} completes, confirm it in the ACM console after deploying",
            domain, www
        );

        let mut distribution_input = aws_cloudfront_distribution::Input {
            logical_id: logical_ids::DISTRIBUTION.to_string(),
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: AllowedMethods::AllowGetHeadOptions,
            default_root_object: Some(INDEX_DOCUMENT.to_string()),
            ..Default::default()
        };
        let distribution = s3_website_distribution::config(&s3_website_distribution::Input {
            logical_bucket_website_url: bucket.bucket.clone(),
            custom_domain_settings: Some(CustomDomainSettings {
                aliases: vec![domain.to_string(), www.to_string()],
                certificate: Certificate::LogicalId(certificate.clone()),
            }),
        }, &mut distribution_input, &mut input)?;

        let mut records = vec![];
        for (logical_id, record_name) in [
            (logical_ids::ROOT_RECORD, None),
            (logical_ids::WWW_RECORD, Some(SUBDOMAIN.to_string())),
        ] {
            records.push(aws_route53::config(&aws_route53::Input {
                logical_id: logical_id.to_string(),
                zone: hosted_zone.clone(),
                record_name,
                target: cloudfront_alias_target(&distribution),
                record_type: RecordType::A,
            }, &mut input)?);
        }

        input.add_output(
            output_names::DISTRIBUTION_DOMAIN_NAME,
            "cloudfront domain name the alias records point at",
            get_att(&distribution, "DomainName"),
        );
        input.add_output(output_names::DISTRIBUTION_ID, "", get_ref(&distribution));
        input.add_output(
            output_names::BUCKET_WEBSITE_URL,
            "upload site content to this bucket",
            get_att(&bucket.bucket, "WebsiteURL"),
        );

        Ok(Self { hosted_zone, bucket, certificate, distribution, records, input })
    }

    pub fn stack_name(&self) -> &str {
        &self.input.stack_name
    }

    pub fn synth(&self) -> Result<SynthesizedStack> {
        self.input.synth()
    }
}
