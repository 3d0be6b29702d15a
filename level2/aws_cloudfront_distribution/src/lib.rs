use aws_cfn_stack::Resource;
use aws_regions::CLOUDFRONT_CERTIFICATE_REGION;
use infra_lib::{
    get_att, get_ref,
    intrinsics::{select, split},
    naming::verify_resource_name,
    types::cloud_front::{
        AllowedMethods, CfnDistribution, CustomOriginConfig, DefaultCacheBehavior, DistributionConfig,
        HttpVersion, Origin, OriginProtocolPolicy, ViewerCertificate, ViewerProtocolPolicy,
        CACHING_OPTIMIZED_POLICY_ID,
    },
    DomainName, Error, Result, StrVal,
};

pub mod s3_website_distribution;

const CONSTRUCT: &str = "aws_cloudfront_distribution";
const DEFAULT_ORIGIN_ID: &str = "origin0";

/// which certificate cloudfront presents for the custom domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Certificate {
    /// a certificate created in the same stack
    LogicalId(String),
    /// an existing certificate
    Arn(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomDomainSettings {
    /// every name the distribution answers to. The first one is its primary name.
    pub aliases: Vec<String>,
    pub certificate: Certificate,
}

pub struct Input {
    pub logical_id: String,

    /// by default we create the distribution enabled and ready to use.
    /// optionally set this field to true to create the distribution
    /// but have it be disabled at first.
    pub disabled: bool,

    /// By default set to allow-all.
    pub viewer_protocol_policy: ViewerProtocolPolicy,

    pub allowed_methods: AllowedMethods,

    /// the domain name of your default origin. If using an S3 bucket website
    /// this should be the host of the WebsiteURL of your S3 bucket.
    /// see https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/distribution-web-values-specify.html#DownloadDistValuesDomainName
    pub default_origin_domain_name: StrVal,

    /// the policy cloudfront should use when making requests to your origin.
    /// by default we set this to http-only to optimize for creating S3 bucket websites.
    pub default_origin_protocol_policy: OriginProtocolPolicy,

    /// served for requests to `/`. must not start with a slash.
    pub default_root_object: Option<String>,

    pub comment: Option<String>,

    /// optionally provide settings to configure your distribution with a custom domain name + https cert
    pub custom_domain_settings: Option<CustomDomainSettings>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            logical_id: "Distribution".to_string(),
            disabled: false,
            viewer_protocol_policy: ViewerProtocolPolicy::AllowAll,
            allowed_methods: AllowedMethods::AllowGetHead,
            default_origin_domain_name: Default::default(),
            default_origin_protocol_policy: OriginProtocolPolicy::HttpOnly,
            default_root_object: None,
            comment: None,
            custom_domain_settings: None,
        }
    }
}

/// { "Fn::Select" : [ "2", { "Fn::Split": ["/", { "Fn::GetAtt": [logical_bucket, "WebsiteURL"] }] } ] }
/// the WebsiteURL looks like `http://<bucket>.s3-website-<region>.amazonaws.com`
/// and cloudfront only wants the host.
pub fn select_s3website_url(logical_bucket: &str) -> StrVal {
    select(2, split("/", get_att(logical_bucket, "WebsiteURL"))).into()
}

fn certificate_region(arn: &str) -> Option<&str> {
    // arn:aws:acm:<region>:<account>:certificate/<id>
    let mut parts = arn.split(':');
    match (parts.next(), parts.nth(1), parts.next()) {
        (Some("arn"), Some("acm"), Some(region)) => Some(region),
        _ => None,
    }
}

fn viewer_certificate(settings: &CustomDomainSettings, stack_region: &str) -> Result<ViewerCertificate> {
    let (cert_region, arn): (&str, StrVal) = match &settings.certificate {
        Certificate::LogicalId(id) => (stack_region, get_ref(id).into()),
        Certificate::Arn(arn) => {
            let region = certificate_region(arn)
                .ok_or_else(|| Error::construct(CONSTRUCT, format!("{arn} is not an ACM certificate arn")))?;
            (region, arn.clone().into())
        }
    };
    if cert_region != CLOUDFRONT_CERTIFICATE_REGION {
        return Err(Error::construct(CONSTRUCT, format!(
            "CloudFront only accepts certificates from {CLOUDFRONT_CERTIFICATE_REGION}, this one is in {cert_region}"
        )));
    }
    Ok(ViewerCertificate::acm(arn))
}

/// adds the distribution and returns its logical id
pub fn config(input: &Input, stackinp: &mut aws_cfn_stack::Input) -> Result<String> {
    verify_resource_name(&input.logical_id)?;
    if input.default_origin_domain_name.as_str().map_or(false, str::is_empty) {
        return Err(Error::construct(CONSTRUCT, "Must provide the domain name of the default origin"));
    }
    let (aliases, viewer_certificate) = match &input.custom_domain_settings {
        Some(settings) => {
            if settings.aliases.is_empty() {
                return Err(Error::construct(CONSTRUCT, "A certificate without any aliases would never be used"));
            }
            let mut aliases: Vec<String> = vec![];
            for alias in settings.aliases.iter() {
                let alias = DomainName::new(alias)?.to_string();
                if aliases.contains(&alias) {
                    return Err(Error::construct(CONSTRUCT, format!("Alias {alias} is listed more than once")));
                }
                aliases.push(alias);
            }
            (aliases, Some(viewer_certificate(settings, &stackinp.env.region)?))
        }
        None => (vec![], None),
    };

    let default_origin = Origin {
        id: DEFAULT_ORIGIN_ID.into(),
        domain_name: input.default_origin_domain_name.clone(),
        custom_origin_config: Some(CustomOriginConfig {
            origin_protocol_policy: input.default_origin_protocol_policy,
            ..Default::default()
        }),
        origin_path: None,
    };
    let distribution = CfnDistribution {
        distribution_config: DistributionConfig {
            aliases,
            comment: input.comment.clone(),
            origins: vec![default_origin],
            enabled: !input.disabled,
            default_root_object: input.default_root_object.clone(),
            default_cache_behavior: DefaultCacheBehavior {
                allowed_methods: input.allowed_methods.methods(),
                cached_methods: input.allowed_methods.cached_methods(),
                cache_policy_id: Some(CACHING_OPTIMIZED_POLICY_ID.to_string()),
                compress: Some(true),
                viewer_protocol_policy: input.viewer_protocol_policy,
                target_origin_id: DEFAULT_ORIGIN_ID.into(),
            },
            http_version: Some(HttpVersion::Http2),
            ipv6_enabled: Some(true),
            viewer_certificate,
        },
    };
    tracing::debug!(
        distribution = %input.logical_id,
        aliases = ?distribution.distribution_config.aliases,
        "cloudfront distribution"
    );
    stackinp.push(Resource::new(&input.logical_id, distribution));
    Ok(input.logical_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_cfn_stack::Environment;
    use serde_json::json;

    fn stack(region: &str) -> aws_cfn_stack::Input {
        aws_cfn_stack::Input::new("stack", Environment::new("120086452202", region).unwrap())
    }

    fn custom_domain(certificate: Certificate) -> Input {
        Input {
            default_origin_domain_name: "example.com".into(),
            custom_domain_settings: Some(CustomDomainSettings {
                aliases: vec!["moltabakery.com".into(), "www.moltabakery.com".into()],
                certificate,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_produce_a_usable_distribution() {
        let mut stackinp = stack("eu-west-1");
        let input = Input { default_origin_domain_name: "example.com".into(), ..Default::default() };
        let id = config(&input, &mut stackinp).unwrap();
        let props = &stackinp.synth().unwrap().template.resources[&id].properties;
        let conf = &props["DistributionConfig"];
        assert_eq!(conf["Enabled"], json!(true));
        assert_eq!(conf["Origins"][0]["CustomOriginConfig"]["OriginProtocolPolicy"], "http-only");
        assert_eq!(conf["DefaultCacheBehavior"]["CachePolicyId"], CACHING_OPTIMIZED_POLICY_ID);
        assert_eq!(conf["DefaultCacheBehavior"]["ViewerProtocolPolicy"], "allow-all");
        assert!(conf.get("Aliases").is_none());
        assert!(conf.get("ViewerCertificate").is_none());
    }

    #[test]
    fn missing_origin_fails() {
        assert!(config(&Input::default(), &mut stack("us-east-1")).is_err());
    }

    #[test]
    fn stack_certificate_must_be_in_us_east_1() {
        let mut stackinp = stack("us-east-1");
        stackinp.push(Resource::new("Cert", infra_lib::types::certificate_manager::CfnCertificate {
            domain_name: "moltabakery.com".into(),
            subject_alternative_names: vec!["www.moltabakery.com".into()],
            ..Default::default()
        }));
        let id = config(&custom_domain(Certificate::LogicalId("Cert".into())), &mut stackinp).unwrap();
        let conf = &stackinp.synth().unwrap().template.resources[&id].properties["DistributionConfig"];
        assert_eq!(conf["Aliases"], json!(["moltabakery.com", "www.moltabakery.com"]));
        assert_eq!(conf["ViewerCertificate"], json!({
            "AcmCertificateArn": { "Ref": "Cert" },
            "MinimumProtocolVersion": "TLSv1.2_2021",
            "SslSupportMethod": "sni-only",
        }));

        let err = config(&custom_domain(Certificate::LogicalId("Cert".into())), &mut stack("eu-west-1")).unwrap_err();
        assert!(err.to_string().contains("only accepts certificates from us-east-1"));
    }

    #[test]
    fn imported_certificate_region_comes_from_the_arn() {
        let ok = Certificate::Arn("arn:aws:acm:us-east-1:120086452202:certificate/abc".into());
        assert!(config(&custom_domain(ok), &mut stack("eu-west-1")).is_ok());
        let wrong = Certificate::Arn("arn:aws:acm:eu-west-1:120086452202:certificate/abc".into());
        assert!(config(&custom_domain(wrong), &mut stack("eu-west-1")).is_err());
        let garbage = Certificate::Arn("not-an-arn".into());
        assert!(config(&custom_domain(garbage), &mut stack("us-east-1")).is_err());
    }

    #[test]
    fn aliases_are_unique_and_required() {
        let mut input = custom_domain(Certificate::Arn("arn:aws:acm:us-east-1:1:certificate/a".into()));
        if let Some(settings) = input.custom_domain_settings.as_mut() {
            settings.aliases.push("MoltaBakery.com".into());
        }
        assert!(config(&input, &mut stack("us-east-1")).is_err());
        if let Some(settings) = input.custom_domain_settings.as_mut() {
            settings.aliases.clear();
        }
        assert!(config(&input, &mut stack("us-east-1")).is_err());
    }

    #[test]
    fn s3_website_url_selects_host() {
        assert_eq!(select_s3website_url("Bucket"), StrVal::Val(json!({
            "Fn::Select": ["2", { "Fn::Split": ["/", { "Fn::GetAtt": ["Bucket", "WebsiteURL"] }] }]
        })));
    }
}
