use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{cfn_resource, StrVal};

/// managed "CachingOptimized" policy.
/// https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/using-managed-cache-policies.html#managed-cache-caching-optimized
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    #[default]
    AllowAll,
    HttpsOnly,
    RedirectToHttps,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginProtocolPolicy {
    #[default]
    HttpOnly,
    MatchViewer,
    HttpsOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpVersion {
    #[serde(rename = "http1.1")]
    Http1_1,
    #[default]
    #[serde(rename = "http2")]
    Http2,
    #[serde(rename = "http3")]
    Http3,
    #[serde(rename = "http2and3")]
    Http2and3,
}

/// cloudfront only accepts these three combinations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllowedMethods {
    #[default]
    AllowGetHead,
    AllowGetHeadOptions,
    AllowAll,
}

impl AllowedMethods {
    pub fn methods(self) -> Vec<String> {
        let m: &[&str] = match self {
            AllowedMethods::AllowGetHead => &["GET", "HEAD"],
            AllowedMethods::AllowGetHeadOptions => &["GET", "HEAD", "OPTIONS"],
            AllowedMethods::AllowAll => &["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"],
        };
        m.iter().map(|s| s.to_string()).collect()
    }

    /// the methods whose responses cloudfront caches
    pub fn cached_methods(self) -> Vec<String> {
        vec!["GET".to_string(), "HEAD".to_string()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomOriginConfig {
    #[serde(rename = "HTTPPort", skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    #[serde(rename = "HTTPSPort", skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,
    pub origin_protocol_policy: OriginProtocolPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origin_ssl_protocols: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Origin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_origin_config: Option<CustomOriginConfig>,
    pub domain_name: StrVal,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DefaultCacheBehavior {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cached_methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,
    pub target_origin_id: String,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewerCertificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acm_certificate_arn: Option<StrVal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_front_default_certificate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_protocol_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_support_method: Option<String>,
}

impl ViewerCertificate {
    /// the usual settings for a custom domain: SNI, TLS 1.2 and up.
    pub fn acm(certificate_arn: StrVal) -> Self {
        Self {
            acm_certificate_arn: Some(certificate_arn),
            cloud_front_default_certificate: None,
            minimum_protocol_version: Some("TLSv1.2_2021".to_string()),
            ssl_support_method: Some("sni-only".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DistributionConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub default_cache_behavior: DefaultCacheBehavior,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_version: Option<HttpVersion>,
    #[serde(rename = "IPV6Enabled", skip_serializing_if = "Option::is_none")]
    pub ipv6_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_certificate: Option<ViewerCertificate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnDistribution {
    pub distribution_config: DistributionConfig,
}

fn validate_distribution(distr: &CfnDistribution) -> Result<(), String> {
    let conf = &distr.distribution_config;
    if conf.origins.is_empty() {
        return Err("Must provide at least one origin".into());
    }
    let target = &conf.default_cache_behavior.target_origin_id;
    if !conf.origins.iter().any(|o| &o.id == target) {
        return Err(format!("Default cache behavior targets origin '{target}' which does not exist"));
    }
    let mut seen = HashSet::new();
    for alias in conf.aliases.iter() {
        if !seen.insert(alias.as_str()) {
            return Err(format!("Alias {alias} is listed more than once"));
        }
    }
    let has_custom_cert = conf.viewer_certificate.as_ref()
        .map_or(false, |c| c.acm_certificate_arn.is_some());
    if !conf.aliases.is_empty() && !has_custom_cert {
        return Err("Aliases require a viewer certificate that covers them".into());
    }
    if let Some(root) = &conf.default_root_object {
        if root.starts_with('/') {
            return Err(format!("Default root object must not start with '/', got {root}"));
        }
    }
    Ok(())
}

cfn_resource!(CfnDistribution, "AWS::CloudFront::Distribution", validate_distribution);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CfnResource;
    use serde_json::json;

    fn simple() -> CfnDistribution {
        CfnDistribution {
            distribution_config: DistributionConfig {
                enabled: true,
                origins: vec![Origin { id: "origin0".into(), domain_name: "example.com".into(), ..Default::default() }],
                default_cache_behavior: DefaultCacheBehavior {
                    target_origin_id: "origin0".into(),
                    viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn enums_use_cloudfront_spelling() {
        let mut d = simple();
        d.distribution_config.ipv6_enabled = Some(true);
        d.distribution_config.http_version = Some(HttpVersion::Http2);
        let props = d.properties().unwrap();
        let conf = &props["DistributionConfig"];
        assert_eq!(conf["DefaultCacheBehavior"]["ViewerProtocolPolicy"], json!("redirect-to-https"));
        assert_eq!(conf["IPV6Enabled"], json!(true));
        assert_eq!(conf["HttpVersion"], json!("http2"));
        let origin = CustomOriginConfig { origin_protocol_policy: OriginProtocolPolicy::HttpOnly, ..Default::default() };
        assert_eq!(serde_json::to_value(origin).unwrap(), json!({ "OriginProtocolPolicy": "http-only" }));
    }

    #[test]
    fn target_origin_must_exist() {
        let mut d = simple();
        assert!(d.validate().is_ok());
        d.distribution_config.default_cache_behavior.target_origin_id = "nope".into();
        assert!(d.validate().unwrap_err().contains("does not exist"));
    }

    #[test]
    fn aliases_need_a_certificate() {
        let mut d = simple();
        d.distribution_config.aliases = vec!["moltabakery.com".into()];
        assert!(d.validate().is_err());
        d.distribution_config.viewer_certificate = Some(ViewerCertificate::acm(json!({ "Ref": "Cert" }).into()));
        assert!(d.validate().is_ok());
        d.distribution_config.aliases.push("moltabakery.com".into());
        assert!(d.validate().unwrap_err().contains("more than once"));
    }

    #[test]
    fn allowed_method_sets() {
        assert_eq!(AllowedMethods::AllowGetHeadOptions.methods(), vec!["GET", "HEAD", "OPTIONS"]);
        assert_eq!(AllowedMethods::AllowAll.methods().len(), 7);
    }
}
