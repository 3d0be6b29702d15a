//! a higher level construct for creating a cloudfront distribution
//! in front of an S3 bucket that is setup as a website.

use infra_lib::{types::cloud_front::OriginProtocolPolicy, Result};

use crate::{select_s3website_url, CustomDomainSettings};

#[derive(Default)]
pub struct Input {
    /// this should be the logical id of the s3 bucket that is setup as a website.
    /// internally, we convert this to be:
    /// { "Fn::Select" : [ "2", { "Fn::Split": ["/", { "Fn::GetAtt": ["logical_bucket_website_url", "WebsiteURL"] }] } ] }
    pub logical_bucket_website_url: String,

    /// optionally provide settings to configure your distribution with a custom domain name + https cert
    pub custom_domain_settings: Option<CustomDomainSettings>,
}

/// fills in the origin of `distrinput` and adds the distribution.
/// website endpoints only speak http, so the origin protocol is always http-only.
pub fn config(inp: &Input, distrinput: &mut crate::Input, stackinp: &mut aws_cfn_stack::Input) -> Result<String> {
    distrinput.default_origin_domain_name = select_s3website_url(&inp.logical_bucket_website_url);
    distrinput.default_origin_protocol_policy = OriginProtocolPolicy::HttpOnly;
    distrinput.custom_domain_settings = inp.custom_domain_settings.clone();
    crate::config(distrinput, stackinp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_cfn_stack::{Environment, Resource};
    use infra_lib::types::s3::CfnBucket;
    use serde_json::json;

    #[test]
    fn origin_points_at_bucket_website_host() {
        let mut stackinp = aws_cfn_stack::Input::new("stack", Environment::new("120086452202", "us-east-1").unwrap());
        stackinp.push(Resource::new("Site", CfnBucket::default()));
        let mut distr = crate::Input {
            default_origin_protocol_policy: OriginProtocolPolicy::HttpsOnly,
            ..Default::default()
        };
        let inp = Input { logical_bucket_website_url: "Site".into(), ..Default::default() };
        let id = config(&inp, &mut distr, &mut stackinp).unwrap();
        let template = stackinp.synth().unwrap().template;
        let origin = &template.resources[&id].properties["DistributionConfig"]["Origins"][0];
        assert_eq!(origin["DomainName"], json!({
            "Fn::Select": ["2", { "Fn::Split": ["/", { "Fn::GetAtt": ["Site", "WebsiteURL"] }] }]
        }));
        assert_eq!(origin["CustomOriginConfig"]["OriginProtocolPolicy"], "http-only");
    }
}
