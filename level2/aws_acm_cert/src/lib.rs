//! This module defines and creates an AWS ACM certificate. This module only works if the following is true:
//! - The domain you'd like to get a certificate for is hosted in Amazon Route 53
//! - The domain resides in your AWS account.
//! - You are using DNS validation.
//!
//! When a hosted zone id is given, cloudformation writes the validation records
//! into that zone itself. The certificate still only becomes ISSUED once DNS
//! validation completes, which can take a while after the stack is deployed.

use aws_cfn_stack::Resource;
use infra_lib::{
    naming::verify_resource_name,
    types::{
        certificate_manager::{CfnCertificate, DomainValidationOption, ValidationMethod},
        Tag,
    },
    DomainName, Error, Result,
};

const CONSTRUCT: &str = "aws_acm_cert";

#[derive(Default)]
pub struct Input {
    /// this is the logical name in cloudformation for your cert.
    /// Reference this name in other resources that rely on it,
    /// for example, a cloudfront distribution that wants to reference the cert ARN.
    pub logical_id: String,
    /// the domain you're requesting a certificate for. Must be fully qualified. Can have 1 optional wildcard.
    /// Examples of valid values:
    /// - www.mysite.com
    /// - multiple.sub.domains.mysite.com
    /// - mysite.com
    /// - *.mysite.com
    /// Examples of invalid values:
    /// - *.something.*.mysite.com
    /// - something.*.mysite.com
    pub domain_name: String,
    /// additional names covered by the same certificate. same rules as `domain_name`.
    pub subject_alternative_names: Vec<String>,
    /// shown in the console as the Name tag.
    pub certificate_name: Option<String>,
    /// The hosted zone ID of where your domain is hosted in Route53.
    /// Must be provided as the actual ID without the `/hostedzone/` prefix.
    pub hosted_zone_id: Option<String>,
}

fn check_wildcard(domain_name: &str) -> Result<()> {
    if domain_name.contains('*') {
        let matches = domain_name.matches('*');
        if matches.count() > 1 {
            return Err(Error::construct(CONSTRUCT, format!("Must only provide 1 wildcard. {} is invalid.", domain_name)));
        }
        if !domain_name.starts_with("*.") {
            return Err(Error::construct(CONSTRUCT, format!("If using a wildcard, it must be the first component of your domain, eg: \"*.something.com\". {} is invalid.", domain_name)));
        }
    }
    Ok(())
}

pub fn config(input: &Input, stackinp: &mut aws_cfn_stack::Input) -> Result<String> {
    verify_resource_name(&input.logical_id)?;
    if input.domain_name.is_empty() {
        return Err(Error::construct(CONSTRUCT, "Must provide a domain name"));
    }
    check_wildcard(&input.domain_name)?;
    let primary = DomainName::new(&input.domain_name)?;

    let mut alternative_names: Vec<DomainName> = vec![];
    for name in input.subject_alternative_names.iter() {
        check_wildcard(name)?;
        let name = DomainName::new(name)?;
        if name == primary {
            return Err(Error::construct(CONSTRUCT, format!("{name} is already the primary domain, don't repeat it as an alternative name")));
        }
        if alternative_names.contains(&name) {
            return Err(Error::construct(CONSTRUCT, format!("{name} is listed more than once")));
        }
        alternative_names.push(name);
    }

    let domain_validation_options = match &input.hosted_zone_id {
        Some(zone_id) => {
            if zone_id.starts_with("/hostedzone/") {
                return Err(Error::construct(CONSTRUCT, format!("Hosted zone id {zone_id} must not include the /hostedzone/ prefix")));
            }
            std::iter::once(&primary).chain(alternative_names.iter())
                .map(|name| DomainValidationOption {
                    domain_name: name.to_string(),
                    hosted_zone_id: Some(zone_id.clone()),
                    ..Default::default()
                })
                .collect()
        }
        None => vec![],
    };
    let tags = input.certificate_name.iter()
        .map(|name| Tag::new("Name", name))
        .collect();

    let cert = CfnCertificate {
        domain_name: primary.to_string(),
        subject_alternative_names: alternative_names.iter().map(|n| n.to_string()).collect(),
        domain_validation_options,
        tags,
        validation_method: Some(ValidationMethod::Dns),
    };
    stackinp.push(Resource::new(&input.logical_id, cert));
    if input.hosted_zone_id.is_none() {
        tracing::warn!(
            certificate = %input.logical_id,
            "no hosted zone given, the DNS validation records for {} must be created by hand",
            primary
        );
    }
    Ok(input.logical_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_cfn_stack::Environment;
    use serde_json::json;

    fn stack() -> aws_cfn_stack::Input {
        aws_cfn_stack::Input::new("stack", Environment::new("120086452202", "us-east-1").unwrap())
    }

    fn input(domain_name: &str) -> Input {
        Input {
            logical_id: "Cert".into(),
            domain_name: domain_name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn wildcard_rules() {
        assert!(config(&input("*.mysite.com"), &mut stack()).is_ok());
        assert!(config(&input("multiple.sub.domains.mysite.com"), &mut stack()).is_ok());
        let err = config(&input("*.something.*.mysite.com"), &mut stack()).unwrap_err();
        assert!(err.to_string().contains("Must only provide 1 wildcard"));
        let err = config(&input("something.*.mysite.com"), &mut stack()).unwrap_err();
        assert!(err.to_string().contains("must be the first component"));
        assert!(config(&input(""), &mut stack()).is_err());
    }

    #[test]
    fn validation_options_cover_every_name() {
        let mut stackinp = stack();
        let cert = Input {
            logical_id: "WebsiteCertificate".into(),
            domain_name: "moltabakery.com".into(),
            subject_alternative_names: vec!["www.moltabakery.com".into()],
            certificate_name: Some("Molta Website Certificate".into()),
            hosted_zone_id: Some("Z0123456789".into()),
        };
        assert_eq!(config(&cert, &mut stackinp).unwrap(), "WebsiteCertificate");
        let template = stackinp.synth().unwrap().template;
        let props = &template.resources["WebsiteCertificate"].properties;
        assert_eq!(props, &json!({
            "DomainName": "moltabakery.com",
            "DomainValidationOptions": [
                { "DomainName": "moltabakery.com", "HostedZoneId": "Z0123456789" },
                { "DomainName": "www.moltabakery.com", "HostedZoneId": "Z0123456789" },
            ],
            "SubjectAlternativeNames": ["www.moltabakery.com"],
            "Tags": [{ "Key": "Name", "Value": "Molta Website Certificate" }],
            "ValidationMethod": "DNS",
        }));
    }

    #[test]
    fn alternative_names_must_be_distinct() {
        let cert = Input {
            subject_alternative_names: vec!["mysite.com".into()],
            ..input("mysite.com")
        };
        assert!(config(&cert, &mut stack()).is_err());
        let cert = Input {
            subject_alternative_names: vec!["www.mysite.com".into(), "WWW.mysite.com".into()],
            ..input("mysite.com")
        };
        assert!(config(&cert, &mut stack()).is_err());
    }

    #[test]
    fn zone_id_prefix_is_rejected() {
        let cert = Input {
            hosted_zone_id: Some("/hostedzone/Z01".into()),
            ..input("mysite.com")
        };
        assert!(config(&cert, &mut stack()).is_err());
    }
}
