use serde::{Deserialize, Serialize};

use crate::{cfn_resource, DomainName};
use super::Tag;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMethod {
    #[default]
    #[serde(rename = "DNS")]
    Dns,
    #[serde(rename = "EMAIL")]
    Email,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainValidationOption {
    pub domain_name: String,
    /// when set for a DNS validated certificate, cloudformation
    /// writes the validation records into this zone itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnCertificate {
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_validation_options: Vec<DomainValidationOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_method: Option<ValidationMethod>,
}

fn validate_certificate(cert: &CfnCertificate) -> Result<(), String> {
    let mut all_names = vec![&cert.domain_name];
    all_names.extend(cert.subject_alternative_names.iter());
    for name in all_names.iter() {
        DomainName::new(name).map_err(|e| e.to_string())?;
    }
    if cert.subject_alternative_names.len() > 100 {
        return Err("A certificate can have at most 100 subject alternative names".into());
    }
    for opt in cert.domain_validation_options.iter() {
        if !all_names.iter().any(|n| **n == opt.domain_name) {
            return Err(format!("Domain validation option for {} does not match any name on the certificate", opt.domain_name));
        }
    }
    Ok(())
}

cfn_resource!(CfnCertificate, "AWS::CertificateManager::Certificate", validate_certificate);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CfnResource;

    #[test]
    fn validation_method_is_upper_case() {
        let c = CfnCertificate {
            domain_name: "moltabakery.com".into(),
            validation_method: Some(ValidationMethod::Dns),
            ..Default::default()
        };
        assert_eq!(c.properties().unwrap()["ValidationMethod"], "DNS");
    }

    #[test]
    fn validation_options_must_match_a_name() {
        let c = CfnCertificate {
            domain_name: "moltabakery.com".into(),
            domain_validation_options: vec![DomainValidationOption {
                domain_name: "other.com".into(),
                hosted_zone_id: Some("Z1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}
