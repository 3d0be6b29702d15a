use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{cfn_resource, naming::validate_bucket_name, StrVal};
use super::Tag;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnBucket {
    /// leave as None to let cloudformation generate a name
    /// from the logical id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<StrVal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_access_block_configuration: Option<PublicAccessBlockConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_configuration: Option<WebsiteConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlockConfiguration {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfiguration {
    /// what s3 applies to new buckets when nothing is specified
    pub const BLOCK_ALL: Self = Self {
        block_public_acls: true,
        block_public_policy: true,
        ignore_public_acls: true,
        restrict_public_buckets: true,
    };
    pub const NONE: Self = Self {
        block_public_acls: false,
        block_public_policy: false,
        ignore_public_acls: false,
        restrict_public_buckets: false,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebsiteConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_document: Option<String>,
}

fn validate_bucket(bucket: &CfnBucket) -> Result<(), String> {
    if let Some(name) = bucket.bucket_name.as_ref().and_then(|n| n.as_str()) {
        validate_bucket_name(name).map_err(|e| e.to_string())?;
    }
    if let Some(website) = &bucket.website_configuration {
        if website.index_document.is_none() && website.error_document.is_some() {
            return Err("A website error document requires an index document".into());
        }
    }
    Ok(())
}

cfn_resource!(CfnBucket, "AWS::S3::Bucket", validate_bucket);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnBucketPolicy {
    pub bucket: StrVal,
    pub policy_document: Value,
}

cfn_resource!(CfnBucketPolicy, "AWS::S3::BucketPolicy");
