//! A higher level module for creating S3 buckets easily. Some higher level
//! functionality this provides is setting up static website hosting with
//! public read access.
//!
//! When `auto_delete_objects` is enabled, a custom cloudformation resource is created
//! alongside the bucket: a lambda function deletes every object in the bucket when the
//! stack gets deleted. Without it, deleting a stack whose bucket is not empty fails.

use aws_cfn_stack::Resource;
use infra_lib::{
    get_att, get_ref,
    intrinsics::{create_policy_doc, sub, PolicyStatement},
    naming::verify_resource_name,
    types::{
        iam::{lambda_assume_role_policy_doc, CfnRole, Policy, LAMBDA_BASIC_EXECUTION_ROLE},
        lambda::{CfnFunction, Code, FunctionRuntime},
        s3::{CfnBucket, CfnBucketPolicy, PublicAccessBlockConfiguration, WebsiteConfiguration},
    },
    CfnResource, Error, RemovalPolicy, Result,
};
use serde_json::{json, Value};

const CONSTRUCT: &str = "aws_s3";

pub const CLEANUP_RESOURCE_TYPE: &str = "Custom::S3BucketCleanup";

pub struct Input {
    /// the logical id of the bucket. The other resources this module
    /// creates are named after it.
    pub logical_id: String,
    /// leave as None to let cloudformation generate a name
    /// from the logical id.
    pub bucket_name: Option<String>,
    /// if set, website hosting is enabled with this index document.
    pub index_document: Option<String>,
    pub error_document: Option<String>,
    /// creates a bucket policy that allows anyone to read every object.
    pub public_read_access: bool,
    /// None leaves the account defaults in place, which block all public access.
    pub block_public_access: Option<PublicAccessBlockConfiguration>,
    pub removal_policy: RemovalPolicy,
    /// empties the bucket when the stack is deleted.
    /// this includes:
    /// - a cloudformation custom resource
    /// - a lambda function that will perform the cleanup
    /// - a role for the lambda function that allows it to cleanup the S3 bucket.
    /// Only valid together with `RemovalPolicy::Destroy`.
    pub auto_delete_objects: bool,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            logical_id: "Bucket".to_string(),
            bucket_name: None,
            index_document: None,
            error_document: None,
            public_read_access: false,
            block_public_access: None,
            removal_policy: RemovalPolicy::Retain,
            auto_delete_objects: false,
        }
    }
}

/// the logical ids of what was created. Reference these in other modules,
/// for example pointing a cloudfront distribution to this bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub bucket: String,
    pub policy: Option<String>,
    pub cleanup: Option<String>,
}

pub struct CleanupResource {
    pub lambda_logical_id: String,
    pub bucket_logical_id: String,
}

impl CfnResource for CleanupResource {
    fn type_string(&self) -> &'static str {
        CLEANUP_RESOURCE_TYPE
    }

    fn properties(&self) -> serde_json::Result<Value> {
        Ok(json!({
            "ServiceToken": get_att(&self.lambda_logical_id, "Arn"),
            "BucketName": get_ref(&self.bucket_logical_id),
        }))
    }
}

/// inline handler that empties the bucket on stack deletion. Uses the v3 sdk
/// bundled with the nodejs20.x runtime and the cfn-response module
/// that lambda provides for inline code.
const CLEANUP_HANDLER: &str = r#"const { S3Client, ListObjectsV2Command, DeleteObjectsCommand } = require('@aws-sdk/client-s3');
const response = require('cfn-response');
const s3 = new S3Client({});
async function emptyBucket(bucket) {
  let token;
  do {
    const page = await s3.send(new ListObjectsV2Command({ Bucket: bucket, ContinuationToken: token }));
    const objects = (page.Contents || []).map((o) => ({ Key: o.Key }));
    if (objects.length > 0) {
      await s3.send(new DeleteObjectsCommand({ Bucket: bucket, Delete: { Objects: objects, Quiet: true } }));
    }
    token = page.IsTruncated ? page.NextContinuationToken : undefined;
  } while (token);
}
exports.handler = async function (event, context) {
  let status = response.SUCCESS;
  if (event.RequestType === 'Delete') {
    try {
      await emptyBucket(event.ResourceProperties.BucketName);
    } catch (err) {
      console.error(err);
      status = response.FAILED;
    }
  }
  await response.send(event, context, status);
};
"#;

pub fn config(input: &Input, stackinp: &mut aws_cfn_stack::Input) -> Result<Outputs> {
    let bucket_id = input.logical_id.clone();
    verify_resource_name(&bucket_id)?;
    if input.auto_delete_objects && input.removal_policy != RemovalPolicy::Destroy {
        return Err(Error::construct(CONSTRUCT, "Cannot use auto_delete_objects unless the removal policy is Destroy"));
    }
    if input.public_read_access {
        let blocks_policy = input.block_public_access
            .map_or(true, |b| b.block_public_policy);
        if blocks_policy {
            return Err(Error::construct(CONSTRUCT, "Cannot use public_read_access while block_public_policy is enabled"));
        }
    }
    if input.error_document.is_some() && input.index_document.is_none() {
        return Err(Error::construct(CONSTRUCT, "error_document requires an index_document"));
    }

    let website_configuration = input.index_document.as_ref().map(|index| WebsiteConfiguration {
        index_document: Some(index.clone()),
        error_document: input.error_document.clone(),
    });
    let bucket = CfnBucket {
        bucket_name: input.bucket_name.clone().map(Into::into),
        public_access_block_configuration: input.block_public_access,
        website_configuration,
        ..Default::default()
    };
    stackinp.push(Resource::new(&bucket_id, bucket).with_removal_policy(input.removal_policy));

    let objects_arn = sub(&format!("arn:aws:s3:::${{{bucket_id}}}/*"));
    let mut outputs = Outputs { bucket: bucket_id.clone(), policy: None, cleanup: None };

    if input.public_read_access {
        let policy_id = format!("{bucket_id}Policy");
        let bucket_policy = CfnBucketPolicy {
            bucket: get_ref(&bucket_id).into(),
            policy_document: create_policy_doc(&[PolicyStatement {
                effect: "Allow",
                actions: vec!["s3:GetObject".to_string()],
                resources: vec![objects_arn.clone()],
                principal: Some(Value::String("*".to_string())),
            }]),
        };
        stackinp.push(Resource::new(&policy_id, bucket_policy));
        outputs.policy = Some(policy_id);
    }

    if !input.auto_delete_objects {
        return Ok(outputs);
    }

    let role_id = format!("{bucket_id}CleanupRole");
    let function_id = format!("{bucket_id}CleanupFunction");
    let cleanup_id = format!("{bucket_id}Cleanup");

    let policy = Policy {
        policy_name: format!("{bucket_id}-cleanup"),
        policy_document: create_policy_doc(&[
            PolicyStatement {
                effect: "Allow",
                actions: vec!["s3:ListBucket".to_string()],
                resources: vec![get_att(&bucket_id, "Arn")],
                principal: None,
            },
            PolicyStatement {
                effect: "Allow",
                actions: vec!["s3:DeleteObject".to_string()],
                resources: vec![objects_arn],
                principal: None,
            },
        ]),
    };
    let role = CfnRole {
        description: Some(format!("empties {bucket_id} when the stack is deleted")),
        assume_role_policy_document: lambda_assume_role_policy_doc(),
        managed_policy_arns: vec![LAMBDA_BASIC_EXECUTION_ROLE.to_string()],
        policies: vec![policy],
    };
    let cleanup_function = CfnFunction {
        runtime: FunctionRuntime::Nodejs20x,
        handler: "index.handler".to_string(),
        role: get_att(&role_id, "Arn").into(),
        timeout: Some(300),
        code: Code {
            zip_file: Some(CLEANUP_HANDLER.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let cleanup = CleanupResource {
        lambda_logical_id: function_id.clone(),
        bucket_logical_id: bucket_id.clone(),
    };
    // the policy has to outlive the cleanup so deletion
    // happens in the order: objects, policy, bucket.
    let mut cleanup_resource = Resource::new(&cleanup_id, cleanup);
    if let Some(policy_id) = &outputs.policy {
        cleanup_resource = cleanup_resource.depends_on(policy_id);
    }
    stackinp.push(Resource::new(&role_id, role));
    stackinp.push(Resource::new(&function_id, cleanup_function));
    stackinp.push(cleanup_resource);
    tracing::debug!(bucket = %bucket_id, "added bucket cleanup resources");

    outputs.cleanup = Some(cleanup_id);
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_cfn_stack::Environment;
    use infra_lib::DeletionPolicy;

    fn stack() -> aws_cfn_stack::Input {
        aws_cfn_stack::Input::new("stack", Environment::new("120086452202", "us-east-1").unwrap())
    }

    fn website_input() -> Input {
        Input {
            logical_id: "DomainBucket".into(),
            bucket_name: Some("moltabakery.com".into()),
            index_document: Some("index.html".into()),
            public_read_access: true,
            block_public_access: Some(PublicAccessBlockConfiguration::NONE),
            removal_policy: RemovalPolicy::Destroy,
            auto_delete_objects: true,
            ..Default::default()
        }
    }

    #[test]
    fn website_bucket_creates_all_resources() {
        let mut stackinp = stack();
        let outputs = config(&website_input(), &mut stackinp).unwrap();
        assert_eq!(outputs, Outputs {
            bucket: "DomainBucket".into(),
            policy: Some("DomainBucketPolicy".into()),
            cleanup: Some("DomainBucketCleanup".into()),
        });
        let template = stackinp.synth().unwrap().template;
        let ids: Vec<&str> = template.resources.keys().map(|s| s.as_str()).collect();
        assert_eq!(ids, vec![
            "DomainBucket",
            "DomainBucketCleanup",
            "DomainBucketCleanupFunction",
            "DomainBucketCleanupRole",
            "DomainBucketPolicy",
        ]);

        let bucket = &template.resources["DomainBucket"];
        assert_eq!(bucket.deletion_policy, Some(DeletionPolicy::Delete));
        assert_eq!(bucket.properties["WebsiteConfiguration"]["IndexDocument"], "index.html");

        let policy = &template.resources["DomainBucketPolicy"].properties;
        assert_eq!(policy["PolicyDocument"]["Statement"][0]["Principal"], "*");
        assert_eq!(policy["PolicyDocument"]["Statement"][0]["Action"], "s3:GetObject");

        let cleanup = &template.resources["DomainBucketCleanup"];
        assert_eq!(cleanup.ty, CLEANUP_RESOURCE_TYPE);
        assert_eq!(cleanup.depends_on, vec!["DomainBucketPolicy".to_string()]);
        assert_eq!(cleanup.properties["BucketName"], get_ref("DomainBucket"));
    }

    #[test]
    fn plain_bucket_has_no_extras() {
        let mut stackinp = stack();
        let outputs = config(&Input::default(), &mut stackinp).unwrap();
        assert_eq!(outputs.policy, None);
        assert_eq!(outputs.cleanup, None);
        assert_eq!(stackinp.resources.len(), 1);
    }

    #[test]
    fn public_read_needs_an_open_policy_block() {
        let input = Input { public_read_access: true, ..Default::default() };
        assert!(config(&input, &mut stack()).is_err());
        let input = Input {
            public_read_access: true,
            block_public_access: Some(PublicAccessBlockConfiguration::BLOCK_ALL),
            ..Default::default()
        };
        assert!(config(&input, &mut stack()).is_err());
    }

    #[test]
    fn auto_delete_requires_destroy() {
        let input = Input { auto_delete_objects: true, ..Default::default() };
        let err = config(&input, &mut stack()).unwrap_err();
        assert!(err.to_string().contains("removal policy is Destroy"));
    }

    #[test]
    fn cleanup_code_fits_inline() {
        assert!(CLEANUP_HANDLER.len() <= 4096);
    }
}
