use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single cloudformation resource type.
pub trait CfnResource {
    /// the cloudformation type, eg: `AWS::S3::Bucket`
    fn type_string(&self) -> &'static str;

    /// the `Properties` section of this resource.
    fn properties(&self) -> serde_json::Result<Value>;

    /// checks that only need the resource itself.
    /// an Err contains a human readable reason.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Implements `CfnResource` for a property struct that already
/// derives `Serialize` in the cloudformation shape.
#[macro_export]
macro_rules! cfn_resource {
    ($ty:ty, $type_string:literal) => {
        impl $crate::CfnResource for $ty {
            fn type_string(&self) -> &'static str {
                $type_string
            }
            fn properties(&self) -> $crate::serde_json::Result<$crate::serde_json::Value> {
                $crate::serde_json::to_value(self)
            }
        }
    };
    ($ty:ty, $type_string:literal, $validate:path) => {
        impl $crate::CfnResource for $ty {
            fn type_string(&self) -> &'static str {
                $type_string
            }
            fn properties(&self) -> $crate::serde_json::Result<$crate::serde_json::Value> {
                $crate::serde_json::to_value(self)
            }
            fn validate(&self) -> Result<(), String> {
                $validate(self)
            }
        }
    };
}

/// What cloudformation does with the physical resource when the
/// logical resource is removed from the stack (or the stack is deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeletionPolicy {
    #[default]
    Delete,
    Retain,
    Snapshot,
}

/// construct-level view of the deletion policy.
/// `Destroy` maps to both DeletionPolicy and UpdateReplacePolicy = Delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    Destroy,
    #[default]
    Retain,
    Snapshot,
}

impl RemovalPolicy {
    pub fn deletion_policy(self) -> DeletionPolicy {
        match self {
            RemovalPolicy::Destroy => DeletionPolicy::Delete,
            RemovalPolicy::Retain => DeletionPolicy::Retain,
            RemovalPolicy::Snapshot => DeletionPolicy::Snapshot,
        }
    }
}
