//! Typed models of the cloudformation resources we emit.
//! Field names serialize to the exact cloudformation property names.

use serde::{Deserialize, Serialize};

pub mod certificate_manager;
pub mod cloud_front;
pub mod iam;
pub mod lambda;
pub mod route53;
pub mod s3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Self { key: key.to_string(), value: value.to_string() }
    }
}
