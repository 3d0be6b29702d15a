//! Core building blocks for describing cloudformation stacks:
//! typed resource models, intrinsic function helpers, the template
//! document itself, and assertions over synthesized templates.

pub use serde_json;

pub mod assertions;
mod domain;
mod error;
pub mod intrinsics;
pub mod naming;
mod resource;
mod template;
pub mod types;

pub use domain::DomainName;
pub use error::{Error, Result};
pub use intrinsics::{get_att, get_ref, StrVal};
pub use resource::{CfnResource, DeletionPolicy, RemovalPolicy};
pub use template::{ResourceOutput, SavedResource, SavedTemplate, TEMPLATE_FORMAT_VERSION};
