use std::collections::HashSet;

use infra_lib::{
    intrinsics::referenced_ids,
    naming::{validate_account, validate_stack_name, verify_resource_name},
    CfnResource, Error, RemovalPolicy, ResourceOutput, Result, SavedResource, SavedTemplate,
};
use serde_json::Value;

mod assembly;
pub use assembly::*;

#[cfg(feature = "aws")]
pub mod deploy;

/// which account and region a stack gets deployed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    pub fn new(account: &str, region: &str) -> Result<Self> {
        validate_account(account)?;
        aws_regions::verify_region(region)?;
        Ok(Self { account: account.to_string(), region: region.to_string() })
    }
}

pub struct Resource {
    /// the logical id in the template
    pub name: String,
    pub properties: Box<dyn CfnResource>,
    /// None leaves DeletionPolicy unset, which cloudformation treats as Delete
    /// for most resource types.
    pub removal_policy: Option<RemovalPolicy>,
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(name: &str, properties: impl CfnResource + 'static) -> Self {
        Self {
            name: name.to_string(),
            properties: Box::new(properties),
            removal_policy: None,
            depends_on: vec![],
        }
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    pub fn depends_on(mut self, logical_id: &str) -> Self {
        self.depends_on.push(logical_id.to_string());
        self
    }
}

/// Everything that goes into one stack. Higher level constructs
/// push their resources in here, and `synth` turns it into a template.
pub struct Input {
    pub stack_name: String,
    pub description: String,
    pub env: Environment,
    pub resources: Vec<Resource>,
    pub outputs: Vec<(String, ResourceOutput)>,
}

impl Input {
    pub fn new(stack_name: &str, env: Environment) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            description: String::new(),
            env,
            resources: vec![],
            outputs: vec![],
        }
    }

    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn add_output(&mut self, name: &str, description: &str, value: Value) {
        self.outputs.push((name.to_string(), ResourceOutput {
            description: description.to_string(),
            value,
        }));
    }

    pub fn synth(&self) -> Result<SynthesizedStack> {
        validate_stack_name(&self.stack_name)?;
        let mut template = validate_resources_to_template(&self.resources)?;
        template.description = self.description.clone();
        for (name, output) in self.outputs.iter() {
            verify_resource_name(name)?;
            if template.outputs.insert(name.clone(), output.clone()).is_some() {
                return Err(Error::DuplicateLogicalId(name.clone()));
            }
        }
        verify_references(&template)?;
        tracing::debug!(
            stack = %self.stack_name,
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "synthesized stack"
        );
        Ok(SynthesizedStack {
            stack_name: self.stack_name.clone(),
            env: self.env.clone(),
            template,
        })
    }
}

fn validate_resources_to_template(resources: &[Resource]) -> Result<SavedTemplate> {
    let mut out_template = SavedTemplate::default();
    for resource in resources.iter() {
        verify_resource_name(&resource.name)?;
        if let Err(reason) = resource.properties.validate() {
            return Err(Error::Validation { resource: resource.name.clone(), reason });
        }
        let deletion_policy = resource.removal_policy.map(|p| p.deletion_policy());
        let saved_resource = SavedResource {
            ty: resource.properties.type_string().to_string(),
            properties: resource.properties.properties()?,
            depends_on: resource.depends_on.clone(),
            deletion_policy,
            update_replace_policy: deletion_policy,
        };
        if out_template.resources.insert(resource.name.clone(), saved_resource).is_some() {
            return Err(Error::DuplicateLogicalId(resource.name.clone()));
        }
    }
    Ok(out_template)
}

/// every Ref / GetAtt / Sub placeholder / DependsOn must point at a resource in this template.
/// cloudformation would reject the template otherwise, but only after upload.
fn verify_references(template: &SavedTemplate) -> Result<()> {
    let known: HashSet<&String> = template.resources.keys().collect();
    for (name, resource) in template.resources.iter() {
        let mut ids = referenced_ids(&resource.properties);
        ids.extend(resource.depends_on.iter().cloned());
        for id in ids {
            if !known.contains(&id) {
                return Err(Error::Validation {
                    resource: name.clone(),
                    reason: format!("references unknown resource '{id}'"),
                });
            }
        }
    }
    for (name, output) in template.outputs.iter() {
        for id in referenced_ids(&output.value) {
            if !known.contains(&id) {
                return Err(Error::Validation {
                    resource: name.clone(),
                    reason: format!("output references unknown resource '{id}'"),
                });
            }
        }
    }
    Ok(())
}
