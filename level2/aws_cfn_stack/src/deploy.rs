//! Applies a synthesized stack through the cloudformation API.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_cloudformation::types::{Capability, OnFailure, Stack, StackStatus};
use infra_lib::{Error, Result};

use crate::SynthesizedStack;

/// cloudfront distributions take minutes to settle, no need to poll fast
const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub async fn make_client(region: &str) -> aws_sdk_cloudformation::Client {
    let region = aws_types::region::Region::new(region.to_string());
    let shared_config = aws_config::from_env().region(region).load().await;
    aws_sdk_cloudformation::Client::new(&shared_config)
}

/// creates or updates the stack, waits for it to finish,
/// and returns the stack outputs.
pub async fn deploy(stack: &SynthesizedStack) -> Result<HashMap<String, String>> {
    let client = make_client(&stack.env.region).await;
    let stack_name = &stack.stack_name;
    tracing::info!(stack = %stack_name, region = %stack.env.region, "about to deploy stack");
    let template_body = stack.template_body()?;
    let submitted = create_or_update_stack(&client, stack_name, &template_body).await?;
    wait_for_output(&client, stack_name, submitted).await
}

pub async fn does_stack_exist(client: &aws_sdk_cloudformation::Client, name: &str) -> Result<bool> {
    match client.describe_stacks().stack_name(name).send().await {
        Ok(_) => Ok(true),
        Err(e) => {
            let e_str = format!("{:#?}", e);
            if e_str.contains("does not exist") {
                return Ok(false);
            }
            Err(Error::Aws(e_str))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Done,
    Waiting,
    Failed,
}

/// `submitted` is false when cloudformation had nothing to update. The stack is
/// then judged as it already stands: a rollback from some earlier update left a
/// stable stack behind, and that is what this template describes.
pub fn progress(status: &StackStatus, submitted: bool) -> Progress {
    match status {
        // done and return success:
        StackStatus::CreateComplete |
        StackStatus::UpdateComplete |
        StackStatus::ImportComplete => Progress::Done,

        // keep trying
        StackStatus::CreateInProgress |
        StackStatus::ImportInProgress |
        StackStatus::ReviewInProgress |
        StackStatus::UpdateCompleteCleanupInProgress |
        StackStatus::UpdateInProgress |
        StackStatus::UpdateRollbackCompleteCleanupInProgress |
        StackStatus::UpdateRollbackInProgress |
        StackStatus::RollbackInProgress |
        StackStatus::ImportRollbackInProgress => Progress::Waiting,

        StackStatus::UpdateRollbackComplete |
        StackStatus::ImportRollbackComplete if !submitted => Progress::Done,

        // an update that rolled back leaves the old stack in place, but our changes failed
        _ => Progress::Failed,
    }
}

/// Some(stack) once the stack reached a terminal, successful state.
/// None while still in progress.
pub async fn describe_stack(client: &aws_sdk_cloudformation::Client, name: &str, submitted: bool) -> Result<Option<Stack>> {
    let d = client.describe_stacks().stack_name(name).send().await
        .map_err(|e| Error::Aws(format!("{:#?}", e)))?;
    let first = d.stacks()
        .and_then(|stacks| stacks.first())
        .ok_or_else(|| Error::Aws(format!("Stack {name} not found")))?;
    let status = first.stack_status()
        .ok_or_else(|| Error::Aws(format!("Stack {name} has no status")))?;
    match progress(status, submitted) {
        Progress::Done => Ok(Some(first.clone())),
        Progress::Waiting => Ok(None),
        Progress::Failed => {
            let reason = first.stack_status_reason().unwrap_or("Failed to get stack failure reason");
            Err(Error::Aws(format!("Stack {name} ended in {:?}: {reason}", status)))
        }
    }
}

pub async fn wait_for_output(client: &aws_sdk_cloudformation::Client, name: &str, submitted: bool) -> Result<HashMap<String, String>> {
    loop {
        if submitted {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        match describe_stack(client, name, submitted).await? {
            Some(stack) => {
                let mut out = HashMap::new();
                for output in stack.outputs().unwrap_or_default() {
                    if let (Some(key), Some(val)) = (output.output_key(), output.output_value()) {
                        out.insert(key.to_string(), val.to_string());
                    }
                }
                tracing::info!(stack = %name, "stack is ready");
                return Ok(out);
            }
            None => {
                tracing::debug!(stack = %name, "still waiting on stack");
                if !submitted {
                    // someone else's change is in flight
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }
}

/// true if a create or update was started, false if the stack already
/// matches the template.
pub async fn create_or_update_stack(client: &aws_sdk_cloudformation::Client, name: &str, body: &str) -> Result<bool> {
    if does_stack_exist(client, name).await? {
        tracing::info!(stack = %name, "updating");
        let res = client
            .update_stack()
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await;
        if let Err(e) = res {
            let e_str = format!("{:#?}", e);
            if e_str.contains("No updates are to be performed") {
                tracing::info!(stack = %name, "no changes to deploy");
                return Ok(false);
            }
            return Err(Error::Aws(e_str));
        }
    } else {
        tracing::info!(stack = %name, "creating");
        client
            .create_stack()
            .on_failure(OnFailure::Delete)
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("{:#?}", e)))?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolled_back_update_fails_our_deploy() {
        assert_eq!(progress(&StackStatus::UpdateRollbackComplete, true), Progress::Failed);
        assert_eq!(progress(&StackStatus::RollbackComplete, true), Progress::Failed);
    }

    #[test]
    fn unchanged_redeploy_accepts_an_earlier_rollback() {
        assert_eq!(progress(&StackStatus::UpdateRollbackComplete, false), Progress::Done);
        assert_eq!(progress(&StackStatus::UpdateComplete, false), Progress::Done);
        // a stack that never got created is still broken
        assert_eq!(progress(&StackStatus::RollbackComplete, false), Progress::Failed);
    }

    #[test]
    fn in_progress_keeps_waiting() {
        assert_eq!(progress(&StackStatus::UpdateInProgress, true), Progress::Waiting);
        assert_eq!(progress(&StackStatus::UpdateRollbackInProgress, false), Progress::Waiting);
        assert_eq!(progress(&StackStatus::CreateComplete, true), Progress::Done);
    }
}
