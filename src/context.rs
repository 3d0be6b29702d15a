//! Keeps the hosted zone cache in the context file filled.

use anyhow::Context;
use aws_route53::{ContextFile, HostedZoneLookup};

use crate::{config::SiteConfig, stack::StackProps};

/// loads the context file. On a cache miss the zone is looked up in
/// Route 53 and written back, when built with AWS support.
pub fn load_context(config: &SiteConfig, props: &StackProps) -> anyhow::Result<ContextFile> {
    let mut ctx = ContextFile::load(&config.context_file)
        .with_context(|| format!("Failed to load {}", config.context_file.display()))?;
    let cached = ctx.find_zone(&props.env.account, &props.env.region, &props.domain_name).is_ok();
    if !cached {
        tracing::info!(domain = %props.domain_name, "hosted zone is not in the context file yet");
        refresh_zone(&mut ctx, props)?;
    }
    Ok(ctx)
}

#[cfg(feature = "aws")]
pub fn refresh_zone(ctx: &mut ContextFile, props: &StackProps) -> anyhow::Result<aws_route53::HostedZone> {
    let runtime = tokio::runtime::Runtime::new()?;
    let zone = runtime.block_on(async {
        let client = aws_route53::lookup::make_client(&props.env.region).await;
        aws_route53::lookup::find_public_zone(&client, &props.domain_name).await
    })?;
    ctx.insert_zone(&props.env.account, &props.env.region, &zone)?;
    ctx.save()?;
    Ok(zone)
}

/// without the sdk there is nothing to refresh from. Synthesis then
/// fails with the usual hosted zone not found error.
#[cfg(not(feature = "aws"))]
pub fn refresh_zone(ctx: &mut ContextFile, props: &StackProps) -> anyhow::Result<aws_route53::HostedZone> {
    tracing::warn!(path = %ctx.path().display(), "built without AWS support, add the hosted zone to the context file by hand");
    Err(infra_lib::Error::HostedZoneNotFound { domain: props.domain_name.to_string() }.into())
}
