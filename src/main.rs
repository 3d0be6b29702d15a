use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use aws_cfn_stack::{template_path, SynthesizedStack};
use clap::{Parser, Subcommand};
use infra_lib::{assertions::Template, DomainName};
use molta_infra::{
    context::load_context,
    logging::init_tracing,
    validate::{all_passed, check_site_template},
    MoltaInfraStack, SiteConfig,
};

#[derive(Parser)]
#[command(name = "molta_infra")]
#[command(about = "Synthesize, check and deploy the Molta website infrastructure")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file. Defaults to molta.toml in the current directory, if present.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Output directory for the synthesized template
    #[arg(long, short, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the template, manifest and deploy script (the default)
    Synth,
    /// Check a synthesized template against the site assertions
    Validate {
        /// Template to check. Defaults to the one in the output directory
        #[arg(long, short)]
        template: Option<PathBuf>,
    },
    /// Look up the hosted zone in Route 53 and cache it in the context file
    Lookup,
    /// Synthesize, then create or update the stack and wait for it
    Deploy,
}

fn synth(config: &SiteConfig) -> anyhow::Result<SynthesizedStack> {
    let props = config.props()?;
    let ctx = load_context(config, &props)?;
    let stack = MoltaInfraStack::new(&props, &ctx)?;
    let synthesized = stack.synth()?;
    synthesized.write_assembly(&config.out_dir)
        .with_context(|| format!("Failed to write to {}", config.out_dir.display()))?;
    Ok(synthesized)
}

fn validate(config: &SiteConfig, template: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let path = template.unwrap_or_else(|| template_path(&config.out_dir, &config.stack_name));
    let body = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}. Run synth first", path.display()))?;
    let template = Template::parse(&body)
        .with_context(|| format!("{} is not valid json", path.display()))?;
    let domain = DomainName::new(&config.domain_name)?;
    let results = check_site_template(&template, &domain);
    for result in results.iter() {
        println!("{result}");
    }
    if all_passed(&results) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(feature = "aws")]
fn lookup(config: &SiteConfig) -> anyhow::Result<()> {
    let props = config.props()?;
    let mut ctx = aws_route53::ContextFile::load(&config.context_file)?;
    let zone = molta_infra::context::refresh_zone(&mut ctx, &props)?;
    println!("{} {}", zone.name, zone.id);
    Ok(())
}

#[cfg(feature = "aws")]
fn deploy(config: &SiteConfig) -> anyhow::Result<()> {
    let synthesized = synth(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let outputs = runtime.block_on(aws_cfn_stack::deploy::deploy(&synthesized))?;
    let mut outputs: Vec<_> = outputs.into_iter().collect();
    outputs.sort();
    for (key, value) in outputs {
        println!("{key} = {value}");
    }
    Ok(())
}

#[cfg(not(feature = "aws"))]
fn lookup(_config: &SiteConfig) -> anyhow::Result<()> {
    anyhow::bail!("lookup needs AWS support, rebuild with --features aws")
}

#[cfg(not(feature = "aws"))]
fn deploy(_config: &SiteConfig) -> anyhow::Result<()> {
    anyhow::bail!("deploy needs AWS support, rebuild with --features aws")
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = SiteConfig::load(cli.config.as_deref())?;
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }
    match cli.command.unwrap_or(Commands::Synth) {
        Commands::Synth => {
            let synthesized = synth(&config)?;
            println!("{}", template_path(&config.out_dir, &synthesized.stack_name).display());
        }
        Commands::Validate { template } => return validate(&config, template),
        Commands::Lookup => lookup(&config)?,
        Commands::Deploy => deploy(&config)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
