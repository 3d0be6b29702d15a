use std::io::Write;
use std::path::{Path, PathBuf};

use infra_lib::{Result, SavedTemplate};
use serde::{Deserialize, Serialize};

use crate::Environment;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEPLOY_FILE: &str = "deploy.sh";

pub struct SynthesizedStack {
    pub stack_name: String,
    pub env: Environment,
    pub template: SavedTemplate,
}

/// describes what was written to the output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub stack_name: String,
    pub account: String,
    pub region: String,
    pub template_file: String,
    /// adler32 of the template file, hex encoded.
    /// identical input always produces the identical checksum.
    pub template_checksum: String,
}

impl SynthesizedStack {
    pub fn template_file_name(&self) -> String {
        format!("{}.template.json", self.stack_name)
    }

    pub fn template_body(&self) -> Result<String> {
        let mut body = self.template.to_string_pretty()?;
        body.push('\n');
        Ok(body)
    }

    pub fn checksum(&self) -> Result<String> {
        Ok(adler_hex(&self.template_body()?))
    }

    pub fn deploy_script(&self) -> String {
        let region = &self.env.region;
        let stack_name = &self.stack_name;
        let template_file = self.template_file_name();
        let mut out = "#!/usr/bin/env bash\n\n".to_string();
        out.push_str("set -euo pipefail\n");
        out.push_str("cd \"$(dirname \"$0\")\"\n\n");
        out.push_str("# deploy:\n");
        out.push_str(&format!(
            "AWS_REGION={region} aws --region {region} cloudformation deploy --stack-name {stack_name} --template-file ./{template_file} --capabilities CAPABILITY_IAM CAPABILITY_NAMED_IAM\n"
        ));
        out
    }

    /// writes the template, a manifest, and a deploy script into `out_dir`,
    /// creating it if needed.
    pub fn write_assembly(&self, out_dir: &Path) -> Result<Manifest> {
        std::fs::create_dir_all(out_dir)?;
        let body = self.template_body()?;
        let template_file = self.template_file_name();
        write_file(&out_dir.join(&template_file), &body)?;

        let manifest = Manifest {
            stack_name: self.stack_name.clone(),
            account: self.env.account.clone(),
            region: self.env.region.clone(),
            template_file,
            template_checksum: adler_hex(&body),
        };
        let manifest_body = serde_json::to_string_pretty(&manifest)?;
        write_file(&out_dir.join(MANIFEST_FILE), &manifest_body)?;

        let deploy_path = out_dir.join(DEPLOY_FILE);
        write_file(&deploy_path, &self.deploy_script())?;
        make_executable(&deploy_path)?;

        tracing::info!(
            stack = %self.stack_name,
            dir = %out_dir.display(),
            checksum = %manifest.template_checksum,
            "wrote cloud assembly"
        );
        Ok(manifest)
    }
}

pub fn template_path(out_dir: &Path, stack_name: &str) -> PathBuf {
    out_dir.join(format!("{stack_name}.template.json"))
}

fn adler_hex(body: &str) -> String {
    format!("{:08x}", adler::adler32_slice(body.as_bytes()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
