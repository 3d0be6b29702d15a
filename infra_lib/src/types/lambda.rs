use serde::{Deserialize, Serialize};

use crate::{cfn_resource, StrVal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionRuntime {
    #[default]
    #[serde(rename = "nodejs20.x")]
    Nodejs20x,
    #[serde(rename = "python3.12")]
    Python312,
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    /// inline source. only supported for interpreted runtimes
    /// and limited to 4096 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_file: Option<String>,
    #[serde(rename = "S3Bucket", skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<StrVal>,
    #[serde(rename = "S3Key", skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<StrVal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnFunction {
    pub code: Code,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub handler: String,
    pub role: StrVal,
    pub runtime: FunctionRuntime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

const MAX_INLINE_CODE_LEN: usize = 4096;

fn validate_function(f: &CfnFunction) -> Result<(), String> {
    match (&f.code.zip_file, &f.code.s3_bucket) {
        (Some(_), Some(_)) => return Err("Provide either inline code or an S3 location, not both".into()),
        (None, None) => return Err("Function code is missing".into()),
        _ => {}
    }
    if let Some(zip) = &f.code.zip_file {
        if zip.len() > MAX_INLINE_CODE_LEN {
            return Err(format!("Inline code is {} characters, the limit is {MAX_INLINE_CODE_LEN}", zip.len()));
        }
        if f.runtime == FunctionRuntime::ProvidedAl2023 {
            return Err("Inline code is not supported on custom runtimes".into());
        }
    }
    if let Some(t) = f.timeout {
        if t == 0 || t > 900 {
            return Err(format!("Timeout must be between 1 and 900 seconds, got {t}"));
        }
    }
    Ok(())
}

cfn_resource!(CfnFunction, "AWS::Lambda::Function", validate_function);
