//! Helpers for CloudFormation intrinsic functions.
//! These all produce plain json values that can be placed anywhere
//! a property value is expected.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A property that is either a literal string, or something
/// that cloudformation resolves at deploy time (a Ref, GetAtt, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrVal {
    Str(String),
    Val(Value),
}

impl Default for StrVal {
    fn default() -> Self {
        StrVal::Str(String::new())
    }
}

impl StrVal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StrVal::Str(s) => Some(s),
            StrVal::Val(Value::String(s)) => Some(s),
            StrVal::Val(_) => None,
        }
    }
}

impl From<&str> for StrVal {
    fn from(value: &str) -> Self {
        StrVal::Str(value.to_string())
    }
}

impl From<String> for StrVal {
    fn from(value: String) -> Self {
        StrVal::Str(value)
    }
}

impl From<Value> for StrVal {
    fn from(value: Value) -> Self {
        StrVal::Val(value)
    }
}

/// `{ "Ref": logical_id }`
pub fn get_ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [logical_id, attribute] }`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Sub": template }`
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// `{ "Fn::Split": [delimiter, value] }`
pub fn split(delimiter: &str, value: Value) -> Value {
    json!({ "Fn::Split": [delimiter, value] })
}

/// `{ "Fn::Select": [index, list] }`. cloudformation wants the index as a string.
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index.to_string(), list] })
}

/// the logical ids referenced by a value through Ref, GetAtt or a
/// `${Id}` / `${Id.Attribute}` placeholder in Fn::Sub.
/// Pseudo parameters such as `AWS::Region` are skipped.
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut out = vec![];
    collect_refs(value, &mut out);
    out
}

fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("Ref") {
                if !id.starts_with("AWS::") {
                    out.push(id.clone());
                }
            }
            if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                if let Some(Value::String(id)) = args.first() {
                    out.push(id.clone());
                }
            }
            if let Some(args) = map.get("Fn::Sub") {
                collect_sub_refs(args, out);
            }
            for v in map.values() {
                collect_refs(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_refs(v, out);
            }
        }
        _ => {}
    }
}

/// Fn::Sub is either a template string, or `[template, { var: value }]`.
/// names bound in the variable map are local to the Sub.
fn collect_sub_refs(args: &Value, out: &mut Vec<String>) {
    let (template, vars) = match args {
        Value::String(s) => (s.as_str(), None),
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => (s.as_str(), items.get(1).and_then(Value::as_object)),
            _ => return,
        },
        _ => return,
    };
    for name in sub_placeholders(template) {
        if vars.map_or(false, |v| v.contains_key(name)) {
            continue;
        }
        let id = name.split('.').next().unwrap_or(name);
        out.push(id.to_string());
    }
}

/// names inside `${...}`. `${!Literal}` escapes and pseudo parameters are skipped.
fn sub_placeholders(template: &str) -> Vec<&str> {
    let mut out = vec![];
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        rest = &rest[start + 2..];
        let end = match rest.find('}') {
            Some(end) => end,
            None => break,
        };
        let name = rest[..end].trim();
        rest = &rest[end + 1..];
        if name.is_empty() || name.starts_with('!') || name.starts_with("AWS::") {
            continue;
        }
        out.push(name);
    }
    out
}

/// one statement of an IAM policy document
pub struct PolicyStatement {
    pub effect: &'static str,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
    /// leave as None for identity policies (ie: ones attached to a role)
    pub principal: Option<Value>,
}

pub fn create_policy_doc(statements: &[PolicyStatement]) -> Value {
    let statements: Vec<Value> = statements.iter().map(|s| {
        let mut obj = Map::new();
        obj.insert("Effect".to_string(), Value::String(s.effect.to_string()));
        if let Some(principal) = &s.principal {
            obj.insert("Principal".to_string(), principal.clone());
        }
        obj.insert("Action".to_string(), one_or_many(s.actions.iter().map(|a| Value::String(a.clone())).collect()));
        obj.insert("Resource".to_string(), one_or_many(s.resources.clone()));
        Value::Object(obj)
    }).collect();
    json!({
        "Version": "2012-10-17",
        "Statement": statements,
    })
}

fn one_or_many(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}
