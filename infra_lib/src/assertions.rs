//! Assertions over a synthesized template.
//!
//! Every check is independent of the others and of resource order.
//! A failing check says which resource type it looked at, where the
//! closest candidate diverged, what was expected there and what was found.
//!
//! ```
//! use infra_lib::assertions::{Match, Template};
//! use serde_json::json;
//!
//! let template = Template::from_json(json!({
//!     "Resources": {
//!         "Bucket": {
//!             "Type": "AWS::S3::Bucket",
//!             "Properties": { "BucketName": "moltabakery.com", "Tags": [] }
//!         }
//!     }
//! }));
//! template.resource_count_is("AWS::S3::Bucket", 1).unwrap();
//! template.has_resource_properties("AWS::S3::Bucket", json!({ "BucketName": "moltabakery.com" })).unwrap();
//! template.has_resource_properties("AWS::S3::Bucket", Match::object_like([
//!     ("WebsiteConfiguration", Match::absent()),
//! ])).unwrap();
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::SavedTemplate;

/// A pattern that a json value is checked against.
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    /// objects match if every key in the pattern matches (extra keys are fine),
    /// arrays must have the same length and match element by element,
    /// everything else must be equal.
    Like(Value),
    /// deep equality, no extra keys allowed anywhere
    Exact(Value),
    /// like `Like` for objects, but the values can be any other matcher
    ObjectLike(Vec<(String, Match)>),
    /// the array contains an element matching each pattern, in any order
    ArrayWith(Vec<Match>),
    /// the key must be present, any value is fine
    AnyValue,
    /// the key must not be present
    Absent,
    /// a string containing this substring
    StringLike(String),
}

impl Match {
    pub fn exact(value: Value) -> Self {
        Match::Exact(value)
    }

    pub fn object_like<K: Into<String>>(entries: impl IntoIterator<Item = (K, Match)>) -> Self {
        Match::ObjectLike(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array_with(items: impl IntoIterator<Item = Match>) -> Self {
        Match::ArrayWith(items.into_iter().collect())
    }

    pub fn any_value() -> Self {
        Match::AnyValue
    }

    pub fn absent() -> Self {
        Match::Absent
    }

    pub fn string_like(s: &str) -> Self {
        Match::StringLike(s.to_string())
    }

    pub fn test(&self, actual: &Value) -> Result<(), Mismatch> {
        check(self, Some(actual), "")
    }
}

impl From<Value> for Match {
    fn from(value: Value) -> Self {
        Match::Like(value)
    }
}

impl From<&str> for Match {
    fn from(value: &str) -> Self {
        Match::Like(Value::String(value.to_string()))
    }
}

/// where and how a value diverged from a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// slash separated path from the root of the checked value, eg: `/Aliases/1`
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    /// how many keys/indexes deep the mismatch sits
    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "at {path}: expected {}, found {}", self.expected, self.actual)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssertionError {
    #[error("Expected {expected} resource(s) of type {ty} but found {actual}")]
    ResourceCount { ty: String, expected: usize, actual: usize },

    #[error("Template has no resource of type {ty}")]
    NoResourceOfType { ty: String },

    #[error("No resource of type {ty} matches.\nClosest is '{logical_id}', {mismatch}")]
    NoMatch { ty: String, logical_id: String, mismatch: Mismatch },

    #[error("Template has no output named {name}")]
    MissingOutput { name: String },

    #[error("Output {name} does not match, {mismatch}")]
    OutputMismatch { name: String, mismatch: Mismatch },

    #[error("Template does not match, {0}")]
    TemplateMismatch(Mismatch),
}

fn describe(v: Option<&Value>) -> String {
    match v {
        None => "nothing".to_string(),
        Some(v) => v.to_string(),
    }
}

fn mismatch(path: &str, expected: impl Into<String>, actual: Option<&Value>) -> Mismatch {
    Mismatch { path: path.to_string(), expected: expected.into(), actual: describe(actual) }
}

fn check(pattern: &Match, actual: Option<&Value>, path: &str) -> Result<(), Mismatch> {
    match pattern {
        Match::Absent => match actual {
            None => Ok(()),
            Some(_) => Err(mismatch(path, "key to be absent", actual)),
        },
        Match::AnyValue => match actual {
            Some(_) => Ok(()),
            None => Err(mismatch(path, "any value", actual)),
        },
        Match::Exact(expected) => match actual {
            Some(a) if a == expected => Ok(()),
            _ => Err(mismatch(path, expected.to_string(), actual)),
        },
        Match::StringLike(sub) => match actual {
            Some(Value::String(s)) if s.contains(sub.as_str()) => Ok(()),
            _ => Err(mismatch(path, format!("a string containing {sub:?}"), actual)),
        },
        Match::Like(expected) => check_like(expected, actual, path),
        Match::ObjectLike(entries) => {
            let obj = match actual {
                Some(Value::Object(o)) => o,
                _ => return Err(mismatch(path, "an object", actual)),
            };
            for (key, pat) in entries.iter() {
                check(pat, obj.get(key), &format!("{path}/{key}"))?;
            }
            Ok(())
        }
        Match::ArrayWith(items) => {
            let arr = match actual {
                Some(Value::Array(a)) => a,
                _ => return Err(mismatch(path, "an array", actual)),
            };
            for (i, pat) in items.iter().enumerate() {
                if !arr.iter().any(|a| check(pat, Some(a), "").is_ok()) {
                    return Err(mismatch(path, format!("an array containing a match for pattern #{i} ({pat:?})"), actual));
                }
            }
            Ok(())
        }
    }
}

fn check_like(expected: &Value, actual: Option<&Value>, path: &str) -> Result<(), Mismatch> {
    match expected {
        Value::Object(exp) => {
            let obj = match actual {
                Some(Value::Object(o)) => o,
                _ => return Err(mismatch(path, expected.to_string(), actual)),
            };
            for (key, exp_val) in exp.iter() {
                let sub_path = format!("{path}/{key}");
                match obj.get(key) {
                    None => return Err(mismatch(&sub_path, exp_val.to_string(), None)),
                    Some(a) => check_like(exp_val, Some(a), &sub_path)?,
                }
            }
            Ok(())
        }
        Value::Array(exp) => {
            let arr = match actual {
                Some(Value::Array(a)) => a,
                _ => return Err(mismatch(path, expected.to_string(), actual)),
            };
            if arr.len() != exp.len() {
                return Err(mismatch(path, format!("an array of {} element(s): {expected}", exp.len()), actual));
            }
            for (i, (e, a)) in exp.iter().zip(arr.iter()).enumerate() {
                check_like(e, Some(a), &format!("{path}/{i}"))?;
            }
            Ok(())
        }
        _ => match actual {
            Some(a) if a == expected => Ok(()),
            _ => Err(mismatch(path, expected.to_string(), actual)),
        },
    }
}

/// a read-only view over a template document
#[derive(Debug, Clone)]
pub struct Template {
    json: Value,
}

impl Template {
    pub fn from_json(json: Value) -> Self {
        Self { json }
    }

    pub fn from_saved(template: &SavedTemplate) -> serde_json::Result<Self> {
        Ok(Self { json: template.to_json()? })
    }

    pub fn parse(s: &str) -> serde_json::Result<Self> {
        Ok(Self { json: serde_json::from_str(s)? })
    }

    pub fn to_json(&self) -> &Value {
        &self.json
    }

    fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
        self.json.get("Resources")
            .and_then(|r| r.as_object())
            .into_iter()
            .flat_map(|r| r.iter())
            .filter(move |(_, res)| res.get("Type").and_then(|t| t.as_str()) == Some(ty))
    }

    pub fn resource_count_is(&self, ty: &str, expected: usize) -> Result<(), AssertionError> {
        let actual = self.resources_of_type(ty).count();
        if actual != expected {
            return Err(AssertionError::ResourceCount { ty: ty.to_string(), expected, actual });
        }
        Ok(())
    }

    /// at least one resource of this type has properties matching the pattern
    pub fn has_resource_properties(&self, ty: &str, pattern: impl Into<Match>) -> Result<(), AssertionError> {
        let pattern = pattern.into();
        let empty = Value::Object(Default::default());
        self.any_resource_matches(ty, |res| {
            check(&pattern, Some(res.get("Properties").unwrap_or(&empty)), "/Properties")
        })
    }

    /// like `has_resource_properties` but the pattern is checked against the
    /// whole resource, so it can see DeletionPolicy, DependsOn etc.
    pub fn has_resource(&self, ty: &str, pattern: impl Into<Match>) -> Result<(), AssertionError> {
        let pattern = pattern.into();
        self.any_resource_matches(ty, |res| check(&pattern, Some(res), ""))
    }

    fn any_resource_matches(
        &self,
        ty: &str,
        mut check_one: impl FnMut(&Value) -> Result<(), Mismatch>,
    ) -> Result<(), AssertionError> {
        let mut closest: Option<(String, Mismatch)> = None;
        for (id, res) in self.resources_of_type(ty) {
            match check_one(res) {
                Ok(()) => return Ok(()),
                Err(m) => {
                    // the deepest mismatch is the most useful one to report
                    let deeper = closest.as_ref().map_or(true, |(_, c)| m.depth() > c.depth());
                    if deeper {
                        closest = Some((id.clone(), m));
                    }
                }
            }
        }
        match closest {
            Some((logical_id, mismatch)) => Err(AssertionError::NoMatch { ty: ty.to_string(), logical_id, mismatch }),
            None => Err(AssertionError::NoResourceOfType { ty: ty.to_string() }),
        }
    }

    /// logical id -> resource, for every resource of this type matching the pattern
    pub fn find_resources(&self, ty: &str, pattern: impl Into<Match>) -> BTreeMap<String, Value> {
        let pattern = pattern.into();
        self.resources_of_type(ty)
            .filter(|(_, res)| check(&pattern, Some(res), "").is_ok())
            .map(|(id, res)| (id.clone(), res.clone()))
            .collect()
    }

    pub fn has_output(&self, name: &str, pattern: impl Into<Match>) -> Result<(), AssertionError> {
        let output = self.json.get("Outputs").and_then(|o| o.get(name));
        let output = match output {
            Some(o) => o,
            None => return Err(AssertionError::MissingOutput { name: name.to_string() }),
        };
        check(&pattern.into(), Some(output), "")
            .map_err(|mismatch| AssertionError::OutputMismatch { name: name.to_string(), mismatch })
    }

    pub fn template_matches(&self, pattern: impl Into<Match>) -> Result<(), AssertionError> {
        check(&pattern.into(), Some(&self.json), "").map_err(AssertionError::TemplateMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Template {
        Template::from_json(json!({
            "Resources": {
                "Dist": {
                    "Type": "AWS::CloudFront::Distribution",
                    "Properties": {
                        "DistributionConfig": {
                            "Aliases": ["a.com", "www.a.com"],
                            "Enabled": true,
                        }
                    }
                },
                "Root": {
                    "Type": "AWS::Route53::RecordSet",
                    "Properties": { "Name": "a.com.", "Type": "A" }
                },
                "Www": {
                    "Type": "AWS::Route53::RecordSet",
                    "Properties": { "Name": "www.a.com.", "Type": "A" },
                    "DeletionPolicy": "Retain"
                }
            },
            "Outputs": {
                "DomainName": { "Value": { "Fn::GetAtt": ["Dist", "DomainName"] } }
            }
        }))
    }

    #[test]
    fn counts_by_type() {
        let t = template();
        assert!(t.resource_count_is("AWS::Route53::RecordSet", 2).is_ok());
        assert!(t.resource_count_is("AWS::S3::Bucket", 0).is_ok());
        let err = t.resource_count_is("AWS::CloudFront::Distribution", 2).unwrap_err();
        assert_eq!(err, AssertionError::ResourceCount {
            ty: "AWS::CloudFront::Distribution".into(), expected: 2, actual: 1,
        });
    }

    #[test]
    fn objects_match_partially_arrays_exactly() {
        let t = template();
        t.has_resource_properties("AWS::CloudFront::Distribution", json!({
            "DistributionConfig": { "Aliases": ["a.com", "www.a.com"] }
        })).unwrap();
        let err = t.has_resource_properties("AWS::CloudFront::Distribution", json!({
            "DistributionConfig": { "Aliases": ["a.com"] }
        })).unwrap_err();
        match err {
            AssertionError::NoMatch { logical_id, mismatch, .. } => {
                assert_eq!(logical_id, "Dist");
                assert_eq!(mismatch.path, "/Properties/DistributionConfig/Aliases");
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn array_with_ignores_order() {
        let t = template();
        t.has_resource_properties("AWS::CloudFront::Distribution", Match::object_like([
            ("DistributionConfig", Match::object_like([
                ("Aliases", Match::array_with(["www.a.com".into(), "a.com".into()])),
            ])),
        ])).unwrap();
    }

    #[test]
    fn reports_expected_and_actual_values() {
        let t = template();
        let err = t.has_resource_properties("AWS::Route53::RecordSet", json!({ "Name": "b.com." })).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("expected \"b.com.\""), "{msg}");
        assert!(msg.contains("found \""), "{msg}");
    }

    #[test]
    fn absent_and_any_value() {
        let t = template();
        t.has_resource_properties("AWS::Route53::RecordSet", Match::object_like([
            ("TTL", Match::absent()),
            ("Name", Match::any_value()),
        ])).unwrap();
        assert!(Match::absent().test(&json!(1)).is_err());
    }

    #[test]
    fn has_resource_sees_deletion_policy() {
        let t = template();
        t.has_resource("AWS::Route53::RecordSet", json!({ "DeletionPolicy": "Retain" })).unwrap();
        let found = t.find_resources("AWS::Route53::RecordSet", json!({ "Properties": { "Type": "A" } }));
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["Root", "Www"]);
    }

    #[test]
    fn closest_is_the_deepest_mismatch_not_the_longest_path() {
        let t = Template::from_json(json!({
            "Resources": {
                "Deep": {
                    "Type": "AWS::S3::Bucket",
                    "Properties": { "WebsiteConfigurationLongName": "v", "B": { "C": "nope" } }
                },
                "Shallow": {
                    "Type": "AWS::S3::Bucket",
                    "Properties": { "WebsiteConfigurationLongName": "other", "B": { "C": "w" } }
                }
            }
        }));
        let err = t.has_resource_properties("AWS::S3::Bucket", Match::object_like([
            ("WebsiteConfigurationLongName", Match::from("v")),
            ("B", Match::object_like([("C", Match::from("w"))])),
        ])).unwrap_err();
        match err {
            AssertionError::NoMatch { logical_id, mismatch, .. } => {
                assert_eq!(logical_id, "Deep");
                assert_eq!(mismatch.path, "/Properties/B/C");
                assert_eq!(mismatch.depth(), 3);
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn missing_type_is_its_own_error() {
        let t = template();
        let err = t.has_resource_properties("AWS::S3::Bucket", json!({})).unwrap_err();
        assert_eq!(err, AssertionError::NoResourceOfType { ty: "AWS::S3::Bucket".into() });
    }

    #[test]
    fn outputs() {
        let t = template();
        t.has_output("DomainName", json!({ "Value": { "Fn::GetAtt": ["Dist", "DomainName"] } })).unwrap();
        assert!(matches!(t.has_output("Nope", Match::any_value()), Err(AssertionError::MissingOutput { .. })));
        t.template_matches(Match::object_like([("Outputs", Match::any_value())])).unwrap();
    }

    #[test]
    fn string_like_and_exact() {
        assert!(Match::string_like("cloudfront").test(&json!("d123.cloudfront.net")).is_ok());
        assert!(Match::exact(json!({ "a": 1 })).test(&json!({ "a": 1, "b": 2 })).is_err());
        assert!(Match::from(json!({ "a": 1 })).test(&json!({ "a": 1, "b": 2 })).is_ok());
    }
}
