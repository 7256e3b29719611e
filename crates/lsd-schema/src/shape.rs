//! Explicit field-set checks for Status Documents, equivalent to the
//! bundled schema but without a schema engine.

use serde_json::{Map, Value};

use crate::validate::{DocumentValidator, ValidationReport, Violation};

/// Top-level members of a Status Document.
pub const STATUS_FIELDS: [&str; 4] = ["id", "status", "links", "updated"];

/// Link relations a Status Document may carry.
pub const LINK_RELATIONS: [&str; 4] = ["license", "register", "return", "renew"];

/// Link relations a Status Document must carry.
pub const REQUIRED_RELATIONS: [&str; 1] = ["license"];

/// Link relations that take exactly one link object, never a list.
pub const SINGLE_LINK_RELATIONS: [&str; 2] = ["license", "register"];

/// Members of the `updated` block.
pub const UPDATED_FIELDS: [&str; 2] = ["license", "status"];

/// A [`DocumentValidator`] performing explicit field-set checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeValidator;

impl ShapeValidator {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentValidator for ShapeValidator {
    fn name(&self) -> &str {
        "field-set"
    }

    fn validate(&self, document: &Value) -> ValidationReport {
        let mut out = Vec::new();
        let Some(root) = document.as_object() else {
            push(&mut out, "", "document is not a JSON object");
            return ValidationReport::from_violations(out);
        };

        check_field_set(&mut out, "", root, &STATUS_FIELDS, &STATUS_FIELDS);

        if let Some(status) = root.get("status") {
            if !status.as_str().is_some_and(|s| !s.is_empty()) {
                push(&mut out, "/status", "must be a non-empty string");
            }
        }
        if let Some(id) = root.get("id") {
            if !id.is_string() {
                push(&mut out, "/id", "must be a string");
            }
        }

        match root.get("updated") {
            Some(Value::Object(updated)) => {
                check_field_set(&mut out, "/updated", updated, &UPDATED_FIELDS, &UPDATED_FIELDS);
                for field in UPDATED_FIELDS {
                    if updated.get(field).is_some_and(|v| !v.is_string()) {
                        push(&mut out, &format!("/updated/{field}"), "must be a string");
                    }
                }
            }
            Some(_) => push(&mut out, "/updated", "must be an object"),
            None => {}
        }

        match root.get("links") {
            Some(Value::Object(links)) => {
                check_field_set(&mut out, "/links", links, &LINK_RELATIONS, &REQUIRED_RELATIONS);
                for (rel, link) in links {
                    let path = format!("/links/{rel}");
                    if SINGLE_LINK_RELATIONS.contains(&rel.as_str()) {
                        check_link_object(&mut out, &path, link);
                    } else if LINK_RELATIONS.contains(&rel.as_str()) {
                        check_link(&mut out, &path, link);
                    }
                }
            }
            Some(_) => push(&mut out, "/links", "must be an object"),
            None => {}
        }

        ValidationReport::from_violations(out)
    }
}

fn check_field_set(
    out: &mut Vec<Violation>,
    path: &str,
    object: &Map<String, Value>,
    allowed: &[&str],
    required: &[&str],
) {
    for field in required {
        if !object.contains_key(*field) {
            push(out, path, &format!("missing required member {field:?}"));
        }
    }
    for key in object.keys() {
        if !allowed.contains(&key.as_str()) {
            push(out, path, &format!("unexpected member {key:?}"));
        }
    }
}

/// A link is one object with a non-empty `href`, or a non-empty list of them.
fn check_link(out: &mut Vec<Violation>, path: &str, link: &Value) {
    match link {
        Value::Array(items) if items.is_empty() => push(out, path, "empty link list"),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                check_link_object(out, &format!("{path}/{i}"), item);
            }
        }
        other => check_link_object(out, path, other),
    }
}

fn check_link_object(out: &mut Vec<Violation>, path: &str, link: &Value) {
    if !link.is_object() {
        push(out, path, "must be a link object");
        return;
    }
    match link.get("href") {
        Some(Value::String(href)) if !href.is_empty() => {}
        Some(_) => push(out, &format!("{path}/href"), "must be a non-empty string"),
        None => push(out, path, "link has no href"),
    }
    for member in ["type", "title", "profile"] {
        if link.get(member).is_some_and(|v| !v.is_string()) {
            push(out, &format!("{path}/{member}"), "must be a string");
        }
    }
    if link.get("templated").is_some_and(|v| !v.is_boolean()) {
        push(out, &format!("{path}/templated"), "must be a boolean");
    }
}

fn push(out: &mut Vec<Violation>, path: &str, message: &str) {
    out.push(Violation {
        instance_path: path.to_string(),
        message: message.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::SchemaValidator;
    use serde_json::json;

    fn ready_status() -> Value {
        json!({
            "id": "lsd-1",
            "status": "ready",
            "updated": {"license": "2016-07-11T14:53:40Z", "status": "2016-07-11T14:53:40Z"},
            "links": {
                "license": {"href": "http://h/licenses/1"},
                "register": {"href": "http://h/register{?id,name}"},
                "return": {"href": "http://h/return{?id,name}"},
                "renew": [{"href": "http://h/renew{?end,id,name}", "type": "application/vnd.readium.lcp.license-1.0+json"}]
            }
        })
    }

    #[test]
    fn accepts_conforming_document() {
        let report = ShapeValidator.validate(&ready_status());
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn missing_license_link_is_invalid() {
        let mut doc = ready_status();
        doc["links"].as_object_mut().unwrap().remove("license");
        let report = ShapeValidator.validate(&doc);
        assert!(!report.is_valid());
        assert_eq!(report.violations()[0].instance_path, "/links");
        assert!(report.diagnostic().contains("missing required member \"license\""));
    }

    #[test]
    fn unknown_relation_is_invalid() {
        let mut doc = ready_status();
        doc["links"]["hint"] = json!({"href": "http://h/hint"});
        assert!(!ShapeValidator.validate(&doc).is_valid());
    }

    #[test]
    fn extra_updated_member_is_invalid() {
        let mut doc = ready_status();
        doc["updated"]["events"] = json!("2016-07-11T14:53:40Z");
        assert!(!ShapeValidator.validate(&doc).is_valid());
    }

    #[test]
    fn link_list_entries_need_href() {
        let mut doc = ready_status();
        doc["links"]["renew"] = json!([{"type": "text/html"}]);
        let report = ShapeValidator.validate(&doc);
        assert_eq!(report.violations()[0].instance_path, "/links/renew/0");
    }

    #[test]
    fn register_must_be_single_link() {
        let mut doc = ready_status();
        doc["links"]["register"] = json!([{"href": "http://h/register{?id,name}"}]);
        let report = ShapeValidator.validate(&doc);
        assert_eq!(report.violations()[0].instance_path, "/links/register");
        assert!(!SchemaValidator::bundled().unwrap().validate(&doc).is_valid());
    }

    #[test]
    fn non_object_is_invalid() {
        assert!(!ShapeValidator.validate(&json!([1, 2])).is_valid());
    }

    #[test]
    fn link_member_types_are_checked() {
        let mut doc = ready_status();
        doc["links"]["register"]["templated"] = json!("yes");
        doc["links"]["license"]["type"] = json!(false);
        let report = ShapeValidator.validate(&doc);
        let paths: Vec<&str> = report
            .violations()
            .iter()
            .map(|v| v.instance_path.as_str())
            .collect();
        assert_eq!(paths, ["/links/license/type", "/links/register/templated"]);
    }

    #[test]
    fn agrees_with_bundled_schema() {
        let schema = SchemaValidator::bundled().unwrap();
        let mut missing_updated = ready_status();
        missing_updated.as_object_mut().unwrap().remove("updated");
        let mut opaque_status = ready_status();
        opaque_status["status"] = json!("suspended");
        let mut empty_renew = ready_status();
        empty_renew["links"]["renew"] = json!([]);

        let mut string_templated = ready_status();
        string_templated["links"]["register"]["templated"] = json!("true");
        let mut numeric_type = ready_status();
        numeric_type["links"]["renew"][0]["type"] = json!(1);
        let mut titled = ready_status();
        titled["links"]["license"]["title"] = json!("License");
        titled["links"]["license"]["profile"] = json!("http://readium.org/lcp/basic-profile");
        let mut untitled = ready_status();
        untitled["links"]["license"]["title"] = json!(null);

        for doc in [
            ready_status(),
            missing_updated,
            opaque_status,
            empty_renew,
            string_templated,
            numeric_type,
            titled,
            untitled,
        ] {
            assert_eq!(
                ShapeValidator.validate(&doc).is_valid(),
                schema.validate(&doc).is_valid(),
                "backends disagree on {doc}"
            );
        }
    }
}
