//! Typed request bodies
//!
//! Each mutating operation declares the exact shape of its JSON body here.
//! Decoding is strict: unknown fields are rejected, so a body either maps
//! onto the declared type or the request fails with a validation error
//! before any engine runs.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Body of `PUT /domains/<name>`: the three contact references
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainCreate {
    pub holder: String,
    pub tech: String,
    pub admin: String,
}

/// Body of `PATCH /domains/<name>`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainPatch {
    pub change: DomainChange,
}

/// The patchable subset of domain fields; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainChange {
    pub tech: Option<String>,
    pub admin: Option<String>,
}

/// Body of `PUT /entities/...`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactCreate {
    pub name: ContactName,
}

/// A structured personal name, ordered list of typed components
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactName {
    pub components: Vec<NameComponent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameComponent {
    pub kind: ComponentKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Given,
    Surname,
}

impl ContactCreate {
    /// Concatenate given + " " + surname into the stored name
    ///
    /// The schema admits component lists without a surname; its absence at
    /// this point is an internal error, not a client error.
    pub fn full_name(&self) -> Result<String> {
        let mut given = String::new();
        let mut surname = None;
        for component in &self.name.components {
            match component.kind {
                ComponentKind::Given => given = component.value.clone(),
                ComponentKind::Surname => surname = Some(component.value.clone()),
            }
        }
        let surname = surname
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::internal("Contact name has no surname"))?;
        Ok(format!("{given} {surname}"))
    }
}

/// Decode a domain-creation body
pub fn decode_domain_create(body: &str, domain: &str) -> Result<DomainCreate> {
    decode(body, domain)
}

/// Decode a domain-patch body
pub fn decode_domain_patch(body: &str, domain: &str) -> Result<DomainPatch> {
    decode(body, domain)
}

/// Decode a contact-creation body
pub fn decode_contact_create(body: &str) -> Result<ContactCreate> {
    decode(body, "contact")
}

fn decode<T: serde::de::DeserializeOwned>(body: &str, target: &str) -> Result<T> {
    // Distinguish "not JSON" from "JSON of the wrong shape": the former is
    // reported bare, the latter carries the violation description.
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| Error::MalformedBody(target.to_string()))?;
    serde_json::from_value(value).map_err(|e| Error::SchemaValidation {
        target: target.to_string(),
        detail: e.to_string(),
    })
}
