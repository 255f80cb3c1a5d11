//! The typed Blueprint tree.
//!
//! Every entity is owned by its parent; nothing is shared or cyclic. Each
//! type has a structurally parallel counterpart in [`crate::source_map`].

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub name: String,
    pub description: String,
    pub metadata: Vec<Metadata>,
    pub resource_groups: Vec<ResourceGroup>,
}

/// A `key: value` line from the document preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    pub name: String,
    pub description: String,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub uri_template: String,
    pub description: String,
    pub model: Option<Payload>,
    pub parameters: Vec<Parameter>,
    pub attributes: Option<Attributes>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub method: String,
    pub name: String,
    /// The action's own URI template, or the resource's when it has none.
    pub uri_template: String,
    pub description: String,
    pub relation: Relation,
    pub parameters: Vec<Parameter>,
    pub attributes: Option<Attributes>,
    pub examples: Vec<TransactionExample>,
}

/// Link relation identifier of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub identifier: String,
}

/// One request/response pairing group of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionExample {
    pub name: String,
    pub description: String,
    pub requests: Vec<Payload>,
    pub responses: Vec<Payload>,
}

impl TransactionExample {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.responses.is_empty()
    }
}

/// Request, response or model body.
///
/// `name` is the status code for responses, an identifier for requests and
/// models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub headers: Vec<Header>,
    pub body: String,
    pub schema: String,
    pub attributes: Option<Attributes>,
    pub reference: Option<Reference>,
}

/// A `[Name][]` reference to a resource model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ParameterUse {
    #[default]
    Undefined,
    Required,
    Optional,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "required")]
    pub use_: ParameterUse,
    pub default_value: String,
    pub example_value: String,
    pub values: Vec<String>,
}

/// An Attributes section as understood by the attributes collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    /// Text between the parentheses of the section signature.
    pub type_definition: String,
    /// Raw source of the nested content.
    pub source: String,
}
