//! Source maps parallel to [`crate::ast`].
//!
//! Each field holds the [`SourceRanges`] the corresponding AST value was read
//! from. Fields stay empty when the value was synthesized or when source map
//! export is disabled.

use apiblueprint_markdown::SourceRanges;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintSourceMap {
    pub name: SourceRanges,
    pub description: SourceRanges,
    pub metadata: Vec<SourceRanges>,
    pub resource_groups: Vec<ResourceGroupSourceMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceGroupSourceMap {
    pub name: SourceRanges,
    pub description: SourceRanges,
    pub resources: Vec<ResourceSourceMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSourceMap {
    pub name: SourceRanges,
    pub uri_template: SourceRanges,
    pub description: SourceRanges,
    pub model: Option<PayloadSourceMap>,
    pub parameters: Vec<ParameterSourceMap>,
    pub attributes: SourceRanges,
    pub actions: Vec<ActionSourceMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSourceMap {
    pub method: SourceRanges,
    pub name: SourceRanges,
    pub uri_template: SourceRanges,
    pub description: SourceRanges,
    pub relation: SourceRanges,
    pub parameters: Vec<ParameterSourceMap>,
    pub attributes: SourceRanges,
    pub examples: Vec<TransactionExampleSourceMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionExampleSourceMap {
    pub name: SourceRanges,
    pub description: SourceRanges,
    pub requests: Vec<PayloadSourceMap>,
    pub responses: Vec<PayloadSourceMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayloadSourceMap {
    pub name: SourceRanges,
    pub description: SourceRanges,
    pub parameters: Vec<ParameterSourceMap>,
    pub headers: Vec<SourceRanges>,
    pub body: SourceRanges,
    pub schema: SourceRanges,
    pub attributes: SourceRanges,
    pub reference: SourceRanges,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSourceMap {
    pub name: SourceRanges,
    pub description: SourceRanges,
    #[serde(rename = "type")]
    pub type_name: SourceRanges,
    #[serde(rename = "required")]
    pub use_: SourceRanges,
    pub default_value: SourceRanges,
    pub example_value: SourceRanges,
    pub values: Vec<SourceRanges>,
}
