//! One [`SectionProcessor`](crate::parsing::SectionProcessor) per Blueprint
//! entity.
//!
//! Processors never build source maps conditionally: every output carries its
//! map and [`crate::parse`] drops the maps afterwards when they were not asked
//! for.

pub mod action;
pub mod asset;
pub mod attributes;
pub mod blueprint;
pub mod headers;
pub mod parameter;
pub mod parameters;
pub mod payload;
pub mod relation;
pub mod resource;
pub mod resource_group;
pub mod values;

use serde::Serialize;

pub use action::ActionProcessor;
pub use asset::AssetProcessor;
pub use attributes::AttributesProcessor;
pub use blueprint::BlueprintProcessor;
pub use headers::HeadersProcessor;
pub use parameter::ParameterProcessor;
pub use parameters::ParametersProcessor;
pub use payload::PayloadProcessor;
pub use relation::RelationProcessor;
pub use resource::ResourceProcessor;
pub use resource_group::ResourceGroupProcessor;
pub use values::ValuesProcessor;

/// A parsed value together with its source map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parsed<N, M> {
    pub node: N,
    pub source_map: M,
}

impl<N, M> Parsed<N, M> {
    pub fn new(node: N, source_map: M) -> Self {
        Self { node, source_map }
    }
}
