//! # anyres-core
//!
//! Building blocks for reconciling untyped, schema-agnostic resources:
//!
//! - [`json`]: normalisation, semantic equality and selective overlay of JSON bodies
//! - [`path`]: dotted path expressions used by ignore-lists and export selectors
//! - [`identity`], [`tags`], [`location`]: codecs between structured arguments and body properties
//! - [`resource_id`]: canonical resource identifiers and type strings
//! - [`definition`]: optional structural definitions and the [`SchemaRegistry`] trait
//!
//! Everything in this crate is synchronous and side-effect free.

pub mod definition;
pub mod error;
pub mod identity;
pub mod json;
pub mod location;
pub mod path;
pub mod resource_id;
pub mod tags;

pub use definition::{
    ObjectDefinition, PropertyDefinition, ResourceDefinition, SchemaRegistry, TypeDefinition,
    ValidationError,
};
pub use error::{CoreError, ErrorCategory, Result};
pub use identity::{IdentityModel, IdentityType, expand_identity, flatten_identity};
pub use json::{
    UpdateOptions, normalize_json, normalize_value, override_with_paths, semantically_equal,
    update_object,
};
pub use location::{normalize_location, same_location};
pub use path::JsonPath;
pub use resource_id::{
    RESOURCE_GROUP_TYPE, ResourceId, is_resource_group_type, parse_type_string,
    require_definition, resource_type_of, split_api_version,
};
pub use tags::{Tags, expand_tags, flatten_tags, validate_tags};
