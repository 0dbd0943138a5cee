//! Identifier extraction from route parameters.
//!
//! Values are read as-is: nothing is coerced or checked here, and an absent
//! parameter comes back as `None` so the DAO decides what to do with it.

use crate::request::RequestContext;
use crate::table::TableDescriptor;

/// `params[table.primary_key[0].alias]`
pub fn resource_id(table: &TableDescriptor, ctx: &RequestContext) -> Option<String> {
    ctx.params.get(table.primary_key_alias()).cloned()
}

/// `params[parent.primary_key[0].alias]`, or `None` without a parent table
pub fn parent_id(parent: Option<&TableDescriptor>, ctx: &RequestContext) -> Option<String> {
    parent.and_then(|parent| resource_id(parent, ctx))
}
