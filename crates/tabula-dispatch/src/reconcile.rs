use serde_json::Value;

use crate::identifier;
use crate::request::RequestContext;
use crate::table::TableDescriptor;

/// Writes route-derived identifiers into a mutation body.
///
/// Each key (the parent's and the table's own) is written only when the route
/// carries it, overwriting the body's value. A key missing from the route
/// leaves the body alone. Non-object bodies pass through untouched.
pub fn reconcile_body(
    table: &TableDescriptor,
    parent: Option<&TableDescriptor>,
    ctx: &RequestContext,
    body: &mut Value,
) {
    let Some(object) = body.as_object_mut() else {
        return;
    };

    if let Some(parent) = parent {
        if let Some(parent_id) = identifier::resource_id(parent, ctx) {
            object.insert(
                parent.primary_key_alias().to_string(),
                Value::String(parent_id),
            );
        }
    }

    if let Some(id) = identifier::resource_id(table, ctx) {
        object.insert(table.primary_key_alias().to_string(), Value::String(id));
    }
}
