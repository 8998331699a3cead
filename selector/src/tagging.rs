//! Call-context tagging.
//!
//! After filtering, the resolved group is written into the call's `group`
//! attachment so every downstream hop inherits the cohort decision. The
//! stable cohort is tagged with the empty string rather than left untagged:
//! provider-side matching compares against the attachment value, and an
//! absent key or a wildcard would make a single-provider call unroutable.

use crate::context::{CallContext, GROUP_ATTACHMENT, WILDCARD_GROUP};

/// Stamps the filtering outcome onto the call context. Applied on every
/// call, gray or formal.
pub fn tag_group(context: &mut CallContext, group: &str) {
    context.set_attachment(GROUP_ATTACHMENT, group);
}

/// Normalizes the `group` attachment for calls that bypass the filtering
/// pipeline entirely (e.g. a single-provider fast path where no balancing
/// runs): an empty attachment map, or a leftover wildcard value, becomes the
/// empty-string stable tag.
pub fn normalize_formal_group(context: &mut CallContext) {
    let wildcard = context
        .group()
        .is_some_and(|group| group == WILDCARD_GROUP);
    if context.attachments().is_empty() || wildcard {
        tag_group(context, "");
    }
}
