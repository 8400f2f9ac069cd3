//! Reference target resolution: direct ids and group indirection.
use crate::snapshot::Snapshot;
use crate::types::{Document, ReferenceTarget};

/// Resolve a target to the concrete document it names.
///
/// A `Direct` target is an id lookup. A `Group` target picks, in snapshot
/// order, the first member whose `document_type` or `id` equals the
/// preferred value; without a preference or a match it falls back to the
/// first member. Returns `None` for unknown ids and empty groups.
///
/// The returned document's `id` is the canonical target from here on:
/// callers recurse into it and namespace against it, never the group.
pub fn resolve<'a>(target: &ReferenceTarget, snapshot: &'a Snapshot) -> Option<&'a Document> {
    return match target {
        ReferenceTarget::Direct(id) => snapshot.get(id),
        ReferenceTarget::Group { group_id, .. } => {
            resolve_group_member(snapshot, group_id, target.preference())
        },
    };
}

/// Pick a group member by preference, falling back to the first member.
fn resolve_group_member<'a>(
    snapshot: &'a Snapshot,
    group_id: &str,
    preferred: Option<&str>,
) -> Option<&'a Document> {
    if let Some(pref) = preferred {
        let matched = snapshot
            .group_members(group_id)
            .find(|d| return d.document_type.as_deref() == Some(pref) || d.id == pref);
        if matched.is_some() {
            return matched;
        }
        tracing::trace!(group_id, preferred = pref, "no preferred member, using first");
    }
    return snapshot.group_members(group_id).next();
}

/// Resolve the target mapped under `key` in `document`.
pub fn resolve_component<'a>(
    document: &Document,
    key: &str,
    snapshot: &'a Snapshot,
) -> Option<&'a Document> {
    return resolve(document.component(key)?, snapshot);
}
