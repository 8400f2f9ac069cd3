//! Recursive composition walk: every placeholder reachable from a root
//! document, resolved through groups and preset overrides.
//!
//! Cycle safety comes from a visited set threaded explicitly through the
//! recursion. Each branch extends its own copy, so a document is never
//! entered twice along one path, while siblings under a common ancestor
//! are explored independently.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::namespace::{self, NamespacedKey};
use crate::resolver;
use crate::scanner;
use crate::snapshot::Snapshot;
use crate::types::{Document, OverrideMap, ResolutionRecord};

/// Ancestors of the document currently being walked.
type Visited<'a> = HashSet<&'a str>;

/// Something the walk skipped without producing a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Recursion stopped because the target is already on the current path.
    Cycle {
        /// The placeholder key.
        key: String,
        /// Document containing the placeholder.
        source: String,
        /// The ancestor the placeholder points back to.
        target: String,
    },
    /// An override names a document absent from the snapshot.
    MissingOverride {
        /// The placeholder key.
        key: String,
        /// Document containing the placeholder.
        source: String,
        /// The override's document id.
        target: String,
    },
    /// The mapping names a document or group that resolves to nothing.
    MissingTarget {
        /// The placeholder key.
        key: String,
        /// Document containing the placeholder.
        source: String,
        /// The target encoding that failed to resolve.
        target: String,
    },
    /// A placeholder with no entry in the source's `components`.
    Unmapped {
        /// The unmapped key.
        key: String,
        /// Document containing the placeholder.
        source: String,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Cycle { key, source, target } => {
                write!(f, "{source}: `{key}` leads back to `{target}`")
            },
            Self::MissingOverride { key, source, target } => {
                write!(f, "{source}: override for `{key}` names missing document `{target}`")
            },
            Self::MissingTarget { key, source, target } => {
                write!(f, "{source}: `{key}` points at `{target}`, which resolves to nothing")
            },
            Self::Unmapped { key, source } => write!(f, "{source}: `{key}` is not mapped"),
        };
    }
}

/// One event of the traversal, in depth-first occurrence order.
enum Step {
    /// A placeholder resolved to a record.
    Resolved(ResolutionRecord),
    /// A placeholder or recursion the walk skipped.
    Skipped(Finding),
}

/// Read-only inputs shared by every level of one walk.
struct Walk<'a> {
    /// Preset overrides, if a preset is being edited.
    overrides: Option<&'a OverrideMap>,
    /// Documents being resolved against.
    snapshot: &'a Snapshot,
    /// Output, appended in depth-first order.
    steps: Vec<Step>,
}

impl<'a> Walk<'a> {
    /// Walk one document given the ancestors on the current path.
    fn enter(&mut self, doc: &'a Document, ancestors: &Visited<'a>) {
        if ancestors.contains(doc.id.as_str()) {
            return;
        }
        let mut visited = ancestors.clone();
        visited.insert(doc.id.as_str());

        if !doc.is_composite || doc.components.is_none() {
            return;
        }

        for occurrence in scanner::scan_all(&doc.content) {
            self.visit_placeholder(doc, &occurrence.key, &visited);
        }
    }

    /// The override document for a placeholder, if an override applies and
    /// names a document that exists.
    fn override_for(
        &mut self,
        doc: &Document,
        key: &str,
        namespaced_key: &str,
    ) -> Option<&'a Document> {
        let id = namespace::effective_target(namespaced_key, key, self.overrides)?;
        let found = self.snapshot.get(id);
        if found.is_none() {
            self.skip(Finding::MissingOverride {
                key: key.to_string(),
                source: doc.id.clone(),
                target: id.to_string(),
            });
        }
        return found;
    }

    /// Record a skipped placeholder.
    fn skip(&mut self, finding: Finding) {
        tracing::trace!(?finding, "skipped");
        self.steps.push(Step::Skipped(finding));
    }

    /// Resolve one placeholder of `doc`, record it, and recurse into its
    /// original target.
    fn visit_placeholder(&mut self, doc: &'a Document, key: &str, visited: &Visited<'a>) {
        let Some(target) = doc.component(key) else {
            self.skip(Finding::Unmapped {
                key: key.to_string(),
                source: doc.id.clone(),
            });
            return;
        };

        let Some(original) = resolver::resolve(target, self.snapshot) else {
            self.skip(Finding::MissingTarget {
                key: key.to_string(),
                source: doc.id.clone(),
                target: target.to_string(),
            });
            return;
        };

        let namespaced_key = NamespacedKey::new(&doc.id, key).to_string();
        let override_doc = self.override_for(doc, key, &namespaced_key);

        tracing::trace!(
            source = %doc.id,
            key,
            target = %original.id,
            overridden = override_doc.is_some(),
            "resolved placeholder"
        );
        self.steps.push(Step::Resolved(ResolutionRecord {
            namespaced_key,
            original_target_document_id: original.id.clone(),
            original_target_document_title: original.title.clone(),
            override_target_document_id: override_doc.map(|d| return d.id.clone()),
            override_target_document_title: override_doc.map(|d| return d.title.clone()),
            placeholder_key: key.to_string(),
            source_document_id: doc.id.clone(),
            source_document_title: doc.title.clone(),
        }));

        // Overrides substitute for display only; recursion follows the mapping.
        if !original.is_composite {
            return;
        }
        if visited.contains(original.id.as_str()) {
            self.skip(Finding::Cycle {
                key: key.to_string(),
                source: doc.id.clone(),
                target: original.id.clone(),
            });
            return;
        }
        self.enter(original, visited);
    }
}

/// Everything [`walk`] silently skipped from `root_id`, in the same order.
pub fn audit(root_id: &str, snapshot: &Snapshot, overrides: Option<&OverrideMap>) -> Vec<Finding> {
    return traverse(root_id, snapshot, overrides)
        .into_iter()
        .filter_map(|step| {
            return match step {
                Step::Resolved(_) => None,
                Step::Skipped(finding) => Some(finding),
            };
        })
        .collect();
}

/// Starting points that together reach every composite document.
///
/// These are the [`roots`], then, in snapshot order, each composite none of
/// the earlier starting points reaches. The second kind only exists where
/// composites reference each other in a cycle nothing outside points into.
pub fn audit_roots(snapshot: &Snapshot) -> Vec<&Document> {
    let mut starts = roots(snapshot);
    let mut reached: HashSet<&str> = HashSet::new();
    for start in &starts {
        mark_reached(start, snapshot, &mut reached);
    }

    for doc in snapshot.documents().iter().filter(|d| return d.is_composite) {
        if reached.contains(doc.id.as_str()) {
            continue;
        }
        tracing::debug!(id = %doc.id, "composite unreachable from any root");
        mark_reached(doc, snapshot, &mut reached);
        starts.push(doc);
    }
    return starts;
}

/// Add `start` and every document a walk from it resolves to.
fn mark_reached<'a>(start: &'a Document, snapshot: &'a Snapshot, reached: &mut HashSet<&'a str>) {
    reached.insert(start.id.as_str());
    for record in walk(&start.id, snapshot, None) {
        if let Some(doc) = snapshot.get(&record.original_target_document_id) {
            reached.insert(doc.id.as_str());
        }
    }
}

/// The document an editor should show for one placeholder: the override
/// when one applies and exists, otherwise the mapped target. Keys missing
/// from the source's `components` resolve to nothing, overrides or not.
pub fn resolve_key<'a>(
    source_id: &str,
    key: &str,
    snapshot: &'a Snapshot,
    overrides: Option<&OverrideMap>,
) -> Option<&'a Document> {
    let target = snapshot.get(source_id)?.component(key)?;
    let namespaced = NamespacedKey::new(source_id, key).to_string();
    let overridden = namespace::effective_target(&namespaced, key, overrides)
        .and_then(|id| return snapshot.get(id));
    return overridden.or_else(|| return resolver::resolve(target, snapshot));
}

/// Composite documents no other document's mapping resolves to. These are
/// the natural starting points for walking a whole snapshot.
pub fn roots(snapshot: &Snapshot) -> Vec<&Document> {
    let referenced: HashSet<&str> = snapshot
        .documents()
        .iter()
        .filter(|d| return d.is_composite)
        .flat_map(|d| return d.components.iter().flat_map(|c| return c.values()))
        .filter_map(|target| return resolver::resolve(target, snapshot))
        .map(|d| return d.id.as_str())
        .collect();

    return snapshot
        .documents()
        .iter()
        .filter(|d| return d.is_composite && !referenced.contains(d.id.as_str()))
        .collect();
}

/// Run the traversal from `root_id` and collect every step.
fn traverse(root_id: &str, snapshot: &Snapshot, overrides: Option<&OverrideMap>) -> Vec<Step> {
    let Some(root) = snapshot.get(root_id) else {
        tracing::debug!(root_id, "walk root not in snapshot");
        return Vec::new();
    };
    let mut walk = Walk {
        overrides,
        snapshot,
        steps: Vec::new(),
    };
    walk.enter(root, &Visited::new());
    tracing::debug!(root_id, steps = walk.steps.len(), "walk finished");
    return walk.steps;
}

/// Resolution records for every placeholder reachable from `root_id`, in
/// depth-first order matching placeholder order in each document's content.
///
/// Missing documents, empty groups, and unmapped keys are omitted rather
/// than reported; see [`audit`] for those. An unknown root yields nothing.
pub fn walk(
    root_id: &str,
    snapshot: &Snapshot,
    overrides: Option<&OverrideMap>,
) -> Vec<ResolutionRecord> {
    return traverse(root_id, snapshot, overrides)
        .into_iter()
        .filter_map(|step| {
            return match step {
                Step::Resolved(record) => Some(record),
                Step::Skipped(_) => None,
            };
        })
        .collect();
}
