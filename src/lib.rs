//! Resolution and composition of `{{key}}` component references.
//!
//! A composite document holds placeholders in its text and a `components`
//! map from key to target: a document id, or `group:<groupId>[:<type>]` for
//! a group member. [`walker::walk`] follows these recursively from a root,
//! applying a preset's overrides, and never enters a document twice on one
//! path. [`compose::compose`] flattens the same tree into text, and
//! [`placeholder::EditableContent`] round-trips text through an editable
//! form without ever changing what is stored.
//!
//! Everything in the resolution core works on a borrowed [`snapshot::Snapshot`]
//! and reports absence as `None` or as an omitted record. [`Error`] is only
//! produced where files are read or edited.

pub mod complete;
pub mod compose;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod keys;
pub mod namespace;
pub mod placeholder;
pub mod preset;
pub mod resolver;
pub mod scanner;
pub mod snapshot;
pub mod types;
pub mod walker;

pub use error::Error;
