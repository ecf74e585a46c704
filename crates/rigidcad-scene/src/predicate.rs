//! Inclusion predicates for traversal.
//!
//! A predicate decides whether an entity takes part in a traversal. For a
//! group, rejection prunes the group's whole subtree. Predicates must not
//! have side effects.

use crate::Entity;

/// Tag marking entities that carry no physical geometry.
pub const IGNORE_TAG: &str = "ignore";

/// Accept every entity.
pub fn include_all(_: &Entity) -> bool {
    true
}

/// Accept visible entities that are not tagged [`IGNORE_TAG`].
pub fn physical(entity: &Entity) -> bool {
    !entity.hidden && !entity.has_tag(IGNORE_TAG)
}

/// Accept entities that do not carry `tag`.
pub fn without_tag(tag: &str) -> impl Fn(&Entity) -> bool + '_ {
    move |entity| !entity.has_tag(tag)
}
