//! Boundary to the physics engine that owns the actual shapes.
//!
//! The engine only ever receives validated descriptors and hands back an
//! opaque handle. Compounds are assembled from transient per-part handles
//! held in a [`HandleArena`], which destroys them on every exit path.

use std::fmt::Debug;

use rigidcad_math::Transform;

use crate::error::Result;
use crate::shape::ShapeDescriptor;

/// A shape factory owning the shapes it creates.
pub trait CollisionEngine {
    /// Opaque shape handle.
    type Handle: Copy + Eq + Debug;

    /// Create a shape from a descriptor.
    ///
    /// [`ShapeDescriptor::Compound`] is never passed here; compounds go
    /// through [`CollisionEngine::create_compound`].
    fn create_shape(&mut self, descriptor: &ShapeDescriptor) -> Result<Self::Handle>;

    /// Create one shape aggregating `parts`.
    ///
    /// The new shape copies what it needs; `parts` stay owned by the caller.
    fn create_compound(
        &mut self,
        parts: &[Self::Handle],
        offset: Option<&Transform>,
    ) -> Result<Self::Handle>;

    /// Release a shape.
    fn destroy(&mut self, handle: Self::Handle);
}

/// Transient engine handles released when the arena is dropped.
pub struct HandleArena<'e, E: CollisionEngine> {
    engine: &'e mut E,
    handles: Vec<E::Handle>,
}

impl<'e, E: CollisionEngine> HandleArena<'e, E> {
    /// Start an empty arena over `engine`.
    pub fn new(engine: &'e mut E) -> Self {
        Self {
            engine,
            handles: Vec::new(),
        }
    }

    /// Create a transient shape owned by the arena.
    pub fn create(&mut self, descriptor: &ShapeDescriptor) -> Result<E::Handle> {
        let handle = self.engine.create_shape(descriptor)?;
        self.handles.push(handle);
        Ok(handle)
    }

    /// Number of live transient shapes.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the arena holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Aggregate every transient shape into a compound the caller owns.
    pub fn assemble(&mut self, offset: Option<&Transform>) -> Result<E::Handle> {
        self.engine.create_compound(&self.handles, offset)
    }
}

impl<E: CollisionEngine> Drop for HandleArena<'_, E> {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            self.engine.destroy(handle);
        }
    }
}

/// Hand a descriptor to the engine.
pub fn realize<E: CollisionEngine>(
    engine: &mut E,
    descriptor: &ShapeDescriptor,
) -> Result<E::Handle> {
    match descriptor {
        ShapeDescriptor::Compound(compound) => {
            let mut arena = HandleArena::new(engine);
            for part in &compound.parts {
                arena.create(&ShapeDescriptor::ConvexHull(part.clone()))?;
            }
            let handle = arena.assemble(compound.offset.as_ref())?;
            log::debug!("assembled compound from {} transient hulls", arena.len());
            Ok(handle)
        }
        other => {
            log::debug!("creating {} shape", other.kind());
            engine.create_shape(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollisionError;
    use crate::shape::{Compound, ConvexHull};
    use rigidcad_math::Point3;

    /// Counts live handles and can be told to fail.
    #[derive(Default)]
    struct Recorder {
        next: u32,
        live: Vec<u32>,
        fail_on_create: Option<u32>,
        fail_compound: bool,
    }

    impl CollisionEngine for Recorder {
        type Handle = u32;

        fn create_shape(&mut self, _: &ShapeDescriptor) -> Result<u32> {
            if self.fail_on_create == Some(self.next) {
                return Err(CollisionError::Engine("refused".into()));
            }
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn create_compound(&mut self, parts: &[u32], _: Option<&Transform>) -> Result<u32> {
            if self.fail_compound || parts.is_empty() {
                return Err(CollisionError::Engine("compound refused".into()));
            }
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn destroy(&mut self, handle: u32) {
            self.live.retain(|&h| h != handle);
        }
    }

    fn hull() -> ConvexHull {
        ConvexHull {
            points: vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            offset: None,
        }
    }

    fn compound(parts: usize) -> ShapeDescriptor {
        ShapeDescriptor::Compound(Compound {
            parts: vec![hull(); parts],
            offset: None,
        })
    }

    #[test]
    fn test_compound_releases_transient_parts() {
        let mut engine = Recorder::default();
        let handle = realize(&mut engine, &compound(3)).unwrap();
        assert_eq!(engine.live, vec![handle]);
    }

    #[test]
    fn test_failed_part_releases_earlier_parts() {
        let mut engine = Recorder {
            fail_on_create: Some(2),
            ..Recorder::default()
        };
        let err = realize(&mut engine, &compound(4)).unwrap_err();
        assert_eq!(err, CollisionError::Engine("refused".into()));
        assert!(engine.live.is_empty());
    }

    #[test]
    fn test_failed_assembly_releases_parts() {
        let mut engine = Recorder {
            fail_compound: true,
            ..Recorder::default()
        };
        assert!(realize(&mut engine, &compound(2)).is_err());
        assert!(engine.live.is_empty());
    }

    #[test]
    fn test_direct_shapes_are_kept() {
        let mut engine = Recorder::default();
        let h = realize(&mut engine, &ShapeDescriptor::ConvexHull(hull())).unwrap();
        assert_eq!(engine.live, vec![h]);
    }

    #[test]
    fn test_arena_drop_without_assembly() {
        let mut engine = Recorder::default();
        {
            let mut arena = HandleArena::new(&mut engine);
            arena.create(&ShapeDescriptor::Null).unwrap();
            arena.create(&ShapeDescriptor::Null).unwrap();
            assert_eq!(arena.len(), 2);
        }
        assert!(engine.live.is_empty());
    }
}
