use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    sync::Arc,
};

use crate::rendering::{
    bindable::{Bindable, BindableKind, IndexBuffer},
    error::GraphicsError,
};

/// The bindables shared by every instance of one shape type.
///
/// The index buffer is part of `binds` (so it is bound with the rest) and is also
/// kept as a distinguished field so instances can read its element count.
pub struct StaticBinds {
    binds: Vec<Arc<dyn Bindable>>,
    index_buffer: Arc<IndexBuffer>,
}

impl StaticBinds {
    pub fn binds(&self) -> &[Arc<dyn Bindable>] {
        &self.binds
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.count()
    }
}

#[cfg(test)]
impl StaticBinds {
    pub fn count_of(&self, kind: BindableKind) -> usize {
        self.binds.iter().filter(|bind| bind.kind() == kind).count()
    }
}

#[derive(Default)]
pub struct StaticBindsBuilder {
    binds: Vec<Arc<dyn Bindable>>,
    index_buffer: Option<Arc<IndexBuffer>>,
}

impl StaticBindsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shared bindable. Index buffers must go through `add_index_buffer`.
    pub fn add_static_bind(&mut self, bind: impl Bindable + 'static) {
        debug_assert!(
            bind.kind() != BindableKind::IndexBuffer,
            "Index buffers must be added with add_index_buffer"
        );
        self.binds.push(Arc::new(bind));
    }

    pub fn add_index_buffer(&mut self, index_buffer: IndexBuffer) {
        debug_assert!(
            self.index_buffer.is_none(),
            "Attempting to add an index buffer a second time"
        );
        let index_buffer = Arc::new(index_buffer);
        self.binds.push(index_buffer.clone());
        self.index_buffer = Some(index_buffer);
    }

    pub fn build(self, shape: &'static str) -> Result<StaticBinds, GraphicsError> {
        let index_buffer = self
            .index_buffer
            .ok_or(GraphicsError::MissingIndexBuffer { shape })?;

        Ok(StaticBinds {
            binds: self.binds,
            index_buffer,
        })
    }
}

/// Shared bindable pools, one per shape type.
///
/// A pool is built at most once per type: the first instance runs the
/// initializer, later instances get the same `Arc`. Access goes through
/// `&mut self`, so a cache shared between threads has to sit behind a lock,
/// which also keeps initialization one-time.
#[derive(Default)]
pub struct BindableCache {
    pools: HashMap<TypeId, Arc<StaticBinds>>,
}

impl BindableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pool for `T`, building it with `init` if this is the first request.
    ///
    /// If `init` fails nothing is stored and the next request tries again.
    pub fn get_or_try_init<T, F>(&mut self, init: F) -> Result<Arc<StaticBinds>, GraphicsError>
    where
        T: 'static,
        F: FnOnce(&mut StaticBindsBuilder) -> Result<(), GraphicsError>,
    {
        if let Some(pool) = self.pools.get(&TypeId::of::<T>()) {
            return Ok(pool.clone());
        }

        let shape = type_name::<T>();
        let mut builder = StaticBindsBuilder::new();
        init(&mut builder)?;
        let pool = Arc::new(builder.build(shape)?);

        log::debug!(
            "Created static binds for {} ({} bindables, {} indices)",
            shape,
            pool.binds().len(),
            pool.index_count()
        );

        self.pools.insert(TypeId::of::<T>(), pool.clone());
        Ok(pool)
    }

    /// Drops every pool. Instances that still hold one keep it alive, and the next
    /// request for a type builds a fresh pool.
    pub fn clear_all(&mut self) {
        self.pools.clear();
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }
}

#[cfg(test)]
impl BindableCache {
    pub fn is_initialized<T: 'static>(&self) -> bool {
        self.pools.contains_key(&TypeId::of::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::{
        bindable::Topology,
        context::PrimitiveTopology,
        error::ErrorCode,
        headless::HeadlessContext,
    };

    struct ShapeA;
    struct ShapeB;

    fn init_pool(
        gfx: &mut HeadlessContext,
        builder: &mut StaticBindsBuilder,
    ) -> Result<(), GraphicsError> {
        builder.add_index_buffer(IndexBuffer::new(gfx, "indices", &[0, 1, 2])?);
        builder.add_static_bind(Topology::new(PrimitiveTopology::TriangleList));
        Ok(())
    }

    #[test]
    fn pool_is_built_once_per_type() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();
        let mut runs = 0;

        for _ in 0..3 {
            cache
                .get_or_try_init::<ShapeA, _>(|builder| {
                    runs += 1;
                    init_pool(&mut gfx, builder)
                })
                .unwrap();
        }

        assert_eq!(runs, 1);
        assert_eq!(gfx.counts().index_buffers, 1);
        assert!(cache.is_initialized::<ShapeA>());
        assert!(!cache.is_initialized::<ShapeB>());
    }

    #[test]
    fn pools_are_separate_per_type() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();

        let a = cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();
        let b = cache
            .get_or_try_init::<ShapeB, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
        assert_eq!(gfx.counts().index_buffers, 2);
    }

    #[test]
    fn index_buffer_is_bound_with_the_rest() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();

        let pool = cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();

        assert_eq!(pool.index_count(), 3);
        assert_eq!(pool.count_of(BindableKind::IndexBuffer), 1);
        assert_eq!(pool.count_of(BindableKind::Topology), 1);
    }

    #[test]
    fn pool_without_index_buffer_is_an_error() {
        let mut cache = BindableCache::new();

        let result = cache.get_or_try_init::<ShapeA, _>(|builder| {
            builder.add_static_bind(Topology::new(PrimitiveTopology::TriangleList));
            Ok(())
        });

        assert!(matches!(result, Err(GraphicsError::MissingIndexBuffer { .. })));
        assert!(!cache.is_initialized::<ShapeA>());
    }

    #[test]
    fn failed_init_is_retried() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();

        gfx.fail_next_creation(ErrorCode::OutOfMemory);
        assert!(cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .is_err());
        assert!(!cache.is_initialized::<ShapeA>());

        assert!(cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .is_ok());
    }

    #[test]
    fn clearing_forces_a_rebuild() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();

        let first = cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();
        cache.clear_all();
        let second = cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.index_count(), 3);
        assert_eq!(gfx.counts().index_buffers, 2);
    }

    #[test]
    fn clear_all_drops_every_pool() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();

        cache
            .get_or_try_init::<ShapeA, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();
        cache
            .get_or_try_init::<ShapeB, _>(|builder| init_pool(&mut gfx, builder))
            .unwrap();
        cache.clear_all();

        assert_eq!(cache.len(), 0);
        assert!(!cache.is_initialized::<ShapeA>());
        assert!(!cache.is_initialized::<ShapeB>());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "second time")]
    fn second_index_buffer_is_rejected() {
        let mut gfx = HeadlessContext::new();
        let mut builder = StaticBindsBuilder::new();

        builder.add_index_buffer(IndexBuffer::new(&mut gfx, "first", &[0, 1, 2]).unwrap());
        builder.add_index_buffer(IndexBuffer::new(&mut gfx, "second", &[0, 1, 2]).unwrap());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "add_index_buffer")]
    fn index_buffer_through_generic_path_is_rejected() {
        let mut gfx = HeadlessContext::new();
        let mut builder = StaticBindsBuilder::new();

        builder.add_static_bind(IndexBuffer::new(&mut gfx, "indices", &[0, 1, 2]).unwrap());
    }
}
