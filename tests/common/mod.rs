//! 测试用的最小解析引擎
//!
//! Last registration wins, singletons are cached per provider tree, scoped
//! instances per scope (the root provider is a scope too), transients are
//! built on every resolve.

#![allow(dead_code)]

use dashmap::DashMap;
use diplus::{
    Arguments, DescriptorId, Implementation, Instance, ResolveError, ServiceCollection,
    ServiceDescriptor, ServiceKey, ServiceLifetime, ServiceResolver,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Registry {
    descriptors: Vec<ServiceDescriptor>,
    winners: HashMap<ServiceKey, usize>,
    singletons: DashMap<DescriptorId, Instance>,
}

pub struct TestProvider {
    registry: Arc<Registry>,
    scoped: DashMap<DescriptorId, Instance>,
}

impl TestProvider {
    pub fn build(services: ServiceCollection) -> Self {
        let descriptors = services.into_descriptors();
        let mut winners = HashMap::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            winners.insert(descriptor.service(), index);
        }

        Self {
            registry: Arc::new(Registry {
                descriptors,
                winners,
                singletons: DashMap::new(),
            }),
            scoped: DashMap::new(),
        }
    }

    pub fn create_scope(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            scoped: DashMap::new(),
        }
    }

    fn cached(
        &self,
        cache: &DashMap<DescriptorId, Instance>,
        descriptor: &ServiceDescriptor,
    ) -> Result<Instance, ResolveError> {
        if let Some(found) = cache.get(&descriptor.id()) {
            return Ok(found.value().clone());
        }
        // 构造期间不持有锁，工厂可能重入解析
        let created = descriptor.construction().resolve(self)?;
        Ok(cache
            .entry(descriptor.id())
            .or_insert(created)
            .value()
            .clone())
    }
}

impl ServiceResolver for TestProvider {
    fn resolve(&self, service: &ServiceKey) -> Result<Instance, ResolveError> {
        let index = self
            .registry
            .winners
            .get(service)
            .copied()
            .ok_or(ResolveError::NotRegistered {
                service: service.name(),
            })?;
        let descriptor = &self.registry.descriptors[index];

        match descriptor.lifetime() {
            ServiceLifetime::Singleton => self.cached(&self.registry.singletons, descriptor),
            ServiceLifetime::Scoped => self.cached(&self.scoped, descriptor),
            ServiceLifetime::Transient => descriptor.construction().resolve(self),
        }
    }

    fn activate(
        &self,
        implementation: &Implementation,
        arguments: Arguments,
    ) -> Result<Instance, ResolveError> {
        implementation.construct(arguments, self)
    }
}

/// 构造计数器，以字面量实例注册，由被测类型在激活时递增
#[derive(Debug, Default)]
pub struct Counter {
    created: AtomicUsize,
}

impl Counter {
    pub fn hit(&self) -> usize {
        self.created.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

/// 比较两个句柄是否指向同一对象，忽略视图类型
pub fn same_object<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

pub fn counted(services: &mut ServiceCollection) -> Arc<Counter> {
    let counter = Arc::new(Counter::default());
    services.add_instance::<Counter>(counter.clone());
    counter
}
