//! 服务注册表
//!
//! 有序的描述符序列。插入顺序有意义：单值解析时同一服务的最后一个注册胜出，
//! 而装饰与组合需要处理全部注册。

use std::fmt;
use std::slice;
use std::sync::Arc;

use super::descriptor::{
    Construction, DescriptorSummary, Implementation, ServiceDescriptor, ServiceKey,
};
use super::lifetime::ServiceLifetime;
use super::provider::{Activate, Implements, ServiceResolver};
use crate::config::RewriteOptions;
use crate::errors::{RegistryError, ResolveError};

#[derive(Clone, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
    options: RewriteOptions,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RewriteOptions) -> Self {
        Self {
            descriptors: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RewriteOptions) {
        self.options = options;
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> slice::Iter<'_, ServiceDescriptor> {
        self.descriptors.iter()
    }

    pub fn all(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, index: usize) -> Option<&ServiceDescriptor> {
        self.descriptors.get(index)
    }

    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Removes the descriptor with the same identity; returns whether one was found.
    pub fn remove(&mut self, descriptor: &ServiceDescriptor) -> bool {
        match self.index_of(descriptor) {
            Some(index) => {
                self.descriptors.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, descriptor: &ServiceDescriptor) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|candidate| candidate.id() == descriptor.id())
    }

    /// Puts `descriptor` at `index`, returning the one it displaced.
    pub fn replace_at(
        &mut self,
        index: usize,
        descriptor: ServiceDescriptor,
    ) -> Option<ServiceDescriptor> {
        let slot = self.descriptors.get_mut(index)?;
        Some(std::mem::replace(slot, descriptor))
    }

    pub fn all_matching<'a>(
        &'a self,
        service: &'a ServiceKey,
    ) -> impl Iterator<Item = &'a ServiceDescriptor> + 'a {
        self.descriptors
            .iter()
            .filter(move |descriptor| descriptor.service() == *service)
    }

    pub fn descriptors_for(&self, service: &ServiceKey) -> Vec<ServiceDescriptor> {
        self.all_matching(service).cloned().collect()
    }

    /// 获取某服务的全部描述符，未注册时返回 `None`
    pub fn try_get_descriptors(&self, service: &ServiceKey) -> Option<Vec<ServiceDescriptor>> {
        let descriptors = self.descriptors_for(service);
        if descriptors.is_empty() {
            None
        } else {
            Some(descriptors)
        }
    }

    pub(crate) fn positions_of(&self, service: &ServiceKey) -> Vec<usize> {
        self.descriptors
            .iter()
            .enumerate()
            .filter(|(_, descriptor)| descriptor.service() == *service)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn contains_key(&self, service: &ServiceKey) -> bool {
        self.descriptors
            .iter()
            .any(|descriptor| descriptor.service() == *service)
    }

    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        self.contains_key(&ServiceKey::of::<S>())
    }

    pub fn snapshot(&self) -> Vec<DescriptorSummary> {
        self.descriptors.iter().map(ServiceDescriptor::summary).collect()
    }

    /// 交付给解析引擎
    pub fn into_descriptors(self) -> Vec<ServiceDescriptor> {
        self.descriptors
    }

    /// Logs the snapshot as JSON when `diagnostics.log_snapshots` is on.
    pub(crate) fn trace_snapshot(&self, operation: &str) {
        if !self.options.diagnostics.log_snapshots {
            return;
        }
        match serde_json::to_string(&self.snapshot()) {
            Ok(snapshot) => tracing::debug!(operation, %snapshot, "Registry snapshot"),
            Err(e) => tracing::warn!(operation, error = %e, "Failed to serialize registry snapshot"),
        }
    }

    // ===== 泛型注册 =====

    /// 以 `T` 作为服务 `S` 的实现注册
    pub fn add_type<S, T>(&mut self, lifetime: ServiceLifetime) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add(ServiceDescriptor::typed::<S, T>(lifetime))
    }

    /// 以自身类型注册 `T`
    pub fn add_self<T: Activate>(&mut self, lifetime: ServiceLifetime) -> &mut Self {
        self.add(ServiceDescriptor::concrete::<T>(lifetime))
    }

    pub fn add_singleton<S, T>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add_type::<S, T>(ServiceLifetime::Singleton)
    }

    pub fn add_scoped<S, T>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add_type::<S, T>(ServiceLifetime::Scoped)
    }

    pub fn add_transient<S, T>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add_type::<S, T>(ServiceLifetime::Transient)
    }

    pub fn add_factory<S, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> Result<Arc<S>, ResolveError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory::<S, F>(lifetime, factory))
    }

    /// 预构建实例，总是单例
    pub fn add_instance<S>(&mut self, value: Arc<S>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::instance::<S>(value))
    }

    /// Key-based registration; `implementation` must have been built for `service`.
    pub fn add_implementation(
        &mut self,
        service: ServiceKey,
        implementation: Implementation,
        lifetime: ServiceLifetime,
    ) -> Result<&mut Self, RegistryError> {
        if implementation.service() != service {
            let err = RegistryError::invalid_argument(format!(
                "implementation {} is exposed as {}, not {}",
                implementation.name(),
                implementation.service(),
                service
            ));
            err.log("add_implementation");
            return Err(err);
        }

        Ok(self.add(ServiceDescriptor::new(
            service,
            Construction::Type(implementation),
            lifetime,
        )))
    }
}

impl<'a> IntoIterator for &'a ServiceCollection {
    type Item = &'a ServiceDescriptor;
    type IntoIter = slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("descriptors", &self.descriptors)
            .field("options", &self.options)
            .finish()
    }
}
