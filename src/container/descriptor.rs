//! 服务注册描述符

use serde::Serialize;
use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::lifetime::ServiceLifetime;
use super::provider::{Activate, Arguments, Implements, Instance, ServiceResolver};
use crate::errors::ResolveError;

/// 服务类型标识
///
/// Equality and hashing use the `TypeId` only; the name is kept for messages.
#[derive(Clone, Copy)]
pub struct ServiceKey {
    type_id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: type_name::<S>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 服务工厂
pub type ServiceFactory =
    Arc<dyn Fn(&dyn ServiceResolver) -> Result<Instance, ResolveError> + Send + Sync>;

type Constructor =
    Arc<dyn Fn(Arguments, &dyn ServiceResolver) -> Result<Instance, ResolveError> + Send + Sync>;

// Arc<T> 转为服务视图 Arc<S>
type View = Arc<dyn Fn(Instance) -> Result<Instance, ResolveError> + Send + Sync>;

/// 实现类型标识
///
/// Carries the implementation's own type, the service it is exposed as, and
/// the erased constructor the engine invokes through [`ServiceResolver::activate`].
#[derive(Clone)]
pub struct Implementation {
    ty: ServiceKey,
    service: ServiceKey,
    constructor: Constructor,
    view: View,
}

impl Implementation {
    /// `T` activated and exposed as service `S`
    pub fn of<S, T>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        Self {
            ty: ServiceKey::of::<T>(),
            service: ServiceKey::of::<S>(),
            constructor: Arc::new(
                |mut arguments: Arguments,
                 resolver: &dyn ServiceResolver|
                 -> Result<Instance, ResolveError> {
                    let value = T::activate(&mut arguments, resolver)?;
                    Ok(Instance::new(<T as Implements<S>>::upcast(Arc::new(value))))
                },
            ),
            view: Arc::new(|instance: Instance| -> Result<Instance, ResolveError> {
                let concrete = instance.require::<T>()?;
                Ok(Instance::new(<T as Implements<S>>::upcast(concrete)))
            }),
        }
    }

    /// `T` activated and exposed as itself
    pub fn concrete<T: Activate>() -> Self {
        Self {
            ty: ServiceKey::of::<T>(),
            service: ServiceKey::of::<T>(),
            constructor: Arc::new(
                |mut arguments: Arguments,
                 resolver: &dyn ServiceResolver|
                 -> Result<Instance, ResolveError> {
                    let value = T::activate(&mut arguments, resolver)?;
                    Ok(Instance::new(Arc::new(value)))
                },
            ),
            view: Arc::new(|instance: Instance| -> Result<Instance, ResolveError> {
                instance.require::<T>()?;
                Ok(instance)
            }),
        }
    }

    pub fn ty(&self) -> ServiceKey {
        self.ty
    }

    pub fn service(&self) -> ServiceKey {
        self.service
    }

    pub fn name(&self) -> &'static str {
        self.ty.name()
    }

    /// 执行构造；由解析引擎在 `activate` 中调用
    pub fn construct(
        &self,
        arguments: Arguments,
        resolver: &dyn ServiceResolver,
    ) -> Result<Instance, ResolveError> {
        (self.constructor)(arguments, resolver)
    }

    /// Re-exposes an instance of the implementation type as the service type.
    pub fn view(&self, instance: Instance) -> Result<Instance, ResolveError> {
        (self.view)(instance)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("ty", &self.ty)
            .field("service", &self.service)
            .finish()
    }
}

/// 构造策略，三者必居其一
#[derive(Clone)]
pub enum Construction {
    /// 预先构建的实例
    Literal(Instance),
    /// 工厂函数
    Factory(ServiceFactory),
    /// 由解析引擎激活的实现类型
    Type(Implementation),
}

impl Construction {
    pub fn kind(&self) -> ConstructionKind {
        match self {
            Construction::Literal(_) => ConstructionKind::Literal,
            Construction::Factory(_) => ConstructionKind::Factory,
            Construction::Type(_) => ConstructionKind::Type,
        }
    }

    /// Produces the instance this strategy describes.
    ///
    /// A literal is returned as-is on every call; the resolver is not consulted.
    pub fn resolve(&self, resolver: &dyn ServiceResolver) -> Result<Instance, ResolveError> {
        match self {
            Construction::Literal(instance) => Ok(instance.clone()),
            Construction::Factory(factory) => factory(resolver),
            Construction::Type(implementation) => {
                resolver.activate(implementation, Arguments::new())
            }
        }
    }

    /// Builds a wrapped original for a decorator or a composite.
    ///
    /// Unlike [`resolve`](Self::resolve), a type whose own key is registered is
    /// taken from the resolver, so a singleton `T` is shared with the wrapper.
    /// Otherwise the type is activated. A type exposed as itself is always
    /// activated: its key now points at the wrapper that is asking.
    pub fn get_or_create(&self, resolver: &dyn ServiceResolver) -> Result<Instance, ResolveError> {
        let Construction::Type(implementation) = self else {
            return self.resolve(resolver);
        };
        if implementation.ty() == implementation.service() {
            return resolver.activate(implementation, Arguments::new());
        }

        match resolver.resolve(&implementation.ty()) {
            Ok(existing) => implementation.view(existing),
            Err(ResolveError::NotRegistered { service }) if service == implementation.name() => {
                resolver.activate(implementation, Arguments::new())
            }
            Err(err) => Err(err),
        }
    }
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::Literal(instance) => f.debug_tuple("Literal").field(instance).finish(),
            Construction::Factory(_) => f.write_str("Factory(..)"),
            Construction::Type(implementation) => {
                f.debug_tuple("Type").field(implementation).finish()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructionKind {
    Literal,
    Factory,
    Type,
}

/// 描述符标识，进程内唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DescriptorId(u64);

impl DescriptorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DescriptorId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// 服务注册描述符
///
/// Cloning keeps the identity; every rewrite produces a descriptor with a
/// fresh [`DescriptorId`].
#[derive(Clone)]
pub struct ServiceDescriptor {
    id: DescriptorId,
    service: ServiceKey,
    construction: Construction,
    lifetime: ServiceLifetime,
}

impl ServiceDescriptor {
    pub(crate) fn new(
        service: ServiceKey,
        construction: Construction,
        lifetime: ServiceLifetime,
    ) -> Self {
        Self {
            id: DescriptorId::next(),
            service,
            construction,
            lifetime,
        }
    }

    /// 预构建实例，生命周期固定为单例
    pub fn instance<S>(value: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self::new(
            ServiceKey::of::<S>(),
            Construction::Literal(Instance::new(value)),
            ServiceLifetime::Singleton,
        )
    }

    pub fn factory<S, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> Result<Arc<S>, ResolveError> + Send + Sync + 'static,
    {
        let erased: ServiceFactory =
            Arc::new(move |resolver: &dyn ServiceResolver| factory(resolver).map(Instance::new));
        Self::new(ServiceKey::of::<S>(), Construction::Factory(erased), lifetime)
    }

    /// 类型擦除的工厂注册
    pub fn erased_factory(
        service: ServiceKey,
        factory: ServiceFactory,
        lifetime: ServiceLifetime,
    ) -> Self {
        Self::new(service, Construction::Factory(factory), lifetime)
    }

    pub fn typed<S, T>(lifetime: ServiceLifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        Self::new(
            ServiceKey::of::<S>(),
            Construction::Type(Implementation::of::<S, T>()),
            lifetime,
        )
    }

    pub fn concrete<T: Activate>(lifetime: ServiceLifetime) -> Self {
        Self::new(
            ServiceKey::of::<T>(),
            Construction::Type(Implementation::concrete::<T>()),
            lifetime,
        )
    }

    /// Same service and lifetime, new construction strategy and identity.
    pub fn with_factory(&self, factory: ServiceFactory) -> Self {
        Self::new(self.service, Construction::Factory(factory), self.lifetime)
    }

    pub fn id(&self) -> DescriptorId {
        self.id
    }

    pub fn service(&self) -> ServiceKey {
        self.service
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn implementation_name(&self) -> Option<&'static str> {
        match &self.construction {
            Construction::Type(implementation) => Some(implementation.name()),
            Construction::Literal(instance) => Some(instance.type_name()),
            Construction::Factory(_) => None,
        }
    }

    pub fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            id: self.id,
            service: self.service.name(),
            kind: self.construction.kind(),
            implementation: self.implementation_name(),
            lifetime: self.lifetime,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("id", &self.id.0)
            .field("service", &self.service.name())
            .field("construction", &self.construction)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// 描述符快照，用于比较与诊断输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSummary {
    pub id: DescriptorId,
    pub service: &'static str,
    pub kind: ConstructionKind,
    pub implementation: Option<&'static str>,
    pub lifetime: ServiceLifetime,
}
