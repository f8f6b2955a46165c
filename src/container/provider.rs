//! 解析引擎接口
//!
//! 注册表改写只负责生成描述符；实例的解析、缓存与激活由外部引擎完成。
//! 这里定义引擎需要实现的能力接口，以及工厂闭包与引擎之间传递的类型擦除值。

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use super::descriptor::{Implementation, ServiceKey};
use crate::errors::ResolveError;

/// 类型擦除的服务实例
///
/// 内部保存一个 `Arc<S>`，`S` 是注册时的服务类型（通常是 `dyn Trait`）。
/// 克隆只增加引用计数，不会复制对象。
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    address: usize,
}

impl Instance {
    pub fn new<S>(service: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let address = Arc::as_ptr(&service) as *const () as usize;
        Self {
            value: Arc::new(service),
            type_name: type_name::<S>(),
            address,
        }
    }

    /// 转换回 `Arc<S>`，类型不符时返回 `None`
    pub fn downcast<S>(&self) -> Option<Arc<S>>
    where
        S: ?Sized + 'static,
    {
        self.value.downcast_ref::<Arc<S>>().cloned()
    }

    pub fn require<S>(&self) -> Result<Arc<S>, ResolveError>
    where
        S: ?Sized + 'static,
    {
        self.downcast::<S>().ok_or(ResolveError::TypeCastFailed {
            expected: type_name::<S>(),
            actual: self.type_name,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles point at the same underlying object, even when they
    /// expose it through different service types.
    pub fn same_object(&self, other: &Instance) -> bool {
        self.address == other.address
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("address", &format_args!("{:#x}", self.address))
            .finish()
    }
}

/// 额外构造参数
///
/// 按类型查找：激活时取出第一个类型匹配的值，其余依赖由解析器提供。
#[derive(Default)]
pub struct Arguments {
    values: Vec<(&'static str, Box<dyn Any + Send>)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Any + Send>(&mut self, value: T) {
        self.values.push((type_name::<T>(), Box::new(value)));
    }

    pub fn take<T: Any>(&mut self) -> Option<T> {
        let position = self.values.iter().position(|(_, value)| value.is::<T>())?;
        let (_, value) = self.values.remove(position);
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn require<T: Any>(&mut self) -> Result<T, ResolveError> {
        self.take::<T>().ok_or(ResolveError::MissingArgument {
            argument: type_name::<T>(),
        })
    }

    /// 装饰器构造参数：被包装的原始实例
    pub fn decorated<S>(&mut self) -> Result<Arc<S>, ResolveError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.require::<Arc<S>>()
    }

    /// 组合构造参数：按注册顺序排列的全部原始实例
    pub fn components<S>(&mut self) -> Result<Vec<Arc<S>>, ResolveError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.require::<Vec<Arc<S>>>()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|(name, _)| name))
            .finish()
    }
}

/// 解析引擎能力接口
///
/// Implemented by the external resolution engine. Factories built by the
/// registry rewrites only ever call these two methods and never touch the
/// registry itself, so the engine may invoke them concurrently.
pub trait ServiceResolver: Send + Sync {
    /// Resolves the winning registration for `service`.
    fn resolve(&self, service: &ServiceKey) -> Result<Instance, ResolveError>;

    /// Constructs `implementation`, handing it `arguments` ahead of the
    /// dependencies the engine supplies itself.
    fn activate(
        &self,
        implementation: &Implementation,
        arguments: Arguments,
    ) -> Result<Instance, ResolveError>;
}

/// 类型化的便捷解析方法
pub trait ResolverExt: ServiceResolver {
    fn get<S>(&self) -> Result<Arc<S>, ResolveError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve(&ServiceKey::of::<S>())?.require::<S>()
    }
}

impl<R: ServiceResolver + ?Sized> ResolverExt for R {}

/// 可被激活的实现类型
///
/// Stands in for constructor reflection: the implementation pulls the extra
/// arguments it expects out of `arguments` and asks `resolver` for the rest.
pub trait Activate: Sized + Send + Sync + 'static {
    fn activate(arguments: &mut Arguments, resolver: &dyn ServiceResolver)
        -> Result<Self, ResolveError>;
}

/// `Self` 可以作为服务 `S` 暴露
pub trait Implements<S: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 声明实现类型可以作为哪些 trait 对象服务暴露
///
/// ```ignore
/// implements!(FileStore: dyn Reader, dyn Writer);
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty : $($service:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$service> for $ty {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}
