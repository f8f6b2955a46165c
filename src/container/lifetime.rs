use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::RegistryError;

/// 服务生命周期
///
/// 声明顺序即"窄度"顺序：`Singleton < Scoped < Transient`。
/// 合并多个注册时取最窄的一个，见 [`ServiceLifetime::most_specific`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// 单例 - 整个注册表生命周期只有一个实例
    Singleton,
    /// 作用域 - 在特定作用域内共享实例
    Scoped,
    /// 瞬态 - 每次请求都创建新实例
    Transient,
}

impl ServiceLifetime {
    pub const ALL: [ServiceLifetime; 3] = [
        ServiceLifetime::Singleton,
        ServiceLifetime::Scoped,
        ServiceLifetime::Transient,
    ];

    /// Returns the narrowest lifetime among `lifetimes`.
    ///
    /// A merged object cannot outlive the shortest-lived thing it holds, so any
    /// `Transient` wins, then any `Scoped`, otherwise `Singleton`. An empty
    /// input is rejected.
    pub fn most_specific<I>(lifetimes: I) -> Result<ServiceLifetime, RegistryError>
    where
        I: IntoIterator<Item = ServiceLifetime>,
    {
        lifetimes.into_iter().max().ok_or_else(|| {
            RegistryError::invalid_argument("cannot pick the most specific of zero lifetimes")
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLifetime::Singleton => "singleton",
            ServiceLifetime::Scoped => "scoped",
            ServiceLifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
