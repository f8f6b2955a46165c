//! Registry rewrites
//!
//! `decorate`, `compose` and `forward` are inherent methods on
//! [`ServiceCollection`](crate::container::ServiceCollection). They run at
//! configuration time and either complete the rewrite or leave the collection
//! untouched.

mod composite;
mod decorator;
mod forwarding;
