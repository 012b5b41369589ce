//! Core traits for resolution and disposal.

pub mod dispose;
pub mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};
