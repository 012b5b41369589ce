//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;
pub(crate) mod instance_cache;

pub use circular::ResolutionStack;
pub(crate) use circular::{StackGuard, DEFAULT_MAX_DEPTH};
pub use dispose_bag::BoxFutureUnit;
pub(crate) use dispose_bag::DisposeBag;
pub(crate) use instance_cache::InstanceCache;
