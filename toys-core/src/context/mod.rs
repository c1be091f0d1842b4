//! Context Propagation
//!
//! Tree-scoped values resolved by walking up from the consuming element,
//! crossing shadow-root boundaries through their hosts.
//!
//! A [`Context`] holds a static default and the entries of the elements
//! currently providing it. A consumer resolves the nearest entry each time
//! it connects, so moving it under a different provider takes effect on the
//! next connection rather than immediately.
//!
//! [`StoreContext`] layers a shared, watchable [`Store`] on top: the provider
//! hands a store down, consumers mirror it into signals while connected.

mod provider;
mod store;

pub use provider::{create_context, Context, ContextId};
pub use store::{
    create_store_context, Merge, Record, Store, StoreContext, StoreProviderProps, WatchHandle,
};
