pub mod pool;
pub mod store;

pub use pool::{InitializePoolParams, Pool, PoolKey};
pub use store::{PoolRegistry, PoolStore};
