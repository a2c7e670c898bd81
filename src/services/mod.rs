#[cfg(test)]
pub mod memory;
pub mod revalidate;
pub mod storage;
pub mod store;

pub use self::revalidate::*;
pub use self::storage::*;
pub use self::store::*;
