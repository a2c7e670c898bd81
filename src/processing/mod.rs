pub mod list_manager;
pub mod section_binder;
pub mod sitemap_processing;
pub mod upload_processing;

pub use self::list_manager::*;
pub use self::section_binder::*;
pub use self::sitemap_processing::*;
pub use self::upload_processing::*;
