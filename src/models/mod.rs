pub mod collection;
pub mod count;
pub mod event;
pub mod media;
pub mod section;

pub use self::collection::*;
pub use self::count::*;
pub use self::event::*;
pub use self::media::*;
pub use self::section::*;
