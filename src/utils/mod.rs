pub mod schema;
pub mod transliterate;

pub use self::schema::*;
pub use self::transliterate::*;
