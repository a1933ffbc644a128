//! Thread layer
//! - title.rs: Thread title parser (name and version extraction)
//! - url.rs: Thread URL reference and id derivation

pub mod title;
pub mod url;

pub use title::{ParsedTitle, TitleParseError, parse_title};
pub use url::{ThreadRef, ThreadUrlError, thread_id_from_url};
