pub mod channel;
pub mod data_file_type;
pub mod error;
pub mod record;
pub mod revision;
pub mod text_encoding;

pub use channel::*;
pub use data_file_type::*;
pub use error::*;
pub use record::*;
pub use revision::*;
pub use text_encoding::*;
