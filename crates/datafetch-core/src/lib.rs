pub mod config;
pub mod logging;

pub mod archive;
pub mod cancel;
pub mod checksum;
pub mod error;
pub mod fetcher;
pub mod location;
pub mod probe;
pub mod request;
pub mod retry;
pub mod storage;
pub mod transport;

pub use cancel::CancelToken;
pub use error::{Error, ExtractError, ExtractErrorKind, FetchError, FetchErrorKind, NotFoundError};
pub use fetcher::{Download, Fetcher};
pub use location::ResourceLocation;
pub use request::{FetchRequest, LocalFile};
