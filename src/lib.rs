mod args;
pub mod checkout;
pub mod clone;
mod cmd;
pub mod config;
mod error;
pub mod git_object;
pub mod git_protocol;
mod hash;
pub mod store;

use args::Args;
pub use cmd::Command;
pub use error::Error;
pub use hash::{Sha1Hash, SHA1_HASH_SIZE};
pub use store::ObjectStore;
pub type Result<T> = std::result::Result<T, Error>;
