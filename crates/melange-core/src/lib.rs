pub mod acceptance;
pub mod accounts;
pub mod cleaning;
pub mod comment;
pub mod config;
pub mod dicts;
pub mod duplicates;
pub mod error;
pub mod feed;
pub mod io;
pub mod notification;
pub mod organization;
pub mod paths;
pub mod phase;
pub mod profile;
pub mod program;
pub mod proposal;
pub mod ranking;
pub mod request;
pub mod slots;
pub mod store;
pub mod system;
pub mod task;
pub mod timeline;
pub mod types;
pub mod user;
pub mod validate;

pub use error::{MelangeError, Result, ValidationError};
