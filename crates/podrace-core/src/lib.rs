pub mod config;
pub mod error;
pub mod io;
pub mod lifecycle;
pub mod markup;
pub mod paths;
pub mod reference;
pub mod store;
pub mod types;
pub mod view;

pub use error::{RaceError, Result, ServiceError};
