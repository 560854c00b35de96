#![forbid(unsafe_code)]

pub mod apply;
pub mod cli;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod migrate;
pub mod normalize;
pub mod util;
pub mod validate;

pub use cli::run_from_env;
pub use error::{DoctorError, Result};
