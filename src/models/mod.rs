pub mod enums;
pub mod snippet;
pub mod classification;
pub mod strategy;

pub use enums::*;
pub use snippet::*;
pub use classification::*;
pub use strategy::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
