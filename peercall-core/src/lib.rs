mod codec;
pub mod model;
pub mod utils;

pub use codec::{DecodeError, EncodeError, decode, encode};
pub use model::*;
