pub use peercall_core::model::PeerId;

pub mod model {
    pub use peercall_core::model::*;
}

pub mod codec {
    pub use peercall_core::utils::*;
    pub use peercall_core::{DecodeError, EncodeError, decode, encode};
}

#[cfg(feature = "client")]
pub mod client {
    pub use peercall_client::*;
}
