pub mod image;
pub mod mint;
pub mod rpc;
pub mod state;
pub mod storage;

pub use image::*;
pub use mint::*;
pub use rpc::*;
pub use state::*;
pub use storage::*;
