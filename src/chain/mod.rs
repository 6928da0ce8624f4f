pub mod contract;

pub use contract::{decode_mint, encode_mint, NftContract};
