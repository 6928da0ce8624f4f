pub mod json_rpc;
pub mod traits;

pub use json_rpc::{spawn_account_watcher, JsonRpcWallet};
pub use traits::Wallet;
