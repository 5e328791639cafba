pub mod credentials;

pub use credentials::{DepositCredentials, STORED_PASSWORD_SENTINEL, mask_secret};
