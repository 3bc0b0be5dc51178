pub mod handle;
pub mod profiles;
