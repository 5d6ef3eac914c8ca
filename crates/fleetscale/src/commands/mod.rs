pub mod bench;
pub mod ping;
pub mod provision;
pub mod teardown;
