pub mod check_store;
pub mod config_cmd;
pub mod serve;
