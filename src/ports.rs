pub mod push;
pub mod store;
pub mod time;
