pub mod dispatch;
pub mod errors;
pub mod merge;
pub mod plan;
pub mod schema;
pub mod store;
pub mod verify;

#[cfg(test)]
pub mod testutil;
