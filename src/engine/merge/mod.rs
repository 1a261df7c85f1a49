pub mod allowlist;
pub mod merger;
pub mod strategy;

pub use allowlist::AllowList;
pub use merger::{MergeOptions, MergeReport, Merger};
pub use strategy::{MergeMode, MergeStrategy, select_mode};

#[cfg(test)]
mod merger_test;
