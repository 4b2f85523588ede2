// gateway/src/utils/mod.rs
pub mod token;
