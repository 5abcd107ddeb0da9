pub mod jikan;
pub mod retry;
