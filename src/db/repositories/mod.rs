pub mod favorite;
pub mod user;
