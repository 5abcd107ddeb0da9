mod init;
mod list;
mod search;
mod user;

pub use init::cmd_init;
pub use list::cmd_list_favorites;
pub use search::cmd_search_catalog;
pub use user::{cmd_user_add, cmd_user_reset_api_key};
