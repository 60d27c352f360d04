pub mod append;
pub mod cat;
pub mod copy;
pub mod list;
pub mod remove;
pub mod stat;
pub mod truncate;

pub use append::append_command;
pub use cat::cat_command;
pub use copy::{cp_command, mv_command};
pub use list::list_command;
pub use remove::rm_command;
pub use stat::stat_command;
pub use truncate::truncate_command;
