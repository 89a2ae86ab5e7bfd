pub mod user_list;

pub use user_list::{
    fetch_snapshot, refresh_and_wait, UserListActor, UserListArgs, UserListConfig, UserListMessage,
    UserListSnapshot, UserView,
};
