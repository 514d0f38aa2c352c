pub mod admin;
pub mod chats;
pub mod comments;
pub mod passwords;
pub mod posts;
pub mod reactions;
pub mod users;
