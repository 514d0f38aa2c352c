pub mod chat;
pub mod engagement;
pub mod post;
pub mod user;
