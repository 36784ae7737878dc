pub mod articles;
pub mod chat;
pub mod health;
