pub mod bot;
pub mod catalog;
pub mod chat;
pub mod common;
pub mod configs;
pub mod player;
pub mod voice;
