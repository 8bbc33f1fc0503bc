pub mod admin;
pub mod auth;
pub mod feedback;
pub mod notes;
pub mod pages;
pub mod shop;
