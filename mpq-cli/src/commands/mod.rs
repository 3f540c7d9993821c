pub mod cat;
pub mod extract;
pub mod find;
pub mod info;
pub mod list;
