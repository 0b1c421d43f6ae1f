pub mod albums;
pub mod reviews;
