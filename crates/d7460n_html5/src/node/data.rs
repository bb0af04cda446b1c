pub mod comment;
pub mod element;
pub mod text;
