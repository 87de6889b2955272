pub mod atlas;
pub mod not_found;
