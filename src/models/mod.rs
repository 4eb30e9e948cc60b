pub mod attendance;
pub mod meeting;
pub mod profile;
