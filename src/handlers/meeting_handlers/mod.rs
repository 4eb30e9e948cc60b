pub mod checkin;
pub mod crud;
pub mod export;
pub mod feed;
pub mod list;

pub use checkin::*;
pub use crud::*;
pub use export::*;
pub use feed::*;
pub use list::*;
