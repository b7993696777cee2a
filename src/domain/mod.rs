pub mod role;
pub mod user;
pub mod club;
pub mod membership;

pub use role::*;
pub use user::*;
pub use club::*;
pub use membership::*;
