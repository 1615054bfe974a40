pub mod favorite;
pub mod item;
pub mod review;
pub mod user;
pub mod vote;
