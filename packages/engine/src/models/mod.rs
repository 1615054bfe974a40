pub mod catalog;
pub mod credibility;
pub mod preference;
pub mod recommendation;
pub mod review;
pub mod vote;
