pub mod common;
pub mod completions;
pub mod favorite;
pub mod filters;
pub mod flush;
pub mod queue;
pub mod restaurants;
pub mod review;
pub mod reviews;
pub mod show;
