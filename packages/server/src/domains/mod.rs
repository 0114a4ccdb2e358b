// Business domains
pub mod posts;
pub mod users;
