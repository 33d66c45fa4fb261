pub mod fetch;
pub mod review;
