pub mod dashboard;
pub mod platforms;
pub mod repositories;
pub mod teams;
pub mod utils;
