pub mod distance;
pub mod flights;
pub mod sharing;
pub mod storage;
pub mod trips;
pub mod users;
