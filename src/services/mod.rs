pub mod attendance;
pub mod detail;
pub mod export;
pub mod local_time;
pub mod sheet_names;
pub mod summary;
