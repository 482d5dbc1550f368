//! Small helpers shared by the checkers and the migration driver.

pub mod email;
pub mod sql;
pub mod time;
