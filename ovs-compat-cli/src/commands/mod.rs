pub mod clock;
pub mod dirs;
pub mod log;
pub mod pair;
pub mod process;
