pub mod beep;
pub mod check;
pub mod config;
pub mod run;
