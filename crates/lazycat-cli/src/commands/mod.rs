pub mod config;
pub mod onboard;
pub mod prefs;
pub mod run;
pub mod stats;
