pub mod formats;
pub mod progress;
