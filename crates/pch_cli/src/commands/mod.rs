pub mod batch;
pub mod discover;
pub mod export;
pub mod prompt;
pub mod settings;
