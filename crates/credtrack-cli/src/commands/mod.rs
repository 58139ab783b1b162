pub mod refresh;
pub mod settings;
pub mod status;
