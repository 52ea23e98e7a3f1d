pub mod alerts;
pub mod voice;
