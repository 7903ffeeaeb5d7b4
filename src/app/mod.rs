pub mod errors;
pub mod factory;
pub mod generator;

pub use factory::AppFactory;
pub use generator::{CardGenerator, GenerateOptions, GeneratedCard};
