//! Infrastructure layer - settings module loaders

pub mod loaders;

pub use loaders::{InMemoryLoader, YamlFileLoader};
