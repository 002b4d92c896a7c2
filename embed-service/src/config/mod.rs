pub mod default_config;
pub mod embedding_config;
pub mod provider;
