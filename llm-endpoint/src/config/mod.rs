pub mod default_config;
pub mod endpoint_config;
pub mod generation_params;
