pub mod endpoint_service;
