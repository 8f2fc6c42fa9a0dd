// OBS Service Patcher
// Adds a streaming service definition to OBS Studio and Streamlabs OBS

pub mod models;
pub mod services;
