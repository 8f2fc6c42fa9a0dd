// OBS Service Patcher Models
// Data structures shared by the services layer

mod service;
mod service_document;
mod services_package;
mod patch_report;
mod settings;

pub use service::*;
pub use service_document::*;
pub use services_package::*;
pub use patch_report::*;
pub use settings::*;
