// OBS Service Patcher Services
// Discovery, download and patch logic

mod events;
mod atomic_file;
mod path_locator;
mod descriptor_fetcher;
mod patch_engine;
mod official_sync;
mod log_manager;

pub use events::*;
pub use atomic_file::*;
pub use path_locator::*;
pub use descriptor_fetcher::*;
pub use patch_engine::*;
pub use official_sync::*;
pub use log_manager::*;
