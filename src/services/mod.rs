pub mod access_control;
pub mod averages;
pub mod geocoder;
pub mod storage;

pub use access_control::{ensure_owner, is_owner_or_admin};
pub use averages::AverageService;
pub use geocoder::{geocoder_from_config, locate, GeocodeError, GeocodeResult, Geocoder, MapQuestGeocoder};
pub use storage::{PhotoUpload, StorageService};
