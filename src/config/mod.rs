pub mod traits;
pub mod evolution;
pub mod schedule;
pub mod manager;

pub use manager::AppConfig;
pub use evolution::EvolutionConfig;
pub use schedule::ScheduleConfig;
pub use traits::ConfigSection;
