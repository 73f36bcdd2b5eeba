pub mod football_data;
pub mod provider;

pub use football_data::FootballData;
pub use provider::StatsProvider;
