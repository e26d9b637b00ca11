mod stats;

pub use stats::PublicationStatsQuery;
