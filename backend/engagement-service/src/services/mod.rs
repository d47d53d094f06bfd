pub mod aggregator;
pub mod join;

pub use aggregator::{AggregationConfig, EngagementService};
pub use join::{build_all_posts, count_comments};
