//! Agent-oriented aggregations over a completed analysis: execution
//! plans, priority recommendations, and top-N rank lists.

pub mod plan;
pub mod recommend;
pub mod toplists;

pub use plan::{ExecutionPlan, PlanItem, Track, execution_plan};
pub use recommend::{PriorityDirection, PriorityRecommendation, priority_recommendations};
pub use toplists::{RankEntry, TopLists, top_lists};
