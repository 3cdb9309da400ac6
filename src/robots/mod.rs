//! Robots.txt handling module
//!
//! Reads robots.txt content through the robotstxt crate and derives a permission
//! verdict for each crawler of interest.

mod agents;
mod evaluator;
mod parser;

pub use agents::{ai_agents, find_agent, is_crawler_name, AgentProfile, KNOWN_AGENTS};
pub use evaluator::{
    default_permissions, evaluate_agent, evaluate_permissions, BotPermission, SAMPLE_PATHS,
};
pub use parser::RobotsDirectives;
