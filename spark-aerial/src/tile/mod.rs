pub mod collector;
pub mod planner;
