pub mod contract;
pub mod next_step;
pub mod recommendation;
pub mod risk;
pub mod universe;
pub mod window;
