pub mod lane_ops;
pub mod normalize;
pub mod sort;
pub mod task_ops;
