pub mod angular;
pub mod running;

pub use angular::AngularStatistic;
pub use running::RunningStatistic;
