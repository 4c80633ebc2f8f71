pub mod availability;
pub mod frame;
pub mod loss;
pub mod profile;
pub mod series;
pub mod threshold;
