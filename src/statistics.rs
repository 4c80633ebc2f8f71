mod summary;

pub use self::summary::{EnergyBalance, LossSummary};
