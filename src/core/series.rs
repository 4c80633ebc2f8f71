mod aggregate;
mod deltas;

pub use self::{aggregate::Aggregate, deltas::Deltas};
