use std::ops::Mul;

use chrono::TimeDelta;

use crate::quantity::energy::WattHours;

quantity!(Watts, suffix: "W", precision: 0);

impl Mul<TimeDelta> for Watts {
    type Output = WattHours;

    fn mul(self, rhs: TimeDelta) -> Self::Output {
        let hours = rhs.as_seconds_f64() / 3600.0;
        WattHours(self.0 * hours)
    }
}
