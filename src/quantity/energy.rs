quantity!(WattHours, suffix: "Wh", precision: 0);

impl WattHours {
    #[must_use]
    pub fn to_kilowatt_hours(self) -> f64 {
        self.0 * 0.001
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(WattHours(1.0) < WattHours(2.0));
        assert_eq!(WattHours(2.0).max(WattHours(1.0)), WattHours(2.0));
    }
}
