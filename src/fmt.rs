use std::fmt::{Debug, Display, Formatter};

/// Proportion shown as a percentage, or a dash when undefined.
pub struct FormattedPercentage(pub Option<f64>);

impl Debug for FormattedPercentage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for FormattedPercentage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(proportion) => write!(f, "{:.1}%", proportion * 100.0),
            None => write!(f, "–"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(FormattedPercentage(Some(0.9876)).to_string(), "98.8%");
        assert_eq!(FormattedPercentage(None).to_string(), "–");
    }
}
