use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    fmt::FormattedPercentage,
    quantity::energy::WattHours,
    statistics::{EnergyBalance, LossSummary},
};

/// Availability below which a day is highlighted.
const POOR_AVAILABILITY: f64 = 0.95;

#[must_use]
pub fn build_loss_summary_table(summary: &LossSummary) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Date", "Produced", "Lost", "Availability"]);
    for (date, balance) in &summary.daily {
        table.add_row(build_row(Cell::new(date.format("%Y-%m-%d")), *balance));
    }
    table.add_row(build_row(Cell::new("Total").add_attribute(Attribute::Bold), summary.total));
    table
}

fn build_row(title: Cell, balance: EnergyBalance) -> Vec<Cell> {
    let availability = balance.availability();
    vec![
        title,
        Cell::new(balance.actual).set_alignment(CellAlignment::Right),
        Cell::new(balance.lost).set_alignment(CellAlignment::Right).fg(
            if balance.lost > WattHours::ZERO { Color::Red } else { Color::Reset },
        ),
        Cell::new(FormattedPercentage(availability)).set_alignment(CellAlignment::Right).fg(
            match availability {
                Some(availability) if availability < POOR_AVAILABILITY => Color::Red,
                Some(_) => Color::Green,
                None => Color::Reset,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{TimeSeries, tests::hourly_index};

    #[test]
    fn test_build_loss_summary_table() {
        let index = hourly_index(3);
        let meter = TimeSeries::try_new(index.clone(), vec![Some(100.0); 3]).unwrap();
        let lost_power = TimeSeries::try_new(index, vec![0.0, 50.0, 0.0]).unwrap();
        let summary = LossSummary::try_new(&meter, &lost_power).unwrap();
        let table = build_loss_summary_table(&summary);
        // One day and the total:
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("2024-06-01"));
        assert!(rendered.contains("50 Wh"));
        assert!(rendered.contains("80.0%"));
    }
}
