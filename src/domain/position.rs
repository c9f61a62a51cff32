//! Open position state.

/// A long holding opened by one entry fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: u64,
    pub entry_price: f64,
    pub highest_price_since_entry: f64,
}

impl Position {
    pub fn open(quantity: u64, fill_price: f64) -> Self {
        Self {
            quantity,
            entry_price: fill_price,
            highest_price_since_entry: fill_price,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    /// Raise the trailing-stop anchor to `high` if it is a new peak.
    pub fn observe_high(&mut self, high: f64) {
        self.highest_price_since_entry = self.highest_price_since_entry.max(high);
    }
}

/// The engine holds at most one position at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PositionState {
    #[default]
    Flat,
    Long(Position),
}

impl PositionState {
    pub fn market_value(&self, price: f64) -> f64 {
        match self {
            PositionState::Flat => 0.0,
            PositionState::Long(p) => p.market_value(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn open_anchors_peak_at_fill() {
        let p = Position::open(10, 50.0);
        assert_relative_eq!(p.highest_price_since_entry, 50.0);
        assert_relative_eq!(p.market_value(55.0), 550.0);
    }

    #[test]
    fn observe_high_only_rises() {
        let mut p = Position::open(1, 100.0);
        p.observe_high(110.0);
        p.observe_high(105.0);
        assert_relative_eq!(p.highest_price_since_entry, 110.0);
    }

    #[test]
    fn state_market_value() {
        assert_eq!(PositionState::default(), PositionState::Flat);
        assert_relative_eq!(PositionState::Flat.market_value(12.0), 0.0);
        let long = PositionState::Long(Position::open(7, 10.0));
        assert_relative_eq!(long.market_value(12.0), 84.0);
    }
}
