//! Per-bar variable resolution.

use crate::domain::candle::Candle;
use crate::domain::equation::Variable;
use crate::domain::equation_eval::Bindings;
use crate::domain::indicator::{ComputedIndicator, IndicatorSet, IndicatorSettings};

/// Read-only view of every variable at one bar.
#[derive(Debug, Clone, Copy)]
pub struct VariableTable<'a> {
    candle: &'a Candle,
    indicators: &'a IndicatorSet,
    settings: &'a IndicatorSettings,
    index: usize,
}

impl<'a> VariableTable<'a> {
    pub fn new(
        candle: &'a Candle,
        indicators: &'a IndicatorSet,
        settings: &'a IndicatorSettings,
        index: usize,
    ) -> Self {
        Self {
            candle,
            indicators,
            settings,
            index,
        }
    }

    /// `None` while the variable's indicator is warming up or was never computed.
    pub fn get(&self, variable: Variable) -> Option<f64> {
        let c = self.candle;
        match variable {
            Variable::Open => return Some(c.open),
            Variable::High => return Some(c.high),
            Variable::Low => return Some(c.low),
            Variable::Close => return Some(c.close),
            Variable::Volume => return Some(c.volume as f64),
            _ => {}
        }

        let key = variable.indicator_key(self.settings)?;
        let series = match (self.indicators.get(&key)?, variable) {
            (ComputedIndicator::Single(s), _) => s,
            (ComputedIndicator::Macd(m), Variable::MacdLine) => &m.line,
            (ComputedIndicator::Macd(m), Variable::MacdSignal) => &m.signal,
            (ComputedIndicator::Macd(m), Variable::MacdHistogram) => &m.histogram,
            (ComputedIndicator::Bollinger(b), Variable::BbUpper) => &b.upper,
            (ComputedIndicator::Bollinger(b), Variable::BbMiddle) => &b.middle,
            (ComputedIndicator::Bollinger(b), Variable::BbLower) => &b.lower,
            (ComputedIndicator::Stochastic(s), Variable::StochK) => &s.k,
            (ComputedIndicator::Stochastic(s), Variable::StochD) => &s.d,
            _ => return None,
        };
        series.get(self.index).copied().flatten()
    }
}

impl Bindings for VariableTable<'_> {
    fn lookup(&self, variable: Variable) -> Option<f64> {
        self.get(variable)
    }
}
