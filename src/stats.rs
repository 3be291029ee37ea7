use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Running sums over the days processed so far.
///
/// Rates are summed as decimals, so the sums are exact and `E[sell²] - E[sell]²`
/// does not lose the variance of rates that barely move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningStats {
    sum_buy: Decimal,
    sum_sell: Decimal,
    sum_sell_squared: Decimal,
    count: usize,
}

/// Final figures for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Days that had a table and contributed rates
    pub days: usize,
    pub mean_buy: f64,
    /// Population standard deviation of the sell rate
    pub sell_std_dev: f64,
}

impl RunningStats {
    pub fn push(&mut self, buy: Decimal, sell: Decimal) {
        self.sum_buy += buy;
        self.sum_sell += sell;
        self.sum_sell_squared += sell * sell;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean_buy(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        self.sum_buy.checked_div(Decimal::from(self.count))?.to_f64()
    }

    /// `sqrt(E[sell²] - E[sell]²)`, computed as `sqrt(n·Σsell² - (Σsell)²) / n`.
    pub fn sell_std_dev(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let n = Decimal::from(self.count);
        let scaled_variance = n
            .checked_mul(self.sum_sell_squared)?
            .checked_sub(self.sum_sell.checked_mul(self.sum_sell)?)?;
        let scaled_variance = scaled_variance.max(Decimal::ZERO).to_f64()?;
        Some(scaled_variance.sqrt() / self.count as f64)
    }

    /// `None` until at least one day has been pushed.
    pub fn summary(&self) -> Option<Summary> {
        Some(Summary {
            days: self.count,
            mean_buy: self.mean_buy()?,
            sell_std_dev: self.sell_std_dev()?,
        })
    }
}

impl FromIterator<(Decimal, Decimal)> for RunningStats {
    fn from_iter<I: IntoIterator<Item = (Decimal, Decimal)>>(iter: I) -> Self {
        let mut stats = Self::default();
        for (buy, sell) in iter {
            stats.push(buy, sell);
        }
        stats
    }
}
