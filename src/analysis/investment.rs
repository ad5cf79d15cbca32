use crate::data::Dataset;
use crate::error::{Result, ScreenerError};
use crate::models::{Currency, InvestmentReturn, StockRecord};

/// Smallest amount the calculator controls accept
pub const MIN_INVESTMENT: f64 = 100.0;

/// Increment used by the amount controls
pub const INVESTMENT_STEP: f64 = 100.0;

/// Project the value of an investment if the price reaches the target
pub fn compute_investment_return(
    invest_amount: f64,
    current_price: f64,
    target_price: f64,
) -> Result<InvestmentReturn> {
    for (name, value) in [
        ("investment amount", invest_amount),
        ("current price", current_price),
        ("target price", target_price),
    ] {
        if !value.is_finite() {
            return Err(ScreenerError::NonFinite(name));
        }
    }
    if current_price == 0.0 {
        return Err(ScreenerError::ZeroPrice);
    }
    if invest_amount == 0.0 {
        return Err(ScreenerError::ZeroInvestment);
    }

    let shares = invest_amount / current_price;
    let expected_value = shares * target_price;
    let gain = expected_value - invest_amount;
    let gain_pct = gain / invest_amount * 100.0;

    Ok(InvestmentReturn {
        shares,
        expected_value,
        gain,
        gain_pct,
    })
}

/// A ticker's detail plus the calculator result for a given amount
#[derive(Debug, Clone)]
pub struct TickerEvaluation {
    pub record: StockRecord,
    pub invest_amount: f64,
    pub currency: Currency,
    pub target_price: f64,
    pub projection: InvestmentReturn,
}

impl TickerEvaluation {
    pub fn shares_line(&self) -> String {
        format!("You could buy {:.2} shares", self.projection.shares)
    }

    pub fn expected_value_line(&self) -> String {
        format!(
            "Expected value at target price ({:.2}): {:.2} {}",
            self.target_price, self.projection.expected_value, self.currency
        )
    }

    pub fn gain_line(&self) -> String {
        format!(
            "Estimated gain: {:.2} {} ({:+.2}%)",
            self.projection.gain, self.currency, self.projection.gain_pct
        )
    }
}

/// Look up a ticker and run the calculator against its price and target.
///
/// Missing price or target is reported, not substituted.
pub fn evaluate_ticker(
    dataset: &Dataset,
    ticker: &str,
    invest_amount: f64,
    currency: Currency,
) -> Result<TickerEvaluation> {
    let record = dataset
        .find(ticker)
        .ok_or_else(|| ScreenerError::TickerNotFound(ticker.to_string()))?;

    let price = record.price.ok_or_else(|| ScreenerError::DataUnavailable {
        ticker: ticker.to_string(),
        field: "Price",
    })?;
    let target_price = record.y_target.ok_or_else(|| ScreenerError::DataUnavailable {
        ticker: ticker.to_string(),
        field: "YTarget",
    })?;

    let projection = compute_investment_return(invest_amount, price, target_price)?;

    Ok(TickerEvaluation {
        record: record.clone(),
        invest_amount,
        currency,
        target_price,
        projection,
    })
}
