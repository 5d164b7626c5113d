use crate::domain::Series;
use crate::ValidationError;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 7;

/// Trailing simple moving average of closing prices.
///
/// The output has one value per sample. The first `window - 1` positions have
/// no full trailing window and are filled with the first raw close, so early
/// values carry no smoothing information.
pub fn smooth(series: &Series, window: usize) -> Result<Vec<f64>, ValidationError> {
    let closes: Vec<f64> = series.closes().collect();
    moving_average(&closes, window)
}

/// [`smooth`] over a bare price slice.
pub fn moving_average(prices: &[f64], window: usize) -> Result<Vec<f64>, ValidationError> {
    if window == 0 {
        return Err(ValidationError::InvalidSmoothingWindow);
    }

    let Some(&first) = prices.first() else {
        return Ok(Vec::new());
    };

    let mut smoothed = Vec::with_capacity(prices.len());
    let mut running_sum = 0.0;
    for (index, price) in prices.iter().enumerate() {
        running_sum += price;
        if index >= window {
            running_sum -= prices[index - window];
        }

        if index + 1 < window {
            smoothed.push(first);
        } else {
            smoothed.push(running_sum / window as f64);
        }
    }

    Ok(smoothed)
}
