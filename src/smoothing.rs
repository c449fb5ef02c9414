use thiserror::Error;

/// Window radius used when the configuration does not set one.
pub const DEFAULT_WINDOW_RADIUS: i64 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum SmoothingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Compute the centered moving average of `samples`.
///
/// Each output position `i` holds the mean of `samples[i - r ..= i + r]`,
/// where `r` is `window_radius`. The output has the same length as the
/// input, so it stays aligned with the time axis of the samples. Positions closer
/// than `r` to either boundary have no full window and are `None`.
///
/// A missing sample (`None` or NaN) poisons every window that contains it.
///
/// # Errors
/// Returns [`SmoothingError::InvalidArgument`] if `window_radius` is negative.
pub fn moving_average(
    samples: &[Option<f64>],
    window_radius: i64,
) -> Result<Vec<Option<f64>>, SmoothingError> {
    if window_radius < 0 {
        return Err(SmoothingError::InvalidArgument(format!(
            "window radius must be non-negative, but is {window_radius}"
        )));
    }
    let radius = usize::try_from(window_radius)
        .map_err(|_| SmoothingError::InvalidArgument("window radius is too large".into()))?;

    let n_vals = samples.len();
    let width = radius
        .checked_mul(2)
        .and_then(|w| w.checked_add(1))
        .ok_or_else(|| SmoothingError::InvalidArgument("window radius is too large".into()))?;

    let smoothed = (0..n_vals)
        .map(|i| {
            if i < radius || i + radius >= n_vals {
                return None;
            }
            let window = &samples[i - radius..=i + radius];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            let mean = sum / width as f64;
            (!mean.is_nan()).then_some(mean)
        })
        .collect();

    Ok(smoothed)
}
