use syscan_core::errors::{ErrorInfo, SyscanError};

/// Fails unless `lo <= value <= hi`.
pub fn in_range(
    dataset: &str,
    what: &str,
    value: f64,
    lo: f64,
    hi: f64,
) -> Result<(), SyscanError> {
    if value.is_finite() && (lo..=hi).contains(&value) {
        return Ok(());
    }
    Err(SyscanError::Format(
        ErrorInfo::new(
            "out-of-range",
            format!("{what} = {value} outside [{lo}, {hi}]"),
        )
        .with_context("dataset", dataset)
        .with_context("field", what),
    ))
}

/// Fails unless `|value - expected| <= tolerance`.
pub fn expect_close(
    dataset: &str,
    what: &str,
    value: f64,
    expected: f64,
    tolerance: f64,
) -> Result<(), SyscanError> {
    if (value - expected).abs() <= tolerance {
        return Ok(());
    }
    Err(SyscanError::Format(
        ErrorInfo::new(
            "unexpected-value",
            format!("{what} = {value}, expected {expected}"),
        )
        .with_context("dataset", dataset)
        .with_context("field", what),
    ))
}

/// Fails on a non-positive bin width.
pub fn bin_width(dataset: &str, lo: f64, hi: f64) -> Result<f64, SyscanError> {
    let width = hi - lo;
    if width > 0.0 && width.is_finite() {
        return Ok(width);
    }
    Err(SyscanError::Format(
        ErrorInfo::new("empty-bin", format!("bin [{lo}, {hi}] has no width"))
            .with_context("dataset", dataset),
    ))
}
