use crate::domain::models::{Bucket, YDomain};
use rust_decimal::Decimal;

/// Headroom above the tallest bar, as a multiplier (1.2).
pub const HEADROOM: Decimal = Decimal::from_parts(12, 0, 0, false, 1);

/// Y-axis range covering `buckets`, or `None` when there is nothing to chart.
pub fn compute_domain(buckets: &[Bucket]) -> Option<YDomain> {
    let max_credit = buckets.iter().map(|b| b.credit).max()?;
    let max_debit = buckets.iter().map(|b| b.debit).max()?;
    // Clamps at `Decimal::MAX` for amounts near the representable limit.
    Some(YDomain(
        Decimal::ZERO,
        max_credit.max(max_debit).saturating_mul(HEADROOM),
    ))
}
