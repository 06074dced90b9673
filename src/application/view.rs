use crate::domain::chart::{bucketize, compute_domain, resolve_label, zoom};
use crate::domain::models::{Bucket, Granularity, Transaction, YDomain};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    /// Showing every bucket
    Full,
    /// Showing a slice picked by one or more zooms
    Zoomed,
}

/// What the UI renders: the visible buckets and their Y-axis range.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChartSnapshot {
    pub granularity: Granularity,
    pub state: ViewState,
    pub buckets: Vec<Bucket>,
    pub domain: Option<YDomain>,
}

/// Chart of one account's history at one granularity.
///
/// The full bucket sequence is kept next to the visible one so a reset never
/// needs the history again. A new history or granularity means a new view.
#[derive(Clone, Debug)]
pub struct ChartView {
    granularity: Granularity,
    original: Vec<Bucket>,
    visible: Vec<Bucket>,
    domain: Option<YDomain>,
    state: ViewState,
}

impl ChartView {
    pub fn build(
        transactions: &[Transaction],
        granularity: Granularity,
        account: &str,
        zone: &FixedOffset,
    ) -> Self {
        let original = bucketize(transactions, granularity, account, zone);
        let domain = compute_domain(&original);
        Self {
            granularity,
            visible: original.clone(),
            original,
            domain,
            state: ViewState::Full,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.visible
    }

    pub fn domain(&self) -> Option<YDomain> {
        self.domain
    }

    /// Narrows the visible buckets to the inclusive index range. Returns
    /// whether the view changed.
    pub fn zoom(&mut self, left: usize, right: usize) -> bool {
        match zoom(&self.visible, left, right) {
            Some(zoomed) => {
                self.visible = zoomed.buckets;
                self.domain = zoomed.domain;
                self.state = ViewState::Zoomed;
                true
            }
            None => {
                tracing::debug!(
                    "Ignoring zoom [{}, {}] over {} buckets",
                    left,
                    right,
                    self.visible.len()
                );
                false
            }
        }
    }

    /// Same as [`ChartView::zoom`] with the ends given as bucket labels.
    pub fn zoom_labels(&mut self, left: &str, right: &str) -> bool {
        match (
            resolve_label(&self.visible, left),
            resolve_label(&self.visible, right),
        ) {
            (Some(left), Some(right)) => self.zoom(left, right),
            _ => {
                tracing::debug!("Ignoring zoom between unknown labels {:?} and {:?}", left, right);
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.visible = self.original.clone();
        self.domain = compute_domain(&self.visible);
        self.state = ViewState::Full;
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            granularity: self.granularity,
            state: self.state,
            buckets: self.visible.clone(),
            domain: self.domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TransactionKind;
    use rust_decimal::Decimal;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn history() -> Vec<Transaction> {
        [(100, "2024-01-05T10:00"), (40, "2024-01-05T11:00"), (70, "2024-01-05T12:00"), (10, "2024-01-05T13:00")]
            .iter()
            .enumerate()
            .map(|(i, (amount, at))| Transaction {
                id: i.to_string(),
                kind: TransactionKind::Deposit,
                amount: Decimal::from(*amount),
                timestamp: at.to_string(),
            })
            .collect()
    }

    fn view() -> ChartView {
        ChartView::build(&history(), Granularity::Transaction, "A", &utc())
    }

    #[test]
    fn starts_full() {
        let view = view();
        assert_eq!(view.state(), ViewState::Full);
        assert_eq!(view.buckets().len(), 4);
        assert_eq!(view.domain(), Some(YDomain(Decimal::ZERO, Decimal::from(120))));
    }

    #[test]
    fn zooms_compound_on_the_visible_slice() {
        let mut view = view();
        assert!(view.zoom(1, 3));
        assert_eq!(view.state(), ViewState::Zoomed);
        assert_eq!(view.domain(), Some(YDomain(Decimal::ZERO, Decimal::from(84))));

        // indices now address the slice [11:00, 12:00, 13:00]
        assert!(view.zoom(0, 1));
        let labels: Vec<&str> = view.buckets().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["11:00", "12:00"]);
        assert_eq!(view.buckets()[0].order_index, 1);
    }

    #[test]
    fn reset_restores_the_full_state() {
        let mut view = view();
        let before = view.snapshot();
        assert!(view.zoom(2, 0));
        assert!(view.zoom(0, 1));
        view.reset();
        assert_eq!(view.snapshot(), before);
    }

    #[test]
    fn label_zoom_normalizes_order() {
        let mut forward = view();
        let mut backward = view();
        assert!(forward.zoom_labels("11:00", "13:00"));
        assert!(backward.zoom_labels("13:00", "11:00"));
        assert_eq!(forward.snapshot(), backward.snapshot());
    }

    #[test]
    fn invalid_zooms_leave_the_view_alone() {
        let mut view = view();
        let before = view.snapshot();
        assert!(!view.zoom(0, 0));
        assert!(!view.zoom(1, 9));
        assert!(!view.zoom_labels("10:00", "23:59"));
        assert!(!view.zoom_labels("12:00", "12:00"));
        assert_eq!(view.snapshot(), before);
    }

    #[test]
    fn reset_after_a_rejected_label_zoom_keeps_indices_contiguous() {
        let mut view = view();
        let before = view.snapshot();
        assert!(view.zoom_labels("11:00", "13:00"));
        let zoomed = view.snapshot();

        // 10:00 exists in the full sequence but not in the visible slice
        assert!(!view.zoom_labels("10:00", "12:00"));
        assert!(!view.zoom_labels("11:00", "99:99"));
        assert_eq!(view.snapshot(), zoomed);

        view.reset();
        let indices: Vec<usize> = view.buckets().iter().map(|b| b.order_index).collect();
        assert_eq!(indices, (0..4).collect::<Vec<_>>());
        assert_eq!(view.snapshot(), before);
    }

    #[test]
    fn empty_history_has_no_domain() {
        let mut view = ChartView::build(&[], Granularity::Month, "A", &utc());
        assert_eq!(view.domain(), None);
        assert!(!view.zoom(0, 1));
        view.reset();
        assert_eq!(view.state(), ViewState::Full);
    }
}
