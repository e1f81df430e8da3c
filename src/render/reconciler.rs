// Render reconciler
// Keeps the rendered bar set in sync with the latest frame

use std::collections::{BTreeMap, BTreeSet};

use super::frame::SampleFrame;
use super::scale::{ChartDimensions, ScaleConfig};

/// Default bar fill colour
pub const DEFAULT_FILL: &str = "#cccccc";

/// A rendered bar for one bin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarElement {
    pub index: usize,
    /// Left edge
    pub x: u32,
    /// Top edge, measured from the top of the chart
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub fill: String,
    /// Magnitude the current height was derived from
    pub magnitude: u8,
}

/// Whether any frame has been rendered yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Empty,
    Populated,
}

/// Bin indices touched by a single reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<usize>,
    pub updated: Vec<usize>,
    pub removed: Vec<usize>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Owns the bar set and applies frames to it
#[derive(Debug, Clone)]
pub struct Reconciler {
    scales: ScaleConfig,
    fill: String,
    bars: BTreeMap<usize, BarElement>,
    state: RenderState,
}

impl Reconciler {
    pub fn new(scales: ScaleConfig) -> Self {
        Self {
            scales,
            fill: DEFAULT_FILL.to_string(),
            bars: BTreeMap::new(),
            state: RenderState::Empty,
        }
    }

    /// Set the fill used for bars created from now on
    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = fill.into();
        self
    }

    /// Bring the bar set in line with `frame`.
    ///
    /// Existing bars only get a new height; new bins get a bar; bins missing
    /// from the frame lose theirs.
    pub fn reconcile(&mut self, frame: &SampleFrame) -> ReconcileReport {
        let incoming: BTreeSet<usize> = (0..frame.len()).collect();
        let removed: Vec<usize> = self
            .bars
            .keys()
            .filter(|index| !incoming.contains(index))
            .copied()
            .collect();

        let mut report = ReconcileReport {
            removed,
            ..ReconcileReport::default()
        };

        for index in &report.removed {
            self.bars.remove(index);
        }

        let chart_height = self.scales.dimensions().height;
        for (index, magnitude) in frame.bins() {
            let height = self.scales.map_magnitude_to_height(magnitude);
            match self.bars.get_mut(&index) {
                Some(bar) => {
                    bar.magnitude = magnitude;
                    bar.height = height;
                    bar.y = chart_height - height;
                    report.updated.push(index);
                }
                None => {
                    let bar = BarElement {
                        index,
                        x: self.scales.map_index_to_x(index),
                        y: chart_height - height,
                        width: self.scales.bar_width(),
                        height,
                        fill: self.fill.clone(),
                        magnitude,
                    };
                    self.bars.insert(index, bar);
                    report.created.push(index);
                }
            }
        }

        self.state = RenderState::Populated;
        report
    }

    /// Rebuild the scales for a new chart size and re-lay out every bar.
    ///
    /// Returns false when the dimensions are unchanged.
    pub fn resize(&mut self, dimensions: ChartDimensions) -> bool {
        if dimensions == self.scales.dimensions() {
            return false;
        }

        self.scales = ScaleConfig::new(dimensions, self.scales.params());
        let width = self.scales.bar_width();
        for bar in self.bars.values_mut() {
            bar.x = self.scales.map_index_to_x(bar.index);
            bar.width = width;
            bar.height = self.scales.map_magnitude_to_height(bar.magnitude);
            bar.y = dimensions.height - bar.height;
        }
        true
    }

    /// Rendered bars in bin order
    pub fn bars(&self) -> impl Iterator<Item = &BarElement> {
        self.bars.values()
    }

    pub fn bar(&self, index: usize) -> Option<&BarElement> {
        self.bars.get(&index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn dimensions(&self) -> ChartDimensions {
        self.scales.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scale::ScaleParams;

    fn reconciler(width: u32, height: u32) -> Reconciler {
        Reconciler::new(ScaleConfig::new(
            ChartDimensions::new(width, height),
            ScaleParams::default(),
        ))
    }

    fn snapshot(reconciler: &Reconciler) -> Vec<BarElement> {
        reconciler.bars().cloned().collect()
    }

    #[test]
    fn test_first_frame_creates_bars() {
        let mut r = reconciler(300, 100);
        assert_eq!(r.state(), RenderState::Empty);

        let report = r.reconcile(&SampleFrame::new(vec![0, 128, 255]));
        assert_eq!(report.created, vec![0, 1, 2]);
        assert!(report.updated.is_empty());
        assert!(report.removed.is_empty());
        assert_eq!(r.state(), RenderState::Populated);

        let heights: Vec<u32> = r.bars().map(|b| b.height).collect();
        assert_eq!(heights, vec![0, 6, 100]);
        let xs: Vec<u32> = r.bars().map(|b| b.x).collect();
        assert_eq!(xs, vec![0, 0, 1]);

        let top = r.bar(2).unwrap();
        assert_eq!(top.y, 0);
        assert_eq!(top.fill, DEFAULT_FILL);
        assert_eq!(r.bar(0).unwrap().y, 100);
    }

    #[test]
    fn test_update_keeps_position_and_fill() {
        let mut r = reconciler(2048, 100).with_fill("#ff0000");
        r.reconcile(&SampleFrame::new(vec![10, 20, 30]));
        let before = r.bar(1).cloned().unwrap();

        let report = r.reconcile(&SampleFrame::new(vec![255, 255, 255]));
        assert_eq!(report.updated, vec![0, 1, 2]);
        assert!(report.created.is_empty());

        let after = r.bar(1).unwrap();
        assert_eq!(after.x, before.x);
        assert_eq!(after.width, before.width);
        assert_eq!(after.fill, "#ff0000");
        assert_eq!(after.height, 100);
        assert_eq!(after.magnitude, 255);
    }

    #[test]
    fn test_shorter_frame_removes_stale_bars() {
        let mut r = reconciler(300, 100);
        r.reconcile(&SampleFrame::new(vec![1, 2, 3]));

        let report = r.reconcile(&SampleFrame::new(vec![4, 5]));
        assert_eq!(report.removed, vec![2]);
        assert_eq!(report.updated, vec![0, 1]);
        assert!(r.bar(2).is_none());
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_longer_frame_creates_new_bars() {
        let mut r = reconciler(300, 100);
        r.reconcile(&SampleFrame::new(vec![1]));

        let report = r.reconcile(&SampleFrame::new(vec![1, 2, 3]));
        assert_eq!(report.updated, vec![0]);
        assert_eq!(report.created, vec![1, 2]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let frame = SampleFrame::new(vec![9, 200, 45, 0, 255]);

        let mut once = reconciler(640, 120);
        once.reconcile(&frame);

        let mut twice = reconciler(640, 120);
        twice.reconcile(&frame);
        twice.reconcile(&frame);

        assert_eq!(snapshot(&once), snapshot(&twice));
    }

    #[test]
    fn test_empty_frame_clears_bars() {
        let mut r = reconciler(300, 100);
        r.reconcile(&SampleFrame::new(vec![1, 2]));

        let report = r.reconcile(&SampleFrame::default());
        assert_eq!(report.removed, vec![0, 1]);
        assert!(r.is_empty());
        assert_eq!(r.state(), RenderState::Populated);
    }

    #[test]
    fn test_resize_relayouts_existing_bars() {
        let mut r = reconciler(1024, 100);
        r.reconcile(&SampleFrame::new(vec![255, 255, 255, 255]));
        assert_eq!(r.bar(3).unwrap().x, 3);

        assert!(r.resize(ChartDimensions::new(2048, 50)));
        let bar = r.bar(3).unwrap();
        assert_eq!(bar.x, 6);
        assert_eq!(bar.width, 2);
        assert_eq!(bar.height, 50);
        assert_eq!(bar.y, 0);

        assert!(!r.resize(ChartDimensions::new(2048, 50)));
    }
}
