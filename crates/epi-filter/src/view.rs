//! Rendering interface implemented by chart and map widgets.
//!
//! The coordinator and the color scale drive views through [`ChartView`];
//! drawing itself happens elsewhere.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use epi_model::Viewport;
use serde::Serialize;

use crate::value::{DimValue, FilterPredicate};

/// Maps a division's metric value to a palette index.
pub type ColorAccessor = Arc<dyn Fn(Option<f64>) -> usize + Send + Sync>;

/// Maps a division name to its metric value.
pub type ValueAccessor = Arc<dyn Fn(&str) -> Option<f64> + Send + Sync>;

/// One bar, row, slice or region of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBin {
    pub key: DimValue,
    pub value: f64,
}

/// What a view needs to redraw itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartSnapshot {
    pub chart: String,
    /// Group of the chart, filtered by every dimension except its own.
    pub bins: Vec<GroupBin>,
    /// Active predicate on the chart's dimension.
    pub predicate: Option<FilterPredicate>,
    /// Records passing every active predicate.
    pub filtered_records: usize,
    pub total_records: usize,
}

/// A chart or map layer.
pub trait ChartView {
    /// Apply (or with `None`, clear) the predicate of the view's dimension.
    fn filter(&mut self, predicate: Option<&FilterPredicate>);

    /// Drop the view's own selection.
    fn filter_all(&mut self);

    fn redraw(&mut self, snapshot: &ChartSnapshot);

    fn colors(&mut self, colors: &[String]);

    fn color_domain(&mut self, domain: [f64; 2]);

    fn color_accessor(&mut self, accessor: ColorAccessor);

    fn value_accessor(&mut self, accessor: ValueAccessor);

    fn transition_duration(&mut self, _ms: u64) {}

    fn height(&mut self, _px: u32) {}

    /// Maps only.
    fn zoom_to(&mut self, _viewport: Viewport) {}
}

/// Everything a [`HeadlessView`] has been told so far.
#[derive(Default)]
pub struct HeadlessState {
    pub predicate: Option<FilterPredicate>,
    pub snapshot: Option<ChartSnapshot>,
    pub redraws: usize,
    pub colors: Vec<String>,
    pub color_domain: Option<[f64; 2]>,
    pub color_accessor: Option<ColorAccessor>,
    pub value_accessor: Option<ValueAccessor>,
    pub transitions: Vec<u64>,
    pub height: Option<u32>,
    pub viewport: Option<Viewport>,
}

impl fmt::Debug for HeadlessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessState")
            .field("predicate", &self.predicate)
            .field("redraws", &self.redraws)
            .field("colors", &self.colors)
            .field("color_domain", &self.color_domain)
            .field("height", &self.height)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

/// A view that only records what it is told. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the recorded state.
    pub fn with_state<R>(&self, read: impl FnOnce(&HeadlessState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        read(&state)
    }

    fn update(&self, write: impl FnOnce(&mut HeadlessState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        write(&mut state);
    }

    pub fn snapshot(&self) -> Option<ChartSnapshot> {
        self.with_state(|state| state.snapshot.clone())
    }

    pub fn redraws(&self) -> usize {
        self.with_state(|state| state.redraws)
    }

    /// Palette index the pushed accessor gives to `name`.
    pub fn color_index(&self, name: &str) -> Option<usize> {
        self.with_state(|state| {
            let values = state.value_accessor.as_ref()?;
            let colors = state.color_accessor.as_ref()?;
            Some(colors(values(name)))
        })
    }
}

impl ChartView for HeadlessView {
    fn filter(&mut self, predicate: Option<&FilterPredicate>) {
        self.update(|state| state.predicate = predicate.cloned());
    }

    fn filter_all(&mut self) {
        self.update(|state| state.predicate = None);
    }

    fn redraw(&mut self, snapshot: &ChartSnapshot) {
        self.update(|state| {
            state.snapshot = Some(snapshot.clone());
            state.redraws += 1;
        });
    }

    fn colors(&mut self, colors: &[String]) {
        self.update(|state| state.colors = colors.to_vec());
    }

    fn color_domain(&mut self, domain: [f64; 2]) {
        self.update(|state| state.color_domain = Some(domain));
    }

    fn color_accessor(&mut self, accessor: ColorAccessor) {
        self.update(|state| state.color_accessor = Some(accessor));
    }

    fn value_accessor(&mut self, accessor: ValueAccessor) {
        self.update(|state| state.value_accessor = Some(accessor));
    }

    fn transition_duration(&mut self, ms: u64) {
        self.update(|state| state.transitions.push(ms));
    }

    fn height(&mut self, px: u32) {
        self.update(|state| state.height = Some(px));
    }

    fn zoom_to(&mut self, viewport: Viewport) {
        self.update(|state| state.viewport = Some(viewport));
    }
}
