//! Timeline interactions: autoplay and quick period filters.

use std::time::Duration;

use epi_model::InteractionSpec;
use tracing::{debug, info};

use crate::coordinator::FilterCoordinator;
use crate::error::Result;
use crate::value::DimValue;

/// What one autoplay step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoplayStep {
    /// Focused the timeline on this period.
    Focused(DimValue),
    /// Went past the last period and stopped.
    Finished,
    /// Autoplay is not running.
    Idle,
}

/// Steps the timeline one period per tick.
///
/// The host owns the timer and calls [`Autoplay::tick`] every
/// [`Autoplay::delay`]; [`Autoplay::pause`] is valid at any point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autoplay {
    delay: Duration,
    rewind: bool,
    position: Option<usize>,
}

impl Autoplay {
    pub fn new(spec: &InteractionSpec) -> Self {
        Self {
            delay: Duration::from_millis(spec.autoplay_delay_ms),
            rewind: spec.autoplay_rewind,
            position: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_playing(&self) -> bool {
        self.position.is_some()
    }

    /// Index of the next period to show.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Clear the time filters and focus the first period.
    pub fn start(&mut self, coordinator: &mut FilterCoordinator) -> Result<AutoplayStep> {
        coordinator.clear_periods()?;
        self.position = Some(0);
        info!(delay_ms = self.delay.as_millis(), rewind = self.rewind, "Autoplay started");
        self.tick(coordinator)
    }

    /// Show the next period, or stop (or rewind) past the last one.
    pub fn tick(&mut self, coordinator: &mut FilterCoordinator) -> Result<AutoplayStep> {
        let Some(position) = self.position else {
            return Ok(AutoplayStep::Idle);
        };
        let domain = coordinator.time_domain()?;
        let position = if position >= domain.len() && self.rewind { 0 } else { position };
        let Some(period) = domain.get(position) else {
            self.pause(coordinator)?;
            return Ok(AutoplayStep::Finished);
        };
        coordinator.focus_period(period)?;
        debug!(%period, position, "Autoplay step");
        self.position = Some(position + 1);
        Ok(AutoplayStep::Focused(period.clone()))
    }

    /// Stop and clear the time filters.
    pub fn pause(&mut self, coordinator: &mut FilterCoordinator) -> Result<()> {
        if self.position.take().is_some() {
            info!("Autoplay paused");
        }
        coordinator.clear_periods()
    }
}

/// Periods selected by a quick filter over the last `count` periods.
///
/// The most recent period is usually incomplete and is left out.
pub fn last_periods(domain: &[DimValue], count: usize) -> &[DimValue] {
    let Some(end) = domain.len().checked_sub(1) else {
        return &[];
    };
    &domain[end.saturating_sub(count)..end]
}

/// Focus the timeline on the last `count` complete periods.
pub fn quick_filter(coordinator: &mut FilterCoordinator, count: usize) -> Result<Vec<DimValue>> {
    let domain = coordinator.time_domain()?;
    let periods = last_periods(&domain, count).to_vec();
    debug!(count, selected = periods.len(), "Quick period filter");
    coordinator.set_periods(&periods)?;
    Ok(periods)
}
