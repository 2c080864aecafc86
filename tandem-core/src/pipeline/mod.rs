//! Perception pipeline task body
//!
//! One iteration:
//! 1. acquire a frame sized to the model input
//! 2. convert it to the model encoding
//! 3. run inference, timed in microseconds
//! 4. post-process with the measured latency
//! 5. sample liveness diagnostics
//! 6. idle for a fixed delay
//!
//! A failed acquisition abandons the iteration and the next one starts
//! immediately, without the idle delay and without any bound on the
//! number of consecutive failures.

use embedded_hal_async::delay::DelayNs;

use crate::diagnostics::LivenessReport;
use crate::task::TaskId;
use crate::tensor::ImageGeometry;
use crate::traits::{AcquireError, ImageSource, MicrosClock, Model, ModelError, RuntimeStats};

/// Report for one completed iteration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport<O> {
    /// Completed iteration number, starting at 1
    pub sequence: u32,
    /// Time spent in inference (µs)
    pub latency_us: u32,
    /// Post-processing result
    pub output: O,
    /// Heap and stack headroom after the iteration
    pub liveness: LivenessReport,
}

/// Outcome of one pipeline iteration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome<O> {
    /// Full acquire → post-process cycle finished
    Completed(CycleReport<O>),
    /// Acquisition failed; nothing else ran
    AcquisitionFailed(AcquireError),
}

impl<O> CycleOutcome<O> {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }
}

/// Pipeline with an initialized model and its collaborators
pub struct Pipeline<M, S, C, R> {
    model: M,
    source: S,
    clock: C,
    stats: R,
    geometry: ImageGeometry,
    completed: u32,
    failed_acquisitions: u32,
}

impl<M, S, C, R> Pipeline<M, S, C, R>
where
    M: Model,
    S: ImageSource,
    C: MicrosClock,
    R: RuntimeStats,
{
    /// Initialize the model exactly once and prepare the loop
    ///
    /// Fails if the model fails to initialize or does not declare a
    /// single-image NHWC input that fits its own input buffer. The caller
    /// must not retry.
    pub fn start(mut model: M, source: S, clock: C, stats: R) -> Result<Self, ModelError> {
        model.init()?;

        let geometry = model
            .input_info()
            .image_geometry()
            .ok_or(ModelError::ShapeMismatch)?;
        if model.input_buffer_mut().len() < geometry.sample_count() {
            return Err(ModelError::ShapeMismatch);
        }

        Ok(Self {
            model,
            source,
            clock,
            stats,
            geometry,
            completed: 0,
            failed_acquisitions: 0,
        })
    }

    /// Run steps 1-5 of one iteration
    pub fn cycle(&mut self) -> CycleOutcome<M::Output> {
        let ImageGeometry {
            width,
            height,
            channels,
        } = self.geometry;

        if let Err(e) = self
            .source
            .acquire(self.model.input_buffer_mut(), width, height, channels)
        {
            self.failed_acquisitions = self.failed_acquisitions.wrapping_add(1);
            return CycleOutcome::AcquisitionFailed(e);
        }

        self.model.convert_input();

        let start = self.clock.now_us();
        self.model.run_inference();
        let latency_us = u32::try_from(self.clock.elapsed_us(start)).unwrap_or(u32::MAX);

        let output = self.model.process_output(latency_us);
        let liveness = LivenessReport::sample(&self.stats, TaskId::Pipeline);

        self.completed = self.completed.wrapping_add(1);
        CycleOutcome::Completed(CycleReport {
            sequence: self.completed,
            latency_us,
            output,
            liveness,
        })
    }

    /// Run one full iteration including the idle delay
    ///
    /// `on_outcome` sees the outcome before the delay starts. Returns true
    /// if the iteration completed.
    pub async fn run_cycle<D, F>(&mut self, delay: &mut D, idle_ms: u32, mut on_outcome: F) -> bool
    where
        D: DelayNs,
        F: FnMut(&CycleOutcome<M::Output>),
    {
        let outcome = self.cycle();
        on_outcome(&outcome);

        if outcome.is_completed() {
            delay.delay_ms(idle_ms).await;
            true
        } else {
            false
        }
    }

    /// Input geometry requested from the image source
    pub fn geometry(&self) -> ImageGeometry {
        self.geometry
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Number of completed iterations
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Number of abandoned iterations
    pub fn failed_acquisitions(&self) -> u32 {
        self.failed_acquisitions
    }
}
