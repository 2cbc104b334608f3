//! Per-month observation output.
//!
//! The observer thread hands each [`MonthReport`] to an
//! [`ObservationSink`] during the Observing phase, while every agent is
//! parked at the third barrier.

use std::fmt;

use crossbeam_channel::Sender;
use thicket_core::units::{fahrenheit_to_celsius, inches_to_cm};
use thicket_core::WorldState;

/// The committed world at the end of one cycle's commit window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonthReport {
    /// Zero-based index of the cycle that produced this state.
    pub cycle: u64,
    /// The committed state, in model units.
    pub state: WorldState,
}

impl MonthReport {
    /// Precipitation in centimetres.
    pub fn precipitation_cm(&self) -> f32 {
        inches_to_cm(self.state.precipitation)
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_c(&self) -> f64 {
        fahrenheit_to_celsius(self.state.temperature)
    }

    /// Grain height in centimetres.
    pub fn vegetation_height_cm(&self) -> f32 {
        inches_to_cm(self.state.vegetation_height)
    }
}

impl fmt::Display for MonthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Year: {}  Month: {}  Precip: {:.2}  Temp: {:.2}  Grain Height: {:.2}  \
             Deer Pop: {}  Coyote Pop: {}",
            self.state.year,
            self.state.month,
            self.precipitation_cm(),
            self.temperature_c(),
            self.vegetation_height_cm(),
            self.state.herbivores,
            self.state.predators,
        )
    }
}

/// Receives one report per completed cycle, in cycle order.
pub trait ObservationSink: Send {
    /// Handle the report for one cycle.
    fn emit(&mut self, report: &MonthReport);
}

impl<S: ObservationSink + ?Sized> ObservationSink for Box<S> {
    fn emit(&mut self, report: &MonthReport) {
        (**self).emit(report);
    }
}

/// Logs each report as an `info` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ObservationSink for TracingSink {
    fn emit(&mut self, report: &MonthReport) {
        tracing::info!(cycle = report.cycle, "{report}");
    }
}

/// Forwards each report over a channel.
///
/// A disconnected receiver is ignored; the run continues.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<MonthReport>,
}

impl ChannelSink {
    /// Wrap a sender.
    pub fn new(tx: Sender<MonthReport>) -> Self {
        Self { tx }
    }
}

impl ObservationSink for ChannelSink {
    fn emit(&mut self, report: &MonthReport) {
        let _ = self.tx.send(*report);
    }
}

/// Discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ObservationSink for NullSink {
    fn emit(&mut self, _report: &MonthReport) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> MonthReport {
        MonthReport {
            cycle: 0,
            state: WorldState {
                cycle: 0,
                year: 2020,
                month: 0,
                precipitation: 1.0,
                temperature: 50.0,
                vegetation_height: 10.0,
                herbivores: 6,
                predators: 3,
            },
        }
    }

    #[test]
    fn display_line_uses_display_units() {
        assert_eq!(
            report().to_string(),
            "Year: 2020  Month: 0  Precip: 2.54  Temp: 10.00  Grain Height: 25.40  \
             Deer Pop: 6  Coyote Pop: 3"
        );
    }

    #[test]
    fn channel_sink_forwards_and_tolerates_hangup() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelSink::new(tx);
        sink.emit(&report());
        assert_eq!(rx.try_recv().unwrap(), report());
        drop(rx);
        sink.emit(&report());
    }
}
