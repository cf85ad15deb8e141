//! Simulation Logging and Notifications
//!
//! Every phase change produces a [`SimEvent`]. Events are:
//! - Forwarded to the `log` facade at a level matching their weight
//! - Kept in a bounded history by [`SimLogger`]
//! - Optionally printed, human-readable or as JSON lines
//! - Broadcast to subscribers by the simulator (fire-and-forget)
//!
//! Log Levels:
//! - WARN: Capacity overflow
//! - INFO: Cycle ends, completion, reset
//! - DEBUG: Phase changes

use crate::gc::{CollectorKind, Phase};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Log level for simulation events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn as_log(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Simulation event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// The heap entered a new phase
    PhaseChange {
        collector: CollectorKind,
        from: Phase,
        to: Phase,
        step: u64,
        message: String,
    },

    /// A collection completed
    CycleEnd {
        collector: CollectorKind,
        cycle: u64,
        step: u64,
    },

    /// Live objects were dropped for lack of a destination
    CapacityOverflow {
        collector: CollectorKind,
        phase: Phase,
        dropped: usize,
        step: u64,
    },

    /// The heap was rebuilt from configuration
    Reset { collector: CollectorKind, epoch: u64 },

    /// A bounded collector reached `Complete`
    Completed {
        collector: CollectorKind,
        cycles: u64,
        step: u64,
    },
}

impl SimEvent {
    /// Log level for event
    pub fn level(&self) -> LogLevel {
        match self {
            SimEvent::CapacityOverflow { .. } => LogLevel::Warn,
            SimEvent::CycleEnd { .. } | SimEvent::Completed { .. } | SimEvent::Reset { .. } => {
                LogLevel::Info
            }
            SimEvent::PhaseChange { .. } => LogLevel::Debug,
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimEvent::PhaseChange {
                collector,
                from,
                to,
                step,
                message,
            } => write!(f, "[{}] step {}: {} -> {}: {}", collector, step, from, to, message),
            SimEvent::CycleEnd {
                collector,
                cycle,
                step,
            } => write!(f, "[{}] step {}: cycle {} completed", collector, step, cycle),
            SimEvent::CapacityOverflow {
                collector,
                phase,
                dropped,
                step,
            } => write!(
                f,
                "[{}] step {}: {} dropped {} live objects, destination full",
                collector, step, phase, dropped
            ),
            SimEvent::Reset { collector, epoch } => {
                write!(f, "[{}] heap reinitialized (epoch {})", collector, epoch)
            }
            SimEvent::Completed {
                collector,
                cycles,
                step,
            } => write!(
                f,
                "[{}] step {}: simulation complete after {} cycles",
                collector, step, cycles
            ),
        }
    }
}

lazy_static::lazy_static! {
    /// Notification text per collector and phase
    static ref DESCRIPTIONS: HashMap<(CollectorKind, Phase), &'static str> = {
        use CollectorKind as C;
        use Phase as P;

        let mut m = HashMap::new();
        m.insert((C::MarkSweep, P::Allocating), "Allocating objects in the heap");
        m.insert((C::MarkSweep, P::Marking), "Marking reachable objects");
        m.insert((C::MarkSweep, P::Sweeping), "Sweeping unmarked objects, survivors stay in place");
        m.insert((C::MarkSweep, P::Complete), "Mark-sweep simulation complete");

        m.insert((C::Copying, P::Allocating), "Allocating in the active semispace");
        m.insert((C::Copying, P::Marking), "Marking live objects in the active semispace");
        m.insert((C::Copying, P::Copying), "Copying live objects to the other semispace");
        m.insert((C::Copying, P::Swapping), "Swapping semispace roles, old space cleared");
        m.insert((C::Copying, P::Complete), "Copying simulation complete");

        m.insert((C::Generational, P::Allocating), "Allocating new objects in eden");
        m.insert((C::Generational, P::Marking), "Minor GC: marking live objects in eden and survivors");
        m.insert((C::Generational, P::CopyingToSurvivor), "Minor GC: copying eden survivors to the survivor space");
        m.insert((C::Generational, P::CopyingBetweenSurvivors), "Minor GC: aging survivors, promoting old objects to tenured");
        m.insert((C::Generational, P::Swapping), "Minor GC: swapping survivor spaces");
        m.insert((C::Generational, P::MajorGcMarking), "Major GC: tenured is full, marking live tenured objects");
        m.insert((C::Generational, P::MajorGcCompacting), "Major GC: compacting tenured");

        m.insert((C::RegionBased, P::Allocating), "Allocating in eden regions");
        m.insert((C::RegionBased, P::Marking), "Marking live objects across all regions");
        m.insert((C::RegionBased, P::Evacuating), "Evacuating eden regions to the survivor region");
        m
    };
}

/// Descriptive notification text for a collector entering a phase
pub fn describe(kind: CollectorKind, phase: Phase) -> &'static str {
    DESCRIPTIONS
        .get(&(kind, phase))
        .copied()
        .unwrap_or("Phase not used by this collector")
}

/// Simulation logger configuration
#[derive(Debug, Clone)]
pub struct SimLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Print events to stdout
    pub console: bool,

    /// Print events as JSON lines
    pub json: bool,

    /// Prefix printed events with a local timestamp
    pub timestamps: bool,

    /// Events kept in history; oldest are dropped first
    pub history: usize,
}

impl Default for SimLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            console: false,
            json: false,
            timestamps: true,
            history: 1024,
        }
    }
}

/// SimLogger - event history and console output
pub struct SimLogger {
    config: SimLoggerConfig,
    events: Mutex<VecDeque<SimEvent>>,
    enabled: AtomicBool,
}

impl SimLogger {
    pub fn new(config: SimLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(VecDeque::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log a simulation event
    pub fn log(&self, event: &SimEvent) {
        if !self.is_enabled() {
            return;
        }

        let level = event.level();
        log::log!(level.as_log(), "{}", event);
        if level > self.config.level {
            return;
        }

        {
            let mut events = self.events.lock();
            if self.config.history > 0 && events.len() >= self.config.history {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        if self.config.console {
            println!("{}", self.render(event));
        }
    }

    /// Format an event the way console output prints it
    pub fn render(&self, event: &SimEvent) -> String {
        let body = if self.config.json {
            to_json(event)
        } else {
            event.to_string()
        };

        if self.config.timestamps {
            let now = chrono::Local::now();
            format!("[{}] {}", now.format("%Y-%m-%d %H:%M:%S%.3f"), body)
        } else {
            body
        }
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl Default for SimLogger {
    fn default() -> Self {
        Self::new(SimLoggerConfig::default())
    }
}

impl fmt::Debug for SimLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimLogger")
            .field("config", &self.config)
            .field("events", &self.event_count())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Render an event as a single JSON line
pub fn to_json(event: &SimEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| event.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_change(step: u64) -> SimEvent {
        SimEvent::PhaseChange {
            collector: CollectorKind::MarkSweep,
            from: Phase::Allocating,
            to: Phase::Marking,
            step,
            message: describe(CollectorKind::MarkSweep, Phase::Marking).to_string(),
        }
    }

    #[test]
    fn test_logger_basic() {
        let logger = SimLogger::default();
        logger.log(&phase_change(1));
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_logger_disable() {
        let logger = SimLogger::default();
        logger.disable();
        logger.log(&phase_change(1));
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let logger = SimLogger::new(SimLoggerConfig {
            history: 3,
            ..Default::default()
        });
        for step in 0..5 {
            logger.log(&phase_change(step));
        }
        let steps: Vec<u64> = logger
            .events()
            .iter()
            .map(|e| match e {
                SimEvent::PhaseChange { step, .. } => *step,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(steps, vec![2, 3, 4]);
    }

    #[test]
    fn test_level_filter() {
        let logger = SimLogger::new(SimLoggerConfig {
            level: LogLevel::Info,
            ..Default::default()
        });
        logger.log(&phase_change(1));
        logger.log(&SimEvent::Reset {
            collector: CollectorKind::Copying,
            epoch: 2,
        });
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_render_json_without_timestamps() {
        let logger = SimLogger::new(SimLoggerConfig {
            json: true,
            timestamps: false,
            ..Default::default()
        });
        let event = phase_change(3);
        assert_eq!(logger.render(&event), to_json(&event));
    }

    #[test]
    fn test_render_text_with_timestamp() {
        let logger = SimLogger::default();
        let event = phase_change(3);
        let line = logger.render(&event);

        // "[YYYY-MM-DD HH:MM:SS.mmm] " prefix
        let (stamp, body) = line.split_at(26);
        assert!(stamp.starts_with('[') && stamp.ends_with("] "), "{}", line);
        assert!(chrono::NaiveDateTime::parse_from_str(
            &stamp[1..24],
            "%Y-%m-%d %H:%M:%S%.3f"
        )
        .is_ok());
        assert_eq!(body, event.to_string());
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&phase_change(7))).unwrap();
        assert_eq!(json["type"], "phase_change");
        assert_eq!(json["collector"], "mark_sweep");
        assert_eq!(json["to"], "marking");
        assert_eq!(json["step"], 7);
    }

    #[test]
    fn test_every_reachable_phase_is_described() {
        let phases: &[(CollectorKind, &[Phase])] = &[
            (
                CollectorKind::MarkSweep,
                &[Phase::Allocating, Phase::Marking, Phase::Sweeping, Phase::Complete],
            ),
            (
                CollectorKind::Copying,
                &[Phase::Marking, Phase::Copying, Phase::Swapping, Phase::Complete],
            ),
            (
                CollectorKind::Generational,
                &[
                    Phase::CopyingToSurvivor,
                    Phase::CopyingBetweenSurvivors,
                    Phase::MajorGcMarking,
                    Phase::MajorGcCompacting,
                ],
            ),
            (CollectorKind::RegionBased, &[Phase::Evacuating]),
        ];
        for (kind, list) in phases {
            for &phase in *list {
                assert_ne!(describe(*kind, phase), "Phase not used by this collector");
            }
        }
        assert_eq!(
            describe(CollectorKind::MarkSweep, Phase::Evacuating),
            "Phase not used by this collector"
        );
    }
}
