//! Time discretization of a transient analysis.
//!
//! The schedule is stored as a `TimeSteps` record list. Each record carries
//! the absolute `ElapsedTime`, the `Step` from the previous record (or from
//! `Start` for the first one) and an optional `Save="true"` checkpoint flag.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::core::{Element, PropertyContainer, PropertyDescriptor, PropertyStore, Record, Schema};
use crate::util::{format_float, Error, Result, ScalarKind, ScalarValue};

/// Tag of the time discretization element.
pub const TIME_INCREMENTS_TAG: &str = "TimeIncrements";

/// Tag of one record inside `TimeSteps`.
pub const TIME_STEP_TAG: &str = "TimeStep";

/// How GeoStudio spaces generated increments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IncrementOption {
    /// Geometrically growing increments.
    Exponential,
    /// Equal increments.
    Linear,
}

impl IncrementOption {
    /// Document token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exponential => "Exponential",
            Self::Linear => "Linear",
        }
    }
}

impl FromStr for IncrementOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Exponential" => Ok(Self::Exponential),
            "Linear" => Ok(Self::Linear),
            other => Err(Error::InvalidValue {
                name: TimeIncrements::INCREMENT_OPTION.to_string(),
                value: other.to_string(),
                expected: "increment option",
            }),
        }
    }
}

impl fmt::Display for IncrementOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of one schedule record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeStep {
    /// Increment from the previous record, `None` if the record has no `Step`.
    pub step: Option<f64>,
    /// Absolute time of this record.
    pub elapsed_time: f64,
    /// Whether results are saved at this record.
    pub save: bool,
}

impl TimeStep {
    /// Decode record `index`. A missing or non-numeric `ElapsedTime` is an error.
    pub fn from_record(index: usize, record: &Record) -> Result<Self> {
        let elapsed = record.get(TimeIncrements::ELAPSED_TIME).ok_or_else(|| Error::MalformedRecord {
            list: TimeIncrements::TIME_STEPS,
            index,
            reason: "missing ElapsedTime".to_string(),
        })?;
        let elapsed_time = parse_field(index, TimeIncrements::ELAPSED_TIME, elapsed)?;
        let step = record
            .get(TimeIncrements::STEP)
            .map(|s| parse_field(index, TimeIncrements::STEP, s))
            .transpose()?;
        Ok(Self {
            step,
            elapsed_time,
            save: is_saved(record),
        })
    }
}

fn parse_field(index: usize, field: &str, text: &str) -> Result<f64> {
    f64::from_text(text).ok_or_else(|| Error::MalformedRecord {
        list: TimeIncrements::TIME_STEPS,
        index,
        reason: format!("{field} {text:?} is not a number"),
    })
}

fn is_saved(record: &Record) -> bool {
    record
        .get(TimeIncrements::SAVE)
        .and_then(bool::from_text)
        .unwrap_or(false)
}

/// One display row of the schedule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeStepRow {
    /// Row number, 0 for the start row.
    pub index: usize,
    /// Step text, empty on the start row.
    pub step: String,
    /// Elapsed time text.
    pub time: String,
    /// Save flag text, empty on the start row.
    pub saved: String,
}

/// Time discretization entity (`TimeIncrements`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeIncrements {
    store: PropertyStore,
}

impl TimeIncrements {
    /// Simulation start time.
    pub const START: &'static str = "Start";
    /// Total simulated duration.
    pub const DURATION: &'static str = "Duration";
    /// `Exponential` or `Linear`.
    pub const INCREMENT_OPTION: &'static str = "IncrementOption";
    /// Number of increments.
    pub const INCREMENT_COUNT: &'static str = "IncrementCount";
    /// First increment size for exponential spacing.
    pub const INITIAL_INCREMENT_SIZE: &'static str = "InitialIncrementSize";
    /// Save every n-th increment.
    pub const SAVE_MULTIPLES_OF: &'static str = "SaveMultiplesOf";
    /// The schedule record list.
    pub const TIME_STEPS: &'static str = "TimeSteps";

    /// Record field: increment from the previous record.
    pub const STEP: &'static str = "Step";
    /// Record field: absolute time.
    pub const ELAPSED_TIME: &'static str = "ElapsedTime";
    /// Record field: checkpoint flag.
    pub const SAVE: &'static str = "Save";

    /// Create an empty time discretization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a `TimeIncrements` element.
    pub fn from_element(node: &Element) -> Result<Self> {
        let mut increments = Self::new();
        increments.read(node)?;
        Ok(increments)
    }

    // ========================================================================
    // Scalar accessors
    // ========================================================================

    /// Start time, 0 if unset.
    pub fn start(&self) -> Result<f64> {
        self.get_or(Self::START, 0.0)
    }

    /// Set the start time.
    pub fn set_start(&mut self, start: f64) -> Result<()> {
        self.set(Self::START, start)
    }

    /// Total duration.
    pub fn duration(&self) -> Result<Option<f64>> {
        self.get_opt(Self::DURATION)
    }

    /// Set the total duration.
    pub fn set_duration(&mut self, duration: f64) -> Result<()> {
        self.set(Self::DURATION, duration)
    }

    /// Increment spacing.
    pub fn increment_option(&self) -> Result<Option<IncrementOption>> {
        self.get_opt::<String>(Self::INCREMENT_OPTION)?
            .map(|s| s.parse())
            .transpose()
    }

    /// Set the increment spacing.
    pub fn set_increment_option(&mut self, option: IncrementOption) -> Result<()> {
        self.set(Self::INCREMENT_OPTION, option.as_str().to_string())
    }

    /// Declared number of increments.
    pub fn increment_count(&self) -> Result<Option<i64>> {
        self.get_opt(Self::INCREMENT_COUNT)
    }

    /// First increment size.
    pub fn initial_increment_size(&self) -> Result<Option<f64>> {
        self.get_opt(Self::INITIAL_INCREMENT_SIZE)
    }

    /// Set the first increment size.
    pub fn set_initial_increment_size(&mut self, size: f64) -> Result<()> {
        self.set(Self::INITIAL_INCREMENT_SIZE, size)
    }

    /// Save interval in increments.
    pub fn save_multiples_of(&self) -> Result<Option<i64>> {
        self.get_opt(Self::SAVE_MULTIPLES_OF)
    }

    /// Set the save interval.
    pub fn set_save_multiples_of(&mut self, every: i64) -> Result<()> {
        self.set(Self::SAVE_MULTIPLES_OF, every)
    }

    // ========================================================================
    // Schedule
    // ========================================================================

    /// Raw schedule records, empty if no schedule is set.
    pub fn schedule(&self) -> &[Record] {
        self.store.records(Self::TIME_STEPS).unwrap_or(&[])
    }

    /// Typed schedule.
    pub fn time_steps(&self) -> Result<Vec<TimeStep>> {
        self.schedule()
            .iter()
            .enumerate()
            .map(|(i, r)| TimeStep::from_record(i, r))
            .collect()
    }

    /// `ElapsedTime` of every record, in schedule order.
    pub fn all_times(&self) -> Result<Vec<f64>> {
        Ok(self.time_steps()?.into_iter().map(|s| s.elapsed_time).collect())
    }

    /// `ElapsedTime` of every record flagged `Save="true"`, in schedule order.
    pub fn saved_times(&self) -> Result<Vec<f64>> {
        Ok(self
            .time_steps()?
            .into_iter()
            .filter(|s| s.save)
            .map(|s| s.elapsed_time)
            .collect())
    }

    /// Replace the schedule with `times`, which must not include the start time.
    ///
    /// Times are sorted ascending (stable, so ties keep their input order),
    /// delta-encoded against the previous time or `Start`, and `saved[i]`
    /// travels with `times[i]`. `IncrementCount` is set to the new length.
    /// Nothing is modified if the inputs are rejected.
    pub fn set_time_steps(&mut self, times: &[f64], saved: &[bool]) -> Result<()> {
        if times.len() != saved.len() {
            return Err(Error::SizeMismatch {
                left: "times",
                left_len: times.len(),
                right: "saved",
                right_len: saved.len(),
            });
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(Error::InvalidValue {
                name: Self::TIME_STEPS.to_string(),
                value: bad.to_string(),
                expected: "finite time",
            });
        }
        let start = self.start()?;

        let mut pairs: Vec<(f64, bool)> = times.iter().copied().zip(saved.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut records = Vec::with_capacity(pairs.len());
        let mut previous = start;
        for (time, save) in pairs {
            let mut record = Record::new();
            record.set(Self::STEP, format_float(time - previous));
            record.set(Self::ELAPSED_TIME, format_float(time));
            if save {
                record.set(Self::SAVE, "true");
            }
            records.push(record);
            previous = time;
        }

        debug!(count = records.len(), start, "rebuilt schedule");
        self.set(Self::INCREMENT_COUNT, records.len() as i64)?;
        self.set_records(Self::TIME_STEPS, records)
    }

    /// Rows of the schedule table: a start row, then one row per record.
    pub fn time_step_rows(&self) -> Result<Vec<TimeStepRow>> {
        let mut rows = vec![TimeStepRow {
            index: 0,
            step: String::new(),
            time: "0".to_string(),
            saved: String::new(),
        }];
        for (i, record) in self.schedule().iter().enumerate() {
            let time = record.get(Self::ELAPSED_TIME).ok_or_else(|| Error::MalformedRecord {
                list: Self::TIME_STEPS,
                index: i,
                reason: "missing ElapsedTime".to_string(),
            })?;
            rows.push(TimeStepRow {
                index: i + 1,
                step: record.get(Self::STEP).unwrap_or_default().to_string(),
                time: time.to_string(),
                saved: record.get(Self::SAVE).unwrap_or("false").to_string(),
            });
        }
        Ok(rows)
    }

    /// `(declared IncrementCount, actual record count)` if the two disagree.
    ///
    /// Hand-edited documents can carry a stale count; it is kept as read and
    /// only corrected by [`set_time_steps`](Self::set_time_steps).
    pub fn count_mismatch(&self) -> Result<Option<(i64, usize)>> {
        if !self.is_set(Self::TIME_STEPS) {
            return Ok(None);
        }
        let actual = self.schedule().len();
        Ok(self
            .increment_count()?
            .filter(|&declared| usize::try_from(declared).ok() != Some(actual))
            .map(|declared| (declared, actual)))
    }
}

impl PropertyContainer for TimeIncrements {
    const SCHEMA: Schema = Schema {
        entity: TIME_INCREMENTS_TAG,
        properties: &[
            PropertyDescriptor::scalar(TimeIncrements::START, ScalarKind::Float),
            PropertyDescriptor::scalar(TimeIncrements::DURATION, ScalarKind::Float),
            PropertyDescriptor::scalar(TimeIncrements::INCREMENT_OPTION, ScalarKind::String),
            PropertyDescriptor::scalar(TimeIncrements::INCREMENT_COUNT, ScalarKind::Integer),
            PropertyDescriptor::scalar(TimeIncrements::INITIAL_INCREMENT_SIZE, ScalarKind::Float),
            PropertyDescriptor::scalar(TimeIncrements::SAVE_MULTIPLES_OF, ScalarKind::Integer),
            PropertyDescriptor::record_list(TimeIncrements::TIME_STEPS, TIME_STEP_TAG),
        ],
    };

    fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    fn finish_read(&mut self) -> Result<()> {
        // Unparseable counts surface on access, not here
        if let Ok(Some((declared, actual))) = self.count_mismatch() {
            warn!(declared, actual, "IncrementCount disagrees with the TimeSteps list");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LEN_ATTRIBUTE;

    fn built(times: &[f64], saved: &[bool]) -> TimeIncrements {
        let mut ti = TimeIncrements::new();
        ti.set_time_steps(times, saved).unwrap();
        ti
    }

    #[test]
    fn test_concrete_schedule() {
        let ti = built(&[5.0, 2.0, 10.0], &[false, true, true]);

        let steps = ti.time_steps().unwrap();
        assert_eq!(
            steps,
            vec![
                TimeStep { step: Some(2.0), elapsed_time: 2.0, save: true },
                TimeStep { step: Some(3.0), elapsed_time: 5.0, save: false },
                TimeStep { step: Some(5.0), elapsed_time: 10.0, save: true },
            ]
        );
        assert!(!ti.schedule()[1].contains(TimeIncrements::SAVE));
        assert_eq!(ti.schedule()[0].get(TimeIncrements::STEP), Some("2"));
        assert_eq!(ti.saved_times().unwrap(), vec![2.0, 10.0]);
        assert_eq!(ti.all_times().unwrap(), vec![2.0, 5.0, 10.0]);
        assert_eq!(ti.increment_count().unwrap(), Some(3));
    }

    #[test]
    fn test_first_step_is_relative_to_start() {
        let mut ti = TimeIncrements::new();
        ti.set_start(100.0).unwrap();
        ti.set_time_steps(&[160.0, 130.0], &[true, false]).unwrap();

        let steps = ti.time_steps().unwrap();
        assert_eq!(steps[0].step, Some(30.0));
        assert_eq!(steps[0].elapsed_time, 130.0);
        assert_eq!(steps[1].step, Some(30.0));
        assert_eq!(ti.saved_times().unwrap(), vec![160.0]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ti = built(&[3.0, 1.0, 3.0], &[true, false, false]);

        let steps = ti.time_steps().unwrap();
        assert_eq!(steps[1].elapsed_time, 3.0);
        assert!(steps[1].save);
        assert_eq!(steps[2].elapsed_time, 3.0);
        assert!(!steps[2].save);
        assert_eq!(steps[2].step, Some(0.0));
    }

    #[test]
    fn test_size_mismatch_leaves_schedule_untouched() {
        let mut ti = built(&[4.0], &[true]);
        let before = ti.clone();

        let err = ti.set_time_steps(&[1.0, 2.0], &[true]).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { left_len: 2, right_len: 1, .. }));
        assert_eq!(ti, before);
    }

    #[test]
    fn test_rebuild_replaces_schedule() {
        let mut ti = built(&[1.0, 2.0, 3.0], &[true, true, true]);
        ti.set_time_steps(&[7.0], &[false]).unwrap();
        assert_eq!(ti.all_times().unwrap(), vec![7.0]);
        assert!(ti.saved_times().unwrap().is_empty());
        assert_eq!(ti.increment_count().unwrap(), Some(1));
    }

    #[test]
    fn test_empty_schedule() {
        let ti = built(&[], &[]);
        assert!(ti.all_times().unwrap().is_empty());
        assert_eq!(ti.increment_count().unwrap(), Some(0));
        assert_eq!(ti.count_mismatch().unwrap(), None);
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let mut ti = TimeIncrements::new();
        assert!(ti.set_time_steps(&[f64::NAN], &[true]).is_err());
        assert!(!ti.is_set(TimeIncrements::TIME_STEPS));
    }

    #[test]
    fn test_malformed_record_fails_loudly() {
        let node = Element::new(TIME_INCREMENTS_TAG).with_child(
            Element::new("TimeSteps")
                .with_attr(LEN_ATTRIBUTE, "2")
                .with_child(Element::new("TimeStep").with_attr("Step", "1").with_attr("ElapsedTime", "1"))
                .with_child(Element::new("TimeStep").with_attr("Step", "1")),
        );
        let ti = TimeIncrements::from_element(&node).unwrap();
        assert!(matches!(
            ti.all_times(),
            Err(Error::MalformedRecord { index: 1, .. })
        ));
        assert!(ti.time_step_rows().is_err());
    }

    #[test]
    fn test_non_numeric_fields_fail_loudly() {
        let bad_time = Element::new(TIME_INCREMENTS_TAG).with_child(
            Element::new("TimeSteps")
                .with_child(Element::new("TimeStep").with_attr("Step", "1").with_attr("ElapsedTime", "abc")),
        );
        let ti = TimeIncrements::from_element(&bad_time).unwrap();
        assert!(matches!(
            ti.all_times(),
            Err(Error::MalformedRecord { index: 0, .. })
        ));

        let bad_step = Element::new(TIME_INCREMENTS_TAG).with_child(
            Element::new("TimeSteps")
                .with_child(Element::new("TimeStep").with_attr("Step", "1").with_attr("ElapsedTime", "1"))
                .with_child(Element::new("TimeStep").with_attr("Step", "x").with_attr("ElapsedTime", "2")),
        );
        let ti = TimeIncrements::from_element(&bad_step).unwrap();
        assert!(matches!(
            ti.time_steps(),
            Err(Error::MalformedRecord { index: 1, .. })
        ));
        assert!(matches!(ti.saved_times(), Err(Error::MalformedRecord { .. })));
    }

    #[test]
    fn test_save_false_is_not_saved() {
        let node = Element::new(TIME_INCREMENTS_TAG).with_child(
            Element::new("TimeSteps")
                .with_child(Element::new("TimeStep").with_attr("ElapsedTime", "1").with_attr("Save", "false"))
                .with_child(Element::new("TimeStep").with_attr("ElapsedTime", "2").with_attr("Save", "true")),
        );
        let ti = TimeIncrements::from_element(&node).unwrap();
        assert_eq!(ti.saved_times().unwrap(), vec![2.0]);
    }

    #[test]
    fn test_rows() {
        let ti = built(&[5.0, 2.0], &[false, true]);
        let rows = ti.time_step_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], TimeStepRow { index: 0, step: String::new(), time: "0".into(), saved: String::new() });
        assert_eq!(rows[1].saved, "true");
        assert_eq!(rows[2].step, "3");
        assert_eq!(rows[2].saved, "false");
    }

    #[test]
    fn test_count_mismatch_is_preserved() {
        let node = Element::new(TIME_INCREMENTS_TAG)
            .with_child(Element::with_text("IncrementCount", "5"))
            .with_child(
                Element::new("TimeSteps")
                    .with_child(Element::new("TimeStep").with_attr("ElapsedTime", "1")),
            );
        let ti = TimeIncrements::from_element(&node).unwrap();
        assert_eq!(ti.increment_count().unwrap(), Some(5));
        assert_eq!(ti.count_mismatch().unwrap(), Some((5, 1)));
    }

    #[test]
    fn test_increment_option() {
        let mut ti = TimeIncrements::new();
        assert_eq!(ti.increment_option().unwrap(), None);
        ti.set_increment_option(IncrementOption::Exponential).unwrap();
        assert_eq!(ti.increment_option().unwrap(), Some(IncrementOption::Exponential));
        ti.set_text(TimeIncrements::INCREMENT_OPTION, "Quadratic").unwrap();
        assert!(ti.increment_option().is_err());
    }
}
