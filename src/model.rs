//! Domain records exchanged with the bookkeeping service.
//!
//! These are owned value types, independent from the generated protobuf
//! messages. Conversions to and from the wire live in [`crate::grpc::convert`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Declares a plain enumeration together with its canonical upper-case
/// textual form, used by `Display`, `FromStr` and serde.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every value of the enumeration.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical upper-case name.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError::new(stringify!($name), s)),
                }
            }
        }
    };
}

text_enum! {
    /// Type of a run.
    RunType {
        /// Physics data taking
        Physics => "PHYSICS",
        /// Cosmic rays data taking
        Cosmics => "COSMICS",
        /// Technical run
        Technical => "TECHNICAL",
    }
}

text_enum! {
    /// Overall quality of a run from the O2 point of view.
    RunQuality {
        /// Good for physics
        Good => "GOOD",
        /// Not usable
        Bad => "BAD",
        /// Not assessed yet
        Unknown => "UNKNOWN",
    }
}

text_enum! {
    /// Kind of DPL process being registered.
    DplProcessType {
        /// QC task
        QcTask => "QC_TASK",
        /// QC checker
        QcChecker => "QC_CHECKER",
        /// QC aggregator
        QcAggregator => "QC_AGGREGATOR",
        /// QC post-processing task
        QcPostprocessing => "QC_POSTPROCESSING",
        /// Data dispatcher
        Dispatcher => "DISPATCHER",
        /// Merger
        Merger => "MERGER",
    }
}

text_enum! {
    /// Who created a log.
    LogOrigin {
        /// Written by a person
        Human => "HUMAN",
        /// Emitted by a process
        Process => "PROCESS",
    }
}

text_enum! {
    /// Category of a log.
    LogSubtype {
        /// About a run
        Run => "RUN",
        /// About a subsystem
        Subsystem => "SUBSYSTEM",
        /// General announcement
        Announcement => "ANNOUNCEMENT",
        /// Intervention report
        Intervention => "INTERVENTION",
        /// Free comment
        Comment => "COMMENT",
    }
}

/// A run as stored by the bookkeeping server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Unique, immutable run number.
    pub run_number: u32,
    /// Control/activity identifier of the environment that ran it.
    pub environment_id: Option<String>,
    /// When the start command was given to O2.
    pub time_o2_start: Option<DateTime<Utc>>,
    /// When the trigger subsystem was started.
    pub time_trg_start: Option<DateTime<Utc>>,
    /// When the run was completely stopped.
    pub time_o2_end: Option<DateTime<Utc>>,
    /// When the trigger subsystem was stopped.
    pub time_trg_end: Option<DateTime<Utc>>,
    /// Run type.
    pub run_type: Option<RunType>,
    /// Quality from the O2 point of view.
    pub run_quality: Option<RunQuality>,
    /// Number of detectors in the run.
    pub n_detectors: Option<u32>,
    /// Number of FLPs in the run.
    pub n_flps: Option<u32>,
    /// Number of EPNs in the run.
    pub n_epns: Option<u32>,
    /// Subtimeframes read out, summed over FLPs.
    pub n_subtimeframes: Option<u64>,
    /// Bytes read out, summed over FLPs.
    pub bytes_read_out: Option<u64>,
    /// Raw CTP trigger configuration text.
    pub raw_ctp_trigger_configuration: Option<String>,
}

/// Data sent when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStart {
    /// Number of the new run.
    pub run_number: u32,
    /// When the start command was given to O2.
    pub time_o2_start: DateTime<Utc>,
    /// When the trigger subsystem was started.
    pub time_trg_start: DateTime<Utc>,
    /// Control ID, can be a 32 or 64 character long hash.
    pub environment_id: String,
    /// Run type.
    pub run_type: RunType,
    /// Number of detectors in the run.
    pub n_detectors: u32,
    /// Number of FLPs in the run.
    pub n_flps: u32,
    /// Number of EPNs in the run.
    pub n_epns: u32,
}

/// Data sent when a run ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEnd {
    /// When the run was completely stopped.
    pub time_o2_end: DateTime<Utc>,
    /// When the trigger subsystem was stopped.
    pub time_trg_end: DateTime<Utc>,
    /// Final quality of the run.
    pub run_quality: RunQuality,
}

/// An FLP and its latest readout counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flp {
    /// Server-side id.
    pub id: u32,
    /// FLP name, unique within a run.
    pub name: String,
    /// Host the FLP runs on.
    pub hostname: String,
    /// Run the FLP is bound to.
    pub run_number: Option<u32>,
    /// Subtimeframes processed.
    pub n_timeframes: Option<u64>,
    /// Bytes processed.
    pub bytes_processed: Option<u64>,
    /// Bytes out of the readout 'equipment' component.
    pub bytes_equipment_read_out: Option<u64>,
    /// Bytes out of the readout 'recording' component.
    pub bytes_recording_read_out: Option<u64>,
    /// Bytes out of the readout 'fmq' component.
    pub bytes_fair_mq_read_out: Option<u64>,
}

/// Absolute snapshot of an FLP's readout counters.
///
/// Each update replaces the stored values, so these must be cumulative
/// totals kept by the caller, not deltas since the last update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlpCounters {
    /// Subtimeframes processed by the FLP.
    pub n_subtimeframes: u64,
    /// Bytes out of the readout 'equipment' component.
    pub n_equipment_bytes: u64,
    /// Bytes out of the readout 'recording' component.
    pub n_recording_bytes: u64,
    /// Bytes out of the readout 'fmq' component.
    pub n_fair_mq_bytes: u64,
}

/// A log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Server-side id.
    pub id: i32,
    /// Title.
    pub title: String,
    /// Body.
    pub text: String,
    /// Who created the log.
    pub origin: Option<LogOrigin>,
    /// Category.
    pub subtype: Option<LogSubtype>,
    /// Runs the log is about.
    pub run_numbers: Vec<u32>,
    /// Log this one replies to.
    pub parent_log_id: Option<i32>,
    /// First log of the thread.
    pub root_log_id: Option<i32>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

/// Parameters of a log creation.
///
/// ```
/// use bookkeeping_api::model::CreateLog;
///
/// let log = CreateLog::new("Beam dump", "Run 9003 ended early")
///     .with_run_numbers([9003])
///     .with_parent_log_id(-1);
/// assert_eq!(log.parent_log_id(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLog {
    /// Title.
    pub title: String,
    /// Body.
    pub text: String,
    /// Runs the log is about.
    pub run_numbers: Vec<u32>,
    /// Log this one replies to. Negative values mean "no parent".
    pub parent_log_id: Option<i32>,
    /// Left to the server default when unset.
    pub origin: Option<LogOrigin>,
    /// Left to the server default when unset.
    pub subtype: Option<LogSubtype>,
}

impl CreateLog {
    /// A log with a title and a body, not attached to any run.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            run_numbers: Vec::new(),
            parent_log_id: None,
            origin: None,
            subtype: None,
        }
    }

    /// Attach the log to runs.
    #[must_use]
    pub fn with_run_numbers(mut self, run_numbers: impl IntoIterator<Item = u32>) -> Self {
        self.run_numbers = run_numbers.into_iter().collect();
        self
    }

    /// Reply to another log. `-1` (any negative id) keeps the log top-level.
    #[must_use]
    pub fn with_parent_log_id(mut self, parent_log_id: i32) -> Self {
        self.parent_log_id = Some(parent_log_id);
        self
    }

    /// Set the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: LogOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: LogSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Parent log id that will actually be sent, if any.
    #[must_use]
    pub fn parent_log_id(&self) -> Option<i32> {
        self.parent_log_id.filter(|id| *id >= 0)
    }
}

/// A quality-control flag to create.
///
/// `from` and `to` are epoch milliseconds; when unset the flag covers the
/// start (resp. the end) of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcFlag {
    /// Id of the flag type (bad, good, limited acceptance, ...).
    pub flag_type_id: u32,
    /// Start of the flagged range.
    #[serde(default)]
    pub from: Option<u64>,
    /// End of the flagged range.
    #[serde(default)]
    pub to: Option<u64>,
    /// QC object or check that produced the flag.
    pub origin: String,
    /// Free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl QcFlag {
    /// A flag covering the whole run.
    pub fn new(flag_type_id: u32, origin: impl Into<String>) -> Self {
        Self {
            flag_type_id,
            from: None,
            to: None,
            origin: origin.into(),
            comment: None,
        }
    }

    /// Restrict the flag to `[from, to]`.
    #[must_use]
    pub fn with_range(mut self, from: u64, to: u64) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Attach a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A registered DPL process execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DplProcessExecution {
    /// Server-side id.
    pub id: u32,
    /// Run the process executed in.
    pub run_number: u32,
    /// Process name.
    pub process_name: String,
    /// Host the process ran on.
    pub hostname: String,
}

/// Trigger counters of one CTP class at a given time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCounters {
    /// LM level, before dead time.
    pub lmb: u64,
    /// LM level, after dead time.
    pub lma: u64,
    /// L0 level, before dead time.
    pub l0b: u64,
    /// L0 level, after dead time.
    pub l0a: u64,
    /// L1 level, before dead time.
    pub l1b: u64,
    /// L1 level, after dead time.
    pub l1a: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_canonical_names() {
        for run_type in RunType::ALL {
            assert_eq!(run_type.as_str().parse::<RunType>().unwrap(), *run_type);
        }
        for process_type in DplProcessType::ALL {
            assert_eq!(
                process_type.to_string().parse::<DplProcessType>().unwrap(),
                *process_type
            );
        }
    }

    #[test]
    fn enum_parsing_is_case_insensitive() {
        assert_eq!("good".parse::<RunQuality>().unwrap(), RunQuality::Good);
        assert_eq!(" qc_task ".parse::<DplProcessType>().unwrap(), DplProcessType::QcTask);
    }

    #[test]
    fn unknown_enum_value_is_rejected_locally() {
        let err = "CALIBRATION".parse::<RunType>().unwrap_err();
        assert_eq!(err.kind, "RunType");
        assert_eq!(err.value, "CALIBRATION");
    }

    #[test]
    fn enums_serialize_as_upper_case() {
        let json = serde_json::to_string(&LogSubtype::Intervention).unwrap();
        assert_eq!(json, "\"INTERVENTION\"");
    }

    #[test]
    fn negative_parent_log_id_means_no_parent() {
        assert_eq!(CreateLog::new("t", "x").with_parent_log_id(-1).parent_log_id(), None);
        assert_eq!(CreateLog::new("t", "x").parent_log_id(), None);
        assert_eq!(CreateLog::new("t", "x").with_parent_log_id(12).parent_log_id(), Some(12));
    }

    #[test]
    fn qc_flag_deserializes_without_optional_fields() {
        let flag: QcFlag = serde_json::from_str(r#"{"flag_type_id": 11, "origin": "FT0/task"}"#)
            .unwrap();
        assert_eq!(flag, QcFlag::new(11, "FT0/task"));
    }
}
