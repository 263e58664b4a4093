//! Conversions between domain records and generated protobuf messages.

use bkp_proto::bookkeeping as proto;
use chrono::{DateTime, Utc};

use crate::error::{ClientError, ParseEnumError, Result};
use crate::model::{
    DplProcessExecution, DplProcessType, Flp, Log, LogOrigin, LogSubtype, Run, RunQuality, RunType,
};

/// Trait for converting proto types to domain types
pub trait ToDomain<T> {
    /// Convert, rejecting values the domain cannot represent.
    fn to_domain(self) -> Result<T>;
}

// Domain -> Proto

impl From<RunType> for proto::RunType {
    fn from(run_type: RunType) -> Self {
        match run_type {
            RunType::Physics => proto::RunType::Physics,
            RunType::Cosmics => proto::RunType::Cosmics,
            RunType::Technical => proto::RunType::Technical,
        }
    }
}

impl From<RunQuality> for proto::RunQuality {
    fn from(quality: RunQuality) -> Self {
        match quality {
            RunQuality::Good => proto::RunQuality::Good,
            RunQuality::Bad => proto::RunQuality::Bad,
            RunQuality::Unknown => proto::RunQuality::Unknown,
        }
    }
}

impl From<DplProcessType> for proto::DplProcessType {
    fn from(process_type: DplProcessType) -> Self {
        match process_type {
            DplProcessType::QcTask => proto::DplProcessType::QcTask,
            DplProcessType::QcChecker => proto::DplProcessType::QcChecker,
            DplProcessType::QcAggregator => proto::DplProcessType::QcAggregator,
            DplProcessType::QcPostprocessing => proto::DplProcessType::QcPostprocessing,
            DplProcessType::Dispatcher => proto::DplProcessType::Dispatcher,
            DplProcessType::Merger => proto::DplProcessType::Merger,
        }
    }
}

impl From<LogOrigin> for proto::LogOrigin {
    fn from(origin: LogOrigin) -> Self {
        match origin {
            LogOrigin::Human => proto::LogOrigin::Human,
            LogOrigin::Process => proto::LogOrigin::Process,
        }
    }
}

impl From<LogSubtype> for proto::LogSubtype {
    fn from(subtype: LogSubtype) -> Self {
        match subtype {
            LogSubtype::Run => proto::LogSubtype::Run,
            LogSubtype::Subsystem => proto::LogSubtype::Subsystem,
            LogSubtype::Announcement => proto::LogSubtype::Announcement,
            LogSubtype::Intervention => proto::LogSubtype::Intervention,
            LogSubtype::Comment => proto::LogSubtype::Comment,
        }
    }
}

// Proto -> Domain
//
// The `NULL` (0) value of every wire enum means "unset"; it maps to `None`
// for optional fields and is an error where a value is required.

impl ToDomain<Option<RunType>> for proto::RunType {
    fn to_domain(self) -> Result<Option<RunType>> {
        Ok(match self {
            proto::RunType::Null => None,
            proto::RunType::Physics => Some(RunType::Physics),
            proto::RunType::Cosmics => Some(RunType::Cosmics),
            proto::RunType::Technical => Some(RunType::Technical),
        })
    }
}

impl ToDomain<Option<RunQuality>> for proto::RunQuality {
    fn to_domain(self) -> Result<Option<RunQuality>> {
        Ok(match self {
            proto::RunQuality::Null => None,
            proto::RunQuality::Good => Some(RunQuality::Good),
            proto::RunQuality::Bad => Some(RunQuality::Bad),
            proto::RunQuality::Unknown => Some(RunQuality::Unknown),
        })
    }
}

impl ToDomain<DplProcessType> for proto::DplProcessType {
    fn to_domain(self) -> Result<DplProcessType> {
        match self {
            proto::DplProcessType::Null => {
                Err(ParseEnumError::new("DplProcessType", self.as_str_name()).into())
            }
            proto::DplProcessType::QcTask => Ok(DplProcessType::QcTask),
            proto::DplProcessType::QcChecker => Ok(DplProcessType::QcChecker),
            proto::DplProcessType::QcAggregator => Ok(DplProcessType::QcAggregator),
            proto::DplProcessType::QcPostprocessing => Ok(DplProcessType::QcPostprocessing),
            proto::DplProcessType::Dispatcher => Ok(DplProcessType::Dispatcher),
            proto::DplProcessType::Merger => Ok(DplProcessType::Merger),
        }
    }
}

impl ToDomain<Option<LogOrigin>> for proto::LogOrigin {
    fn to_domain(self) -> Result<Option<LogOrigin>> {
        Ok(match self {
            proto::LogOrigin::Null => None,
            proto::LogOrigin::Human => Some(LogOrigin::Human),
            proto::LogOrigin::Process => Some(LogOrigin::Process),
        })
    }
}

impl ToDomain<Option<LogSubtype>> for proto::LogSubtype {
    fn to_domain(self) -> Result<Option<LogSubtype>> {
        Ok(match self {
            proto::LogSubtype::Null => None,
            proto::LogSubtype::Run => Some(LogSubtype::Run),
            proto::LogSubtype::Subsystem => Some(LogSubtype::Subsystem),
            proto::LogSubtype::Announcement => Some(LogSubtype::Announcement),
            proto::LogSubtype::Intervention => Some(LogSubtype::Intervention),
            proto::LogSubtype::Comment => Some(LogSubtype::Comment),
        })
    }
}

/// Decode a raw enum number, rejecting values unknown to this client.
fn wire_enum<E, T>(kind: &'static str, value: i32) -> Result<T>
where
    E: TryFrom<i32> + ToDomain<T>,
{
    E::try_from(value)
        .map_err(|_| ClientError::from(ParseEnumError::new(kind, value)))?
        .to_domain()
}

fn optional_wire_enum<E, T>(kind: &'static str, value: Option<i32>) -> Result<Option<T>>
where
    E: TryFrom<i32> + ToDomain<Option<T>>,
{
    match value {
        Some(value) => wire_enum::<E, Option<T>>(kind, value),
        None => Ok(None),
    }
}

/// Milliseconds since the unix epoch, as sent on the wire.
pub(crate) fn to_epoch_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub(crate) fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        ClientError::UnexpectedResponse(format!("timestamp out of range: {millis} ms"))
    })
}

fn optional_instant(millis: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    millis.map(from_epoch_millis).transpose()
}

impl ToDomain<Run> for proto::Run {
    fn to_domain(self) -> Result<Run> {
        Ok(Run {
            run_number: self.run_number,
            environment_id: self.environment_id,
            time_o2_start: optional_instant(self.time_o2_start)?,
            time_trg_start: optional_instant(self.time_trg_start)?,
            time_o2_end: optional_instant(self.time_o2_end)?,
            time_trg_end: optional_instant(self.time_trg_end)?,
            run_type: optional_wire_enum::<proto::RunType, _>("RunType", self.run_type)?,
            run_quality: optional_wire_enum::<proto::RunQuality, _>(
                "RunQuality",
                self.run_quality,
            )?,
            n_detectors: self.n_detectors,
            n_flps: self.n_flps,
            n_epns: self.n_epns,
            n_subtimeframes: self.n_subtimeframes,
            bytes_read_out: self.bytes_read_out,
            raw_ctp_trigger_configuration: self.raw_ctp_trigger_configuration,
        })
    }
}

impl ToDomain<Flp> for proto::Flp {
    fn to_domain(self) -> Result<Flp> {
        Ok(Flp {
            id: self.id,
            name: self.name,
            hostname: self.hostname,
            run_number: self.run_number,
            n_timeframes: self.n_timeframes,
            bytes_processed: self.bytes_processed,
            bytes_equipment_read_out: self.bytes_equipment_read_out,
            bytes_recording_read_out: self.bytes_recording_read_out,
            bytes_fair_mq_read_out: self.bytes_fair_mq_read_out,
        })
    }
}

impl ToDomain<Log> for proto::Log {
    fn to_domain(self) -> Result<Log> {
        Ok(Log {
            id: self.id,
            origin: wire_enum::<proto::LogOrigin, _>("LogOrigin", self.origin)?,
            subtype: wire_enum::<proto::LogSubtype, _>("LogSubtype", self.subtype)?,
            title: self.title,
            text: self.text,
            run_numbers: self.run_numbers,
            parent_log_id: self.parent_log_id,
            root_log_id: self.root_log_id,
            created_at: optional_instant(self.created_at)?,
        })
    }
}

impl ToDomain<DplProcessExecution> for proto::DplProcessExecution {
    fn to_domain(self) -> Result<DplProcessExecution> {
        Ok(DplProcessExecution {
            id: self.id,
            run_number: self.run_number,
            process_name: self.process_name,
            hostname: self.hostname,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_type_round_trips_through_the_wire() {
        for run_type in RunType::ALL {
            let wire = proto::RunType::from(*run_type) as i32;
            let back: Option<RunType> = wire_enum::<proto::RunType, _>("RunType", wire).unwrap();
            assert_eq!(back, Some(*run_type));
        }
    }

    #[test]
    fn run_quality_round_trips_through_the_wire() {
        for quality in RunQuality::ALL {
            let wire = proto::RunQuality::from(*quality) as i32;
            let back: Option<RunQuality> =
                wire_enum::<proto::RunQuality, _>("RunQuality", wire).unwrap();
            assert_eq!(back, Some(*quality));
        }
    }

    #[test]
    fn dpl_process_type_round_trips_through_the_wire() {
        for process_type in DplProcessType::ALL {
            let wire = proto::DplProcessType::from(*process_type) as i32;
            let back: DplProcessType =
                wire_enum::<proto::DplProcessType, _>("DplProcessType", wire).unwrap();
            assert_eq!(back, *process_type);
        }
    }

    #[test]
    fn log_enums_round_trip_through_the_wire() {
        for origin in LogOrigin::ALL {
            let wire = proto::LogOrigin::from(*origin);
            assert_eq!(wire.to_domain().unwrap(), Some(*origin));
        }
        for subtype in LogSubtype::ALL {
            let wire = proto::LogSubtype::from(*subtype);
            assert_eq!(wire.to_domain().unwrap(), Some(*subtype));
        }
    }

    #[test]
    fn wire_names_carry_the_type_prefix() {
        assert_eq!(
            proto::RunType::from(RunType::Technical).as_str_name(),
            "RUN_TYPE_TECHNICAL"
        );
        assert_eq!(
            proto::RunQuality::from(RunQuality::Good).as_str_name(),
            "RUN_QUALITY_GOOD"
        );
        assert_eq!(
            proto::DplProcessType::from(DplProcessType::QcChecker).as_str_name(),
            "DPL_PROCESS_TYPE_QC_CHECKER"
        );
    }

    #[test]
    fn unknown_wire_enum_is_rejected() {
        let err = wire_enum::<proto::RunType, Option<RunType>>("RunType", 42).unwrap_err();
        assert_eq!(err.to_string(), "Invalid RunType value: 42");
    }

    #[test]
    fn null_process_type_is_rejected() {
        let err = proto::DplProcessType::Null.to_domain().unwrap_err();
        assert!(matches!(err, ClientError::InvalidEnumValue(_)));
    }

    #[test]
    fn run_without_optional_fields_converts() {
        let run = proto::Run {
            run_number: 9003,
            ..Default::default()
        }
        .to_domain()
        .unwrap();

        assert_eq!(run.run_number, 9003);
        assert_eq!(run.run_type, None);
        assert_eq!(run.time_o2_start, None);
    }

    #[test]
    fn epoch_millis_round_trip() {
        let instant = from_epoch_millis(1_565_280_000_000).unwrap();
        assert_eq!(to_epoch_millis(instant), 1_565_280_000_000);
        assert!(from_epoch_millis(i64::MAX).is_err());
    }
}
