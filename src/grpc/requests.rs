//! Request message construction.
//!
//! Each function copies caller arguments field by field into the generated
//! message. Arguments the caller left unset are omitted (`None`), never sent
//! as placeholder values.

use bkp_proto::bookkeeping as proto;

use super::convert::to_epoch_millis;
use crate::model::{
    CreateLog, DplProcessType, FlpCounters, QcFlag, RunEnd, RunStart, TriggerCounters,
};

pub fn run_start(run: &RunStart) -> proto::Run {
    proto::Run {
        run_number: run.run_number,
        environment_id: Some(run.environment_id.clone()),
        time_o2_start: Some(to_epoch_millis(run.time_o2_start)),
        time_trg_start: Some(to_epoch_millis(run.time_trg_start)),
        run_type: Some(proto::RunType::from(run.run_type) as i32),
        n_detectors: Some(run.n_detectors),
        n_flps: Some(run.n_flps),
        n_epns: Some(run.n_epns),
        ..Default::default()
    }
}

/// Patch carrying only the end fields, so that start data is never
/// overwritten.
pub fn run_end(run_number: u32, end: &RunEnd) -> proto::RunUpdateRequest {
    proto::RunUpdateRequest {
        run_number,
        patch: Some(proto::Run {
            run_number,
            time_o2_end: Some(to_epoch_millis(end.time_o2_end)),
            time_trg_end: Some(to_epoch_millis(end.time_trg_end)),
            run_quality: Some(proto::RunQuality::from(end.run_quality) as i32),
            ..Default::default()
        }),
    }
}

pub fn run_fetch(run_number: u32) -> proto::RunFetchRequest {
    proto::RunFetchRequest { run_number }
}

pub fn set_raw_ctp_trigger_configuration(
    run_number: u32,
    raw_ctp_trigger_configuration: &str,
) -> proto::SetRawCtpTriggerConfigurationRequest {
    proto::SetRawCtpTriggerConfigurationRequest {
        run_number,
        raw_ctp_trigger_configuration: raw_ctp_trigger_configuration.to_string(),
    }
}

pub fn flp_creation(
    name: &str,
    hostname: &str,
    run_number: Option<u32>,
) -> proto::FlpCreationRequest {
    proto::FlpCreationRequest {
        name: name.to_string(),
        hostname: hostname.to_string(),
        run_number,
    }
}

pub fn flp_update_counters(
    flp_name: &str,
    run_number: u32,
    counters: &FlpCounters,
) -> proto::FlpUpdateCountersRequest {
    proto::FlpUpdateCountersRequest {
        flp_name: flp_name.to_string(),
        run_number,
        n_subtimeframes: counters.n_subtimeframes,
        n_equipment_bytes: counters.n_equipment_bytes,
        n_recording_bytes: counters.n_recording_bytes,
        n_fair_mq_bytes: counters.n_fair_mq_bytes,
    }
}

pub fn log_creation(log: &CreateLog) -> proto::LogCreationRequest {
    proto::LogCreationRequest {
        title: log.title.clone(),
        text: log.text.clone(),
        run_numbers: log.run_numbers.clone(),
        parent_log_id: log.parent_log_id(),
        origin: log.origin.map(|origin| proto::LogOrigin::from(origin) as i32),
        subtype: log.subtype.map(|subtype| proto::LogSubtype::from(subtype) as i32),
    }
}

pub fn log_fetch(id: i32) -> proto::LogFetchRequest {
    proto::LogFetchRequest { id }
}

pub fn dpl_process_execution(
    run_number: u32,
    process_type: DplProcessType,
    hostname: &str,
    process_name: &str,
    args: Option<&str>,
    detector_name: Option<&str>,
) -> proto::DplProcessExecutionCreationRequest {
    proto::DplProcessExecutionCreationRequest {
        run_number,
        detector_name: detector_name.map(str::to_string),
        process_name: process_name.to_string(),
        process_type: proto::DplProcessType::from(process_type) as i32,
        hostname: hostname.to_string(),
        args: args.map(str::to_string),
    }
}

fn qc_flags(flags: &[QcFlag]) -> Vec<proto::QcFlag> {
    flags
        .iter()
        .map(|flag| proto::QcFlag {
            flag_type_id: flag.flag_type_id,
            from: flag.from,
            to: flag.to,
            origin: flag.origin.clone(),
            comment: flag.comment.clone(),
        })
        .collect()
}

pub fn data_pass_qc_flags(
    run_number: u32,
    pass_name: &str,
    detector_name: &str,
    flags: &[QcFlag],
) -> proto::DataPassQcFlagCreationRequest {
    proto::DataPassQcFlagCreationRequest {
        run_number,
        pass_name: pass_name.to_string(),
        detector_name: detector_name.to_string(),
        flags: qc_flags(flags),
    }
}

pub fn simulation_pass_qc_flags(
    run_number: u32,
    production_name: &str,
    detector_name: &str,
    flags: &[QcFlag],
) -> proto::SimulationPassQcFlagCreationRequest {
    proto::SimulationPassQcFlagCreationRequest {
        run_number,
        production_name: production_name.to_string(),
        detector_name: detector_name.to_string(),
        flags: qc_flags(flags),
    }
}

pub fn synchronous_qc_flags(
    run_number: u32,
    detector_name: &str,
    flags: &[QcFlag],
) -> proto::SynchronousQcFlagCreationRequest {
    proto::SynchronousQcFlagCreationRequest {
        run_number,
        detector_name: detector_name.to_string(),
        flags: qc_flags(flags),
    }
}

pub fn ctp_trigger_counters(
    run_number: u32,
    class_name: &str,
    timestamp: u64,
    counters: &TriggerCounters,
) -> proto::CtpTriggerCountersCreateOrUpdateRequest {
    proto::CtpTriggerCountersCreateOrUpdateRequest {
        run_number,
        class_name: class_name.to_string(),
        timestamp,
        lmb: counters.lmb,
        lma: counters.lma,
        l0b: counters.l0b,
        l0a: counters.l0a,
        l1b: counters.l1b,
        l1a: counters.l1a,
    }
}
