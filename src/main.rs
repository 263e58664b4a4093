//! CLI entry point for the bookkeeping client.
//!
//! One subcommand per bookkeeping operation, plus `demo`, which replays a
//! short data-taking scenario against a server. Results are printed to
//! stdout as JSON; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! bkp --uri ali-bookkeeping:4001 --token "$TOKEN" run-get 9003
//! bkp --config bkp.toml log-create "Beam dump" "Run ended early" --run 9003
//! bkp --uri localhost:4001 demo
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bookkeeping_api::connection::resolve_address;
use bookkeeping_api::context::{bearer_token_context_factory, default_context_factory};
use bookkeeping_api::logging::{self, LoggingConfig, OutputFormat};
use bookkeeping_api::model::{
    CreateLog, DplProcessType, FlpCounters, LogOrigin, LogSubtype, QcFlag, RunEnd, RunQuality,
    RunStart, RunType, TriggerCounters,
};
use bookkeeping_api::{BkpClient, BkpClientFactory, BkpConfig};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "bkp")]
#[command(about = "Command-line client for the O2 Bookkeeping service", long_about = None)]
struct Cli {
    /// gRPC endpoint (overrides configuration and BKP_GRPC_URI)
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Bearer token sent with every request (overrides o2.bkp.token)
    #[arg(long, global = true)]
    token: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format: pretty, compact or json
    #[arg(long, global = true, default_value = "compact")]
    log_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the start of a run
    RunStart {
        run_number: u32,
        /// Environment (activity) id
        #[arg(long)]
        environment_id: String,
        #[arg(long, default_value = "TECHNICAL")]
        run_type: RunType,
        #[arg(long, default_value_t = 0)]
        n_detectors: u32,
        #[arg(long, default_value_t = 0)]
        n_flps: u32,
        #[arg(long, default_value_t = 0)]
        n_epns: u32,
        /// O2 and trigger start time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Register the end of a run
    RunEnd {
        run_number: u32,
        #[arg(long, default_value = "UNKNOWN")]
        run_quality: RunQuality,
        /// O2 and trigger end time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Fetch a run
    RunGet { run_number: u32 },

    /// Set the raw CTP trigger configuration of a run
    CtpConfig {
        run_number: u32,
        /// File holding the configuration text
        file: PathBuf,
    },

    /// Register an FLP
    FlpCreate {
        name: String,
        /// Defaults to the local host name
        #[arg(long)]
        hostname: Option<String>,
        #[arg(long)]
        run_number: Option<u32>,
    },

    /// Overwrite the readout counters of an FLP
    FlpCounters {
        flp_name: String,
        run_number: u32,
        #[arg(long, default_value_t = 0)]
        subtimeframes: u64,
        #[arg(long, default_value_t = 0)]
        equipment_bytes: u64,
        #[arg(long, default_value_t = 0)]
        recording_bytes: u64,
        #[arg(long, default_value_t = 0)]
        fair_mq_bytes: u64,
    },

    /// Create a log entry
    LogCreate {
        title: String,
        text: String,
        /// Run the log is about (repeatable)
        #[arg(long = "run")]
        run_numbers: Vec<u32>,
        /// Log this one replies to; negative means none
        #[arg(long, allow_negative_numbers = true)]
        parent_log_id: Option<i32>,
        #[arg(long)]
        origin: Option<LogOrigin>,
        #[arg(long)]
        subtype: Option<LogSubtype>,
    },

    /// Fetch a log entry
    LogGet { log_id: i32 },

    /// Register the execution of a DPL process
    DplRegister {
        run_number: u32,
        process_type: DplProcessType,
        process_name: String,
        /// Defaults to the local host name
        #[arg(long)]
        hostname: Option<String>,
        #[arg(long)]
        args: Option<String>,
        #[arg(long)]
        detector_name: Option<String>,
    },

    /// Create QC flags read from a JSON array file
    QcFlags {
        run_number: u32,
        detector_name: String,
        /// JSON array of {flag_type_id, from, to, origin, comment} objects
        file: PathBuf,
        /// Data pass name
        #[arg(long, conflicts_with = "production")]
        pass: Option<String>,
        /// Simulation production name
        #[arg(long)]
        production: Option<String>,
    },

    /// Create or update the trigger counters of a CTP class
    TriggerCounters {
        run_number: u32,
        class_name: String,
        timestamp: u64,
        #[arg(long, default_value_t = 0)]
        lmb: u64,
        #[arg(long, default_value_t = 0)]
        lma: u64,
        #[arg(long, default_value_t = 0)]
        l0b: u64,
        #[arg(long, default_value_t = 0)]
        l0a: u64,
        #[arg(long, default_value_t = 0)]
        l1b: u64,
        #[arg(long, default_value_t = 0)]
        l1a: u64,
    },

    /// Replay a short data-taking scenario
    Demo {
        /// Run number used by the scenario
        #[arg(long, default_value_t = 9003)]
        run_number: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BkpConfig::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => BkpConfig::load().context("loading configuration")?,
    };
    config.validate()?;
    logging::init(LoggingConfig::from_config(&config)?.with_format(cli.log_format))?;

    let address = resolve_address(cli.uri.as_deref(), config.grpc_uri())?;
    let context_factory = match cli.token.as_deref().or(config.token()) {
        Some(token) => bearer_token_context_factory(token)?,
        None => default_context_factory(),
    };
    info!(%address, source = %address.source(), "Using bookkeeping endpoint");
    let client = BkpClientFactory::connect_with_config(
        address.as_str(),
        context_factory,
        config.channel_config(),
    )
    .await
    .with_context(|| format!("connecting to {address}"))?;

    execute(&client, cli.command).await
}

async fn execute(client: &BkpClient, command: Commands) -> Result<()> {
    match command {
        Commands::RunStart {
            run_number,
            environment_id,
            run_type,
            n_detectors,
            n_flps,
            n_epns,
            at,
        } => {
            let at = at.unwrap_or_else(Utc::now);
            let run = client
                .run()
                .start(RunStart {
                    run_number,
                    time_o2_start: at,
                    time_trg_start: at,
                    environment_id,
                    run_type,
                    n_detectors,
                    n_flps,
                    n_epns,
                })
                .await?;
            print_json(&run)
        }
        Commands::RunEnd {
            run_number,
            run_quality,
            at,
        } => {
            let at = at.unwrap_or_else(Utc::now);
            let end = RunEnd {
                time_o2_end: at,
                time_trg_end: at,
                run_quality,
            };
            print_json(&client.run().end(run_number, end).await?)
        }
        Commands::RunGet { run_number } => print_json(&client.run().get(run_number).await?),
        Commands::CtpConfig { run_number, file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            client
                .run()
                .set_raw_ctp_trigger_configuration(run_number, &text)
                .await?;
            println!("Raw CTP trigger configuration of run {run_number} updated");
            Ok(())
        }
        Commands::FlpCreate {
            name,
            hostname,
            run_number,
        } => {
            let hostname = hostname.map_or_else(local_hostname, Ok)?;
            print_json(&client.flp().create(&name, &hostname, run_number).await?)
        }
        Commands::FlpCounters {
            flp_name,
            run_number,
            subtimeframes,
            equipment_bytes,
            recording_bytes,
            fair_mq_bytes,
        } => {
            let counters = FlpCounters {
                n_subtimeframes: subtimeframes,
                n_equipment_bytes: equipment_bytes,
                n_recording_bytes: recording_bytes,
                n_fair_mq_bytes: fair_mq_bytes,
            };
            client
                .flp()
                .update_counters(&flp_name, run_number, counters)
                .await?;
            println!("Counters of {flp_name} in run {run_number} updated");
            Ok(())
        }
        Commands::LogCreate {
            title,
            text,
            run_numbers,
            parent_log_id,
            origin,
            subtype,
        } => {
            let mut log = CreateLog::new(title, text).with_run_numbers(run_numbers);
            log.parent_log_id = parent_log_id;
            log.origin = origin;
            log.subtype = subtype;
            print_json(&client.log().create(log).await?)
        }
        Commands::LogGet { log_id } => print_json(&client.log().get(log_id).await?),
        Commands::DplRegister {
            run_number,
            process_type,
            process_name,
            hostname,
            args,
            detector_name,
        } => {
            let hostname = hostname.map_or_else(local_hostname, Ok)?;
            client
                .dpl_process_execution()
                .register_process_execution(
                    run_number,
                    process_type,
                    &hostname,
                    &process_name,
                    args.as_deref(),
                    detector_name.as_deref(),
                )
                .await?;
            println!("Execution of {process_name} registered for run {run_number}");
            Ok(())
        }
        Commands::QcFlags {
            run_number,
            detector_name,
            file,
            pass,
            production,
        } => {
            let flags = read_qc_flags(&file).await?;
            let qc_flag = client.qc_flag();
            let ids = match (pass, production) {
                (Some(pass), _) => {
                    qc_flag
                        .create_for_data_pass(run_number, &pass, &detector_name, &flags)
                        .await?
                }
                (None, Some(production)) => {
                    qc_flag
                        .create_for_simulation_pass(run_number, &production, &detector_name, &flags)
                        .await?
                }
                (None, None) => {
                    qc_flag
                        .create_synchronous(run_number, &detector_name, &flags)
                        .await?
                }
            };
            print_json(&ids)
        }
        Commands::TriggerCounters {
            run_number,
            class_name,
            timestamp,
            lmb,
            lma,
            l0b,
            l0a,
            l1b,
            l1a,
        } => {
            let counters = TriggerCounters {
                lmb,
                lma,
                l0b,
                l0a,
                l1b,
                l1a,
            };
            client
                .ctp_trigger_counters()
                .create_or_update_for_run(run_number, &class_name, timestamp, counters)
                .await?;
            println!("Trigger counters of {class_name} in run {run_number} stored");
            Ok(())
        }
        Commands::Demo { run_number } => demo(client, run_number).await,
    }
}

/// Start a run, feed it through every service, then end it.
async fn demo(client: &BkpClient, run_number: u32) -> Result<()> {
    let now = Utc::now();
    let run = client
        .run()
        .start(RunStart {
            run_number,
            time_o2_start: now,
            time_trg_start: now,
            environment_id: "cpp-api".to_string(),
            run_type: RunType::Technical,
            n_detectors: 123,
            n_flps: 200,
            n_epns: 100,
        })
        .await
        .context("starting run")?;
    println!("Run {} started", run.run_number);

    let hostname = local_hostname()?;
    let flp = client
        .flp()
        .create("FLP-TPC-1", &hostname, Some(run_number))
        .await
        .context("creating FLP")?;
    println!("FLP {} created with id {}", flp.name, flp.id);

    client
        .flp()
        .update_counters(
            "FLP-TPC-1",
            run_number,
            FlpCounters {
                n_subtimeframes: 123,
                n_equipment_bytes: 123_408,
                n_recording_bytes: 5_834,
                n_fair_mq_bytes: 9_999,
            },
        )
        .await
        .context("updating FLP counters")?;
    println!("FLP counters updated");

    client
        .dpl_process_execution()
        .register_process_execution(
            run_number,
            DplProcessType::QcChecker,
            &hostname,
            "PROCESS-NAME",
            None,
            Some("DEFAULT"),
        )
        .await
        .context("registering DPL process execution")?;
    println!("DPL process execution registered");

    let flags = [
        QcFlag::new(2, "FT0/Check").with_range(1_565_280_000_000, 1_565_287_200_000),
        QcFlag::new(11, "FT0/task"),
    ];
    let ids = client
        .qc_flag()
        .create_for_data_pass(run_number, "skimming", "FT0", &flags)
        .await
        .context("creating data pass QC flags")?;
    println!("QC flags created with ids {ids:?}");

    let ids = client
        .qc_flag()
        .create_for_simulation_pass(run_number, "LHC23k6b", "FT0", &flags)
        .await
        .context("creating simulation pass QC flags")?;
    println!("QC flags created with ids {ids:?}");

    let trigger = client.ctp_trigger_counters();
    let mut counters = TriggerCounters {
        lmb: 1,
        lma: 2,
        l0b: 3,
        l0a: 4,
        l1b: 5,
        l1a: 6,
    };
    trigger
        .create_or_update_for_run(run_number, "CLASS-NAME", 123, counters)
        .await
        .context("creating trigger counters")?;
    counters = TriggerCounters {
        lmb: 10,
        lma: 20,
        l0b: 30,
        l0a: 40,
        l1b: 50,
        l1a: 60,
    };
    trigger
        .create_or_update_for_run(run_number, "CLASS-NAME", 1234, counters)
        .await
        .context("updating trigger counters")?;
    println!("Trigger counters created then updated");

    client
        .run()
        .set_raw_ctp_trigger_configuration(run_number, "A\nnew raw\nCTP trigger configuration")
        .await
        .context("setting raw CTP trigger configuration")?;
    println!("Raw CTP trigger configuration set");

    let log = client
        .log()
        .create(
            CreateLog::new("Demo run", "Created by the bkp demo")
                .with_run_numbers([run_number])
                .with_parent_log_id(-1),
        )
        .await
        .context("creating log")?;
    println!("Log {} created", log.id);

    let end = RunEnd {
        time_o2_end: Utc::now(),
        time_trg_end: Utc::now(),
        run_quality: RunQuality::Good,
    };
    let run = client.run().end(run_number, end).await.context("ending run")?;
    print_json(&run)
}

/// QC flags from a JSON array file.
async fn read_qc_flags(file: &Path) -> Result<Vec<QcFlag>> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing QC flags from {}", file.display()))
}

fn local_hostname() -> Result<String> {
    Ok(hostname::get()
        .context("reading local host name")?
        .to_string_lossy()
        .into_owned())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
