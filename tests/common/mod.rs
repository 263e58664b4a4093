//! In-process fake bookkeeping server.
//!
//! Serves every bookkeeping service on an ephemeral local port, records the
//! requests it receives (with their `authorization` header) and can be told
//! to fail every call with a given status.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bkp_proto::bookkeeping as proto;
use proto::ctp_trigger_counters_service_server::{
    CtpTriggerCountersService, CtpTriggerCountersServiceServer,
};
use proto::dpl_process_execution_service_server::{
    DplProcessExecutionService, DplProcessExecutionServiceServer,
};
use proto::flp_service_server::{FlpService, FlpServiceServer};
use proto::log_service_server::{LogService, LogServiceServer};
use proto::qc_flag_service_server::{QcFlagService, QcFlagServiceServer};
use proto::run_service_server::{RunService, RunServiceServer};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Code, Request, Response, Status};

/// A request received by the fake server.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RunGet(proto::RunFetchRequest),
    RunStart(proto::Run),
    RunUpdate(proto::RunUpdateRequest),
    SetRawCtpTriggerConfiguration(proto::SetRawCtpTriggerConfigurationRequest),
    FlpCreate(proto::FlpCreationRequest),
    FlpUpdateCounters(proto::FlpUpdateCountersRequest),
    LogCreate(proto::LogCreationRequest),
    LogGet(proto::LogFetchRequest),
    DplRegister(proto::DplProcessExecutionCreationRequest),
    QcDataPass(proto::DataPassQcFlagCreationRequest),
    QcSimulationPass(proto::SimulationPassQcFlagCreationRequest),
    QcSynchronous(proto::SynchronousQcFlagCreationRequest),
    CtpTriggerCounters(proto::CtpTriggerCountersCreateOrUpdateRequest),
}

/// State shared between the fake services and the test.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    authorizations: Mutex<Vec<Option<String>>>,
    failure: Mutex<Option<(Code, String)>>,
    short_qc_ids: AtomicBool,
    run_get_delay: Mutex<Option<Duration>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// `authorization` header of every request, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }

    /// Fail every following call with `code` and `message`.
    pub fn fail_with(&self, code: Code, message: &str) {
        *self.failure.lock().unwrap() = Some((code, message.to_string()));
    }

    /// Answer QC flag batches with one id less than submitted.
    pub fn return_short_qc_ids(&self) {
        self.short_qc_ids.store(true, Ordering::SeqCst);
    }

    /// Hold every following run fetch for `delay` before answering.
    pub fn delay_run_get(&self, delay: Duration) {
        *self.run_get_delay.lock().unwrap() = Some(delay);
    }

    fn record<T>(&self, request: &Request<T>, call: Call) -> Result<(), Status> {
        let authorization = request
            .metadata()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.authorizations.lock().unwrap().push(authorization);
        self.calls.lock().unwrap().push(call);

        match self.failure.lock().unwrap().as_ref() {
            Some((code, message)) => Err(Status::new(*code, message.clone())),
            None => Ok(()),
        }
    }

    fn qc_ids(&self, count: usize) -> proto::QcFlagCreationResponse {
        let count = if self.short_qc_ids.load(Ordering::SeqCst) {
            count.saturating_sub(1)
        } else {
            count
        };
        proto::QcFlagCreationResponse {
            flag_ids: (0..count as u32).map(|i| 1000 + i).collect(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeBookkeeping {
    state: Arc<Recorder>,
}

#[tonic::async_trait]
impl RunService for FakeBookkeeping {
    async fn get(
        &self,
        request: Request<proto::RunFetchRequest>,
    ) -> Result<Response<proto::Run>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::RunGet(message.clone()))?;
        let delay = *self.state.run_get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Response::new(proto::Run {
            run_number: message.run_number,
            environment_id: Some("env-1".to_string()),
            time_o2_start: Some(1_565_280_000_000),
            run_type: Some(proto::RunType::Physics as i32),
            run_quality: Some(proto::RunQuality::Good as i32),
            n_flps: Some(200),
            ..Default::default()
        }))
    }

    async fn start(&self, request: Request<proto::Run>) -> Result<Response<proto::Run>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::RunStart(message.clone()))?;
        Ok(Response::new(message))
    }

    async fn update(
        &self,
        request: Request<proto::RunUpdateRequest>,
    ) -> Result<Response<proto::Run>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::RunUpdate(message.clone()))?;
        let patch = message.patch.unwrap_or_default();
        Ok(Response::new(proto::Run {
            run_number: message.run_number,
            ..patch
        }))
    }

    async fn set_raw_ctp_trigger_configuration(
        &self,
        request: Request<proto::SetRawCtpTriggerConfigurationRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        let message = request.get_ref().clone();
        self.state
            .record(&request, Call::SetRawCtpTriggerConfiguration(message))?;
        Ok(Response::new(proto::Empty {}))
    }
}

#[tonic::async_trait]
impl FlpService for FakeBookkeeping {
    async fn create(
        &self,
        request: Request<proto::FlpCreationRequest>,
    ) -> Result<Response<proto::Flp>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::FlpCreate(message.clone()))?;
        Ok(Response::new(proto::Flp {
            id: 1,
            name: message.name,
            hostname: message.hostname,
            run_number: message.run_number,
            ..Default::default()
        }))
    }

    async fn update_counters(
        &self,
        request: Request<proto::FlpUpdateCountersRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::FlpUpdateCounters(message))?;
        Ok(Response::new(proto::Empty {}))
    }
}

#[tonic::async_trait]
impl LogService for FakeBookkeeping {
    async fn create(
        &self,
        request: Request<proto::LogCreationRequest>,
    ) -> Result<Response<proto::Log>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::LogCreate(message.clone()))?;
        Ok(Response::new(proto::Log {
            id: 42,
            title: message.title,
            text: message.text,
            origin: message.origin.unwrap_or(proto::LogOrigin::Process as i32),
            subtype: message.subtype.unwrap_or(proto::LogSubtype::Run as i32),
            run_numbers: message.run_numbers,
            parent_log_id: message.parent_log_id,
            root_log_id: message.parent_log_id,
            created_at: Some(1_565_280_000_000),
        }))
    }

    async fn get(
        &self,
        request: Request<proto::LogFetchRequest>,
    ) -> Result<Response<proto::Log>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::LogGet(message.clone()))?;
        Ok(Response::new(proto::Log {
            id: message.id,
            title: "Beam dump".to_string(),
            text: "Run ended early".to_string(),
            origin: proto::LogOrigin::Human as i32,
            subtype: proto::LogSubtype::Intervention as i32,
            run_numbers: vec![9003, 9004],
            ..Default::default()
        }))
    }
}

#[tonic::async_trait]
impl DplProcessExecutionService for FakeBookkeeping {
    async fn register_process_execution(
        &self,
        request: Request<proto::DplProcessExecutionCreationRequest>,
    ) -> Result<Response<proto::DplProcessExecution>, Status> {
        let message = request.get_ref().clone();
        self.state.record(&request, Call::DplRegister(message.clone()))?;
        Ok(Response::new(proto::DplProcessExecution {
            id: 7,
            run_number: message.run_number,
            process_name: message.process_name,
            hostname: message.hostname,
        }))
    }
}

#[tonic::async_trait]
impl QcFlagService for FakeBookkeeping {
    async fn create_for_data_pass(
        &self,
        request: Request<proto::DataPassQcFlagCreationRequest>,
    ) -> Result<Response<proto::QcFlagCreationResponse>, Status> {
        let message = request.get_ref().clone();
        let count = message.flags.len();
        self.state.record(&request, Call::QcDataPass(message))?;
        Ok(Response::new(self.state.qc_ids(count)))
    }

    async fn create_for_simulation_pass(
        &self,
        request: Request<proto::SimulationPassQcFlagCreationRequest>,
    ) -> Result<Response<proto::QcFlagCreationResponse>, Status> {
        let message = request.get_ref().clone();
        let count = message.flags.len();
        self.state.record(&request, Call::QcSimulationPass(message))?;
        Ok(Response::new(self.state.qc_ids(count)))
    }

    async fn create_synchronous(
        &self,
        request: Request<proto::SynchronousQcFlagCreationRequest>,
    ) -> Result<Response<proto::QcFlagCreationResponse>, Status> {
        let message = request.get_ref().clone();
        let count = message.flags.len();
        self.state.record(&request, Call::QcSynchronous(message))?;
        Ok(Response::new(self.state.qc_ids(count)))
    }
}

#[tonic::async_trait]
impl CtpTriggerCountersService for FakeBookkeeping {
    async fn create_or_update_for_run(
        &self,
        request: Request<proto::CtpTriggerCountersCreateOrUpdateRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        let message = request.get_ref().clone();
        self.state
            .record(&request, Call::CtpTriggerCounters(message))?;
        Ok(Response::new(proto::Empty {}))
    }
}

/// A running fake server. Stops when dropped.
pub struct TestServer {
    pub uri: String,
    pub state: Arc<Recorder>,
    _shutdown: oneshot::Sender<()>,
}

/// Start a fake server on the current tokio runtime.
pub async fn spawn() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake = FakeBookkeeping::default();
    let state = Arc::clone(&fake.state);
    let (shutdown, stopped) = oneshot::channel::<()>();

    tokio::spawn(async move {
        Server::builder()
            .add_service(RunServiceServer::new(fake.clone()))
            .add_service(FlpServiceServer::new(fake.clone()))
            .add_service(LogServiceServer::new(fake.clone()))
            .add_service(DplProcessExecutionServiceServer::new(fake.clone()))
            .add_service(QcFlagServiceServer::new(fake.clone()))
            .add_service(CtpTriggerCountersServiceServer::new(fake))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        uri: format!("http://{addr}"),
        state,
        _shutdown: shutdown,
    }
}
