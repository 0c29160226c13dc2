//! gRPC front end for the scoped ID allocator.
//!
//! [`IdService`] implements the [`IdAllocator`] service on top of a shared
//! [`Allocator`]. Handlers are thin: validate, call the allocator, convert the
//! result. Allocator errors are mapped to `tonic::Status` through
//! [`scopeid_tonic_core::Error`].

use crate::server::telemetry::{increment_clock_regressions, increment_ids_issued, increment_requests};
use scopeid_tonic_core::{
    Error,
    proto::{
        GetDatacenterIdRequest, GetDatacenterIdResponse, GetIdRequest, GetIdResponse,
        GetScopesRequest, GetScopesResponse, GetTimestampRequest, GetTimestampResponse,
        GetWorkerIdRequest, GetWorkerIdResponse, id_allocator_server::IdAllocator,
    },
    scopeid::{self, Identity},
    types::{Allocator, validate_scope},
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tonic::{Request, Response, Status};

/// gRPC service handing out scoped IDs.
///
/// Cloning is cheap; every clone shares the same allocator and shutdown flag.
#[derive(Clone)]
pub struct IdService {
    allocator: Arc<Allocator>,
    shutting_down: Arc<AtomicBool>,
}

impl IdService {
    pub fn new(identity: Identity) -> Self {
        Self::with_allocator(Allocator::new(identity))
    }

    pub fn with_allocator(allocator: Allocator) -> Self {
        Self {
            allocator: Arc::new(allocator),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Refuses new `GetId` calls. Requests already past the check complete
    /// normally.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
    }

    fn ensure_running(&self) -> Result<(), Error> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(Error::ServiceShutdown);
        }
        Ok(())
    }
}

#[tonic::async_trait]
impl IdAllocator for IdService {
    async fn get_worker_id(
        &self,
        _req: Request<GetWorkerIdRequest>,
    ) -> Result<Response<GetWorkerIdResponse>, Status> {
        increment_requests("GetWorkerId");
        Ok(Response::new(GetWorkerIdResponse {
            worker_id: u32::from(self.allocator.worker_id()),
        }))
    }

    async fn get_datacenter_id(
        &self,
        _req: Request<GetDatacenterIdRequest>,
    ) -> Result<Response<GetDatacenterIdResponse>, Status> {
        increment_requests("GetDatacenterId");
        Ok(Response::new(GetDatacenterIdResponse {
            datacenter_id: u32::from(self.allocator.datacenter_id()),
        }))
    }

    async fn get_timestamp(
        &self,
        _req: Request<GetTimestampRequest>,
    ) -> Result<Response<GetTimestampResponse>, Status> {
        increment_requests("GetTimestamp");
        Ok(Response::new(GetTimestampResponse {
            timestamp: self.allocator.current_timestamp(),
        }))
    }

    /// Issues the next ID for the requested scope.
    ///
    /// The allocator call is synchronous and short: it holds the scope's lock
    /// only long enough to read the clock and bump a counter, so it runs on
    /// the request task instead of a blocking pool.
    #[tracing::instrument(level = "debug", skip_all, fields(scope = %req.get_ref().scope))]
    async fn get_id(&self, req: Request<GetIdRequest>) -> Result<Response<GetIdResponse>, Status> {
        increment_requests("GetId");
        self.ensure_running()?;

        let scope = validate_scope(&req.get_ref().scope)?;
        match self.allocator.next_id(scope) {
            Ok(id) => {
                increment_ids_issued();
                Ok(Response::new(GetIdResponse { id: id.to_raw() }))
            }
            Err(e @ scopeid::Error::ClockRegression { .. }) => {
                increment_clock_regressions();
                tracing::warn!(%scope, error = %e, "refusing to issue id");
                Err(Error::from(e).into())
            }
            Err(e) => Err(Error::from(e).into()),
        }
    }

    async fn get_scopes(
        &self,
        _req: Request<GetScopesRequest>,
    ) -> Result<Response<GetScopesResponse>, Status> {
        increment_requests("GetScopes");
        Ok(Response::new(GetScopesResponse {
            scopes: self.allocator.list_scopes(),
        }))
    }
}
