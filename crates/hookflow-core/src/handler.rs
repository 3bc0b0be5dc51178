//! Request handling
//!
//! Classifies an inbound event, runs the delete path or the lifecycle, and
//! always finishes with exactly one completion report.

use crate::error::Result;
use crate::gateway::{BackendGateway, Handle};
use crate::lifecycle::LifecycleController;
use crate::profile::BackendProfile;
use crate::report::{
    CallbackTransport, CompletionReporter, ProvisioningResult, ReportContext, ResponseEnvelope,
};
use crate::request::{Disposition, ProvisioningRequest};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;

/// Handler for one resource type
pub struct ResourceHandler<'a> {
    gateway: &'a dyn BackendGateway,
    profile: BackendProfile,
    transport: &'a dyn CallbackTransport,
}

impl<'a> ResourceHandler<'a> {
    pub fn new(
        gateway: &'a dyn BackendGateway,
        profile: BackendProfile,
        transport: &'a dyn CallbackTransport,
    ) -> Self {
        Self {
            gateway,
            profile,
            transport,
        }
    }

    /// Handle one event end to end
    ///
    /// Lifecycle failures are reported as FAILED and do not make this return
    /// an error; only a failed callback delivery does.
    pub async fn handle(
        &self,
        request: &ProvisioningRequest,
        context: ReportContext,
    ) -> Result<ResponseEnvelope> {
        tracing::info!(
            request_type = %request.request_type,
            request_id = %request.request_id,
            logical_resource_id = %request.logical_resource_id,
            backend = %self.gateway.name(),
            "Received provisioning request"
        );

        let result = AssertUnwindSafe(self.resolve(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(panic = %message, "Provisioning panicked");
                ProvisioningResult::failed(format!("Internal error: {}", message))
            });

        CompletionReporter::new(self.transport, context)
            .report(request, &result)
            .await
    }

    /// Compute the result of a request without reporting it
    pub async fn resolve(&self, request: &ProvisioningRequest) -> ProvisioningResult {
        match request.disposition() {
            Disposition::Delete => self.delete(request).await,
            Disposition::CreateOrUpdate => self.provision(request).await,
        }
    }

    async fn delete(&self, request: &ProvisioningRequest) -> ProvisioningResult {
        match (&request.physical_resource_id, self.gateway.supports_teardown()) {
            (Some(id), true) => {
                let handle = Handle::new(id.clone());
                match self.gateway.teardown(&handle).await {
                    Ok(()) => tracing::info!(handle = %handle, "Resource deleted"),
                    // best-effort: delete always reports success
                    Err(e) => tracing::warn!(handle = %handle, error = %e, "Teardown failed, ignoring"),
                }
            }
            (None, true) => {
                tracing::warn!("Delete request without a physical id, nothing to tear down");
            }
            (_, false) => {
                tracing::debug!(backend = %self.gateway.name(), "Backend has no teardown");
            }
        }

        ProvisioningResult::success(request.physical_resource_id.clone(), Default::default())
    }

    async fn provision(&self, request: &ProvisioningRequest) -> ProvisioningResult {
        let controller = LifecycleController::new(
            self.gateway,
            self.profile.clone(),
            request.resource_properties.clone(),
        );

        match controller.run().await {
            Ok(provisioned) => ProvisioningResult::success(
                provisioned.handle.map(Handle::into_inner),
                provisioned.outputs,
            ),
            Err(e) => ProvisioningResult::failed(e.to_string()),
        }
    }
}
