//! Premium membership requests.

use std::sync::Arc;

use kaay_core::{NewPremiumRequest, PremiumRequest, PremiumRequestId, PremiumRequestPatch};
use tracing::{instrument, warn};

use super::{decode_first, decode_rows, encode};
use crate::error::{DataError, Result};
use crate::remote::{Backend, Filter, Query, Table};

const ENTITY: &str = "premium request";

/// Reads and writes the `premium_requests` table.
#[derive(Clone)]
pub struct PremiumRequestService {
    backend: Arc<dyn Backend>,
}

impl PremiumRequestService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Record a new request in the `pending` state.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if the backend returns no row.
    #[instrument(skip(self, request))]
    pub async fn submit(&self, request: &NewPremiumRequest) -> Result<PremiumRequest> {
        let rows = self
            .backend
            .insert(Table::PremiumRequests, vec![encode(request)?])
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to submit premium request"))?;
        decode_first(ENTITY, rows)?
            .ok_or_else(|| DataError::NotFound("submitted premium request".to_string()))
    }

    /// Every request, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the backend call or decoding fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PremiumRequest>> {
        let query = Query::table(Table::PremiumRequests).order_desc("created_at");
        let rows = self
            .backend
            .select(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load premium requests"))?;
        decode_rows(ENTITY, rows)
    }

    /// Record a review decision.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` if no request has this id.
    #[instrument(skip(self, patch), fields(request_id = %id, status = ?patch.status))]
    pub async fn set_status(
        &self,
        id: &PremiumRequestId,
        patch: &PremiumRequestPatch,
    ) -> Result<PremiumRequest> {
        let rows = self
            .backend
            .update(
                Table::PremiumRequests,
                &[Filter::eq("id", id.as_str())],
                encode(patch)?,
            )
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to review premium request"))?;
        decode_first(ENTITY, rows)?
            .ok_or_else(|| DataError::NotFound(format!("premium request {id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaay_core::PremiumStatus;

    use super::*;
    use crate::remote::MemoryBackend;

    fn request() -> NewPremiumRequest {
        NewPremiumRequest {
            full_name: "Moussa Fall".to_string(),
            phone: "771234567".to_string(),
            email: None,
            instagram: Some("moussa.fall".to_string()),
            tiktok: None,
            followers: 12_000,
            engagement_rate: Some(4.5),
            motivation: None,
        }
    }

    #[tokio::test]
    async fn submitted_requests_start_pending() {
        let service = PremiumRequestService::new(Arc::new(MemoryBackend::new()));
        let created = service.submit(&request()).await.unwrap();
        assert_eq!(created.status, PremiumStatus::Pending);
        assert!(created.access_code.is_none());
    }

    #[tokio::test]
    async fn approval_attaches_access_code() {
        let service = PremiumRequestService::new(Arc::new(MemoryBackend::new()));
        let created = service.submit(&request()).await.unwrap();

        let approved = service
            .set_status(&created.id, &PremiumRequestPatch::approve())
            .await
            .unwrap();
        assert_eq!(approved.status, PremiumStatus::Approved);
        assert!(approved.access_code.unwrap().as_str().starts_with("KAAY-"));

        let rejected = service
            .set_status(&created.id, &PremiumRequestPatch::reject())
            .await
            .unwrap();
        assert_eq!(rejected.status, PremiumStatus::Rejected);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }
}
