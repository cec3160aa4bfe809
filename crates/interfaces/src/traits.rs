use async_trait::async_trait;
use webpilot_core::Plan;

/// Human approval of a validated plan before anything is executed.
#[async_trait]
pub trait PlanConfirmer: Send + Sync {
    async fn confirm_plan(&self, plan: &Plan) -> bool;
}

/// Human approval of a navigation that leaves the current origin.
#[async_trait]
pub trait OriginConfirmer: Send + Sync {
    async fn confirm_origin_change(&self, from: &str, to: &str) -> bool;
}

/// Confirms everything. For unattended runs under permissive profiles.
pub struct AutoApprove;

#[async_trait]
impl PlanConfirmer for AutoApprove {
    async fn confirm_plan(&self, _plan: &Plan) -> bool {
        true
    }
}

#[async_trait]
impl OriginConfirmer for AutoApprove {
    async fn confirm_origin_change(&self, _from: &str, _to: &str) -> bool {
        true
    }
}
