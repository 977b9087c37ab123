pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod simulated;
pub mod validator;


// Re-export main types
pub use orchestrator::{
    buffered_limit, AuthorizationStatus, BatchOrchestrator, DistributionEvent,
    DistributionOutcome, DistributionRequest, DistributionStage, DistributionStatus,
    OrchestratorConfig, OrchestratorError, SettlementReceipt, TxOverrides,
    DEFAULT_NATIVE_UNIT_EXPONENT,
};
pub use provider::{
    CallContext, ProviderError, Receipt, SettlementCall, TxLimits, ValueTransferProvider,
};
pub use session::Session;
pub use simulated::{CostModel, SimulatedProvider, TxRecord, SIMULATED_NETWORK_ID};
pub use validator::BatchValidator;
