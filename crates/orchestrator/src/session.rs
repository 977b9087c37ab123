use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use batch_distributor_types::Address;
use tracing::info;

use crate::{OrchestratorError, ProviderError, ValueTransferProvider};

/// An open connection to one network and its settlement engine
pub struct Session<P: ValueTransferProvider> {
    provider: Arc<P>,
    network_id: u64,
    engine: Address,
    open: AtomicBool,
}

impl<P: ValueTransferProvider> Session<P> {
    /// Connect and resolve the engine address.
    ///
    /// `custom_engine` wins over the deployment registry; otherwise the
    /// engine deployed on the provider's network is used.
    pub async fn open(
        provider: Arc<P>,
        deployments: &HashMap<u64, Address>,
        custom_engine: Option<Address>,
    ) -> Result<Self, ProviderError> {
        let network_id = provider.network_id().await?;
        let engine = match custom_engine {
            Some(address) => address,
            None => deployments
                .get(&network_id)
                .cloned()
                .ok_or(ProviderError::NoDeployment { network_id })?,
        };

        info!(network_id, engine = %engine, "Session opened");

        Ok(Self {
            provider,
            network_id,
            engine,
            open: AtomicBool::new(true),
        })
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    pub fn engine_address(&self) -> &Address {
        &self.engine
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn provider(&self) -> Result<&P, OrchestratorError> {
        if !self.is_open() {
            return Err(OrchestratorError::SessionClosed);
        }
        Ok(self.provider.as_ref())
    }

    /// Default signer of the connected provider
    pub async fn current_account(&self) -> Result<Address, OrchestratorError> {
        let accounts = self.provider()?.get_accounts().await?;
        accounts.into_iter().next().ok_or(OrchestratorError::NoAccount)
    }

    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!(network_id = self.network_id, "Session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimulatedProvider, SIMULATED_NETWORK_ID};
    use cosmwasm_std::Uint128;

    fn deployments(engine: &Address) -> HashMap<u64, Address> {
        HashMap::from([(SIMULATED_NETWORK_ID, engine.clone())])
    }

    #[tokio::test]
    async fn test_open_resolves_deployment() {
        let provider = Arc::new(SimulatedProvider::new());
        let engine = provider.engine_address().clone();

        let session = Session::open(provider, &deployments(&engine), None)
            .await
            .unwrap();

        assert_eq!(session.network_id(), SIMULATED_NETWORK_ID);
        assert_eq!(session.engine_address(), &engine);
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_custom_engine_overrides_registry() {
        let provider = Arc::new(SimulatedProvider::new());
        let custom = Address::from_label("custom-engine");

        let session = Session::open(provider, &HashMap::new(), Some(custom.clone()))
            .await
            .unwrap();

        assert_eq!(session.engine_address(), &custom);
    }

    #[tokio::test]
    async fn test_missing_deployment() {
        let provider = Arc::new(SimulatedProvider::new().with_network_id(5));
        let engine = provider.engine_address().clone();

        let err = Session::open(provider, &deployments(&engine), None)
            .await
            .err()
            .unwrap();

        assert_eq!(err, ProviderError::NoDeployment { network_id: 5 });
    }

    #[tokio::test]
    async fn test_current_account_is_first_account() {
        let provider = Arc::new(SimulatedProvider::new());
        provider
            .add_account(&Address::from_label("first"), Uint128::zero())
            .await
            .unwrap();
        provider
            .add_account(&Address::from_label("second"), Uint128::zero())
            .await
            .unwrap();
        let engine = provider.engine_address().clone();

        let session = Session::open(provider, &deployments(&engine), None)
            .await
            .unwrap();

        assert_eq!(
            session.current_account().await.unwrap(),
            Address::from_label("first")
        );
    }

    #[tokio::test]
    async fn test_no_account() {
        let provider = Arc::new(SimulatedProvider::new());
        let engine = provider.engine_address().clone();
        let session = Session::open(provider, &deployments(&engine), None)
            .await
            .unwrap();

        assert!(matches!(
            session.current_account().await,
            Err(OrchestratorError::NoAccount)
        ));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_use() {
        let provider = Arc::new(SimulatedProvider::new());
        let engine = provider.engine_address().clone();
        let session = Session::open(provider, &deployments(&engine), None)
            .await
            .unwrap();

        session.close();
        session.close();

        assert!(!session.is_open());
        assert!(matches!(
            session.provider(),
            Err(OrchestratorError::SessionClosed)
        ));
        assert!(matches!(
            session.current_account().await,
            Err(OrchestratorError::SessionClosed)
        ));
    }
}
