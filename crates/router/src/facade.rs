//! Selector-dispatching facade over the logic modules.

use crate::context::{CallContext, CallOutput, ExecContext, ViewContext};
use crate::error::RouterError;
use crate::modules::{LogicModule, OrderBookRouter, PairRouter, PairUtils};
use crate::selectors::IHybridRouter::{self, IHybridRouterCalls};
use crate::selectors::Operation;
use alloy::primitives::{Address, Bytes, FixedBytes, Log};
use alloy::sol_types::{SolCall, SolEvent, SolInterface};
use dex::{ConfigProvider, DexError, PoolManager, Settlement, TokenLedger};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Single entry point of the exchange.
///
/// Holds the engine state and the token ledger, and forwards each call to the
/// logic module bound to its selector. Modules run against the facade's own
/// storage with the caller's identity and attached value.
///
/// State-changing calls are serialized and atomic: a call runs on a draft of
/// the state, its token movements settle afterwards, and any failure leaves
/// both state and ledger untouched.
#[derive(Debug)]
pub struct HybridRouter<L: TokenLedger> {
    address: Address,
    config: Arc<dyn ConfigProvider>,
    state: RwLock<PoolManager>,
    ledger: RwLock<L>,
    bindings: RwLock<HashMap<[u8; 4], Address>>,
    modules: HashMap<Address, Box<dyn LogicModule>>,
}

impl<L: TokenLedger> HybridRouter<L> {
    /// Create a facade at `address` with no modules and no bindings.
    /// The facade account holds all pool reserves and resting order funds.
    pub fn new(address: Address, config: Arc<dyn ConfigProvider>, ledger: L) -> Self {
        let state = PoolManager::new(config.clone(), address);
        Self {
            address,
            config,
            state: RwLock::new(state),
            ledger: RwLock::new(ledger),
            bindings: RwLock::new(HashMap::new()),
            modules: HashMap::new(),
        }
    }

    /// Create a facade with the three standard modules deployed at the given
    /// backend addresses. Their selectors still have to be bound by the owner.
    pub fn with_standard_modules(
        address: Address,
        config: Arc<dyn ConfigProvider>,
        ledger: L,
        backends: StandardBackends,
    ) -> Self {
        let mut router = Self::new(address, config, ledger);
        router.register_module(backends.pair_router, Box::new(PairRouter));
        router.register_module(backends.order_book_router, Box::new(OrderBookRouter));
        router.register_module(backends.pair_utils, Box::new(PairUtils));
        router
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    /// Deploy `module` at `backend`, replacing whatever was there.
    pub fn register_module(&mut self, backend: Address, module: Box<dyn LogicModule>) {
        info!(%backend, module = module.name(), "module registered");
        self.modules.insert(backend, module);
    }

    /// Backend currently bound to `selector`.
    pub fn binding(&self, selector: [u8; 4]) -> Option<Address> {
        self.bindings.read().get(&selector).copied()
    }

    /// Bind `selectors` to `backend`, overwriting earlier bindings.
    /// Only the configured owner may bind.
    pub fn bind_functions(&self, caller: Address, backend: Address, selectors: &[[u8; 4]]) -> Result<(), RouterError> {
        let owner = self.config.owner();
        if caller != owner {
            return Err(DexError::Unauthorized(format!("{caller} is not the owner")).into());
        }
        let mut bindings = self.bindings.write();
        for selector in selectors {
            if let Some(previous) = bindings.insert(*selector, backend) {
                debug!(selector = %hex::encode(selector), %previous, %backend, "binding overwritten");
            }
        }
        info!(%backend, count = selectors.len(), "functions bound");
        Ok(())
    }

    /// Read access to the engine state.
    pub fn state(&self) -> parking_lot::RwLockReadGuard<'_, PoolManager> {
        self.state.read()
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> parking_lot::RwLockReadGuard<'_, L> {
        self.ledger.read()
    }

    /// Mutable access to the ledger, for funding accounts outside of calls.
    pub fn ledger_mut(&self) -> parking_lot::RwLockWriteGuard<'_, L> {
        self.ledger.write()
    }

    /// Dispatch ABI-encoded `calldata` on behalf of `ctx.caller`.
    ///
    /// Returns the bound module's ABI-encoded result verbatim along with the
    /// logs it emitted.
    pub fn call(&self, ctx: &CallContext, calldata: &[u8]) -> Result<CallOutput, RouterError> {
        if calldata.len() < 4 {
            return Err(RouterError::InvalidCalldata(
                "calldata too short for function selector".to_string(),
            ));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);

        if selector == IHybridRouter::bindFunctionsCall::SELECTOR {
            return self.handle_bind_functions(ctx, calldata);
        }

        let backend = self
            .binding(selector)
            .ok_or(RouterError::FunctionNotFound(selector))?;
        let module = self
            .modules
            .get(&backend)
            .ok_or(RouterError::FunctionNotFound(selector))?;
        let operation = Operation::from_selector(selector)
            .filter(|op| module.implements(*op))
            .ok_or(RouterError::FunctionNotFound(selector))?;

        let call = IHybridRouterCalls::abi_decode(calldata).map_err(|e| {
            RouterError::InvalidCalldata(format!("failed to decode {}: {}", operation.name(), e))
        })?;
        debug!(
            caller = %ctx.caller,
            value = %ctx.value,
            operation = operation.name(),
            module = module.name(),
            "dispatching call"
        );

        if !operation.is_payable() && !ctx.value.is_zero() {
            return Err(DexError::InvalidValue(format!(
                "{} does not accept value",
                operation.name()
            ))
            .into());
        }

        if operation.is_view() {
            let state = self.state.read();
            let ledger = self.ledger.read();
            let view = ViewContext {
                call: ctx,
                state: &*state,
                ledger: &*ledger,
            };
            let data = module.query(&view, call)?;
            return Ok(CallOutput {
                data,
                logs: Vec::new(),
            });
        }
        self.transact(ctx, operation, module.as_ref(), call)
    }

    /// Run a state-changing call on a draft and commit it only if it settles
    /// and the invariants still hold.
    fn transact(
        &self,
        ctx: &CallContext,
        operation: Operation,
        module: &dyn LogicModule,
        call: IHybridRouterCalls,
    ) -> Result<CallOutput, RouterError> {
        let mut state = self.state.write();
        let mut ledger = self.ledger.write();
        let mut draft = state.clone();
        let mut settlement = Settlement::new(self.address);

        let (data, logs) = {
            let mut exec = ExecContext::new(ctx, self.address, &mut draft, &*ledger, &mut settlement);
            let data = module.execute(&mut exec, call)?;
            (data, exec.logs)
        };

        let journal = settlement.execute(&mut *ledger)?;
        if let Err(err) = draft.check_invariants(&*ledger, &settlement.tokens()) {
            warn!(operation = operation.name(), %err, "invariant check failed, rolling back");
            journal.revert(&mut *ledger);
            return Err(err.into());
        }
        *state = draft;

        info!(
            caller = %ctx.caller,
            operation = operation.name(),
            transfers = journal.len(),
            logs = logs.len(),
            "call committed"
        );
        Ok(CallOutput { data, logs })
    }

    fn handle_bind_functions(&self, ctx: &CallContext, calldata: &[u8]) -> Result<CallOutput, RouterError> {
        let call = IHybridRouter::bindFunctionsCall::abi_decode(calldata).map_err(|e| {
            RouterError::InvalidCalldata(format!("failed to decode bindFunctions: {}", e))
        })?;
        if !ctx.value.is_zero() {
            return Err(DexError::InvalidValue("bindFunctions does not accept value".to_string()).into());
        }
        let selectors: Vec<[u8; 4]> = call.selectors.iter().map(|s| s.0).collect();
        self.bind_functions(ctx.caller, call.backend, &selectors)?;

        let event = IHybridRouter::FunctionsBound {
            backend: call.backend,
            selectors: call.selectors,
        };
        Ok(CallOutput {
            data: Bytes::new(),
            logs: vec![Log {
                address: self.address,
                data: event.encode_log_data(),
            }],
        })
    }
}

/// Backend addresses of the standard modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardBackends {
    pub pair_router: Address,
    pub order_book_router: Address,
    pub pair_utils: Address,
}

impl StandardBackends {
    /// Selectors each standard module should be bound to, by backend.
    pub fn bindings(&self) -> Vec<(Address, Vec<FixedBytes<4>>)> {
        let selectors = |module: &dyn LogicModule| {
            module
                .operations()
                .iter()
                .map(|op| FixedBytes(op.selector()))
                .collect::<Vec<_>>()
        };
        vec![
            (self.pair_router, selectors(&PairRouter)),
            (self.order_book_router, selectors(&OrderBookRouter)),
            (self.pair_utils, selectors(&PairUtils)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex::{DexConfig, MemoryLedger};

    fn owner() -> Address {
        Address::repeat_byte(0x0A)
    }

    fn backends() -> StandardBackends {
        StandardBackends {
            pair_router: Address::repeat_byte(0xB1),
            order_book_router: Address::repeat_byte(0xB2),
            pair_utils: Address::repeat_byte(0xB3),
        }
    }

    fn router() -> HybridRouter<MemoryLedger> {
        let config = DexConfig::default().with_owner(owner());
        HybridRouter::with_standard_modules(
            Address::repeat_byte(0xD0),
            Arc::new(config),
            MemoryLedger::new(),
            backends(),
        )
    }

    #[test]
    fn test_bind_is_owner_only() {
        let router = router();
        let selector = Operation::GetPair.selector();

        let err = router
            .bind_functions(Address::repeat_byte(0x0B), backends().pair_utils, &[selector])
            .unwrap_err();
        assert_eq!(err.kind(), dex::ErrorKind::Unauthorized);
        assert_eq!(router.binding(selector), None);

        router.bind_functions(owner(), backends().pair_utils, &[selector]).unwrap();
        assert_eq!(router.binding(selector), Some(backends().pair_utils));
    }

    #[test]
    fn test_short_calldata() {
        let router = router();
        let ctx = CallContext::new(owner(), 0);
        assert!(matches!(
            router.call(&ctx, &[0x01, 0x02]),
            Err(RouterError::InvalidCalldata(_))
        ));
    }

    #[test]
    fn test_standard_bindings_cover_modules() {
        let bindings = backends().bindings();
        let total: usize = bindings.iter().map(|(_, selectors)| selectors.len()).sum();
        // Every operation except bindFunctions lives in a module
        assert_eq!(total, Operation::ALL.len() - 1);
    }
}
