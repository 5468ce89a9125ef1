//! In-memory stand-in for the injected extension.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::extension::{parse_quantity, TransactionRequest};
use crate::provider::{
    methods, Eip1193Provider, ProviderError, RequestArguments, UNRECOGNIZED_CHAIN,
    UNSUPPORTED_METHOD,
};

#[derive(Default)]
struct MockState {
    chain_id: u64,
    known_chains: HashSet<u64>,
    accounts: Vec<Address>,
    balances: HashMap<Address, U256>,
    scripted: HashMap<String, VecDeque<Result<Value, ProviderError>>>,
    log: Vec<RequestArguments>,
    sent: Vec<B256>,
    receipt_delay: usize,
    pending_polls: HashMap<B256, usize>,
    reverted: bool,
}

/// Scriptable EIP-1193 provider. Knows its starting chain, records every
/// request, and mines each sent transaction after a configurable number of
/// empty receipt polls.
pub struct MockExtension {
    state: Mutex<MockState>,
}

impl MockExtension {
    pub fn new(chain_id: u64) -> Self {
        let state = MockState {
            chain_id,
            known_chains: HashSet::from([chain_id]),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn with_known_chain(self, chain_id: u64) -> Self {
        self.with_state(|s| s.known_chains.insert(chain_id));
        self
    }

    pub fn with_account(self, address: Address) -> Self {
        self.with_state(|s| s.accounts.push(address));
        self
    }

    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.set_balance(address, balance);
        self
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.with_state(|s| s.balances.insert(address, balance));
    }

    /// Number of `null` receipt responses before a transaction is mined.
    pub fn set_receipt_delay(&self, polls: usize) {
        self.with_state(|s| s.receipt_delay = polls);
    }

    /// Mine subsequent transactions with status `0x0`.
    pub fn set_reverted(&self, reverted: bool) {
        self.with_state(|s| s.reverted = reverted);
    }

    /// Fail the next call to `method` with `err`.
    pub fn fail_next(&self, method: &str, err: ProviderError) {
        self.with_state(|s| {
            s.scripted
                .entry(method.to_string())
                .or_default()
                .push_back(Err(err))
        });
    }

    /// Answer the next call to `method` with `value`.
    pub fn respond_with(&self, method: &str, value: Value) {
        self.with_state(|s| {
            s.scripted
                .entry(method.to_string())
                .or_default()
                .push_back(Ok(value))
        });
    }

    pub fn active_chain(&self) -> u64 {
        self.with_state(|s| s.chain_id)
    }

    pub fn calls(&self) -> Vec<RequestArguments> {
        self.with_state(|s| s.log.clone())
    }

    pub fn calls_to(&self, method: &str) -> Vec<RequestArguments> {
        self.with_state(|s| s.log.iter().filter(|c| c.method == method).cloned().collect())
    }

    /// Method names in call order.
    pub fn method_log(&self) -> Vec<String> {
        self.with_state(|s| s.log.iter().map(|c| c.method.clone()).collect())
    }

    pub fn clear_log(&self) {
        self.with_state(|s| s.log.clear());
    }

    pub fn last_transaction_hash(&self) -> Option<B256> {
        self.with_state(|s| s.sent.last().copied())
    }
}

fn invalid_params(method: &str) -> ProviderError {
    ProviderError::new(-32602, format!("Invalid params for {method}"))
}

fn first_param<T: serde::de::DeserializeOwned>(args: &RequestArguments) -> Result<T, ProviderError> {
    args.params
        .get(0)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or_else(|| invalid_params(&args.method))
}

fn requested_chain(args: &RequestArguments) -> Result<u64, ProviderError> {
    args.params
        .pointer("/0/chainId")
        .and_then(Value::as_str)
        .and_then(parse_quantity)
        .ok_or_else(|| invalid_params(&args.method))
}

impl MockState {
    fn handle(&mut self, args: &RequestArguments) -> Result<Value, ProviderError> {
        match args.method.as_str() {
            methods::REQUEST_ACCOUNTS | methods::ACCOUNTS => Ok(json!(self.accounts)),
            methods::CHAIN_ID => Ok(json!(format!("{:#x}", self.chain_id))),
            methods::SWITCH_CHAIN => {
                let id = requested_chain(args)?;
                if !self.known_chains.contains(&id) {
                    return Err(ProviderError::new(
                        UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{id:#x}\"."),
                    ));
                }
                self.chain_id = id;
                Ok(Value::Null)
            }
            methods::ADD_CHAIN => {
                let id = requested_chain(args)?;
                self.known_chains.insert(id);
                self.chain_id = id;
                Ok(Value::Null)
            }
            methods::GET_BALANCE => {
                let address: Address = first_param(args)?;
                Ok(json!(self.balances.get(&address).copied().unwrap_or_default()))
            }
            methods::SEND_TRANSACTION => {
                let tx: TransactionRequest = first_param(args)?;
                let balance = self.balances.entry(tx.from).or_default();
                *balance = balance
                    .checked_sub(tx.value)
                    .ok_or_else(|| ProviderError::new(-32000, "insufficient funds for transfer"))?;
                *self.balances.entry(tx.to).or_default() += tx.value;

                let hash = B256::left_padding_from(&(self.sent.len() as u64 + 1).to_be_bytes());
                self.sent.push(hash);
                self.pending_polls.insert(hash, self.receipt_delay);
                Ok(json!(hash))
            }
            methods::GET_TRANSACTION_RECEIPT => {
                let hash: B256 = first_param(args)?;
                let Some(remaining) = self.pending_polls.get_mut(&hash) else {
                    return Ok(Value::Null);
                };
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(Value::Null);
                }
                let block = self.sent.iter().position(|h| *h == hash).unwrap_or(0) + 1;
                Ok(json!({
                    "transactionHash": hash,
                    "blockNumber": format!("{block:#x}"),
                    "status": if self.reverted { "0x0" } else { "0x1" },
                }))
            }
            other => Err(ProviderError::new(
                UNSUPPORTED_METHOD,
                format!("Method {other} not supported"),
            )),
        }
    }
}

#[async_trait]
impl Eip1193Provider for MockExtension {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError> {
        self.with_state(|s| {
            s.log.push(args.clone());
            if let Some(scripted) = s.scripted.get_mut(&args.method).and_then(VecDeque::pop_front) {
                return scripted;
            }
            s.handle(&args)
        })
    }
}
