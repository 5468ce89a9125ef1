//! Native transfer submission and lifecycle tracking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::address::parse_recipient;
use crate::error::{Result, VaultError};
use crate::extension::{ExtensionClient, TransactionReceipt, TransactionRequest};
use crate::session::SessionController;
use crate::units::{format_units, parse_units, Balance};

/// Lifecycle of the latest submission:
/// `None -> Pending(None) -> Pending(Some) -> Success | Error`, or
/// `None -> Error` when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransactionStatus {
    #[default]
    None,
    /// Waiting for the wallet to return a hash, then for inclusion.
    Pending(Option<B256>),
    Success(B256),
    Error(String),
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    pub fn hash(&self) -> Option<B256> {
        match self {
            Self::Pending(hash) => *hash,
            Self::Success(hash) => Some(*hash),
            Self::None | Self::Error(_) => None,
        }
    }
}

/// The transfer form's input fields, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub recipient: String,
    pub amount: String,
}

impl TransferForm {
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    pub fn clear(&mut self) {
        self.recipient.clear();
        self.amount.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.recipient.is_empty() && self.amount.is_empty()
    }
}

/// Shared view of the submit-in-flight flag, for disabling the submit control.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.0.clone()))
    }
}

/// Clears the flag when dropped, so every exit path of `submit` (including
/// a dropped future) releases it exactly once.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A confirmed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub hash: B256,
    pub block_number: Option<u64>,
    /// Balance after the transfer, `None` if the refresh failed; the session
    /// then keeps its previous value.
    pub balance: Option<Balance>,
}

struct ValidatedTransfer {
    from: Address,
    to: Address,
    value: U256,
}

pub struct TransactionSubmitter {
    form: TransferForm,
    status: TransactionStatus,
    in_flight: InFlight,
    poll_interval: Duration,
    subscribers: Vec<mpsc::UnboundedSender<TransactionStatus>>,
}

impl TransactionSubmitter {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            form: TransferForm::default(),
            status: TransactionStatus::None,
            in_flight: InFlight::default(),
            poll_interval,
            subscribers: Vec::new(),
        }
    }

    /// Submitter using the session's configured receipt poll interval.
    pub fn for_session(session: &SessionController) -> Self {
        Self::new(session.config().receipt_poll_interval())
    }

    pub fn form(&self) -> &TransferForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TransferForm {
        &mut self.form
    }

    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Receive every status transition from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<TransactionStatus> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Dismiss a terminal banner. Ignored while a submission is running.
    pub fn clear_status(&mut self) {
        if !self.in_flight.is_set() {
            self.set_status(TransactionStatus::None);
        }
    }

    fn set_status(&mut self, status: TransactionStatus) {
        if self.status == status {
            return;
        }
        self.subscribers.retain(|s| s.send(status.clone()).is_ok());
        self.status = status;
    }

    fn fail(&mut self, err: VaultError) -> VaultError {
        self.set_status(TransactionStatus::Error(err.to_string()));
        err
    }

    /// Validate the form, broadcast the transfer through the extension and
    /// wait for its receipt. On success the session balance is refreshed and
    /// the form cleared.
    pub async fn submit(&mut self, session: &mut SessionController) -> Result<TransferReceipt> {
        let _guard = self
            .in_flight
            .acquire()
            .ok_or(VaultError::SubmissionInProgress)?;
        self.set_status(TransactionStatus::None);

        let transfer = match self.validate(session) {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "transfer rejected by validation");
                return Err(self.fail(e));
            }
        };
        let client = match session.connector().client() {
            Ok(c) => c.clone(),
            Err(e) => return Err(self.fail(e)),
        };

        let (hash, receipt) = match self.broadcast_and_confirm(&client, transfer).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "transfer failed");
                return Err(self.fail(e));
            }
        };
        self.set_status(TransactionStatus::Success(hash));
        info!(%hash, block = ?receipt.block_number(), "transfer confirmed");

        let balance = match session.refresh_balance().await {
            Ok(b) => Some(b),
            Err(e) => {
                warn!(error = %e, "balance refresh after transfer failed");
                None
            }
        };
        self.form.clear();

        Ok(TransferReceipt {
            hash,
            block_number: receipt.block_number(),
            balance,
        })
    }

    fn validate(&self, session: &SessionController) -> Result<ValidatedTransfer> {
        let account = session.state().account().ok_or(VaultError::NotConnected)?;

        let recipient = self.form.recipient.trim();
        let amount = self.form.amount.trim();
        if recipient.is_empty() || amount.is_empty() {
            return Err(VaultError::MissingFields);
        }

        let decimals = session.chain().decimals();
        let value = parse_units(amount, decimals)?;
        if value.is_zero() {
            return Err(VaultError::InvalidAmount("amount must be positive".into()));
        }

        if !account.balance.covers(value) {
            return Err(VaultError::InsufficientBalance(format!(
                "{} {symbol} requested, {} {symbol} available",
                format_units(value, decimals),
                account.balance,
                symbol = session.chain().symbol(),
            )));
        }

        let to = parse_recipient(recipient, session.connector().codec())
            .map_err(|e| VaultError::InvalidRecipient(e.to_string()))?;

        Ok(ValidatedTransfer {
            from: account.address,
            to,
            value,
        })
    }

    async fn broadcast_and_confirm(
        &mut self,
        client: &ExtensionClient,
        transfer: ValidatedTransfer,
    ) -> Result<(B256, TransactionReceipt)> {
        self.set_status(TransactionStatus::Pending(None));

        let tx = TransactionRequest {
            from: transfer.from,
            to: transfer.to,
            value: transfer.value,
        };
        info!(to = %tx.to, value = %tx.value, "sending transfer");
        let hash = client.send_transaction(&tx).await.map_err(|e| {
            if e.is_user_rejection() {
                VaultError::UserRejected(e.message)
            } else {
                VaultError::SubmissionFailed(e.to_string())
            }
        })?;
        self.set_status(TransactionStatus::Pending(Some(hash)));

        let receipt = self.wait_for_receipt(client, hash).await?;
        if !receipt.succeeded() {
            return Err(VaultError::ConfirmationFailed(format!(
                "transaction {hash} reverted"
            )));
        }
        Ok((hash, receipt))
    }

    /// Poll until the receipt appears. No timeout: a transaction that is
    /// never mined keeps this pending.
    async fn wait_for_receipt(
        &self,
        client: &ExtensionClient,
        hash: B256,
    ) -> Result<TransactionReceipt> {
        loop {
            match client.transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {
                    debug!(%hash, "receipt not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(VaultError::ConfirmationFailed(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;
    use crate::provider::{methods, Eip1193Provider, ProviderError, USER_REJECTED_REQUEST};
    use crate::testing::MockExtension;

    const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn sender() -> Address {
        Address::with_last_byte(0x11)
    }

    fn wei(s: &str) -> U256 {
        parse_units(s, 18).unwrap()
    }

    async fn connected(balance: &str) -> (Arc<MockExtension>, SessionController) {
        let mock = Arc::new(
            MockExtension::new(0x59f)
                .with_account(sender())
                .with_balance(sender(), wei(balance)),
        );
        let mut session = SessionController::new(
            Some(mock.clone() as Arc<dyn Eip1193Provider>),
            VaultConfig::default(),
        )
        .unwrap();
        session.connect().await.unwrap();
        mock.clear_log();
        (mock, session)
    }

    fn submitter(recipient: &str, amount: &str) -> TransactionSubmitter {
        let mut s = TransactionSubmitter::new(Duration::from_millis(10));
        *s.form_mut() = TransferForm::new(recipient, amount);
        s
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TransactionStatus>) -> Vec<TransactionStatus> {
        let mut out = Vec::new();
        while let Ok(s) = rx.try_recv() {
            out.push(s);
        }
        out
    }

    #[tokio::test]
    async fn not_connected_issues_no_calls() {
        let mock = Arc::new(MockExtension::new(0x59f));
        let mut session = SessionController::new(
            Some(mock.clone() as Arc<dyn Eip1193Provider>),
            VaultConfig::default(),
        )
        .unwrap();
        let mut s = submitter(RECIPIENT, "1");
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::NotConnected));
        assert!(matches!(s.status(), TransactionStatus::Error(_)));
        assert!(mock.method_log().is_empty());
        assert!(!s.in_flight().is_set());
    }

    #[tokio::test]
    async fn missing_fields() {
        let (mock, mut session) = connected("2.5").await;
        for (r, a) in [("", "1"), (RECIPIENT, ""), ("  ", "  ")] {
            let mut s = submitter(r, a);
            let err = s.submit(&mut session).await.unwrap_err();
            assert!(matches!(err, VaultError::MissingFields), "got {err:?}");
        }
        assert!(mock.method_log().is_empty());
    }

    #[tokio::test]
    async fn invalid_amounts() {
        let (mock, mut session) = connected("2.5").await;
        for amount in ["abc", "-1", "0", "0.000", "NaN", "1e3"] {
            let mut s = submitter(RECIPIENT, amount);
            let err = s.submit(&mut session).await.unwrap_err();
            assert!(matches!(err, VaultError::InvalidAmount(_)), "{amount}: {err:?}");
            assert_eq!(s.status(), &TransactionStatus::Error(err.to_string()));
        }
        assert!(mock.method_log().is_empty());
    }

    #[tokio::test]
    async fn insufficient_balance() {
        let (mock, mut session) = connected("2.5").await;
        let mut s = submitter(RECIPIENT, "3.0");
        let mut rx = s.subscribe();
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance(_)), "got {err:?}");
        assert!(err.to_string().contains("3.0 INJ"), "got {err}");

        let seen = drain(&mut rx);
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], TransactionStatus::Error(_)));
        assert!(mock.calls_to(methods::SEND_TRANSACTION).is_empty());
        // Inputs stay for correction.
        assert_eq!(s.form().amount, "3.0");
    }

    #[tokio::test]
    async fn invalid_recipient() {
        let (mock, mut session) = connected("2.5").await;
        let mut s = submitter("not-an-address", "1");
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::InvalidRecipient(_)), "got {err:?}");
        assert!(mock.method_log().is_empty());
    }

    #[tokio::test]
    async fn successful_transfer_lifecycle() {
        let (mock, mut session) = connected("2.5").await;
        let mut s = submitter(RECIPIENT, "1.0");
        let mut rx = s.subscribe();

        let receipt = s.submit(&mut session).await.unwrap();

        let hash = mock.last_transaction_hash().unwrap();
        assert_eq!(receipt.hash, hash);
        assert_eq!(
            drain(&mut rx),
            vec![
                TransactionStatus::Pending(None),
                TransactionStatus::Pending(Some(hash)),
                TransactionStatus::Success(hash),
            ]
        );
        assert_eq!(s.status(), &TransactionStatus::Success(hash));
        assert!(s.form().is_empty());
        assert!(!s.in_flight().is_set());

        let sent = mock.calls_to(methods::SEND_TRANSACTION);
        assert_eq!(sent.len(), 1);
        let tx: TransactionRequest = serde_json::from_value(sent[0].params[0].clone()).unwrap();
        assert_eq!(tx.from, sender());
        assert_eq!(tx.to, RECIPIENT.parse::<Address>().unwrap());
        assert_eq!(tx.value, wei("1.0"));

        // Balance re-queried after confirmation.
        let log = mock.method_log();
        assert_eq!(log.last().map(String::as_str), Some(methods::GET_BALANCE));
        assert_eq!(receipt.balance.unwrap().to_string(), "1.5");
        assert_eq!(session.state().balance().unwrap().to_string(), "1.5");
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_receipt() {
        let (mock, mut session) = connected("2.5").await;
        mock.set_receipt_delay(3);
        let mut s = submitter(RECIPIENT, "0.5");
        s.submit(&mut session).await.unwrap();
        assert_eq!(mock.calls_to(methods::GET_TRANSACTION_RECEIPT).len(), 4);
    }

    #[tokio::test]
    async fn broadcast_failure() {
        let (mock, mut session) = connected("2.5").await;
        mock.fail_next(
            methods::SEND_TRANSACTION,
            ProviderError::new(-32000, "intrinsic gas too low"),
        );
        let mut s = submitter(RECIPIENT, "1");
        let mut rx = s.subscribe();
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::SubmissionFailed(_)), "got {err:?}");
        assert_eq!(
            drain(&mut rx),
            vec![
                TransactionStatus::Pending(None),
                TransactionStatus::Error(err.to_string()),
            ]
        );
        assert_eq!(s.status().hash(), None);
        assert_eq!(s.form().amount, "1");
        assert!(!s.in_flight().is_set());
    }

    #[tokio::test]
    async fn rejected_signature() {
        let (mock, mut session) = connected("2.5").await;
        mock.fail_next(
            methods::SEND_TRANSACTION,
            ProviderError::new(USER_REJECTED_REQUEST, "User denied transaction signature."),
        );
        let mut s = submitter(RECIPIENT, "1");
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::UserRejected(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn reverted_receipt() {
        let (mock, mut session) = connected("2.5").await;
        mock.set_reverted(true);
        let mut s = submitter(RECIPIENT, "1");
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::ConfirmationFailed(_)), "got {err:?}");
        assert!(matches!(s.status(), TransactionStatus::Error(_)));
        assert!(mock.calls_to(methods::GET_BALANCE).is_empty());
    }

    #[tokio::test]
    async fn receipt_query_failure() {
        let (mock, mut session) = connected("2.5").await;
        mock.fail_next(
            methods::GET_TRANSACTION_RECEIPT,
            ProviderError::new(-32603, "Internal error"),
        );
        let mut s = submitter(RECIPIENT, "1");
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::ConfirmationFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn balance_refresh_failure_keeps_success() {
        let (mock, mut session) = connected("2.5").await;
        mock.fail_next(methods::GET_BALANCE, ProviderError::new(-32000, "header not found"));
        let mut s = submitter(RECIPIENT, "1");
        let receipt = s.submit(&mut session).await.unwrap();
        assert!(receipt.balance.is_none());
        assert!(matches!(s.status(), TransactionStatus::Success(_)));
        assert_eq!(session.state().balance().unwrap().to_string(), "2.5");
        assert!(s.form().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_refused() {
        let (_mock, mut session) = connected("2.5").await;
        let mut s = submitter(RECIPIENT, "1");
        let flag = s.in_flight();
        let _held = flag.acquire().unwrap();
        let err = s.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, VaultError::SubmissionInProgress));
        assert_eq!(s.status(), &TransactionStatus::None);
    }

    #[tokio::test]
    async fn next_submit_resets_terminal_status() {
        let (_mock, mut session) = connected("2.5").await;
        let mut s = submitter(RECIPIENT, "9");
        s.submit(&mut session).await.unwrap_err();
        *s.form_mut() = TransferForm::new(RECIPIENT, "1");
        let mut rx = s.subscribe();
        s.submit(&mut session).await.unwrap();
        assert_eq!(drain(&mut rx)[0], TransactionStatus::None);
    }

    #[test]
    fn clear_status_resets_terminal() {
        let mut s = TransactionSubmitter::new(Duration::from_millis(1));
        s.set_status(TransactionStatus::Error("x".into()));
        s.clear_status();
        assert_eq!(s.status(), &TransactionStatus::None);
    }
}
