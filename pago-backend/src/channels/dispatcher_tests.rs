//! Integration tests for the conversation turn loop.
//!
//! Each test wires an in-memory database, a queued mock completion client,
//! and recording transport/chain fakes into a real MessageDispatcher, then
//! drives one turn and asserts on the collaborator call pattern - which
//! tools ran, in what order, and what the user ended up seeing.

use crate::ai::{AiClient, AiResponse, MockAiClient, ToolCall};
use crate::channels::dispatcher::{APOLOGY, MessageDispatcher};
use crate::channels::types::{NormalizedMessage, WebhookEnvelope, WebhookPayload};
use crate::channels::whatsapp::Transport;
use crate::db::Database;
use crate::models::{ConversationMessage, WalletRef};
use crate::tools::{self, ToolDeps};
use crate::web3::{ChainClient, TransferReceipt};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const EXPLORER: &str = "https://scan.test/tx/";

/// Transport fake: records every call, serves canned history.
struct RecordingTransport {
    events: Mutex<Vec<String>>,
    history: Mutex<Vec<ConversationMessage>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
        })
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn sent_texts(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix("send:").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, _handle: &str, text: &str) -> Result<(), String> {
        self.events.lock().unwrap().push(format!("send:{}", text));
        Ok(())
    }

    async fn start_typing(&self, _handle: &str) -> Result<(), String> {
        self.events.lock().unwrap().push("typing_on".to_string());
        Ok(())
    }

    async fn stop_typing(&self, _handle: &str) -> Result<(), String> {
        self.events.lock().unwrap().push("typing_off".to_string());
        Ok(())
    }

    async fn get_history(&self, _handle: &str) -> Result<Vec<ConversationMessage>, String> {
        Ok(self.history.lock().unwrap().clone())
    }
}

/// Chain fake: canned balances, generated wallets with predictable
/// addresses, and a call log for order assertions.
struct FakeChain {
    calls: Mutex<Vec<String>>,
    balances: Mutex<HashMap<String, f64>>,
    generated: Mutex<u32>,
}

impl FakeChain {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            balances: Mutex::new(HashMap::new()),
            generated: Mutex::new(0),
        })
    }

    fn set_balance(&self, address: &str, balance: f64) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), balance);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn transfer_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("transfer:"))
            .count()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn generate_wallet(&self) -> Result<WalletRef, String> {
        self.calls.lock().unwrap().push("generate_wallet".to_string());
        let mut generated = self.generated.lock().unwrap();
        *generated += 1;
        Ok(WalletRef {
            address: format!("0xa{}", generated),
            secret: format!("secret-{}", generated),
        })
    }

    async fn fund_wallet(&self, address: &str) -> Result<(), String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("fund_wallet:{}", address));
        Ok(())
    }

    async fn get_balance(&self, address: &str) -> Result<f64, String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("get_balance:{}", address));
        Ok(*self.balances.lock().unwrap().get(address).unwrap_or(&0.0))
    }

    async fn transfer(
        &self,
        _from: &WalletRef,
        to_address: &str,
        amount: f64,
    ) -> Result<TransferReceipt, String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("transfer:{}:{}", to_address, amount));
        Ok(TransferReceipt {
            tx_hash: "0xfeedbeef".to_string(),
        })
    }
}

struct TestHarness {
    dispatcher: MessageDispatcher,
    db: Arc<Database>,
    transport: Arc<RecordingTransport>,
    chain: Arc<FakeChain>,
}

impl TestHarness {
    fn new(mock_responses: Vec<AiResponse>) -> Self {
        let db = Arc::new(Database::new(":memory:").expect("in-memory db"));
        let transport = RecordingTransport::new();
        let chain = FakeChain::new();

        let registry = Arc::new(tools::create_registry(&ToolDeps {
            db: db.clone(),
            chain: chain.clone() as Arc<dyn ChainClient>,
            explorer_tx_url: EXPLORER.to_string(),
        }));

        let mock = MockAiClient::new(mock_responses.into_iter().map(Ok).collect());
        let dispatcher = MessageDispatcher::new(
            db.clone(),
            transport.clone() as Arc<dyn Transport>,
            registry,
            AiClient::Mock(mock),
            None,
            10,
        );

        TestHarness {
            dispatcher,
            db,
            transport,
            chain,
        }
    }

    /// Seed an onboarded profile, optionally with a wallet.
    fn seed_profile(&self, handle: &str, name: &str, wallet: Option<&str>) {
        self.db.create_profile(handle, Some(name)).unwrap();
        self.db
            .update_email_address(handle, &format!("{}@example.com", name.to_lowercase()))
            .unwrap();
        if let Some(address) = wallet {
            self.db
                .set_wallet(
                    handle,
                    &WalletRef {
                        address: address.to_string(),
                        secret: format!("secret-{}", name),
                    },
                )
                .unwrap();
        }
    }

    async fn dispatch_text(&self, handle: &str, text: &str) -> crate::channels::DispatchResult {
        self.dispatcher
            .dispatch(NormalizedMessage {
                sender_handle: handle.to_string(),
                sender_name: None,
                text: text.to_string(),
            })
            .await
    }
}

fn tool_call(name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall {
        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
        name: name.to_string(),
        arguments: args,
    }
}

// ============================================================================
// Scenario: onboarding
// ============================================================================

#[tokio::test]
async fn onboarding_collects_fields_and_replies() {
    let harness = TestHarness::new(vec![AiResponse::text(
        r#"{"email":"pedro@example.com","name":"Pedro","message":"Thanks Pedro, you're all set!"}"#,
    )]);

    let result = harness.dispatch_text("5511999@c.us", "hi").await;
    assert!(result.error.is_none(), "turn should succeed: {:?}", result.error);

    let profile = harness.db.find_profile("5511999@c.us").unwrap().unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Pedro"));
    assert_eq!(profile.email_address.as_deref(), Some("pedro@example.com"));

    let sent = harness.transport.sent_texts();
    assert_eq!(sent, vec!["Thanks Pedro, you're all set!"]);
}

#[tokio::test]
async fn onboarding_partial_fields_keep_mode() {
    // Only a name this turn - the profile stays un-onboarded.
    let harness = TestHarness::new(vec![AiResponse::text(
        r#"{"email":"","name":"Maria","message":"Nice to meet you Maria! What's your email?"}"#,
    )]);

    let result = harness.dispatch_text("m@c.us", "I'm Maria").await;
    assert!(result.error.is_none());

    let profile = harness.db.find_profile("m@c.us").unwrap().unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Maria"));
    assert!(profile.email_address.is_none());
    assert!(!crate::onboarding::is_onboarded(&profile));
}

#[tokio::test]
async fn onboarding_schema_violation_becomes_apology() {
    let harness = TestHarness::new(vec![AiResponse::text("not json at all")]);

    let result = harness.dispatch_text("x@c.us", "hello").await;
    let error = result.error.expect("schema violation surfaces");
    assert!(error.contains("schema"), "unexpected error: {}", error);
    assert_eq!(harness.transport.sent_texts(), vec![APOLOGY]);
}

// ============================================================================
// Scenario: balance
// ============================================================================

#[tokio::test]
async fn balance_turn_formats_amount() {
    let harness = TestHarness::new(vec![AiResponse::with_tools(
        String::new(),
        vec![tool_call(
            "get_balance",
            json!({"address": "0xABC", "message": "You have %amount% digital dollars."}),
        )],
    )]);
    harness.seed_profile("p@c.us", "Pedro", Some("0xABC"));
    harness.chain.set_balance("0xABC", 1234.5);

    let result = harness.dispatch_text("p@c.us", "what's my balance?").await;
    assert!(result.error.is_none(), "{:?}", result.error);

    let sent = harness.transport.sent_texts();
    assert_eq!(sent, vec!["You have 1234.5 digital dollars."]);
    assert!(!sent[0].contains("%amount%"));
    assert!(harness.chain.calls().contains(&"get_balance:0xABC".to_string()));
}

// ============================================================================
// Scenario: transfer, happy path
// ============================================================================

#[tokio::test]
async fn transfer_happy_path_sends_once_and_links_tx() {
    let harness = TestHarness::new(vec![AiResponse::with_tools(
        String::new(),
        vec![tool_call(
            "send_money",
            json!({
                "amount": 500,
                "recipient": {"name": "Pedro", "handle": "p@c.us"},
                "message": "Done! Sent %amount% to %name%.%transaction_details%"
            }),
        )],
    )]);
    harness.seed_profile("sender@c.us", "Ana", Some("0xAAA"));
    harness.seed_profile("p@c.us", "Pedro", Some("0xBBB"));
    harness.chain.set_balance("0xAAA", 1000.0);

    let result = harness.dispatch_text("sender@c.us", "send 500 to pedro").await;
    assert!(result.error.is_none(), "{:?}", result.error);

    assert_eq!(harness.chain.transfer_count(), 1);
    assert!(
        harness
            .chain
            .calls()
            .contains(&"transfer:0xBBB:500".to_string())
    );

    let sent = harness.transport.sent_texts();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Sent 500 to Pedro"));
    assert!(sent[0].contains("https://scan.test/tx/0xfeedbeef"));
    for token in ["%amount%", "%name%", "%transaction_details%"] {
        assert!(!sent[0].contains(token), "leftover token in: {}", sent[0]);
    }
}

// ============================================================================
// Scenario: transfer, first-contact recipient
// ============================================================================

#[tokio::test]
async fn transfer_to_unknown_recipient_registers_and_funds_first() {
    let harness = TestHarness::new(vec![AiResponse::with_tools(
        String::new(),
        vec![tool_call(
            "send_money",
            json!({
                "amount": 50,
                "recipient": {"name": "Novo", "handle": "novo@c.us"},
                "message": "Sent %amount% to %name%.%transaction_details%"
            }),
        )],
    )]);
    harness.seed_profile("sender@c.us", "Ana", Some("0xAAA"));
    harness.chain.set_balance("0xAAA", 1000.0);
    assert!(harness.db.find_profile("novo@c.us").unwrap().is_none());

    let result = harness.dispatch_text("sender@c.us", "send 50 to novo").await;
    assert!(result.error.is_none(), "{:?}", result.error);

    // Exactly one profile, one generated wallet, one funding, then the
    // transfer - in that order.
    let recipient = harness.db.find_profile("novo@c.us").unwrap().unwrap();
    assert_eq!(recipient.display_name.as_deref(), Some("Novo"));
    let recipient_wallet = recipient.wallet.expect("wallet persisted");
    assert_eq!(recipient_wallet.address, "0xa1");

    let calls = harness.chain.calls();
    let pos = |needle: &str| {
        calls
            .iter()
            .position(|c| c == needle)
            .unwrap_or_else(|| panic!("missing call {} in {:?}", needle, calls))
    };
    let generate = pos("generate_wallet");
    let fund = pos("fund_wallet:0xa1");
    let transfer = pos("transfer:0xa1:50");
    assert!(generate < fund && fund < transfer, "order was {:?}", calls);

    assert_eq!(
        calls.iter().filter(|c| *c == "generate_wallet").count(),
        1
    );
    assert_eq!(
        calls.iter().filter(|c| c.starts_with("fund_wallet:")).count(),
        1
    );
}

// ============================================================================
// Scenario: transfer, insufficient funds
// ============================================================================

#[tokio::test]
async fn insufficient_funds_never_reaches_transfer() {
    let harness = TestHarness::new(vec![AiResponse::with_tools(
        String::new(),
        vec![tool_call(
            "send_money",
            json!({
                "amount": 500,
                "recipient": {"name": "Pedro", "handle": "p@c.us"},
                "message": "Sent %amount% to %name%.%transaction_details%"
            }),
        )],
    )]);
    harness.seed_profile("sender@c.us", "Ana", Some("0xAAA"));
    harness.seed_profile("p@c.us", "Pedro", Some("0xBBB"));
    harness.chain.set_balance("0xAAA", 100.0);

    let result = harness.dispatch_text("sender@c.us", "send 500 to pedro").await;

    let error = result.error.expect("insufficient funds surfaces");
    assert!(error.contains("insufficient funds"), "got: {}", error);
    assert_eq!(harness.chain.transfer_count(), 0);
    assert_eq!(harness.transport.sent_texts(), vec![APOLOGY]);
}

// ============================================================================
// Scenario: validation gate
// ============================================================================

#[tokio::test]
async fn zero_amount_is_rejected_before_any_side_effect() {
    let harness = TestHarness::new(vec![AiResponse::with_tools(
        String::new(),
        vec![tool_call(
            "send_money",
            json!({
                "amount": 0,
                "recipient": {"name": "Pedro", "handle": "p@c.us"},
                "message": "Sent %amount% to %name%.%transaction_details%"
            }),
        )],
    )]);
    harness.seed_profile("sender@c.us", "Ana", Some("0xAAA"));

    let result = harness.dispatch_text("sender@c.us", "send 0 to pedro").await;

    let error = result.error.expect("validation error surfaces");
    assert!(error.contains("invalid arguments"), "got: {}", error);
    assert!(harness.chain.calls().is_empty(), "no chain calls expected");
    assert!(harness.db.find_profile("p@c.us").unwrap().is_none());
    assert_eq!(harness.transport.sent_texts(), vec![APOLOGY]);
}

#[tokio::test]
async fn missing_message_argument_is_rejected_by_the_gate() {
    let harness = TestHarness::new(vec![AiResponse::with_tools(
        String::new(),
        vec![tool_call("get_balance", json!({"address": "0xABC"}))],
    )]);
    harness.seed_profile("p@c.us", "Pedro", Some("0xABC"));

    let result = harness.dispatch_text("p@c.us", "balance?").await;
    let error = result.error.expect("gate rejects");
    assert!(error.contains("message"), "got: {}", error);
    assert!(harness.chain.calls().is_empty());
}

// ============================================================================
// Plain replies and typing indicators
// ============================================================================

#[tokio::test]
async fn plain_text_reply_passes_through() {
    let harness = TestHarness::new(vec![AiResponse::text("I can send money and check balances.")]);
    harness.seed_profile("p@c.us", "Pedro", Some("0xABC"));

    let result = harness.dispatch_text("p@c.us", "what can you do?").await;
    assert!(result.error.is_none());
    assert_eq!(
        harness.transport.sent_texts(),
        vec!["I can send money and check balances."]
    );
}

#[tokio::test]
async fn typing_indicator_brackets_the_turn() {
    let harness = TestHarness::new(vec![AiResponse::text("hey!")]);
    harness.seed_profile("p@c.us", "Pedro", None);

    harness.dispatch_text("p@c.us", "hey").await;

    let events = harness.transport.events();
    let on = events.iter().position(|e| e == "typing_on").unwrap();
    let send = events.iter().position(|e| e.starts_with("send:")).unwrap();
    let off = events.iter().position(|e| e == "typing_off").unwrap();
    assert!(on < send && send < off, "events were {:?}", events);
}

// ============================================================================
// Webhook filtering
// ============================================================================

fn envelope(event_type: &str, payload: Option<WebhookPayload>) -> WebhookEnvelope {
    WebhookEnvelope {
        event_type: event_type.to_string(),
        payload,
    }
}

fn payload(sender: &str, recipient: &str, from_bot: bool, text: &str) -> WebhookPayload {
    WebhookPayload {
        sender_handle: sender.to_string(),
        recipient_handle: recipient.to_string(),
        is_from_bot: from_bot,
        text: text.to_string(),
        sender_name: None,
    }
}

#[tokio::test]
async fn accept_filters_non_message_events_and_echoes() {
    let harness = TestHarness::new(vec![]);
    let dispatcher = &harness.dispatcher;

    assert!(dispatcher.accept(&envelope("ack", None)).is_none());
    assert!(
        dispatcher
            .accept(&envelope(
                "message",
                Some(payload("u@c.us", "bot@c.us", true, "echo"))
            ))
            .is_none()
    );
    assert!(
        dispatcher
            .accept(&envelope(
                "message",
                Some(payload("u@c.us", "bot@c.us", false, "   "))
            ))
            .is_none()
    );

    let accepted = dispatcher
        .accept(&envelope(
            "message",
            Some(payload("u@c.us", "bot@c.us", false, "hi")),
        ))
        .expect("real message accepted");
    assert_eq!(accepted.sender_handle, "u@c.us");
    assert_eq!(accepted.text, "hi");
}

#[tokio::test]
async fn accept_honors_the_bound_line() {
    let db = Arc::new(Database::new(":memory:").unwrap());
    let transport = RecordingTransport::new();
    let chain = FakeChain::new();
    let registry = Arc::new(tools::create_registry(&ToolDeps {
        db: db.clone(),
        chain: chain.clone() as Arc<dyn ChainClient>,
        explorer_tx_url: EXPLORER.to_string(),
    }));
    let dispatcher = MessageDispatcher::new(
        db,
        transport as Arc<dyn Transport>,
        registry,
        AiClient::Mock(MockAiClient::new(vec![])),
        Some("boss@c.us".to_string()),
        10,
    );

    assert!(
        dispatcher
            .accept(&envelope(
                "message",
                Some(payload("stranger@c.us", "bot@c.us", false, "hi"))
            ))
            .is_none()
    );
    assert!(
        dispatcher
            .accept(&envelope(
                "message",
                Some(payload("boss@c.us", "bot@c.us", false, "hi"))
            ))
            .is_some()
    );
}
