use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde_json::json;
use shared::domain::OrderId;
use shared::protocol::OrderSummary;

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Transient(String),
    Blocking(String, String),
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notifier lock").clone()
    }

    fn transient_count(&self) -> usize {
        self.notices()
            .iter()
            .filter(|notice| matches!(notice, Notice::Transient(_)))
            .count()
    }

    fn blocking_count(&self) -> usize {
        self.notices()
            .iter()
            .filter(|notice| matches!(notice, Notice::Blocking(..)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn transient(&self, message: &str) {
        self.notices
            .lock()
            .expect("notifier lock")
            .push(Notice::Transient(message.to_string()));
    }

    fn blocking(&self, title: &str, body: &str) {
        self.notices
            .lock()
            .expect("notifier lock")
            .push(Notice::Blocking(title.to_string(), body.to_string()));
    }
}

#[derive(Debug, Default, Clone)]
struct CallCounts {
    check_connection: u32,
    test: u32,
    get_orders: u32,
    push_customers: u32,
    push_items: u32,
    queue_sync: u32,
}

impl CallCounts {
    fn total(&self) -> u32 {
        self.check_connection
            + self.test
            + self.get_orders
            + self.push_customers
            + self.push_items
            + self.queue_sync
    }
}

struct CountingOps {
    counts: Arc<Mutex<CallCounts>>,
    check_result: bool,
    hang_check: bool,
    fail_with: Option<String>,
    orders: Vec<OrderSummary>,
}

impl CountingOps {
    fn ok() -> Self {
        Self {
            counts: Arc::new(Mutex::new(CallCounts::default())),
            check_result: true,
            hang_check: false,
            fail_with: None,
            orders: Vec::new(),
        }
    }

    fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_with: Some(err.into()),
            ..Self::ok()
        }
    }

    fn with_check_result(check_result: bool) -> Self {
        Self {
            check_result,
            ..Self::ok()
        }
    }

    fn hanging() -> Self {
        Self {
            hang_check: true,
            ..Self::ok()
        }
    }

    fn with_orders(orders: Vec<OrderSummary>) -> Self {
        Self {
            orders,
            ..Self::ok()
        }
    }

    fn counts(&self) -> CallCounts {
        self.counts.lock().expect("counts lock").clone()
    }

    fn fail(&self) -> Option<anyhow::Error> {
        self.fail_with.as_ref().map(|err| anyhow!(err.clone()))
    }
}

#[async_trait]
impl RemoteOps for CountingOps {
    async fn check_connection(&self) -> Result<bool> {
        self.counts.lock().expect("counts lock").check_connection += 1;
        if self.hang_check {
            std::future::pending::<()>().await;
        }
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(self.check_result)
    }

    async fn test(&self) -> Result<Value> {
        self.counts.lock().expect("counts lock").test += 1;
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(json!({"ok": true}))
    }

    async fn get_orders(&self) -> Result<Vec<OrderSummary>> {
        self.counts.lock().expect("counts lock").get_orders += 1;
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(self.orders.clone())
    }

    async fn push_customers(&self) -> Result<usize> {
        self.counts.lock().expect("counts lock").push_customers += 1;
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(2)
    }

    async fn push_items(&self) -> Result<usize> {
        self.counts.lock().expect("counts lock").push_items += 1;
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(3)
    }

    async fn queue_sync(&self) -> Result<()> {
        self.counts.lock().expect("counts lock").queue_sync += 1;
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(())
    }
}

fn sample_order(number: &str) -> OrderSummary {
    OrderSummary {
        order_number: OrderId::from(number),
        status: "pending".to_string(),
        company_name: "Acme Wholesale".to_string(),
        company_code: None,
        total: Some(120.5),
        currency_code: Some("USD".to_string()),
        created_at: None,
    }
}

#[test]
fn refresh_registers_five_labeled_buttons() {
    let actions = actions();
    assert_eq!(actions.len(), 5);
    let labels: Vec<&str> = actions.iter().map(|action| action.label()).collect();
    assert_eq!(
        labels,
        vec!["Test", "Get orders", "Push customers", "Push items", "Sync"]
    );
    assert_eq!(FormAction::GetOrders.emphasis(), ButtonEmphasis::Primary);
    assert_eq!(FormAction::Sync.emphasis(), ButtonEmphasis::Primary);
    assert_eq!(FormAction::Test.emphasis(), ButtonEmphasis::Default);
}

#[tokio::test]
async fn each_action_invokes_exactly_one_remote_call() {
    for action in FormAction::ALL {
        let ops = CountingOps::ok();
        let notifier = RecordingNotifier::default();
        run_action(action, &ops, &notifier).await;

        let counts = ops.counts();
        assert_eq!(counts.total(), 1, "{action:?} must issue exactly one call");
        let expected = match action {
            FormAction::Test => counts.test,
            FormAction::GetOrders => counts.get_orders,
            FormAction::PushCustomers => counts.push_customers,
            FormAction::PushItems => counts.push_items,
            FormAction::Sync => counts.queue_sync,
        };
        assert_eq!(expected, 1, "{action:?} must hit its own operation");
    }
}

#[tokio::test]
async fn a_failing_handler_still_issues_only_one_call() {
    let ops = CountingOps::failing("connection reset");
    let notifier = RecordingNotifier::default();
    run_action(FormAction::GetOrders, &ops, &notifier).await;

    assert_eq!(ops.counts().total(), 1);
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        Notice::Transient(message) => {
            assert!(message.contains("Get orders failed"));
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected transient failure notice, got {other:?}"),
    }
}

#[tokio::test]
async fn get_orders_echoes_the_serialized_result() {
    let ops = CountingOps::with_orders(vec![sample_order("N1001"), sample_order("N1002")]);
    let notifier = RecordingNotifier::default();
    run_action(FormAction::GetOrders, &ops, &notifier).await;

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        Notice::Transient(message) => {
            assert!(message.starts_with("Orders read: "));
            assert!(message.contains("N1001"));
            assert!(message.contains("N1002"));
        }
        other => panic!("expected transient notice, got {other:?}"),
    }
}

#[tokio::test]
async fn push_actions_render_written_notices() {
    let ops = CountingOps::ok();
    let notifier = RecordingNotifier::default();
    run_action(FormAction::PushCustomers, &ops, &notifier).await;
    run_action(FormAction::PushItems, &ops, &notifier).await;

    assert_eq!(
        notifier.notices(),
        vec![
            Notice::Transient("Customers written".to_string()),
            Notice::Transient("Items written".to_string()),
        ]
    );
}

#[tokio::test]
async fn sync_always_shows_blocking_dialog() {
    // Successful enqueue.
    let ops = CountingOps::ok();
    let notifier = RecordingNotifier::default();
    run_action(FormAction::Sync, &ops, &notifier).await;
    assert_eq!(ops.counts().queue_sync, 1);
    assert_eq!(notifier.blocking_count(), 1);

    // The dialog does not depend on the enqueue outcome.
    let ops = CountingOps::failing("queue unavailable");
    let notifier = RecordingNotifier::default();
    run_action(FormAction::Sync, &ops, &notifier).await;
    assert_eq!(ops.counts().queue_sync, 1);
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        Notice::Blocking(title, body) => {
            assert_eq!(title, "Sync");
            assert!(body.contains("sync log"));
        }
        other => panic!("expected blocking notice, got {other:?}"),
    }
}

#[tokio::test]
async fn validate_with_false_result_is_invalid_and_blocks() {
    let ops = CountingOps::with_check_result(false);
    let notifier = RecordingNotifier::default();

    let outcome = validate(&ops, &notifier).await;
    assert_eq!(outcome, ValidationOutcome::Invalid);
    assert!(!outcome.is_valid());
    assert_eq!(ops.counts().check_connection, 1);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1, "no side effects beyond the one dialog");
    match &notices[0] {
        Notice::Blocking(title, body) => {
            assert_eq!(title, "Validation");
            assert!(body.contains("validation failed"));
            assert!(body.contains("error log"));
        }
        other => panic!("expected blocking notice, got {other:?}"),
    }
}

#[tokio::test]
async fn validate_with_true_result_is_valid_with_transient_notice() {
    let ops = CountingOps::ok();
    let notifier = RecordingNotifier::default();

    let outcome = validate(&ops, &notifier).await;
    assert_eq!(outcome, ValidationOutcome::Valid);
    assert_eq!(ops.counts().check_connection, 1);
    assert_eq!(notifier.blocking_count(), 0, "no dialog on success");
    assert_eq!(
        notifier.notices(),
        vec![Notice::Transient("Connection valid".to_string())]
    );
}

#[tokio::test]
async fn validate_with_transport_error_is_invalid() {
    let ops = CountingOps::failing("dns failure");
    let notifier = RecordingNotifier::default();

    let outcome = validate(&ops, &notifier).await;
    assert_eq!(outcome, ValidationOutcome::Invalid);
    assert_eq!(notifier.blocking_count(), 1);
    assert_eq!(notifier.transient_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn validate_times_out_instead_of_blocking_forever() {
    let ops = CountingOps::hanging();
    let notifier = RecordingNotifier::default();

    let outcome = validate(&ops, &notifier).await;
    assert_eq!(outcome, ValidationOutcome::Invalid);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        Notice::Blocking(title, body) => {
            assert_eq!(title, "Validation");
            assert!(body.contains("timed out"));
        }
        other => panic!("expected blocking notice, got {other:?}"),
    }
}
