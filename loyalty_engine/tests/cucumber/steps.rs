use std::time::Duration;

use cucumber::{given, then, when};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, Points, UserId},
    LedgerDatabase,
    LedgerError,
};
use serde_json::json;
use tokio::time::{sleep, Instant};
use wiremock::{
    matchers::{method, path},
    Mock,
    ResponseTemplate,
};

use crate::cucumber::LoyaltyWorld;

fn points(value: f64) -> Points {
    Points::try_from(value).expect("Not a valid points value")
}

fn order_number(number: &str) -> OrderNumber {
    OrderNumber::parse(number).expect("Not a valid order number")
}

fn order_path(number: &str) -> String {
    format!("/api/orders/{number}")
}

#[given(expr = "the accrual service reports order {word} as {word} with {float} points")]
async fn accrual_reports(world: &mut LoyaltyWorld, number: String, status: String, accrual: f64) {
    let body = json!({"order": number, "status": status, "accrual": accrual});
    Mock::given(method("GET"))
        .and(path(order_path(&number)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(world.system().accrual())
        .await;
}

#[given(expr = "the accrual service does not know order {word}")]
async fn accrual_does_not_know(world: &mut LoyaltyWorld, number: String) {
    Mock::given(method("GET"))
        .and(path(order_path(&number)))
        .respond_with(ResponseTemplate::new(204))
        .mount(world.system().accrual())
        .await;
}

#[given("the accrual service is rate limiting")]
async fn accrual_rate_limiting(world: &mut LoyaltyWorld) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "60"))
        .mount(world.system().accrual())
        .await;
}

#[given(expr = "user '{word}' has a processed order {word} worth {float} points")]
async fn processed_order(world: &mut LoyaltyWorld, user: String, number: String, accrual: f64) {
    let db = &world.system().db;
    let number = order_number(&number);
    db.insert_order(&number, &UserId::from(user)).await.expect("Error inserting order");
    db.update_order_status(&number, OrderStatusType::Processed, Some(points(accrual)))
        .await
        .expect("Error updating order");
}

#[when(expr = "user '{word}' registers order {word}")]
async fn register_order(world: &mut LoyaltyWorld, user: String, number: String) {
    world.api().register_order(&number, &UserId::from(user)).await.expect("Error registering order");
}

#[when(expr = "user '{word}' registers order {word} again")]
async fn register_order_again(world: &mut LoyaltyWorld, user: String, number: String) {
    let err = world.api().register_order(&number, &UserId::from(user)).await.unwrap_err();
    assert_eq!(err, LedgerError::AlreadyOwnedBySameUser(order_number(&number)));
}

#[when(expr = "user '{word}' tries to register order {word}")]
async fn register_someone_elses_order(world: &mut LoyaltyWorld, user: String, number: String) {
    let err = world.api().register_order(&number, &UserId::from(user)).await.unwrap_err();
    assert_eq!(err, LedgerError::OwnedByAnotherUser(order_number(&number)));
}

#[when(expr = "user '{word}' tries to withdraw {float} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, user: String, amount: f64, number: String) {
    let result = world.api().withdraw(&UserId::from(user), &number, points(amount)).await;
    world.system().last_withdrawal = Some(result);
}

#[when("the reconciliation pool is running")]
async fn pool_is_running(world: &mut LoyaltyWorld) {
    world.system().start_pool();
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut LoyaltyWorld, ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

#[when(expr = "I wait for order {word} to be resolved")]
async fn wait_for_resolution(world: &mut LoyaltyWorld, number: String) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let order = world.api().order(&number).await.expect("Error fetching order").expect("Order does not exist");
        if order.status.is_terminal() {
            return;
        }
        assert!(Instant::now() < deadline, "Order {number} was not resolved in time. It is {}", order.status);
        sleep(Duration::from_millis(50)).await;
    }
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid status");
    let order = world.api().order(&number).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} has an accrual of {float} points")]
async fn check_accrual(world: &mut LoyaltyWorld, number: String, accrual: f64) {
    let order = world.api().order(&number).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.accrual, Some(points(accrual)));
}

#[then(expr = "order {word} belongs to user '{word}'")]
async fn check_owner(world: &mut LoyaltyWorld, number: String, user: String) {
    let order = world.api().order(&number).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.user_id, UserId::from(user));
}

#[then(expr = "order {word} is awaiting reconciliation")]
async fn check_unresolved(world: &mut LoyaltyWorld, number: String) {
    let unresolved = world.system().db.fetch_unresolved_orders().await.expect("Error fetching unresolved orders");
    assert!(unresolved.contains(&order_number(&number)), "{number} is not in {unresolved:?}");
}

#[then(expr = "the balance for user '{word}' is {float} points")]
async fn check_balance(world: &mut LoyaltyWorld, user: String, balance: f64) {
    let actual = world.api().balance(&UserId::from(user)).await.expect("Error fetching balance");
    assert_eq!(actual.current, points(balance));
}

#[then(expr = "user '{word}' has withdrawn {float} points")]
async fn check_withdrawn(world: &mut LoyaltyWorld, user: String, withdrawn: f64) {
    let actual = world.api().balance(&UserId::from(user)).await.expect("Error fetching balance");
    assert_eq!(actual.withdrawn, points(withdrawn));
}

#[then("the withdrawal is refused for insufficient funds")]
async fn check_refused(world: &mut LoyaltyWorld) {
    let result = world.system().last_withdrawal.take().expect("No withdrawal was attempted");
    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })), "Unexpected result: {result:?}");
}

#[then("the withdrawal succeeds")]
async fn check_succeeded(world: &mut LoyaltyWorld) {
    let result = world.system().last_withdrawal.take().expect("No withdrawal was attempted");
    assert!(result.is_ok(), "Unexpected result: {result:?}");
}

#[then(expr = "user '{word}' has {int} withdrawal(s)")]
async fn check_withdrawal_count(world: &mut LoyaltyWorld, user: String, count: usize) {
    let withdrawals = world.api().withdrawals_for(&UserId::from(user)).await.expect("Error fetching withdrawals");
    assert_eq!(withdrawals.len(), count);
}

#[then("the reconciliation pool is paused")]
async fn check_paused(world: &mut LoyaltyWorld) {
    let pool = world.system().pool.as_ref().expect("The pool is not running");
    assert!(pool.is_paused());
    assert_eq!(pool.stats().pauses, 1);
}
