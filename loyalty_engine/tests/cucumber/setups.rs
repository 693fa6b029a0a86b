use cucumber::given;
use wiremock::MockServer;

use crate::cucumber::{LoyaltySystem, LoyaltyWorld};

#[given("a fresh ledger")]
async fn fresh_ledger(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given("an accrual service")]
async fn accrual_service(world: &mut LoyaltyWorld) {
    let server = MockServer::start().await;
    world.system().accrual = Some(server);
}
