//! Agent assignment tests: eligibility, capacity ceilings and commission capture.
use oja_common::Kobo;
use oja_engine::{
    db_types::{EarningStatus, NewOrder, NewOrderItem, OrderNo, OrderStatusType},
    events::EventProducers,
    helpers::new_order_number,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seeds::{seed_agent, seed_basic_market, seed_market},
    },
    MarketplaceDatabase,
    OrderFlowApi,
    OrderManagement,
    SqliteDatabase,
};

async fn new_test_api() -> OrderFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    OrderFlowApi::new(db, EventProducers::default())
}

async fn paid_order(api: &OrderFlowApi<SqliteDatabase>, market_id: i64, phone: &str) -> OrderNo {
    let order_no = new_order_number();
    let new_order = NewOrder::new(order_no.clone(), market_id, phone.into(), "12 Ojuelegba Rd".into());
    let items = vec![NewOrderItem::new("Rice", "1kg", 2, Kobo::from_naira(1_200))];
    api.process_new_order(new_order, &items).await.unwrap();
    api.update_status(&order_no, OrderStatusType::Paid, "Paid").await.unwrap();
    order_no
}

#[tokio::test]
async fn paid_orders_are_assigned_with_commission() {
    let api = new_test_api().await;
    let (market_id, agent_id) = seed_basic_market(api.db().pool()).await;
    let order_no = paid_order(&api, market_id, "+2348060000001").await;

    let (order, agent) = api.assign_agent(&order_no).await.unwrap().expect("agent should be assigned");
    assert_eq!(agent.id, agent_id);
    assert_eq!(order.status, OrderStatusType::Assigned);
    assert_eq!(order.agent_id, Some(agent_id));
    assert!(order.assigned_at.is_some());

    // 10% of the ₦2400 subtotal, captured as a pending earning.
    let earnings = api.db().fetch_earnings_for_order(&order_no).await.unwrap();
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0].amount, Kobo::from_naira(240));
    assert_eq!(earnings[0].status, EarningStatus::Pending);
    assert!(earnings[0].paid_at.is_none());
}

#[tokio::test]
async fn unpaid_orders_are_not_assigned() {
    let api = new_test_api().await;
    let (market_id, _) = seed_basic_market(api.db().pool()).await;
    let order_no = new_order_number();
    let new_order = NewOrder::new(order_no.clone(), market_id, "+2348060000002".into(), "9 Herbert Macaulay".into());
    api.process_new_order(new_order, &[NewOrderItem::new("Yam", "tuber", 1, Kobo::from_naira(1_500))])
        .await
        .unwrap();

    assert!(api.assign_agent(&order_no).await.unwrap().is_none());
}

#[tokio::test]
async fn agents_at_capacity_are_skipped() {
    let api = new_test_api().await;
    let market_id = seed_market(api.db().pool(), "Oyingbo", Kobo::from_naira(300)).await;
    // One agent who can only carry a single open order at a time.
    let busy = seed_agent(api.db().pool(), market_id, "Tunde", 1).await;

    let first = paid_order(&api, market_id, "+2348060000003").await;
    let second = paid_order(&api, market_id, "+2348060000004").await;

    let (_, agent) = api.assign_agent(&first).await.unwrap().expect("first order should be assigned");
    assert_eq!(agent.id, busy);
    // Tunde is full; the second order waits for the sweep to retry.
    assert!(api.assign_agent(&second).await.unwrap().is_none());

    let unassigned = api.db().fetch_unassigned_paid_orders().await.unwrap();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].order_no, second);

    // Delivering the first order frees the slot up again.
    for status in [
        OrderStatusType::Preparing,
        OrderStatusType::ReadyForDelivery,
        OrderStatusType::OutForDelivery,
        OrderStatusType::Delivered,
    ] {
        api.update_status(&first, status, "moving along").await.unwrap();
    }
    let (_, agent) = api.assign_agent(&second).await.unwrap().expect("slot should have freed up");
    assert_eq!(agent.id, busy);
    assert!(api.db().fetch_unassigned_paid_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn earlier_agents_take_precedence() {
    let api = new_test_api().await;
    let market_id = seed_market(api.db().pool(), "Bodija", Kobo::from_naira(300)).await;
    let senior = seed_agent(api.db().pool(), market_id, "Amaka", 5).await;
    let _junior = seed_agent(api.db().pool(), market_id, "Chidi", 5).await;

    let order_no = paid_order(&api, market_id, "+2348060000005").await;
    let (_, agent) = api.assign_agent(&order_no).await.unwrap().unwrap();
    assert_eq!(agent.id, senior);
}

#[tokio::test]
async fn agents_never_cross_markets() {
    let api = new_test_api().await;
    let (market_a, _) = seed_basic_market(api.db().pool()).await;
    let market_b = seed_market(api.db().pool(), "Wuse", Kobo::from_naira(700)).await;
    // market_b has no agents, so its orders stay unassigned no matter who is free in market_a.
    let _ = market_a;
    let order_no = paid_order(&api, market_b, "+2348060000006").await;
    assert!(api.assign_agent(&order_no).await.unwrap().is_none());
}
