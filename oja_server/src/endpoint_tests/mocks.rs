use mockall::mock;
use oja_common::Kobo;
use oja_engine::{
    db_types::{
        Agent,
        AgentEarning,
        CustomerSession,
        Market,
        MarketProduct,
        NewOrder,
        NewOrderItem,
        Order,
        OrderItem,
        OrderNo,
        OrderStatusLogEntry,
        OrderStatusType,
        ProductPrice,
    },
    order_objects::OrderQueryFilter,
    traits::{CatalogError, CatalogManagement, MarketplaceDatabase, MarketplaceError, OrderManagement, PaymentOutcome},
};

mock! {
    pub MarketplaceDb {}

    impl Clone for MarketplaceDb {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for MarketplaceDb {
        async fn fetch_order_by_order_no(&self, order_no: &OrderNo) -> Result<Option<Order>, MarketplaceError>;
        async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, MarketplaceError>;
        async fn fetch_order_items(&self, order_no: &OrderNo) -> Result<Vec<OrderItem>, MarketplaceError>;
        async fn fetch_status_history(&self, order_no: &OrderNo) -> Result<Vec<OrderStatusLogEntry>, MarketplaceError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError>;
        async fn fetch_earnings_for_order(&self, order_no: &OrderNo) -> Result<Vec<AgentEarning>, MarketplaceError>;
        async fn fetch_active_session(&self, customer_phone: &str) -> Result<Option<CustomerSession>, MarketplaceError>;
    }

    impl CatalogManagement for MarketplaceDb {
        async fn fetch_market(&self, market_id: i64) -> Result<Option<Market>, CatalogError>;
        async fn fetch_catalog_for_market(&self, market_id: i64) -> Result<Vec<MarketProduct>, CatalogError>;
        async fn fetch_prices_for_product(&self, product_id: i64) -> Result<Vec<ProductPrice>, CatalogError>;
    }

    impl MarketplaceDatabase for MarketplaceDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, MarketplaceError>;
        async fn add_item(&self, order_no: &OrderNo, item: NewOrderItem) -> Result<Order, MarketplaceError>;
        async fn replace_items(&self, order_no: &OrderNo, items: &[NewOrderItem]) -> Result<Order, MarketplaceError>;
        async fn mark_order_status(
            &self,
            order_no: &OrderNo,
            from: OrderStatusType,
            to: OrderStatusType,
            message: &str,
        ) -> Result<Order, MarketplaceError>;
        async fn set_payment_reference(&self, order_no: &OrderNo, reference: &str) -> Result<Order, MarketplaceError>;
        async fn confirm_payment(&self, reference: &str, amount: Kobo) -> Result<PaymentOutcome, MarketplaceError>;
        async fn fail_payment(&self, reference: &str) -> Result<PaymentOutcome, MarketplaceError>;
        async fn assign_agent(&self, order_no: &OrderNo) -> Result<Option<(Order, Agent)>, MarketplaceError>;
        async fn fetch_unassigned_paid_orders(&self) -> Result<Vec<Order>, MarketplaceError>;
    }
}
