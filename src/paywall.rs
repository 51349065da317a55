//! Paywall shown after onboarding: loads the subscription offer and runs
//! purchases through the injected store capability.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PurchaseError;
use crate::store::{KeyValueStore, StoredValue};

/// Settings key flipped on after a successful purchase.
pub const SUBSCRIPTION_ACTIVE: &str = "subscription.active";

/// A purchasable subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    /// Localized price as the store displays it, e.g. "$4.99".
    pub price_label: String,
    /// Billing period label, e.g. "week".
    pub period: String,
}

/// The platform's in-app purchase service.
#[async_trait]
pub trait PurchaseCapability: Send + Sync {
    /// Look up a product. `Ok(None)` when the store does not list it.
    async fn get_product(&self, id: &str) -> Result<Option<Product>, PurchaseError>;

    /// Run the purchase sheet. `Ok(false)` when the user backs out.
    async fn purchase(&self, product: &Product) -> Result<bool, PurchaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    Purchased,
    Declined,
}

pub struct Paywall {
    purchases: Arc<dyn PurchaseCapability>,
    store: Arc<dyn KeyValueStore>,
}

impl Paywall {
    pub fn new(purchases: Arc<dyn PurchaseCapability>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { purchases, store }
    }

    /// Products to display, in the order requested. Ids the store does not
    /// know are skipped.
    pub async fn load_offer(&self, ids: &[String]) -> Result<Vec<Product>, PurchaseError> {
        let mut offer = Vec::with_capacity(ids.len());
        for id in ids {
            match self.purchases.get_product(id).await? {
                Some(product) => offer.push(product),
                None => warn!(product_id = %id, "Product not listed by store, skipping"),
            }
        }
        Ok(offer)
    }

    /// Purchase a product by id and record the subscription on success.
    pub async fn buy(&self, id: &str) -> Result<PurchaseOutcome, PurchaseError> {
        let product = self.purchases.get_product(id).await?.ok_or_else(|| {
            PurchaseError::ProductUnavailable {
                product_id: id.to_string(),
            }
        })?;

        if !self.purchases.purchase(&product).await? {
            info!(product_id = %id, "Purchase declined");
            return Ok(PurchaseOutcome::Declined);
        }

        info!(product_id = %id, "Purchase completed");
        // The store already charged; a failed local write must not undo that.
        if let Err(e) = self
            .store
            .set(SUBSCRIPTION_ACTIVE, StoredValue::Flag(true))
            .await
        {
            warn!(error = %e, "Failed to record active subscription");
        }
        Ok(PurchaseOutcome::Purchased)
    }

    /// Whether a subscription was recorded on this device.
    pub async fn is_subscribed(&self) -> bool {
        match self.store.get(SUBSCRIPTION_ACTIVE).await {
            Ok(value) => value.and_then(|v| v.as_flag()).unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "Could not read subscription flag");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    struct MockStoreFront {
        products: Vec<Product>,
        approve: Result<bool, PurchaseError>,
        bought: Mutex<Vec<String>>,
    }

    impl MockStoreFront {
        fn new(approve: Result<bool, PurchaseError>) -> Self {
            Self {
                products: vec![product("dream.weekly", "week"), product("dream.yearly", "year")],
                approve,
                bought: Mutex::new(Vec::new()),
            }
        }
    }

    fn product(id: &str, period: &str) -> Product {
        Product {
            id: id.to_string(),
            title: format!("Dream Journal ({period})"),
            price_label: "$4.99".to_string(),
            period: period.to_string(),
        }
    }

    #[async_trait]
    impl PurchaseCapability for MockStoreFront {
        async fn get_product(&self, id: &str) -> Result<Option<Product>, PurchaseError> {
            Ok(self.products.iter().find(|p| p.id == id).cloned())
        }

        async fn purchase(&self, product: &Product) -> Result<bool, PurchaseError> {
            self.bought.lock().unwrap().push(product.id.clone());
            match &self.approve {
                Ok(approved) => Ok(*approved),
                Err(PurchaseError::Network(msg)) => Err(PurchaseError::Network(msg.clone())),
                Err(_) => Err(PurchaseError::Cancelled {
                    product_id: product.id.clone(),
                }),
            }
        }
    }

    fn paywall(front: MockStoreFront) -> (Paywall, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Paywall::new(Arc::new(front), store.clone()), store)
    }

    #[tokio::test]
    async fn load_offer_keeps_order_and_skips_unknown() {
        let (paywall, _) = paywall(MockStoreFront::new(Ok(true)));
        let ids = vec![
            "dream.yearly".to_string(),
            "dream.lifetime".to_string(),
            "dream.weekly".to_string(),
        ];
        let offer = paywall.load_offer(&ids).await.unwrap();
        let got: Vec<_> = offer.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(got, vec!["dream.yearly", "dream.weekly"]);
    }

    #[tokio::test]
    async fn buy_records_subscription() {
        let (paywall, store) = paywall(MockStoreFront::new(Ok(true)));
        assert!(!paywall.is_subscribed().await);

        let outcome = paywall.buy("dream.weekly").await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::Purchased);
        assert_eq!(
            store.get(SUBSCRIPTION_ACTIVE).await.unwrap(),
            Some(StoredValue::Flag(true))
        );
        assert!(paywall.is_subscribed().await);
    }

    #[tokio::test]
    async fn declined_purchase_records_nothing() {
        let (paywall, store) = paywall(MockStoreFront::new(Ok(false)));
        let outcome = paywall.buy("dream.yearly").await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::Declined);
        assert!(store.get(SUBSCRIPTION_ACTIVE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_product_is_unavailable() {
        let (paywall, _) = paywall(MockStoreFront::new(Ok(true)));
        let err = paywall.buy("dream.lifetime").await.unwrap_err();
        assert!(matches!(err, PurchaseError::ProductUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn store_failure_surfaces_retryable_message() {
        let (paywall, store) =
            paywall(MockStoreFront::new(Err(PurchaseError::Network("timeout".into()))));
        let err = paywall.buy("dream.weekly").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.user_message().contains("try again"));
        assert!(store.get(SUBSCRIPTION_ACTIVE).await.unwrap().is_none());
    }
}
