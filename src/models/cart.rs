//! Guest and customer carts (quotes) through to order placement.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DefaultOnNull};

use crate::client::MagentoClient;
use crate::error::{MagentoError, Result, ResultExt};
use crate::models::common::{magento_datetime, Address};
use crate::models::order::OrderHandle;
use crate::response::unquote;
use crate::traits::{Handle, HandleState, Refresh};

/// Base route for guest carts.
pub const GUEST_CARTS: &str = "/guest-carts";
/// Route of the authenticated customer's own cart.
pub const CUSTOMER_CART: &str = "/carts/mine";

/// A quote.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<u64>,
    #[serde(default, with = "magento_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "magento_datetime")]
    pub updated_at: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
    pub is_virtual: Option<bool>,
    pub items_count: Option<u32>,
    pub items_qty: Option<f64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub billing_address: Option<Address>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: Option<u64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub qty: f64,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub product_type: Option<String>,
    pub quote_id: Option<String>,
}

impl CartItem {
    pub fn new(sku: impl Into<String>, qty: f64) -> Self {
        Self {
            sku: sku.into(),
            qty,
            ..Default::default()
        }
    }
}

/// A shipping method offered for a cart.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    #[serde(default)]
    pub carrier_code: String,
    #[serde(default)]
    pub method_code: String,
    pub carrier_title: Option<String>,
    pub method_title: Option<String>,
    pub amount: Option<f64>,
    pub base_amount: Option<f64>,
    #[serde(default)]
    pub available: bool,
    pub error_message: Option<String>,
    pub price_excl_tax: Option<f64>,
    pub price_incl_tax: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressInformation {
    pub shipping_address: Address,
    pub billing_address: Address,
    pub shipping_carrier_code: String,
    pub shipping_method_code: String,
}

impl AddressInformation {
    /// Ship and bill to the same address with the chosen carrier.
    pub fn same_address(address: Address, carrier: &Carrier) -> Self {
        Self {
            shipping_address: address.clone(),
            billing_address: address,
            shipping_carrier_code: carrier.carrier_code.clone(),
            shipping_method_code: carrier.method_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub code: String,
    #[serde(default)]
    pub title: String,
}

/// Answer to submitting shipping information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
    #[serde(default)]
    pub totals: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct CartItemPayload<'a> {
    #[serde(rename = "cartItem")]
    cart_item: &'a CartItem,
}

#[derive(Serialize)]
struct EstimateShippingPayload<'a> {
    address: &'a Address,
}

#[derive(Serialize)]
struct ShippingInformationPayload<'a> {
    #[serde(rename = "addressInformation")]
    address_information: &'a AddressInformation,
}

#[derive(Serialize)]
struct PaymentMethodCode<'a> {
    method: &'a str,
}

#[derive(Serialize)]
struct PlaceOrderPayload<'a> {
    #[serde(rename = "paymentMethod")]
    payment_method: PaymentMethodCode<'a>,
}

/// Accessor for one cart.
#[derive(Debug, Clone)]
pub struct CartHandle {
    route: Option<String>,
    state: HandleState,
    /// Quote id returned when the cart was created. Masked for guest carts.
    pub quote_id: String,
    pub cart: Cart,
    client: MagentoClient,
}

fn parse_quote_id(raw: &str, operation: &str) -> Result<String> {
    let quote_id = unquote(raw.trim());
    if quote_id.is_empty() {
        return Err(MagentoError::UnexpectedResponse {
            operation: operation.to_string(),
            body: raw.to_string(),
        });
    }
    Ok(quote_id.to_string())
}

impl CartHandle {
    /// Create a guest cart and hydrate it.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client))]
    pub async fn new_guest(client: &MagentoClient) -> Result<Self> {
        let raw = client
            .post_empty(GUEST_CARTS, "initialize cart for guest")
            .await
            .context("initialize guest cart")?;
        let quote_id = parse_quote_id(&raw, "initialize guest cart")?;
        let route = format!("{GUEST_CARTS}/{quote_id}");
        Self::initialized(client, route, quote_id)
            .await
            .context("update guest cart from remote after initialization")
    }

    /// Create (or reuse) the authenticated customer's cart and hydrate it.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client))]
    pub async fn new_customer(client: &MagentoClient) -> Result<Self> {
        let raw = client
            .post_empty(CUSTOMER_CART, "initialize cart for customer")
            .await
            .context("initialize customer cart")?;
        let quote_id = parse_quote_id(&raw, "initialize customer cart")?;
        Self::initialized(client, CUSTOMER_CART.to_string(), quote_id)
            .await
            .context("update customer cart from remote after initialization")
    }

    async fn initialized(client: &MagentoClient, route: String, quote_id: String) -> Result<Self> {
        tracing::debug!(quote_id = %quote_id, route = %route, "cart initialized");
        let mut handle = Self {
            route: Some(route),
            state: HandleState::RouteKnown,
            quote_id,
            cart: Cart::default(),
            client: client.clone(),
        };
        handle.refresh().await?;
        Ok(handle)
    }

    fn sub_route(&self, suffix: &str, operation: &str) -> Result<String> {
        Ok(format!("{}{suffix}", self.require_route(operation)?))
    }

    /// Add items one by one. Each item is stamped with this cart's quote id.
    ///
    /// The local cart is not refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::ItemNotFound`] when the API answers 404 for an
    /// item (typically an unknown SKU). Items before it stay in the cart.
    #[tracing::instrument(skip(self, items), fields(quote_id = %self.quote_id, count = items.len()))]
    pub async fn add_items(&self, items: &[CartItem]) -> Result<()> {
        let endpoint = self.sub_route("/items", "add item to cart")?;

        for item in items {
            let mut item = item.clone();
            item.quote_id = Some(self.quote_id.clone());

            let operation = format!("add item '{}' to cart", item.sku);
            let added: Result<serde_json::Value> = self
                .client
                .post(&endpoint, &CartItemPayload { cart_item: &item }, &operation)
                .await;

            match added {
                Ok(_) => tracing::debug!(sku = %item.sku, qty = item.qty, "item added to cart"),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(sku = %item.sku, "cart item not found");
                    return Err(MagentoError::ItemNotFound {
                        item_id: item.item_id,
                        sku: item.sku,
                    });
                }
                Err(e) => return Err(e.context(operation)),
            }
        }
        Ok(())
    }

    /// Shipping methods available for `address`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self, address), fields(quote_id = %self.quote_id))]
    pub async fn estimate_shipping_carriers(&self, address: &Address) -> Result<Vec<Carrier>> {
        let operation = "estimate shipping carrier for cart";
        let endpoint = self.sub_route("/estimate-shipping-methods", operation)?;
        self.client
            .post(&endpoint, &EstimateShippingPayload { address }, operation)
            .await
            .context(operation)
    }

    /// Set shipping and billing addresses plus the shipping method.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self, info), fields(quote_id = %self.quote_id))]
    pub async fn add_shipping_information(
        &self,
        info: &AddressInformation,
    ) -> Result<PaymentDetails> {
        let operation = "add shipping information to cart";
        let endpoint = self.sub_route("/shipping-information", operation)?;
        self.client
            .post(
                &endpoint,
                &ShippingInformationPayload {
                    address_information: info,
                },
                operation,
            )
            .await
            .context(operation)
    }

    /// Payment methods available for this cart.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self), fields(quote_id = %self.quote_id))]
    pub async fn estimate_payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        let operation = "estimate payment methods for cart";
        let endpoint = self.sub_route("/payment-methods", operation)?;
        let methods: Vec<PaymentMethod> =
            self.client.get(&endpoint, operation).await.context(operation)?;
        tracing::debug!(count = methods.len(), "payment methods estimated");
        Ok(methods)
    }

    /// Place the order. The returned handle knows its route but is not
    /// hydrated.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::UnexpectedResponse`] if the order id in the
    /// body is not numeric.
    #[tracing::instrument(skip(self, method), fields(quote_id = %self.quote_id, method = %method.code))]
    pub async fn place_order(&self, method: &PaymentMethod) -> Result<OrderHandle> {
        let operation = "create order";
        let endpoint = self.sub_route("/order", operation)?;
        let payload = PlaceOrderPayload {
            payment_method: PaymentMethodCode {
                method: &method.code,
            },
        };

        let raw = self
            .client
            .put_raw(&endpoint, &payload, operation)
            .await
            .context(operation)?;
        let id = unquote(raw.trim());
        let entity_id: u64 = id.parse().map_err(|_| {
            tracing::error!(body = %raw, "order id is not numeric");
            MagentoError::UnexpectedResponse {
                operation: "extract order id".to_string(),
                body: raw.clone(),
            }
        })?;

        tracing::info!(entity_id, "order placed");
        Ok(OrderHandle::from_entity_id(&self.client, entity_id))
    }

    /// Remove one item from the cart.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self), fields(quote_id = %self.quote_id))]
    pub async fn delete_item(&self, item_id: u64) -> Result<()> {
        let operation = format!("delete item id '{item_id}'");
        let endpoint = self.sub_route(&format!("/items/{item_id}"), &operation)?;
        let _: serde_json::Value = self.client.delete(&endpoint, &operation).await?;
        tracing::debug!(item_id, "item deleted from cart");
        Ok(())
    }

    /// Refresh, then delete every item in the cart.
    ///
    /// # Errors
    ///
    /// Stops at the first failed deletion.
    #[tracing::instrument(skip(self), fields(quote_id = %self.quote_id))]
    pub async fn delete_all_items(&mut self) -> Result<()> {
        self.refresh()
            .await
            .context("update cart before deleting all items")?;

        let ids: Vec<u64> = self.cart.items.iter().filter_map(|i| i.item_id).collect();
        for id in ids {
            self.delete_item(id)
                .await
                .context("delete item during delete all items")?;
        }
        self.cart.items.clear();
        tracing::debug!("all items deleted from cart");
        Ok(())
    }
}

impl Handle for CartHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Refresh for CartHandle {
    async fn refresh(&mut self) -> Result<()> {
        let route = self
            .require_route("get detailed cart object from remote")?
            .to_string();
        let cart: Cart = self
            .client
            .get(&route, "get detailed cart object from remote")
            .await?;
        self.cart = cart;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}
