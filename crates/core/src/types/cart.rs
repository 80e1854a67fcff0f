//! Cart and line item types.
//!
//! A [`Cart`] is an ordered list of [`LineItem`]s, unique by product. It is
//! never edited in place: every change builds a new cart value, which is what
//! gets persisted and then published.
//!
//! The serialized form is a plain JSON array of line items, each one being the
//! product record with an extra `amount` field:
//!
//! ```json
//! [{"id": 1, "title": "Shoe", "price": "100", "image": "", "amount": 2}]
//! ```

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::product::Product;

/// Errors raised when a cart change would break the cart's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartStateError {
    /// The product already has a line item.
    #[error("product {0} is already in the cart")]
    DuplicateProduct(ProductId),

    /// The product has no line item.
    #[error("product {0} is not in the cart")]
    MissingProduct(ProductId),
}

/// One cart entry: a product and the requested quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: NonZeroU32,
}

impl LineItem {
    /// A fresh line item with a quantity of one.
    ///
    /// Any `amount` field the catalog put on the product is dropped; the line
    /// item's own quantity is the only `amount` in the serialized record.
    #[must_use]
    pub fn new(mut product: Product) -> Self {
        product.extra.remove("amount");
        Self {
            product,
            amount: NonZeroU32::MIN,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// `price * amount` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.amount.get())
    }
}

/// Ordered collection of line items, unique by product ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line item for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id() == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// A new cart with `item` appended.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateProduct` if the product already has a line item.
    pub fn with_item(&self, item: LineItem) -> Result<Self, CartStateError> {
        if self.contains(item.product_id()) {
            return Err(CartStateError::DuplicateProduct(item.product_id()));
        }

        let mut items = self.items.clone();
        items.push(item);
        Ok(Self { items })
    }

    /// A new cart without the line item for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `MissingProduct` if the product has no line item.
    pub fn without(&self, product_id: ProductId) -> Result<Self, CartStateError> {
        if !self.contains(product_id) {
            return Err(CartStateError::MissingProduct(product_id));
        }

        let items = self
            .items
            .iter()
            .filter(|item| item.product_id() != product_id)
            .cloned()
            .collect();
        Ok(Self { items })
    }

    /// A new cart where the line item for `product_id` has `amount` units.
    ///
    /// # Errors
    ///
    /// Returns `MissingProduct` if the product has no line item.
    pub fn with_amount(
        &self,
        product_id: ProductId,
        amount: NonZeroU32,
    ) -> Result<Self, CartStateError> {
        let mut items = self.items.clone();
        let item = items
            .iter_mut()
            .find(|item| item.product_id() == product_id)
            .ok_or(CartStateError::MissingProduct(product_id))?;
        item.amount = amount;
        Ok(Self { items })
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.amount.get()))
            .sum()
    }

    /// Sum of every line total.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CartStateError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        items
            .into_iter()
            .try_fold(Self::new(), |mut cart, item| {
                if cart.contains(item.product_id()) {
                    return Err(CartStateError::DuplicateProduct(item.product_id()));
                }
                cart.items.push(item);
                Ok(cart)
            })
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Shoe {id}"),
            price: Decimal::new(price, 0),
            image: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    fn amount(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_with_item_appends_in_order() {
        let cart = Cart::new()
            .with_item(LineItem::new(product(2, 10)))
            .unwrap()
            .with_item(LineItem::new(product(1, 20)))
            .unwrap();

        let ids: Vec<i32> = cart.iter().map(|i| i.product_id().as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().amount.get(), 1);
    }

    #[test]
    fn test_with_item_rejects_duplicate() {
        let cart = Cart::new().with_item(LineItem::new(product(1, 10))).unwrap();
        let err = cart.with_item(LineItem::new(product(1, 10))).unwrap_err();
        assert_eq!(err, CartStateError::DuplicateProduct(ProductId::new(1)));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_without_and_with_amount_leave_original_untouched() {
        let cart = Cart::new().with_item(LineItem::new(product(1, 10))).unwrap();

        let updated = cart.with_amount(ProductId::new(1), amount(3)).unwrap();
        assert_eq!(updated.get(ProductId::new(1)).unwrap().amount.get(), 3);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().amount.get(), 1);

        let emptied = cart.without(ProductId::new(1)).unwrap();
        assert!(emptied.is_empty());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_missing_product_errors() {
        let cart = Cart::new();
        assert_eq!(
            cart.without(ProductId::new(9)).unwrap_err(),
            CartStateError::MissingProduct(ProductId::new(9))
        );
        assert_eq!(
            cart.with_amount(ProductId::new(9), amount(2)).unwrap_err(),
            CartStateError::MissingProduct(ProductId::new(9))
        );
    }

    #[test]
    fn test_item_count_and_subtotal() {
        let cart = Cart::new()
            .with_item(LineItem::new(product(1, 100)))
            .unwrap()
            .with_item(LineItem::new(product(2, 50)))
            .unwrap()
            .with_amount(ProductId::new(2), amount(3))
            .unwrap();

        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.subtotal(), Decimal::new(250, 0));
        assert_eq!(
            cart.get(ProductId::new(2)).unwrap().line_total(),
            Decimal::new(150, 0)
        );
    }

    #[test]
    fn test_serialized_form_is_flat_array() {
        let cart = Cart::new()
            .with_item(LineItem::new(product(1, 100)))
            .unwrap()
            .with_amount(ProductId::new(1), amount(2))
            .unwrap();

        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["amount"], 2);
        assert_eq!(value[0]["title"], "Shoe 1");

        let back: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_catalog_amount_field_is_replaced_by_quantity() {
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "title": "Shoe", "price": 100, "amount": 0, "brand": "VR"}"#,
        )
        .unwrap();
        let cart = Cart::new().with_item(LineItem::new(product)).unwrap();

        let blob = serde_json::to_string(&cart).unwrap();
        assert_eq!(blob.matches("\"amount\"").count(), 1);

        let back: Cart = serde_json::from_str(&blob).unwrap();
        assert_eq!(back, cart);
        assert_eq!(back.items()[0].amount.get(), 1);
        assert_eq!(back.items()[0].product.extra.get("brand").unwrap(), "VR");
    }

    #[test]
    fn test_deserialize_rejects_duplicates_and_zero_amounts() {
        let duplicated = r#"[
            {"id": 1, "title": "A", "price": 1, "amount": 1},
            {"id": 1, "title": "A", "price": 1, "amount": 2}
        ]"#;
        assert!(serde_json::from_str::<Cart>(duplicated).is_err());

        let zero = r#"[{"id": 1, "title": "A", "price": 1, "amount": 0}]"#;
        assert!(serde_json::from_str::<Cart>(zero).is_err());
    }
}
