//! Catalog product and stock records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as returned by the catalog service.
///
/// Only `id`, `title`, `price` and `image` are interpreted. Any other field
/// the catalog returns is kept in `extra` and written back untouched when the
/// cart is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(alias = "name")]
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Available quantity for a product, as reported by the stock service.
///
/// Never cached: a fresh record is fetched for every quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(rename = "id", alias = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "amount", alias = "availableQuantity")]
    pub available: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_accepts_name_alias_and_numeric_price() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Shoe", "price": 100}"#).unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.title, "Shoe");
        assert_eq!(product.price, Decimal::new(100, 0));
        assert!(product.image.is_empty());
        assert!(product.extra.is_empty());
    }

    #[test]
    fn test_product_keeps_unknown_fields() {
        let product: Product = serde_json::from_str(
            r#"{"id": 2, "title": "Tênis VR Caminhada", "price": 139.9, "image": "https://cdn/x.jpg", "brand": "VR"}"#,
        )
        .unwrap();

        assert_eq!(product.price, Decimal::new(1399, 1));
        assert_eq!(
            product.extra.get("brand"),
            Some(&serde_json::Value::String("VR".to_string()))
        );

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["brand"], "VR");
        assert_eq!(value["title"], "Tênis VR Caminhada");
    }

    #[test]
    fn test_stock_wire_names() {
        let stock: Stock = serde_json::from_str(r#"{"id": 3, "amount": 5}"#).unwrap();
        assert_eq!(stock.product_id, ProductId::new(3));
        assert_eq!(stock.available, 5);

        let stock: Stock =
            serde_json::from_str(r#"{"productId": 3, "availableQuantity": 0}"#).unwrap();
        assert_eq!(stock.available, 0);
    }

    #[test]
    fn test_stock_rejects_negative_quantity() {
        assert!(serde_json::from_str::<Stock>(r#"{"id": 3, "amount": -1}"#).is_err());
    }
}
