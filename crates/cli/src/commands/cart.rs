//! Cart commands: wiring the store and rendering the cart.

use std::fmt::Write as _;
use std::sync::Arc;

use rocketshoes_cart::api::{ApiClient, ApiError};
use rocketshoes_cart::config::CartConfig;
use rocketshoes_cart::services::{FileStorage, TracingNotifier};
use rocketshoes_cart::{CartServices, CartStore, UpdateProductAmount};
use rocketshoes_core::{Cart, CurrencyCode, Price, ProductId};
use tracing::debug;

/// Build the cart store from configuration.
///
/// # Errors
///
/// Returns an error if the API client cannot be built.
pub fn open_store(config: &CartConfig) -> Result<CartStore, ApiError> {
    debug!(api = ?config.api, storage = %config.storage_path.display(), "Opening cart");

    let api = ApiClient::new(&config.api)?;
    let services = CartServices::from_api(
        api,
        Arc::new(FileStorage::new(&config.storage_path)),
        Arc::new(TracingNotifier),
    );

    Ok(CartStore::open(services, config.storage_key.as_str()))
}

/// Set a product's quantity.
pub async fn update(store: &mut CartStore, product_id: ProductId, amount: i64) {
    store
        .update_product_amount(UpdateProductAmount { product_id, amount })
        .await;
}

/// Print the cart to stdout.
#[allow(clippy::print_stdout)]
pub fn print_cart(cart: &Cart, currency: CurrencyCode) {
    print!("{}", render_cart(cart, currency));
}

/// Render the cart as a plain-text table.
#[must_use]
pub fn render_cart(cart: &Cart, currency: CurrencyCode) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<32} {:>5} {:>14} {:>14}",
        "ID", "Product", "Qty", "Unit price", "Total"
    );

    for item in cart {
        let _ = writeln!(
            out,
            "{:<6} {:<32} {:>5} {:>14} {:>14}",
            item.product_id(),
            truncate(&item.product.title, 32),
            item.amount,
            Price::new(item.product.price, currency).display(),
            Price::new(item.line_total(), currency).display(),
        );
    }

    let _ = writeln!(
        out,
        "\nItems: {}  Subtotal: {}",
        cart.item_count(),
        Price::new(cart.subtotal(), currency).display()
    );
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_cart() -> Cart {
        serde_json::from_str(
            r#"[
                {"id": 1, "title": "Tênis de Caminhada Leve Confortável", "price": 179.9, "image": "", "amount": 2},
                {"id": 2, "title": "Shoe", "price": 100, "image": "", "amount": 1}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_cart(&Cart::new(), CurrencyCode::BRL), "Cart is empty\n");
    }

    #[test]
    fn test_render_cart_lines_and_totals() {
        let rendered = render_cart(&sample_cart(), CurrencyCode::BRL);

        assert!(rendered.contains("R$ 359.80"));
        assert!(rendered.contains("Shoe"));
        assert!(rendered.ends_with("Items: 3  Subtotal: R$ 459.80\n"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Shoe", 32), "Shoe");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
