//! Decoding backend payloads into engine types.
//!
//! The backend wraps resources in `{ data: { cart: {...} } }`, but older
//! endpoints return `{ cart: {...} }`, `{ data: {...} }` or the bare object.
//! Decoding accepts any of these. Individual lines are read field by field
//! so a missing image or title does not discard the whole cart.

use crate::{error::Result, Cart, CartItem, Error, Wishlist, WishlistItem};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Decode a cart response. The backend's `totalAmount` is trusted verbatim;
/// the total is only computed when the backend omits it.
pub fn cart_from_response(body: &Value) -> Result<Cart> {
    let cart = unwrap_envelope(body, "cart", &["items", "totalAmount"])
        .ok_or_else(|| Error::MalformedResponse("no cart object in response".into()))?;

    let lines = cart
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(item) = cart_item_from_line(line)? {
            items.push(item);
        }
    }

    match cart.get("totalAmount").or_else(|| cart.get("total")) {
        Some(total) if !total.is_null() => Ok(Cart::with_total(items, decimal(total, "totalAmount")?)),
        _ => Cart::from_items(items),
    }
}

/// Decode a wishlist response. Entries are kept as sent, duplicates included.
pub fn wishlist_from_response(body: &Value) -> Result<Wishlist> {
    let wishlist = unwrap_envelope(body, "wishlist", &["items"])
        .ok_or_else(|| Error::MalformedResponse("no wishlist object in response".into()))?;

    let items = wishlist
        .get("items")
        .and_then(Value::as_array)
        .map(|lines| lines.iter().filter_map(wishlist_item_from_line).collect())
        .unwrap_or_default();

    Ok(Wishlist { items })
}

/// Find the resource object under `data.<key>`, `<key>`, `data`, or the
/// root, accepting the first candidate carrying any of `markers`.
fn unwrap_envelope<'a>(body: &'a Value, key: &str, markers: &[&str]) -> Option<&'a Value> {
    let data = body.get("data");
    let candidates = [
        data.and_then(|d| d.get(key)),
        body.get(key),
        data,
        Some(body),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_object() && markers.iter().any(|m| candidate.get(m).is_some()))
}

fn cart_item_from_line(line: &Value) -> Result<Option<CartItem>> {
    let product = line.get("product").filter(|p| p.is_object());

    let Some(product_id) = product
        .and_then(|p| id_of(p))
        .or_else(|| string_field(line, "productId"))
        .or_else(|| line.get("product").and_then(scalar_string))
    else {
        return Ok(None);
    };

    let quantity = line
        .get("quantity")
        .or_else(|| line.get("qty"))
        .and_then(Value::as_u64)
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or(0);
    if quantity == 0 {
        return Ok(None);
    }

    let price_value = line
        .get("price")
        .or_else(|| product.and_then(|p| p.get("price")))
        .filter(|v| !v.is_null());
    let price = match price_value {
        Some(value) => decimal(value, "price")?,
        None => Decimal::ZERO,
    };

    let name = product
        .and_then(|p| string_field(p, "name").or_else(|| string_field(p, "title")))
        .or_else(|| string_field(line, "name"))
        .unwrap_or_default();

    let image = product
        .and_then(image_of)
        .or_else(|| image_of(line))
        .unwrap_or_default();

    Ok(Some(CartItem {
        id: id_of(line).unwrap_or_else(|| product_id.clone()),
        product_id,
        name,
        price,
        quantity,
        image,
    }))
}

fn wishlist_item_from_line(line: &Value) -> Option<WishlistItem> {
    let product = line.get("product").filter(|p| p.is_object());

    let product_id = product
        .and_then(id_of)
        .or_else(|| string_field(line, "productId"))
        .or_else(|| line.get("product").and_then(scalar_string))?;

    let source = product.unwrap_or(line);
    Some(WishlistItem {
        id: id_of(line).unwrap_or_else(|| product_id.clone()),
        title: string_field(source, "title")
            .or_else(|| string_field(source, "name"))
            .unwrap_or_default(),
        price: source.get("price").and_then(scalar_string).unwrap_or_default(),
        image: image_of(source).unwrap_or_default(),
        product_id,
    })
}

fn id_of(value: &Value) -> Option<String> {
    value
        .get("_id")
        .or_else(|| value.get("id"))
        .and_then(scalar_string)
}

fn image_of(value: &Value) -> Option<String> {
    value
        .get("images")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(|first| scalar_string(first).or_else(|| string_field(first, "url")))
        .or_else(|| string_field(value, "image"))
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(scalar_string)
}

/// Strings as-is, numbers rendered; everything else is absent.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal(value: &Value, field: &str) -> Result<Decimal> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };

    parsed.ok_or_else(|| Error::InvalidPrice {
        field: field.to_string(),
        value: value.to_string(),
    })
}
