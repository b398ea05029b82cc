//! # Catalog Operations
//!
//! Pure operations over a loaded product snapshot. The store loads the
//! snapshot, calls one of these, and persists the result.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{IdWatermark, NewProduct, Page, Product, ProductUpdate};
use crate::validation::{validate_description, validate_price, validate_product_name};
use crate::DEFAULT_PAGE_SIZE;

/// Next free id: 1 for an empty set, otherwise `max + 1`.
///
/// Shared by products, users, orders and order lines.
///
/// ## Example
/// ```rust
/// use stockroom_core::catalog::next_id;
///
/// assert_eq!(next_id([]), 1);
/// assert_eq!(next_id([3, 9, 4]), 10);
/// ```
pub fn next_id(ids: impl IntoIterator<Item = u64>) -> u64 {
    ids.into_iter().max().map_or(1, |max| max + 1)
}

pub fn find(products: &[Product], id: u64) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

/// Watermark name used for product ids.
pub const PRODUCT_IDS: &str = "products";

/// Validates a draft, assigns the next id and appends it.
///
/// The id is above every id in `products` and every id in `retired`.
/// Callers pass the product ids still referenced by order lines plus the
/// removal watermark, so a deleted product never hands its id to a new one.
pub fn create(
    products: &mut Vec<Product>,
    draft: NewProduct,
    retired: impl IntoIterator<Item = u64>,
) -> CoreResult<Product> {
    validate_product_name(&draft.name)?;
    validate_description(&draft.description)?;
    validate_price(draft.price)?;

    let taken = products.iter().map(|p| p.id).chain(retired);

    let product = Product {
        id: next_id(taken),
        name: draft.name.trim().to_string(),
        description: draft.description,
        price: draft.price,
        quantity: draft.quantity,
    };
    products.push(product.clone());
    Ok(product)
}

/// Applies the set fields of `update` to product `id`.
///
/// The update is validated in full before any field changes.
pub fn update(products: &mut [Product], id: u64, update: ProductUpdate) -> CoreResult<Product> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(description) = &update.description {
        validate_description(description)?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
    }

    let product = products
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(CoreError::ProductNotFound(id))?;

    if let Some(name) = update.name {
        product.name = name.trim().to_string();
    }
    if let Some(description) = update.description {
        product.description = description;
    }
    if let Some(price) = update.price {
        product.price = price;
    }
    if let Some(quantity) = update.quantity {
        product.quantity = quantity;
    }

    Ok(product.clone())
}

/// Removes product `id`. Order lines that reference it are left alone.
pub fn remove(products: &mut Vec<Product>, id: u64) -> CoreResult<Product> {
    let index = products
        .iter()
        .position(|p| p.id == id)
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(products.remove(index))
}

/// Highest removed id recorded for `table`, 0 when none.
pub fn highest_removed(watermarks: &[IdWatermark], table: &str) -> u64 {
    watermarks
        .iter()
        .filter(|w| w.table == table)
        .map(|w| w.highest_removed)
        .max()
        .unwrap_or(0)
}

/// Raises the watermark of `table` to `id` if it is higher.
pub fn retire_id(watermarks: &mut Vec<IdWatermark>, table: &str, id: u64) {
    match watermarks.iter_mut().find(|w| w.table == table) {
        Some(mark) => mark.highest_removed = mark.highest_removed.max(id),
        None => watermarks.push(IdWatermark {
            table: table.to_string(),
            highest_removed: id,
        }),
    }
}

/// Σ price × quantity over the catalog, saturating at the money range.
pub fn stock_value(products: &[Product]) -> Money {
    products
        .iter()
        .map(|p| p.price.multiply_quantity(p.quantity))
        .sum()
}

/// Slices one page out of `items`.
///
/// ## Rules
/// - `page` is 1-based; 0 is treated as 1
/// - `limit` of 0 falls back to [`DEFAULT_PAGE_SIZE`]
/// - `pages = ceil(total / limit)`
/// - A page past the end is empty but still reports `total` and `pages`
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    let total = items.len();
    let pages = total.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit);
    let slice = items.iter().skip(start).take(limit).cloned().collect();

    Page {
        items: slice,
        total,
        page,
        pages,
    }
}
