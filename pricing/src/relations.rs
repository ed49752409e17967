//! Product/price relations of an item set
//!
//! Groups line items by product so callers can attach orders back to
//! catalog entities. Components of composite items are walked like
//! top-level items; the composite parent carries no product of its own.

use serde::{Deserialize, Serialize};

use crate::models::PriceItem;

/// One product with the distinct prices it was ordered under
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRelation {
    pub product_id: String,
    pub price_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Collect the distinct products referenced by a set of items
///
/// Relations keep first-seen order; price ids and tags are deduplicated.
/// Items without any product reference are skipped.
pub fn extract_product_relations(items: &[PriceItem]) -> Vec<ProductRelation> {
    let mut relations: Vec<ProductRelation> = Vec::new();
    for item in items {
        match item.item_components.as_deref() {
            Some(components) => {
                for component in components {
                    collect_relation(&mut relations, component);
                }
            }
            None => collect_relation(&mut relations, item),
        }
    }
    relations
}

fn collect_relation(relations: &mut Vec<ProductRelation>, item: &PriceItem) {
    let product_id = item
        .product
        .as_ref()
        .and_then(|product| product.id.clone())
        .or_else(|| item.product_id.clone());
    let Some(product_id) = product_id else {
        return;
    };

    let index = match relations.iter().position(|relation| relation.product_id == product_id) {
        Some(index) => index,
        None => {
            relations.push(ProductRelation {
                product_id,
                ..Default::default()
            });
            relations.len() - 1
        }
    };

    let price_id = item
        .price_id
        .clone()
        .or_else(|| item.price.as_ref().and_then(|price| price.id.clone()));
    if let Some(price_id) = price_id {
        if !relations[index].price_ids.contains(&price_id) {
            relations[index].price_ids.push(price_id);
        }
    }

    if let Some(tags) = item.product.as_ref().and_then(|product| product.tags.as_deref()) {
        for tag in tags {
            if !relations[index].tags.contains(tag) {
                relations[index].tags.push(tag.clone());
            }
        }
    }
}

// ==================== Tests ====================
