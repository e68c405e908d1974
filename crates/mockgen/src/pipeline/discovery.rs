//! Work items and their grouping by product.

use std::collections::{HashMap, HashSet};

use crate::db::variant_repo::VariantRow;

/// A variant that needs a mockup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub variant_id: i64,
    pub product_id: Option<i64>,
}

impl WorkItem {
    /// Converts a discovered row, rejecting non-positive variant ids.
    pub fn from_row(row: &VariantRow) -> Option<Self> {
        (row.variant_id > 0).then_some(Self {
            variant_id: row.variant_id,
            product_id: row.product_id,
        })
    }
}

/// Variants of one product, rendered by a single vendor task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductGroup {
    pub product_id: i64,
    pub variant_ids: Vec<i64>,
}

/// Partitions resolved `(variant_id, product_id)` pairs by product.
///
/// Groups appear in order of their first variant; variants keep their
/// input order. A variant listed twice is only grouped once.
pub fn group_by_product(items: &[(i64, i64)]) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut seen: HashSet<i64> = HashSet::new();

    for &(variant_id, product_id) in items {
        if !seen.insert(variant_id) {
            continue;
        }
        match index.get(&product_id) {
            Some(&i) => groups[i].variant_ids.push(variant_id),
            None => {
                index.insert(product_id, groups.len());
                groups.push(ProductGroup {
                    product_id,
                    variant_ids: vec![variant_id],
                });
            }
        }
    }

    groups
}
