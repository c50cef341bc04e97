//! Restaurant identity resolution.
//!
//! Rows are matched to restaurants by exact `StreetAddress`. Candidates are
//! sharded by postcode so each row only scans restaurants already seen in
//! its own postcode. Rows sharing an address but carrying a different
//! postcode land in different shards and are never compared.

use std::collections::HashMap;

use crate::ids::IdGenerator;
use crate::model::{InspectionRow, MergeConflict, RestaurantRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// New restaurants, shard by shard in first-seen postcode order.
    pub restaurants: Vec<RestaurantRecord>,
    pub conflicts: Vec<MergeConflict>,
}

/// Postcode → candidate restaurants, in insertion order.
#[derive(Debug, Default)]
struct RestaurantIndex {
    shards: Vec<Vec<RestaurantRecord>>,
    by_postcode: HashMap<Option<i64>, usize>,
}

impl RestaurantIndex {
    fn find(&self, postcode: Option<i64>, street_address: &str) -> Option<&RestaurantRecord> {
        let shard = self.by_postcode.get(&postcode)?;
        self.shards[*shard]
            .iter()
            .find(|r| r.street_address == street_address)
    }

    fn insert(&mut self, postcode: Option<i64>, record: RestaurantRecord) {
        let shards = &mut self.shards;
        let shard = *self.by_postcode.entry(postcode).or_insert_with(|| {
            shards.push(Vec::new());
            shards.len() - 1
        });
        self.shards[shard].push(record);
    }

    fn into_records(self) -> Vec<RestaurantRecord> {
        self.shards.into_iter().flatten().collect()
    }
}

/// Assign a restaurant to every row, creating restaurants for unseen
/// addresses. Writes `restaurant_id` onto each row.
///
/// A matched row that disagrees with its restaurant is recorded as a
/// [`MergeConflict`]; the existing record is left unchanged.
pub fn resolve_restaurants(rows: &mut [InspectionRow], ids: &mut IdGenerator) -> Resolution {
    let mut index = RestaurantIndex::default();
    let mut conflicts = Vec::new();

    for (pos, row) in rows.iter_mut().enumerate() {
        if let Some(existing) = index.find(row.postcode, &row.street_address) {
            row.restaurant_id = Some(existing.id.clone());

            let fields = existing.differing_fields(row);
            if !fields.is_empty() {
                let conflict = MergeConflict {
                    restaurant_id: existing.id.clone(),
                    row: pos,
                    fields,
                    existing: existing.clone(),
                    incoming: RestaurantRecord::from_inspection(existing.id.clone(), row),
                };
                log::warn!("{conflict}");
                conflicts.push(conflict);
            }
            continue;
        }

        let id = ids.new_id();
        row.restaurant_id = Some(id.clone());
        index.insert(row.postcode, RestaurantRecord::from_inspection(id, row));
    }

    let restaurants = index.into_records();
    log::info!(
        "resolved {} rows to {} restaurants ({} merge conflicts)",
        rows.len(),
        restaurants.len(),
        conflicts.len()
    );

    Resolution { restaurants, conflicts }
}
