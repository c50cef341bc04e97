use std::collections::HashMap;

use crate::ids::IdGenerator;
use crate::model::{ApplicationRow, BranchRecord};

/// Group applications by (legal name, address) key and give each group a
/// branch id. Rows with either key empty stay unassigned.
pub fn assign_branches(rows: &mut [ApplicationRow], ids: &mut IdGenerator) -> Vec<BranchRecord> {
    let mut branches: Vec<BranchRecord> = Vec::new();
    let mut by_key: HashMap<(String, String), usize> = HashMap::new();

    for row in rows.iter_mut() {
        if row.formatted_legal_business_name.is_empty() || row.formatted_business_address.is_empty() {
            continue;
        }

        let key = (
            row.formatted_legal_business_name.clone(),
            row.formatted_business_address.clone(),
        );
        let slot = *by_key.entry(key).or_insert_with(|| {
            branches.push(BranchRecord {
                id: ids.new_branch_id(),
                legal_business_name: row.formatted_legal_business_name.clone(),
                business_address: row.formatted_business_address.clone(),
                application_count: 0,
            });
            branches.len() - 1
        });

        let branch = &mut branches[slot];
        branch.application_count += 1;
        row.branch_id = Some(branch.id.clone());
    }

    log::info!("assigned {} branch ids", branches.len());
    branches
}
