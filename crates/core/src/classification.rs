//! Rules for batched classification entry saves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Largest number of entries accepted in one save request.
pub const MAX_ENTRY_BATCH: usize = 10_000;

/// One label assignment as sent by the map client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAssignment {
    pub super_pixel_id: DbId,
    pub land_class_id: DbId,
}

/// Validate a batch and collapse repeated superpixels.
///
/// The last assignment for a superpixel wins; output order follows the
/// first occurrence of each superpixel.
pub fn normalize_entries(entries: &[EntryAssignment]) -> Result<Vec<EntryAssignment>, String> {
    if entries.is_empty() {
        return Err("At least one entry is required".to_string());
    }
    if entries.len() > MAX_ENTRY_BATCH {
        return Err(format!(
            "Too many entries in one request ({} > {MAX_ENTRY_BATCH})",
            entries.len()
        ));
    }

    let mut position: HashMap<DbId, usize> = HashMap::with_capacity(entries.len());
    let mut out: Vec<EntryAssignment> = Vec::with_capacity(entries.len());
    for entry in entries {
        match position.get(&entry.super_pixel_id) {
            Some(&i) => out[i].land_class_id = entry.land_class_id,
            None => {
                position.insert(entry.super_pixel_id, out.len());
                out.push(*entry);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(super_pixel_id: DbId, land_class_id: DbId) -> EntryAssignment {
        EntryAssignment {
            super_pixel_id,
            land_class_id,
        }
    }

    #[test]
    fn test_last_assignment_wins() {
        let out = normalize_entries(&[a(1, 10), a(2, 20), a(1, 30)]).unwrap();
        assert_eq!(out, vec![a(1, 30), a(2, 20)]);
    }

    #[test]
    fn test_distinct_entries_untouched() {
        let input = [a(5, 1), a(3, 2), a(9, 1)];
        assert_eq!(normalize_entries(&input).unwrap(), input.to_vec());
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(normalize_entries(&[]).is_err());
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let input: Vec<_> = (0..=MAX_ENTRY_BATCH as DbId).map(|i| a(i, 1)).collect();
        let err = normalize_entries(&input).unwrap_err();
        assert!(err.contains("Too many entries"));
    }
}
