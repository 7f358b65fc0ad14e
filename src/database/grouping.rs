//! Folding LEFT JOIN row streams back into parent-with-children shapes.

use std::collections::HashMap;

/// A flat row from `parent LEFT JOIN child`
pub trait JoinedRow {
    type Parent;
    type Child;

    fn parent_id(&self) -> i32;

    /// Split into the parent projection and the child, if the child columns
    /// were not all NULL.
    fn into_parts(self) -> (Self::Parent, Option<Self::Child>);
}

/// Group rows by parent id, keeping first-seen parent order.
///
/// Each parent is projected once; later rows for the same parent only
/// contribute their child. A parent that matched no children comes back
/// with an empty list.
pub fn fold_one_to_many<R: JoinedRow>(rows: Vec<R>) -> Vec<(R::Parent, Vec<R::Child>)> {
    let mut grouped: Vec<(R::Parent, Vec<R::Child>)> = Vec::new();
    let mut index: HashMap<i32, usize> = HashMap::new();

    for row in rows {
        let id = row.parent_id();
        let (parent, child) = row.into_parts();
        let slot = *index.entry(id).or_insert_with(|| {
            grouped.push((parent, Vec::new()));
            grouped.len() - 1
        });
        if let Some(child) = child {
            grouped[slot].1.push(child);
        }
    }

    grouped
}
