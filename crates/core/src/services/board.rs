use crate::store::Document;

/// In-memory list owned by one flow.
///
/// Successful fetches replace the list, inserts go to the front and updates
/// replace the matching element. A failed call simply never touches it.
#[derive(Debug, Clone)]
pub struct Board<T> {
    items: Vec<T>,
}

impl<T> Default for Board<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Document> Board<T> {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in display order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace the contents after a fetch.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Show a freshly inserted item first.
    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Swap in an updated item by id. Returns `false` if no item matched.
    pub fn apply_update(&mut self, item: T) -> bool {
        let Some(id) = item.id().map(str::to_string) else {
            return false;
        };
        match self
            .items
            .iter_mut()
            .find(|existing| existing.id() == Some(id.as_str()))
        {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn prepend_and_update() {
        let mut board: Board<Value> = Board::new();
        assert!(board.items().is_empty());
        board.replace(vec![json!({"_id": "a", "n": 1})]);
        board.prepend(json!({"_id": "b", "n": 2}));
        assert_eq!(board.items()[0]["_id"], json!("b"));

        assert!(board.apply_update(json!({"_id": "a", "n": 9})));
        assert_eq!(board.get("a").unwrap()["n"], json!(9));
        assert!(!board.apply_update(json!({"_id": "zz"})));
        assert_eq!(board.items().len(), 2);
    }
}
