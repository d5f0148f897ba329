/// Insertion-ordered map with in-place updates.
///
/// Updating an existing key keeps its position; removing and re-adding a key
/// moves it to the end.
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: Eq + Copy, V> Registry<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Appends a new entry. Returns the value back if the key exists.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), V> {
        if self.contains(&key) {
            return Err(value);
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Keeps entries for which `f` returns `true`, preserving order.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        self.entries.retain_mut(|(k, v)| f(k, v));
    }

    /// Removes every entry in registration order.
    pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(r: &Registry<char, u32>) -> String {
        r.keys().collect()
    }

    #[test]
    fn remove_and_readd_moves_to_end() {
        let mut r = Registry::new();
        for k in ['A', 'B', 'C'] {
            r.insert(k, 0).unwrap();
        }

        r.remove(&'C');
        r.insert('C', 0).unwrap();
        assert_eq!(order(&r), "ABC");

        r.remove(&'A');
        r.insert('A', 0).unwrap();
        assert_eq!(order(&r), "BCA");
    }

    #[test]
    fn duplicate_insert_is_refused_and_update_keeps_position() {
        let mut r = Registry::new();
        r.insert('A', 1).unwrap();
        r.insert('B', 2).unwrap();
        assert_eq!(r.insert('A', 9), Err(9));

        *r.get_mut(&'A').unwrap() = 7;
        assert_eq!(order(&r), "AB");
        assert_eq!(r.values().copied().collect::<Vec<_>>(), vec![7, 2]);
    }

    #[test]
    fn unknown_remove_is_noop() {
        let mut r: Registry<char, u32> = Registry::new();
        assert!(r.remove(&'Z').is_none());
        assert!(r.is_empty());
    }

    #[test]
    fn retain_preserves_order() {
        let mut r = Registry::new();
        for (i, k) in ['A', 'B', 'C', 'D'].into_iter().enumerate() {
            r.insert(k, i as u32).unwrap();
        }
        r.retain(|_, v| *v % 2 == 1);
        assert_eq!(order(&r), "BD");
    }
}
