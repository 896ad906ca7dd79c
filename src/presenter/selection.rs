/// At most one selected item, independent of pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<K> {
    current: Option<K>,
}

impl<K> Default for Selection<K> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<K: PartialEq> Selection<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `key`, returning the previously selected key.
    pub fn select(&mut self, key: K) -> Option<K> {
        self.current.replace(key)
    }

    #[inline]
    pub fn selected(&self) -> Option<&K> {
        self.current.as_ref()
    }

    #[inline]
    pub fn is_selected(&self, key: &K) -> bool {
        self.current.as_ref() == Some(key)
    }

    /// Clears the selection (dismiss).
    pub fn clear(&mut self) -> Option<K> {
        self.current.take()
    }

    /// Clears the selection only if `key` is the selected one.
    pub fn clear_if(&mut self, key: &K) -> bool {
        if self.is_selected(key) {
            self.current = None;
            true
        } else {
            false
        }
    }
}
