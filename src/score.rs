/// Running arg-max over candidates scored by a lexicographic key.
///
/// Score types are small structs or tuples with a derived `Ord`, fields in
/// criteria order, with `Reverse` on the criteria that are minimized. A later
/// candidate only displaces the incumbent when strictly better, so the
/// first-offered candidate wins exact ties.
#[derive(Debug, Clone)]
pub struct BestPick<S, T> {
    best: Option<(S, T)>,
}

impl<S: Ord, T> BestPick<S, T> {
    pub fn new() -> Self {
        Self { best: None }
    }

    pub fn offer(&mut self, score: S, item: T) {
        let better = match &self.best {
            Some((incumbent, _)) => score > *incumbent,
            None => true,
        };
        if better {
            self.best = Some((score, item));
        }
    }

    pub fn into_inner(self) -> Option<T> {
        self.best.map(|(_, item)| item)
    }
}

impl<S: Ord, T> Default for BestPick<S, T> {
    fn default() -> Self {
        Self::new()
    }
}
