//! Cyclic cursor over the most recent query result

/// Holds a result set and a cursor that wraps around at both ends.
///
/// The cursor only means something while the set is non-empty; traversal
/// on an empty set returns `None` and changes nothing.
#[derive(Debug, Clone)]
pub struct Navigator<T> {
    records: Vec<T>,
    cursor: usize,
}

impl<T> Default for Navigator<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T> Navigator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the result set and moves the cursor to its start
    pub fn load(&mut self, records: Vec<T>) {
        self.records = records;
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the current record, `None` when there is nothing loaded
    pub fn position(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.cursor)
    }

    pub fn current(&self) -> Option<&T> {
        self.records.get(self.position()?)
    }

    pub fn first(&mut self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.cursor = 0;
        self.records.first()
    }

    pub fn next(&mut self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.len();
        self.records.get(self.cursor)
    }

    pub fn previous(&mut self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + self.len() - 1) % self.len();
        self.records.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Malt;

    fn malts(n: usize) -> Vec<Malt> {
        (1..=n)
            .map(|i| Malt::new(format!("Test{i}"), 10, format!("Region{i}"), 100))
            .collect()
    }

    fn loaded(n: usize) -> Navigator<Malt> {
        let mut nav = Navigator::new();
        nav.load(malts(n));
        nav
    }

    mod empty_tests {
        use super::*;

        #[test]
        fn test_nothing_to_return() {
            let mut nav: Navigator<Malt> = Navigator::new();
            assert_eq!(nav.next(), None);
            assert_eq!(nav.previous(), None);
            assert_eq!(nav.first(), None);
            assert_eq!(nav.current(), None);
            assert_eq!(nav.position(), None);
            assert!(nav.is_empty());
        }

        #[test]
        fn test_loading_empty_set_resets() {
            let mut nav = loaded(3);
            nav.next();
            nav.load(Vec::new());
            assert_eq!(nav.position(), None);
            assert_eq!(nav.next(), None);
            assert_eq!(nav.position(), None);
        }

        #[test]
        fn test_clear() {
            let mut nav = loaded(2);
            nav.clear();
            assert!(nav.is_empty());
            assert_eq!(nav.first(), None);
        }
    }

    mod single_record_tests {
        use super::*;

        #[test]
        fn test_next_stays_put() {
            let mut nav = loaded(1);
            let only = malts(1).remove(0);
            for _ in 0..3 {
                assert_eq!(nav.next(), Some(&only));
            }
        }

        #[test]
        fn test_previous_stays_put() {
            let mut nav = loaded(1);
            let only = malts(1).remove(0);
            for _ in 0..3 {
                assert_eq!(nav.previous(), Some(&only));
            }
        }
    }

    mod cyclic_tests {
        use super::*;

        #[test]
        fn test_two_records_alternate() {
            let records = malts(2);
            let mut nav = loaded(2);

            assert_eq!(nav.next(), Some(&records[1]));
            assert_eq!(nav.next(), Some(&records[0]));
            assert_eq!(nav.next(), Some(&records[1]));

            nav.first();
            assert_eq!(nav.previous(), Some(&records[1]));
            assert_eq!(nav.previous(), Some(&records[0]));
            assert_eq!(nav.previous(), Some(&records[1]));
        }

        #[test]
        fn test_five_records_both_ways() {
            let records = malts(5);
            let mut nav = loaded(5);

            for expected in [1, 2, 3, 4, 0, 1] {
                assert_eq!(nav.next(), Some(&records[expected]));
            }
            for expected in [0, 4, 3, 2, 1, 0] {
                assert_eq!(nav.previous(), Some(&records[expected]));
            }
        }

        #[test]
        fn test_closure_from_every_start() {
            for n in 1..=7 {
                let mut nav = loaded(n);
                for start in 0..n {
                    nav.first();
                    for _ in 0..start {
                        nav.next();
                    }
                    let origin = nav.current().cloned();

                    for _ in 0..n {
                        nav.next();
                    }
                    assert_eq!(nav.current().cloned(), origin, "next, n={n} start={start}");

                    for _ in 0..n {
                        nav.previous();
                    }
                    assert_eq!(nav.current().cloned(), origin, "previous, n={n} start={start}");
                }
            }
        }

        #[test]
        fn test_first_rewinds() {
            let records = malts(3);
            let mut nav = loaded(3);
            nav.next();
            nav.next();
            assert_eq!(nav.first(), Some(&records[0]));
            assert_eq!(nav.position(), Some(0));
        }

        #[test]
        fn test_load_replaces_wholesale() {
            let mut nav = loaded(4);
            nav.next();
            nav.next();

            let replacement = vec![Malt::new("Ardbeg", 10, "Islay", 60)];
            nav.load(replacement.clone());
            assert_eq!(nav.len(), 1);
            assert_eq!(nav.current(), Some(&replacement[0]));
        }
    }
}
