//! スクロール時のフェードイン表示
//!
//! 一度表示されたカードはクラスを付けたまま（スクロールアウトしても戻さない）。

use std::cell::Cell;

pub trait RevealTarget {
    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str);
}

/// IntersectionObserverのエントリ相当
#[derive(Debug, Clone)]
pub struct Intersection<T> {
    pub target: T,
    pub is_intersecting: bool,
}

pub struct RevealTracker {
    class: String,
    threshold: f64,
    revealed: Cell<usize>,
}

impl RevealTracker {
    pub fn new(class: &str, threshold: f64) -> Self {
        RevealTracker {
            class: class.to_string(),
            threshold: threshold.clamp(0.0, 1.0),
            revealed: Cell::new(0),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// これまでに表示したカード数
    pub fn revealed_count(&self) -> usize {
        self.revealed.get()
    }

    /// 交差したカードにクラスを付与する。戻り値は今回新たに表示した数
    pub fn handle<T, I>(&self, entries: I) -> usize
    where
        T: RevealTarget,
        I: IntoIterator<Item = Intersection<T>>,
    {
        let mut newly = 0;
        for entry in entries {
            if entry.is_intersecting && !entry.target.has_class(&self.class) {
                entry.target.add_class(&self.class);
                newly += 1;
            }
        }
        self.revealed.set(self.revealed.get() + newly);
        newly
    }
}
