//! 遅延タスクのスケジューリング
//!
//! ブラウザでは `gloo` のタイマー、テストでは仮想時計の `ManualScheduler` を使う。
//! どちらもキャンセル用の `TaskHandle` を返す。

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// スケジュール済みタスクのキャンセルトークン
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未実行ならタスクを実行させない（実行済みなら何もしない）
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

pub trait Scheduler {
    /// `delay` 経過後に一度だけ `task` を実行する
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle;
}

// ============================================
// ブラウザ用（setTimeout）
// ============================================

#[derive(Debug, Clone, Copy, Default)]
pub struct TimerScheduler;

impl Scheduler for TimerScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let handle = TaskHandle::new();
        let token = handle.clone();
        let millis = delay.as_millis().min(u32::MAX as u128) as u32;
        gloo::timers::callback::Timeout::new(millis, move || {
            if !token.is_cancelled() {
                task();
            }
        })
        .forget();
        handle
    }
}

// ============================================
// テスト用（仮想時計）
// ============================================

struct Pending {
    due: Duration,
    seq: u64,
    handle: TaskHandle,
    task: Box<dyn FnOnce()>,
}

/// 明示的に時間を進めるスケジューラ
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    seq: Cell<u64>,
    queue: RefCell<Vec<Pending>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// 未実行（キャンセル済み含む）のタスク数
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// 時計を `by` だけ進め、期限の来たタスクを期限順に実行する。
    /// 実行中に追加されたタスクも期限内なら同じ呼び出しで実行される。
    /// 戻り値は実行したタスク数（キャンセル済みは数えない）。
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let index = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.seq))
                    .map(|(i, _)| i);
                index.map(|i| queue.swap_remove(i))
            };
            let Some(pending) = next else { break };
            self.now.set(pending.due);
            if !pending.handle.is_cancelled() {
                (pending.task)();
                ran += 1;
            }
        }
        self.now.set(target);
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let handle = TaskHandle::new();
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.queue.borrow_mut().push(Pending {
            due: self.now.get() + delay,
            seq,
            handle: handle.clone(),
            task,
        });
        handle
    }
}
