//! アラートの自動消去

use crate::error::Result;
use crate::schedule::{Scheduler, TaskHandle};
use crate::utils::log_trace::log_debug;
use std::time::Duration;

pub trait Dismissible {
    /// 閉じる。既に消えている要素に対しては何もしないか `Err` を返す
    fn dismiss(&self) -> Result<()>;
}

/// 各アラートを `delay` 後に独立して閉じる。
/// 閉じる処理の失敗は無視する（ユーザーが先に閉じた場合など）。
pub fn schedule_auto_dismiss<A>(alerts: Vec<A>, scheduler: &dyn Scheduler, delay: Duration) -> Vec<TaskHandle>
where
    A: Dismissible + 'static,
{
    alerts
        .into_iter()
        .map(|alert| {
            scheduler.schedule(
                delay,
                Box::new(move || {
                    if let Err(e) = alert.dismiss() {
                        log_debug("alerts", &format!("アラートを閉じられません: {}", e));
                    }
                }),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlueError;
    use crate::schedule::ManualScheduler;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct FakeAlert {
        removed: Rc<Cell<bool>>,
        dismissals: Rc<Cell<u32>>,
    }

    impl Dismissible for FakeAlert {
        fn dismiss(&self) -> Result<()> {
            if self.removed.get() {
                return Err(GlueError::Js("element is gone".to_string()));
            }
            self.dismissals.set(self.dismissals.get() + 1);
            self.removed.set(true);
            Ok(())
        }
    }

    const DELAY: Duration = Duration::from_millis(5000);

    #[test]
    fn every_alert_dismissed_once_after_delay() {
        let scheduler = ManualScheduler::new();
        let alerts: Vec<FakeAlert> = (0..3).map(|_| FakeAlert::default()).collect();
        let handles = schedule_auto_dismiss(alerts.clone(), &scheduler, DELAY);
        assert_eq!(handles.len(), 3);

        scheduler.advance(Duration::from_millis(4999));
        assert!(alerts.iter().all(|a| a.dismissals.get() == 0));

        assert_eq!(scheduler.advance(Duration::from_millis(1)), 3);
        assert!(alerts.iter().all(|a| a.dismissals.get() == 1));

        scheduler.advance(Duration::from_secs(60));
        assert!(alerts.iter().all(|a| a.dismissals.get() == 1));
    }

    #[test]
    fn manually_removed_alert_is_ignored() {
        let scheduler = ManualScheduler::new();
        let kept = FakeAlert::default();
        let closed_by_user = FakeAlert::default();
        schedule_auto_dismiss(vec![kept.clone(), closed_by_user.clone()], &scheduler, DELAY);

        closed_by_user.removed.set(true);
        assert_eq!(scheduler.advance(DELAY), 2);
        assert_eq!(kept.dismissals.get(), 1);
        assert_eq!(closed_by_user.dismissals.get(), 0);
    }

    #[test]
    fn no_alerts_schedules_nothing() {
        let scheduler = ManualScheduler::new();
        let handles = schedule_auto_dismiss(Vec::<FakeAlert>::new(), &scheduler, DELAY);
        assert!(handles.is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cancelled_dismiss_keeps_alert() {
        let scheduler = ManualScheduler::new();
        let alert = FakeAlert::default();
        let handles = schedule_auto_dismiss(vec![alert.clone()], &scheduler, DELAY);
        handles[0].cancel();
        scheduler.advance(DELAY);
        assert_eq!(alert.dismissals.get(), 0);
    }
}
