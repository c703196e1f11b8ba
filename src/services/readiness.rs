//! 就绪轮询原语 - 业务能力层
//!
//! 页面上的每一次交互都要先等待一个外部控制的前置条件成立
//! （表格加载完、按钮可用、菜单项出现）。所有等待共用这里的
//! 两个原语，各处只提供自己的探测策略，不各自复制轮询循环。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::{StepError, StepResult};

/// 未就绪时的阻塞原因
///
/// 三种原因对应不同的用户处置方式，超时时必须区分，不能合并成
/// 一个笼统的超时。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    /// 目标元素不存在
    Missing,
    /// 元素已找到但处于禁用状态
    Disabled,
    /// 上游加载指示仍然可见
    Loading,
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::Missing => write!(f, "目标元素不存在"),
            Blocker::Disabled => write!(f, "元素已找到但始终处于禁用状态"),
            Blocker::Loading => write!(f, "页面加载指示一直未消失"),
        }
    }
}

/// 单次探测的结论
#[derive(Debug)]
pub enum Probe<T> {
    /// 前置条件成立，携带就绪句柄
    Ready(T),
    /// 尚未就绪
    NotYet(Blocker),
}

/// 轮询结果
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// 第 attempts 次探测时就绪
    Ready { value: T, attempts: usize },
    /// 预算耗尽，携带最后一次观察到的阻塞原因
    TimedOut { attempts: usize, blocker: Blocker },
}

impl<T> PollOutcome<T> {
    /// 把超时转换为携带控件名的步骤错误
    pub fn into_ready(self, control: &str) -> StepResult<T> {
        match self {
            PollOutcome::Ready { value, .. } => Ok(value),
            PollOutcome::TimedOut { blocker, .. } => Err(StepError::timeout(control, blocker)),
        }
    }
}

/// 轮询直到探测就绪或预算耗尽
///
/// - 最多执行 `max_attempts` 次探测，相邻探测间隔 `interval`
/// - 第一次就绪立即返回，不再额外等待
/// - 耗尽后返回最后一次观察到的阻塞原因
pub async fn poll_until_ready<T, F, Fut>(
    mut probe: F,
    max_attempts: usize,
    interval: Duration,
) -> StepResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StepResult<Probe<T>>>,
{
    let mut last_blocker = Blocker::Missing;

    for attempt in 1..=max_attempts {
        match probe().await? {
            Probe::Ready(value) => {
                return Ok(PollOutcome::Ready {
                    value,
                    attempts: attempt,
                })
            }
            Probe::NotYet(blocker) => {
                debug!("第 {}/{} 次探测未就绪: {}", attempt, max_attempts, blocker);
                last_blocker = blocker;
            }
        }
        if attempt < max_attempts {
            sleep(interval).await;
        }
    }

    Ok(PollOutcome::TimedOut {
        attempts: max_attempts,
        blocker: last_blocker,
    })
}

/// 稳定等待的预算
#[derive(Debug, Clone)]
pub struct StabilityBudget {
    /// 探测间隔
    pub interval: Duration,
    /// 最短等待时间（即使提前稳定也先等到）
    pub min_wait: Duration,
    /// 最长等待时间，超过后按当前状态继续
    pub max_wait: Duration,
    /// 条件需连续成立的次数（防止瞬时抖动）
    pub required_streak: usize,
}

/// 稳定等待的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StableOutcome {
    /// 条件连续成立，已稳定
    Stable,
    /// 达到时间上限，放弃等待
    GaveUp,
}

/// 轮询直到条件连续成立若干次，或达到时间上限
///
/// 面单状态这类指标会出现瞬时闪变，单次观察到"全部成功"并不可信，
/// 必须连续多次成立才算稳定。时间上限到达后返回 [`StableOutcome::GaveUp`]，
/// 由调用方决定是否按当前状态继续（软放行）。
pub async fn poll_until_stable<F, Fut>(
    mut probe: F,
    budget: &StabilityBudget,
) -> StepResult<StableOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StepResult<bool>>,
{
    let start = std::time::Instant::now();
    let mut streak = 0usize;

    loop {
        sleep(budget.interval).await;

        if probe().await? {
            streak += 1;
        } else {
            streak = 0;
        }

        let elapsed = start.elapsed();
        if streak >= budget.required_streak && elapsed >= budget.min_wait {
            return Ok(StableOutcome::Stable);
        }
        if elapsed >= budget.max_wait {
            return Ok(StableOutcome::GaveUp);
        }
    }
}

/// 把页面脚本返回的控件状态字符串映射为探测结论
///
/// 页面侧统一返回 "ready" / "disabled" / "missing" / "loading" 四种状态
pub fn parse_control_state(raw: &str) -> Probe<()> {
    match raw {
        "ready" => Probe::Ready(()),
        "disabled" => Probe::NotYet(Blocker::Disabled),
        "loading" => Probe::NotYet(Blocker::Loading),
        // 未知状态一律按元素缺失处理
        _ => Probe::NotYet(Blocker::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    /// 构造一个前 k-1 次返回阻塞、第 k 次就绪的探测
    fn ready_at(k: usize, blocker: Blocker) -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<StepResult<Probe<usize>>>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let probe = move || {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            let result = if n >= k {
                Ok(Probe::Ready(n))
            } else {
                Ok(Probe::NotYet(blocker))
            };
            std::future::ready(result)
        };
        (counter, probe)
    }

    #[tokio::test]
    async fn resolves_exactly_at_first_ready_probe() {
        let (counter, probe) = ready_at(3, Blocker::Loading);
        let outcome = poll_until_ready(probe, 10, Duration::from_millis(1))
            .await
            .unwrap();

        match outcome {
            PollOutcome::Ready { value, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(value, 3);
            }
            PollOutcome::TimedOut { .. } => panic!("应在第 3 次就绪"),
        }
        // 就绪后不再有多余的探测
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn immediate_ready_needs_single_probe() {
        let (counter, probe) = ready_at(1, Blocker::Missing);
        let start = Instant::now();
        let outcome = poll_until_ready(probe, 5, Duration::from_millis(50))
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Ready { attempts: 1, .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        // 第一次就绪立即返回，不应出现整段间隔的等待
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn exhaustion_performs_exactly_max_attempts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let probe = move || {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(Probe::<()>::NotYet(Blocker::Disabled)))
        };

        let outcome = poll_until_ready(probe, 4, Duration::from_millis(1))
            .await
            .unwrap();

        match outcome {
            PollOutcome::TimedOut { attempts, blocker } => {
                assert_eq!(attempts, 4);
                assert_eq!(blocker, Blocker::Disabled);
            }
            PollOutcome::Ready { .. } => panic!("不应就绪"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn probes_are_spaced_by_interval() {
        let probe = || std::future::ready(Ok(Probe::<()>::NotYet(Blocker::Missing)));
        let interval = Duration::from_millis(10);
        let start = Instant::now();
        let _ = poll_until_ready(probe, 4, interval).await.unwrap();
        // 4 次探测之间有 3 段间隔
        assert!(start.elapsed() >= interval * 3);
    }

    #[tokio::test]
    async fn timeout_reason_reflects_last_observed_blocker() {
        // 先是 Loading，随后变为 Disabled 并保持到预算耗尽
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let probe = move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            let blocker = if n < 2 { Blocker::Loading } else { Blocker::Disabled };
            std::future::ready(Ok(Probe::<()>::NotYet(blocker)))
        };

        let outcome = poll_until_ready(probe, 5, Duration::from_millis(1))
            .await
            .unwrap();
        match outcome {
            PollOutcome::TimedOut { blocker, .. } => assert_eq!(blocker, Blocker::Disabled),
            PollOutcome::Ready { .. } => panic!("不应就绪"),
        }
    }

    #[tokio::test]
    async fn probe_error_propagates() {
        let probe = || {
            std::future::ready(Err::<Probe<()>, _>(StepError::Discovery(
                "探测脚本失败".to_string(),
            )))
        };
        let result = poll_until_ready(probe, 3, Duration::from_millis(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn into_ready_carries_control_name() {
        let probe = || std::future::ready(Ok(Probe::<()>::NotYet(Blocker::Disabled)));
        let outcome = poll_until_ready(probe, 2, Duration::from_millis(1))
            .await
            .unwrap();
        let err = outcome.into_ready("确认揽收按钮").unwrap_err();
        assert!(err.to_string().contains("确认揽收按钮"));
    }

    fn fast_budget(max_wait_ms: u64) -> StabilityBudget {
        StabilityBudget {
            interval: Duration::from_millis(2),
            min_wait: Duration::from_millis(0),
            max_wait: Duration::from_millis(max_wait_ms),
            required_streak: 2,
        }
    }

    #[tokio::test]
    async fn stability_requires_consecutive_success() {
        // true, false, true, true → 第 4 次才满足连续 2 次
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let probe = move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(n != 1))
        };

        let outcome = poll_until_stable(probe, &fast_budget(1_000)).await.unwrap();
        assert_eq!(outcome, StableOutcome::Stable);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn flicker_resets_the_streak() {
        // 永远交替 true/false，预算内不可能稳定
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let probe = move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(n % 2 == 0))
        };

        let outcome = poll_until_stable(probe, &fast_budget(30)).await.unwrap();
        assert_eq!(outcome, StableOutcome::GaveUp);
    }

    #[tokio::test]
    async fn ceiling_triggers_soft_give_up() {
        let probe = || std::future::ready(Ok(false));
        let outcome = poll_until_stable(probe, &fast_budget(20)).await.unwrap();
        assert_eq!(outcome, StableOutcome::GaveUp);
    }

    #[tokio::test]
    async fn floor_wait_is_respected() {
        let budget = StabilityBudget {
            interval: Duration::from_millis(2),
            min_wait: Duration::from_millis(30),
            max_wait: Duration::from_millis(1_000),
            required_streak: 2,
        };
        let probe = || std::future::ready(Ok(true));
        let start = Instant::now();
        let outcome = poll_until_stable(probe, &budget).await.unwrap();
        assert_eq!(outcome, StableOutcome::Stable);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn control_state_mapping() {
        assert!(matches!(parse_control_state("ready"), Probe::Ready(())));
        assert!(matches!(
            parse_control_state("disabled"),
            Probe::NotYet(Blocker::Disabled)
        ));
        assert!(matches!(
            parse_control_state("loading"),
            Probe::NotYet(Blocker::Loading)
        ));
        assert!(matches!(
            parse_control_state("missing"),
            Probe::NotYet(Blocker::Missing)
        ));
        assert!(matches!(
            parse_control_state("???"),
            Probe::NotYet(Blocker::Missing)
        ));
    }
}
