//! Branch-and-bound execution engine.
//!
//! # Algorithm
//!
//! 1. Seed the pool with the empty policy (bound `+inf`)
//! 2. At each step:
//!    a. Pop up to `batch_size` candidates, verifying each against `select`
//!    b. Drop candidates dominated by the incumbent (`bound <= incumbent + slack`)
//!    c. Evaluate complete policies; on improvement, prune the pool
//!    d. Expand the rest into private pools and `union` them back
//! 3. Terminate when the pool is empty (optimal within slack), the
//!    expansion budget runs out, or the run is cancelled
//!
//! # Reference
//!
//! Oliehoek, Spaan & Vlassis (2008), "Optimal and Approximate Q-value
//! Functions for Decentralized POMDPs", *JAIR* 32, 289-353 (GMAA*).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::config::BnbConfig;
use super::types::BnbProblem;
use crate::error::SearchError;
use crate::pool::{BoundOrderedPool, Candidate, PolicyPool, PoolSummary};

/// Result of a branch-and-bound run.
#[derive(Debug, Clone)]
pub struct BnbResult<P> {
    /// Best complete policy found, if any.
    pub best: Option<Arc<P>>,

    /// Value of `best`, or `-inf` when none was found.
    pub best_value: f64,

    /// Number of candidates expanded.
    pub expansions: usize,

    /// Candidates discarded as dominated, whether by `prune` or when popped
    /// or generated below the incumbent.
    pub pruned: usize,

    /// Largest pool size observed.
    pub peak_frontier: usize,

    /// Whether the pool was exhausted, proving `best` optimal within slack.
    pub proven_optimal: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// `(expansions, value)` at each incumbent improvement.
    pub incumbent_history: Vec<(usize, f64)>,

    /// Pool contents when the run stopped.
    pub frontier: PoolSummary,
}

/// Branch-and-bound runner.
pub struct BnbRunner;

impl BnbRunner {
    /// Runs best-first branch-and-bound with a [`BoundOrderedPool`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use u_policypool::bnb::{BnbConfig, BnbProblem, BnbRunner};
    /// use u_policypool::policy::{JointPolicyShape, PartialJointPolicy};
    /// use u_policypool::pool::Candidate;
    ///
    /// struct MyProblem {
    ///     shape: JointPolicyShape,
    /// }
    ///
    /// impl BnbProblem for MyProblem {
    ///     type Policy = PartialJointPolicy;
    ///     type Context = JointPolicyShape;
    ///     fn context(&self) -> &JointPolicyShape { &self.shape }
    ///     fn expand(&self, _parent: &Candidate<PartialJointPolicy>) -> Vec<Candidate<PartialJointPolicy>> { vec![] }
    ///     fn complete_value(&self, _policy: &PartialJointPolicy) -> Option<f64> { None }
    /// }
    ///
    /// let problem = MyProblem { shape: JointPolicyShape::open_loop(2, vec![2, 2]).unwrap() };
    /// let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();
    /// assert!(result.best.is_none());
    /// ```
    pub fn run<Pr: BnbProblem>(
        problem: &Pr,
        config: &BnbConfig,
    ) -> Result<BnbResult<Pr::Policy>, SearchError> {
        Self::run_with_pool(problem, BoundOrderedPool::new(), config, None)
    }

    /// Runs best-first branch-and-bound with an optional cancellation token.
    ///
    /// The flag is checked once per step; when set, the run stops and
    /// returns the best policy found so far.
    pub fn run_with_cancel<Pr: BnbProblem>(
        problem: &Pr,
        config: &BnbConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<BnbResult<Pr::Policy>, SearchError> {
        Self::run_with_pool(problem, BoundOrderedPool::new(), config, cancel)
    }

    /// Runs branch-and-bound over any pool ordering.
    ///
    /// `pool` is re-initialized from the problem context, so its previous
    /// contents are discarded.
    pub fn run_with_pool<Pr, Q>(
        problem: &Pr,
        mut pool: Q,
        config: &BnbConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<BnbResult<Pr::Policy>, SearchError>
    where
        Pr: BnbProblem,
        Q: PolicyPool<Pr::Policy> + Default + Send,
    {
        config.validate().map_err(SearchError::InvalidConfig)?;

        pool.init(problem.context());

        let mut incumbent = f64::NEG_INFINITY;
        let mut best: Option<Arc<Pr::Policy>> = None;
        let mut incumbent_history = Vec::new();
        let mut expansions = 0usize;
        let mut pruned = 0usize;
        let mut peak_frontier = pool.size();
        let mut cancelled = false;

        loop {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if pool.is_empty() {
                break;
            }

            let room = if config.max_expansions > 0 {
                config.max_expansions - expansions
            } else {
                usize::MAX
            };
            if room == 0 {
                break;
            }

            // Gather a batch of non-dominated, incomplete candidates.
            let mut batch = Vec::with_capacity(config.batch_size.min(room));
            while batch.len() < config.batch_size.min(room) {
                let front = match pool.select() {
                    Ok(front) => front.clone(),
                    Err(_) => break,
                };
                let candidate = pool.pop(Some(&front))?;

                if candidate.bound().value() <= incumbent + config.slack {
                    pruned += 1;
                    continue;
                }

                match problem.complete_value(candidate.policy()) {
                    Some(value) => {
                        if value > incumbent {
                            incumbent = value;
                            best = Some(Arc::clone(candidate.shared_policy()));
                            incumbent_history.push((expansions, value));
                            let removed = pool.prune(incumbent + config.slack);
                            pruned += removed;
                            tracing::debug!(
                                value,
                                expansions,
                                removed,
                                frontier = pool.size(),
                                "new incumbent"
                            );
                        }
                    }
                    None => batch.push(candidate),
                }
            }

            // The incumbent may have improved after earlier members were gathered.
            let threshold = incumbent + config.slack;
            let gathered = batch.len();
            batch.retain(|c| c.bound().value() > threshold);
            pruned += gathered - batch.len();

            if batch.is_empty() {
                continue;
            }

            expansions += batch.len();
            let (mut children, dominated) =
                expand_batch::<Pr, Q>(problem, &batch, threshold, config.parallel);
            pruned += dominated;
            tracing::trace!(
                parents = batch.len(),
                children = children.size(),
                dominated,
                "expanded batch"
            );

            pool.union(&mut children);
            peak_frontier = peak_frontier.max(pool.size());
        }

        let proven_optimal = !cancelled && pool.is_empty();
        let frontier = pool.summary(config.summary_buckets);
        tracing::info!(
            best_value = incumbent,
            expansions,
            pruned,
            peak_frontier,
            proven_optimal,
            cancelled,
            "branch-and-bound finished"
        );

        Ok(BnbResult {
            best,
            best_value: incumbent,
            expansions,
            pruned,
            peak_frontier,
            proven_optimal,
            cancelled,
            incumbent_history,
            frontier,
        })
    }
}

/// Expands one parent into a fresh pool, skipping dominated children.
fn expand_into<Pr, Q>(problem: &Pr, parent: &Candidate<Pr::Policy>, threshold: f64) -> (Q, usize)
where
    Pr: BnbProblem,
    Q: PolicyPool<Pr::Policy> + Default,
{
    let mut local = Q::default();
    let mut dominated = 0;
    for child in problem.expand(parent) {
        if child.bound().value() <= threshold {
            dominated += 1;
        } else {
            local.insert(child);
        }
    }
    (local, dominated)
}

#[cfg(feature = "parallel")]
fn expand_batch<Pr, Q>(
    problem: &Pr,
    batch: &[Candidate<Pr::Policy>],
    threshold: f64,
    parallel: bool,
) -> (Q, usize)
where
    Pr: BnbProblem,
    Q: PolicyPool<Pr::Policy> + Default + Send,
{
    if parallel && batch.len() > 1 {
        // rayon's reduce combines adjacent results in order, so ties keep
        // the same order as a sequential run.
        return batch
            .par_iter()
            .map(|parent| expand_into::<Pr, Q>(problem, parent, threshold))
            .reduce(
                || (Q::default(), 0),
                |(mut acc, a), (mut next, b)| {
                    acc.union(&mut next);
                    (acc, a + b)
                },
            );
    }
    expand_sequential::<Pr, Q>(problem, batch, threshold)
}

#[cfg(not(feature = "parallel"))]
fn expand_batch<Pr, Q>(
    problem: &Pr,
    batch: &[Candidate<Pr::Policy>],
    threshold: f64,
    _parallel: bool,
) -> (Q, usize)
where
    Pr: BnbProblem,
    Q: PolicyPool<Pr::Policy> + Default + Send,
{
    expand_sequential::<Pr, Q>(problem, batch, threshold)
}

fn expand_sequential<Pr, Q>(
    problem: &Pr,
    batch: &[Candidate<Pr::Policy>],
    threshold: f64,
) -> (Q, usize)
where
    Pr: BnbProblem,
    Q: PolicyPool<Pr::Policy> + Default,
{
    let mut merged = Q::default();
    let mut dominated = 0;
    for parent in batch {
        let (mut local, d) = expand_into::<Pr, Q>(problem, parent, threshold);
        merged.union(&mut local);
        dominated += d;
    }
    (merged, dominated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{
        JointDecisionRule, JointPolicyShape, PartialJointPolicy, PartialPolicy,
    };
    use crate::pool::DepthFirstPool;

    // ---- Open-loop team game: sum of per-epoch joint-action rewards ----

    struct TeamGame {
        shape: JointPolicyShape,
        /// rewards[epoch][joint action index]
        rewards: Vec<Vec<f64>>,
        expand_calls: std::sync::atomic::AtomicUsize,
    }

    impl TeamGame {
        fn new(num_actions: Vec<usize>, rewards: Vec<Vec<f64>>) -> Self {
            let shape = JointPolicyShape::open_loop(rewards.len(), num_actions).unwrap();
            Self {
                shape,
                rewards,
                expand_calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        /// Deterministic pseudo-random instance.
        fn generated(num_actions: Vec<usize>, horizon: usize, seed: u64) -> Self {
            let joint: usize = num_actions.iter().product();
            let mut state = seed;
            let rewards = (0..horizon)
                .map(|_| {
                    (0..joint)
                        .map(|_| {
                            state = state
                                .wrapping_mul(6364136223846793005)
                                .wrapping_add(1442695040888963407);
                            ((state >> 33) % 100) as f64
                        })
                        .collect()
                })
                .collect();
            Self::new(num_actions, rewards)
        }

        fn joint_index(&self, rule: &JointDecisionRule) -> usize {
            let mut index = 0;
            for agent in 0..self.shape.num_agents() {
                index = index * self.shape.num_actions(agent) + rule.action(agent, 0).unwrap();
            }
            index
        }

        fn joint_action(&self, mut index: usize) -> Vec<usize> {
            let n = self.shape.num_agents();
            let mut actions = vec![0; n];
            for agent in (0..n).rev() {
                let k = self.shape.num_actions(agent);
                actions[agent] = index % k;
                index /= k;
            }
            actions
        }

        fn decided_value(&self, policy: &PartialJointPolicy) -> f64 {
            policy
                .decision_rules()
                .iter()
                .enumerate()
                .map(|(epoch, rule)| self.rewards[epoch][self.joint_index(rule)])
                .sum()
        }

        fn upper_bound(&self, policy: &PartialJointPolicy) -> f64 {
            let rest: f64 = self.rewards[policy.depth()..]
                .iter()
                .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
                .sum();
            self.decided_value(policy) + rest
        }

        fn brute_force_optimum(&self) -> f64 {
            self.rewards
                .iter()
                .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
                .sum()
        }
    }

    impl BnbProblem for TeamGame {
        type Policy = PartialJointPolicy;
        type Context = JointPolicyShape;

        fn context(&self) -> &JointPolicyShape {
            &self.shape
        }

        fn expand(&self, parent: &Candidate<PartialJointPolicy>) -> Vec<Candidate<PartialJointPolicy>> {
            self.expand_calls
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            let joint = self.rewards[0].len();
            (0..joint)
                .map(|index| {
                    let rule = JointDecisionRule::from_joint_action(&self.joint_action(index));
                    let child = parent.policy().extend(rule).unwrap();
                    let bound = self.upper_bound(&child);
                    Candidate::new(child, bound).unwrap()
                })
                .collect()
        }

        fn complete_value(&self, policy: &PartialJointPolicy) -> Option<f64> {
            policy
                .is_complete()
                .then(|| self.decided_value(policy))
        }
    }

    #[test]
    fn test_bnb_finds_optimum() {
        let problem = TeamGame::new(
            vec![2, 2],
            vec![vec![1.0, 0.0, 0.0, 3.0], vec![2.0, 5.0, 0.0, 1.0]],
        );
        let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();

        assert!((result.best_value - 8.0).abs() < 1e-12);
        assert!(result.proven_optimal);
        assert!(!result.cancelled);
        let best = result.best.unwrap();
        assert!(best.is_complete());
        assert_eq!(best.action(0, 0, 0), Some(1));
        assert_eq!(best.action(1, 0, 0), Some(1));
        assert_eq!(best.action(0, 1, 0), Some(0));
        assert_eq!(best.action(1, 1, 0), Some(1));
        assert_eq!(result.frontier.size, 0);
    }

    #[test]
    fn test_bnb_matches_brute_force_on_generated_instances() {
        for seed in 0..10 {
            let problem = TeamGame::generated(vec![2, 3], 3, seed);
            let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();
            assert!(
                (result.best_value - problem.brute_force_optimum()).abs() < 1e-9,
                "seed {seed}: got {}, expected {}",
                result.best_value,
                problem.brute_force_optimum()
            );
            assert!(result.proven_optimal);
        }
    }

    #[test]
    fn test_bnb_prunes_against_exhaustive_search() {
        let problem = TeamGame::generated(vec![2, 2], 4, 7);
        let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();
        // exhaustive enumeration expands 1 + 4 + 16 + 64 interior nodes
        assert!(result.expansions < 85, "expanded {}", result.expansions);
        assert!(result.pruned > 0);
        assert_eq!(result.incumbent_history.len(), 1, "best-first finds the optimum first");
    }

    #[test]
    fn test_depth_first_pool_reaches_same_optimum() {
        let problem = TeamGame::generated(vec![3, 2], 3, 11);
        let result = BnbRunner::run_with_pool(
            &problem,
            DepthFirstPool::new(),
            &BnbConfig::default(),
            None,
        )
        .unwrap();
        assert!((result.best_value - problem.brute_force_optimum()).abs() < 1e-9);
        assert!(result.proven_optimal);
        for window in result.incumbent_history.windows(2) {
            assert!(window[1].1 > window[0].1, "incumbent must strictly improve");
        }
    }

    #[test]
    fn test_slack_bounds_the_loss() {
        let slack = 2.0;
        for seed in 0..5 {
            let problem = TeamGame::generated(vec![2, 2], 3, seed);
            let config = BnbConfig::default().with_slack(slack);
            let result =
                BnbRunner::run_with_pool(&problem, DepthFirstPool::new(), &config, None).unwrap();
            let optimum = problem.brute_force_optimum();
            assert!(result.best_value >= optimum - slack - 1e-9);
            assert!(result.best_value <= optimum + 1e-9);
        }
    }

    #[test]
    fn test_expansion_budget() {
        let problem = TeamGame::generated(vec![2, 2], 4, 3);
        let config = BnbConfig::default().with_max_expansions(2);
        let result = BnbRunner::run(&problem, &config).unwrap();
        assert_eq!(result.expansions, 2);
        assert!(!result.proven_optimal);
        assert!(result.best.is_none());
        assert!(result.frontier.size > 0);
    }

    #[test]
    fn test_batches_respect_budget() {
        let problem = TeamGame::generated(vec![2, 2], 4, 3);
        let config = BnbConfig::default()
            .with_max_expansions(5)
            .with_batch_size(4);
        let result = BnbRunner::run(&problem, &config).unwrap();
        assert_eq!(result.expansions, 5);
        assert_eq!(
            problem
                .expand_calls
                .load(std::sync::atomic::Ordering::Relaxed),
            5
        );
    }

    #[test]
    fn test_batched_search_is_still_optimal() {
        let problem = TeamGame::generated(vec![2, 3], 3, 5);
        let config = BnbConfig::default().with_batch_size(6).with_parallel(true);
        let result = BnbRunner::run(&problem, &config).unwrap();
        assert!((result.best_value - problem.brute_force_optimum()).abs() < 1e-9);
        assert!(result.proven_optimal);
    }

    #[test]
    fn test_batched_search_matches_sequential_policy() {
        let problem = TeamGame::generated(vec![2, 2], 3, 9);
        let sequential = BnbRunner::run(&problem, &BnbConfig::default().with_batch_size(4)).unwrap();
        let parallel = BnbRunner::run(
            &problem,
            &BnbConfig::default().with_batch_size(4).with_parallel(true),
        )
        .unwrap();
        assert_eq!(sequential.best_value, parallel.best_value);
        assert_eq!(sequential.expansions, parallel.expansions);
        assert_eq!(
            sequential.best.unwrap().decision_rules(),
            parallel.best.unwrap().decision_rules()
        );
    }

    #[test]
    fn test_cancel_before_start() {
        let problem = TeamGame::generated(vec![2, 2], 3, 1);
        let cancel = Arc::new(AtomicBool::new(true));
        let result =
            BnbRunner::run_with_cancel(&problem, &BnbConfig::default(), Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert!(!result.proven_optimal);
        assert_eq!(result.expansions, 0);
        // the seed is still there
        assert_eq!(result.frontier.size, 1);
        assert_eq!(result.frontier.unbounded, 1);
    }

    #[test]
    fn test_cancel_flag_unset_runs_to_completion() {
        let problem = TeamGame::generated(vec![2, 2], 3, 1);
        let cancel = Arc::new(AtomicBool::new(false));
        let result =
            BnbRunner::run_with_cancel(&problem, &BnbConfig::default(), Some(cancel)).unwrap();
        assert!(!result.cancelled);
        assert!(result.proven_optimal);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = TeamGame::generated(vec![2], 2, 0);
        let err = BnbRunner::run(&problem, &BnbConfig::default().with_batch_size(0)).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
    }

    #[test]
    fn test_dead_end_problem_exhausts_without_solution() {
        struct DeadEnd {
            shape: JointPolicyShape,
        }

        impl BnbProblem for DeadEnd {
            type Policy = PartialJointPolicy;
            type Context = JointPolicyShape;

            fn context(&self) -> &JointPolicyShape {
                &self.shape
            }

            fn expand(
                &self,
                _parent: &Candidate<PartialJointPolicy>,
            ) -> Vec<Candidate<PartialJointPolicy>> {
                vec![]
            }

            fn complete_value(&self, _policy: &PartialJointPolicy) -> Option<f64> {
                None
            }
        }

        let problem = DeadEnd {
            shape: JointPolicyShape::open_loop(2, vec![2]).unwrap(),
        };
        let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();
        assert!(result.best.is_none());
        assert_eq!(result.best_value, f64::NEG_INFINITY);
        assert_eq!(result.expansions, 1);
        assert!(result.proven_optimal);
    }

    #[test]
    fn test_batch_refiltered_after_incumbent_improves() {
        use crate::policy::ProblemContext;
        use std::sync::Mutex;

        struct Node {
            depth: usize,
            label: u32,
        }

        impl PartialPolicy for Node {
            fn depth(&self) -> usize {
                self.depth
            }
        }

        struct Root;

        impl ProblemContext for Root {
            type Policy = Node;

            fn empty_policy(&self) -> Node {
                Node { depth: 0, label: 0 }
            }
        }

        // The root has three children popped in one batch: an open branch
        // (10), an open branch tied with a complete policy (9), and that
        // complete policy, worth 9.
        struct Tie {
            root: Root,
            expanded: Mutex<Vec<u32>>,
        }

        impl BnbProblem for Tie {
            type Policy = Node;
            type Context = Root;

            fn context(&self) -> &Root {
                &self.root
            }

            fn expand(&self, parent: &Candidate<Node>) -> Vec<Candidate<Node>> {
                self.expanded.lock().unwrap().push(parent.policy().label);
                if parent.policy().depth > 0 {
                    return vec![];
                }
                [(1, 10.0), (2, 9.0), (3, 9.0)]
                    .into_iter()
                    .map(|(label, bound)| Candidate::new(Node { depth: 1, label }, bound).unwrap())
                    .collect()
            }

            fn complete_value(&self, policy: &Node) -> Option<f64> {
                (policy.label == 3).then_some(9.0)
            }
        }

        let problem = Tie {
            root: Root,
            expanded: Mutex::new(Vec::new()),
        };
        let config = BnbConfig::default().with_batch_size(3);
        let result = BnbRunner::run(&problem, &config).unwrap();

        assert_eq!(result.best_value, 9.0);
        assert_eq!(result.best.as_ref().map(|p| p.label), Some(3));
        assert!(result.proven_optimal);
        assert_eq!(*problem.expanded.lock().unwrap(), vec![0, 1]);
        assert_eq!(result.expansions, 2);
        assert_eq!(result.pruned, 1);
    }
}
