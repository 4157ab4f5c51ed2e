//! Reference-counted partial joint policies.

use std::fmt;
use std::sync::Arc;

use super::types::{PartialPolicy, ProblemContext};
use crate::error::PolicyError;

/// Agents, horizon, and per-agent action/observation counts of a problem.
///
/// Agent `i` has `num_observations[i]^t` observation histories at epoch `t`
/// (one, the empty history, at epoch 0).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawShape")
)]
pub struct JointPolicyShape {
    num_agents: usize,
    horizon: usize,
    num_actions: Vec<usize>,
    num_observations: Vec<usize>,
}

impl JointPolicyShape {
    /// Creates and validates a shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_policypool::policy::JointPolicyShape;
    ///
    /// let shape = JointPolicyShape::new(2, 3, vec![2, 3], vec![2, 2]).unwrap();
    /// assert_eq!(shape.num_histories(0, 2), 4);
    /// assert!(JointPolicyShape::new(0, 3, vec![], vec![]).is_err());
    /// ```
    pub fn new(
        num_agents: usize,
        horizon: usize,
        num_actions: Vec<usize>,
        num_observations: Vec<usize>,
    ) -> Result<Self, PolicyError> {
        let shape = Self {
            num_agents,
            horizon,
            num_actions,
            num_observations,
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Shape for agents that receive no informative observations.
    ///
    /// Each agent has a single history per epoch, so a policy is just a
    /// sequence of joint actions.
    pub fn open_loop(horizon: usize, num_actions: Vec<usize>) -> Result<Self, PolicyError> {
        let num_agents = num_actions.len();
        Self::new(num_agents, horizon, num_actions, vec![1; num_agents])
    }

    fn validate(&self) -> Result<(), PolicyError> {
        let invalid = |detail: String| Err(PolicyError::InvalidShape { detail });
        if self.num_agents == 0 {
            return invalid("at least one agent is required".into());
        }
        if self.horizon == 0 {
            return invalid("horizon must be at least 1".into());
        }
        if self.num_actions.len() != self.num_agents {
            return invalid(format!(
                "{} action counts given for {} agents",
                self.num_actions.len(),
                self.num_agents
            ));
        }
        if self.num_observations.len() != self.num_agents {
            return invalid(format!(
                "{} observation counts given for {} agents",
                self.num_observations.len(),
                self.num_agents
            ));
        }
        for agent in 0..self.num_agents {
            if self.num_actions[agent] == 0 {
                return invalid(format!("agent {agent} has no actions"));
            }
            if self.num_observations[agent] == 0 {
                return invalid(format!("agent {agent} has no observations"));
            }
            let last_epoch = u32::try_from(self.horizon - 1).unwrap_or(u32::MAX);
            if self.num_observations[agent].checked_pow(last_epoch).is_none() {
                return invalid(format!(
                    "agent {agent} has too many observation histories to index"
                ));
            }
        }
        Ok(())
    }

    /// Number of agents.
    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    /// Number of decision epochs.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of actions available to `agent`.
    pub fn num_actions(&self, agent: usize) -> usize {
        self.num_actions[agent]
    }

    /// Number of observations `agent` can receive per step.
    pub fn num_observations(&self, agent: usize) -> usize {
        self.num_observations[agent]
    }

    /// Number of observation histories `agent` can have at `epoch`.
    pub fn num_histories(&self, agent: usize, epoch: usize) -> usize {
        // validate() guarantees this cannot overflow for epoch < horizon.
        self.num_observations[agent].pow(epoch as u32)
    }
}

/// Unchecked field set; deserialized shapes go through
/// [`JointPolicyShape::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawShape {
    num_agents: usize,
    horizon: usize,
    num_actions: Vec<usize>,
    num_observations: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawShape> for JointPolicyShape {
    type Error = PolicyError;

    fn try_from(raw: RawShape) -> Result<Self, Self::Error> {
        Self::new(
            raw.num_agents,
            raw.horizon,
            raw.num_actions,
            raw.num_observations,
        )
    }
}

impl ProblemContext for JointPolicyShape {
    type Policy = PartialJointPolicy;

    fn empty_policy(&self) -> PartialJointPolicy {
        PartialJointPolicy::empty(Arc::new(self.clone()))
    }
}

/// Every agent's action choices at a single decision epoch.
///
/// `actions[agent][history]` is the action `agent` takes after observation
/// history `history`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointDecisionRule {
    actions: Vec<Vec<usize>>,
}

impl JointDecisionRule {
    /// Creates a rule from per-agent, per-history action indices.
    pub fn new(actions: Vec<Vec<usize>>) -> Self {
        Self { actions }
    }

    /// Creates a rule for agents with a single history each.
    ///
    /// ```
    /// use u_policypool::policy::JointDecisionRule;
    ///
    /// let rule = JointDecisionRule::from_joint_action(&[1, 0]);
    /// assert_eq!(rule.action(0, 0), Some(1));
    /// assert_eq!(rule.action(1, 0), Some(0));
    /// ```
    pub fn from_joint_action(joint_action: &[usize]) -> Self {
        Self {
            actions: joint_action.iter().map(|&a| vec![a]).collect(),
        }
    }

    /// The action `agent` takes after `history`, if the rule covers it.
    pub fn action(&self, agent: usize, history: usize) -> Option<usize> {
        self.actions.get(agent)?.get(history).copied()
    }

    /// Per-agent action tables.
    pub fn actions(&self) -> &[Vec<usize>] {
        &self.actions
    }

    fn check(&self, shape: &JointPolicyShape, epoch: usize) -> Result<(), PolicyError> {
        let mismatch = |detail: String| Err(PolicyError::RuleMismatch { epoch, detail });
        if self.actions.len() != shape.num_agents() {
            return mismatch(format!(
                "rule covers {} agents, problem has {}",
                self.actions.len(),
                shape.num_agents()
            ));
        }
        for (agent, table) in self.actions.iter().enumerate() {
            let expected = shape.num_histories(agent, epoch);
            if table.len() != expected {
                return mismatch(format!(
                    "agent {agent} has {} entries, expected {expected} histories",
                    table.len()
                ));
            }
            if let Some(&bad) = table.iter().find(|&&a| a >= shape.num_actions(agent)) {
                return mismatch(format!("agent {agent} has no action {bad}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Stage {
    rule: JointDecisionRule,
    parent: Option<Arc<Stage>>,
}

/// A joint policy with the first [`depth`](PartialPolicy::depth) epochs decided.
///
/// Internally a persistent singly linked list of decision rules, newest
/// first. [`extend`](Self::extend) allocates one new stage and points it at
/// the existing ones, so sibling policies share their whole common prefix
/// and no stage is ever modified after creation. Cloning is O(1).
#[derive(Clone)]
pub struct PartialJointPolicy {
    shape: Arc<JointPolicyShape>,
    head: Option<Arc<Stage>>,
    depth: usize,
}

impl PartialJointPolicy {
    /// The policy with no epochs decided.
    pub fn empty(shape: Arc<JointPolicyShape>) -> Self {
        Self {
            shape,
            head: None,
            depth: 0,
        }
    }

    /// Returns a new policy that also decides the next epoch with `rule`.
    ///
    /// `self` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_policypool::policy::{
    ///     JointDecisionRule, JointPolicyShape, PartialPolicy, ProblemContext,
    /// };
    ///
    /// let shape = JointPolicyShape::open_loop(2, vec![2, 2]).unwrap();
    /// let root = shape.empty_policy();
    /// let child = root.extend(JointDecisionRule::from_joint_action(&[0, 1])).unwrap();
    /// assert_eq!(root.depth(), 0);
    /// assert_eq!(child.depth(), 1);
    /// assert_eq!(child.action(1, 0, 0), Some(1));
    /// ```
    pub fn extend(&self, rule: JointDecisionRule) -> Result<Self, PolicyError> {
        if self.depth >= self.shape.horizon() {
            return Err(PolicyError::HorizonExceeded {
                horizon: self.shape.horizon(),
            });
        }
        rule.check(&self.shape, self.depth)?;
        Ok(Self {
            shape: Arc::clone(&self.shape),
            head: Some(Arc::new(Stage {
                rule,
                parent: self.head.clone(),
            })),
            depth: self.depth + 1,
        })
    }

    /// Shape of the problem this policy belongs to.
    pub fn shape(&self) -> &JointPolicyShape {
        &self.shape
    }

    /// Whether every epoch up to the horizon is decided.
    pub fn is_complete(&self) -> bool {
        self.depth == self.shape.horizon()
    }

    /// The rule chosen for `epoch`, if already decided.
    pub fn decision_rule(&self, epoch: usize) -> Option<&JointDecisionRule> {
        if epoch >= self.depth {
            return None;
        }
        self.stage_at(epoch).map(|stage| &stage.rule)
    }

    /// The action `agent` takes at `epoch` after `history`, if decided.
    pub fn action(&self, agent: usize, epoch: usize, history: usize) -> Option<usize> {
        self.decision_rule(epoch)?.action(agent, history)
    }

    /// Decided rules in epoch order.
    pub fn decision_rules(&self) -> Vec<&JointDecisionRule> {
        let mut rules = Vec::with_capacity(self.depth);
        let mut cursor = self.head.as_deref();
        while let Some(stage) = cursor {
            rules.push(&stage.rule);
            cursor = stage.parent.as_deref();
        }
        rules.reverse();
        rules
    }

    /// Number of leading epochs whose stages are physically shared with `other`.
    ///
    /// Two policies derived from a common ancestor share at least that
    /// ancestor's depth; equal-but-separately-built stages do not count.
    pub fn shared_prefix_len(&self, other: &Self) -> usize {
        let mut a = self.head.as_ref();
        let mut b = other.head.as_ref();
        let mut depth_a = self.depth;
        let mut depth_b = other.depth;
        while depth_a > depth_b {
            a = a.and_then(|s| s.parent.as_ref());
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = b.and_then(|s| s.parent.as_ref());
            depth_b -= 1;
        }
        while let (Some(x), Some(y)) = (a, b) {
            if Arc::ptr_eq(x, y) {
                return depth_a;
            }
            a = x.parent.as_ref();
            b = y.parent.as_ref();
            depth_a -= 1;
        }
        0
    }

    fn stage_at(&self, epoch: usize) -> Option<&Stage> {
        let mut cursor = self.head.as_deref();
        for _ in 0..(self.depth - 1 - epoch) {
            cursor = cursor?.parent.as_deref();
        }
        cursor
    }
}

impl PartialPolicy for PartialJointPolicy {
    fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for PartialJointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialJointPolicy")
            .field("depth", &self.depth)
            .field("horizon", &self.shape.horizon())
            .field("rules", &self.decision_rules())
            .finish()
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_shape_round_trips() {
        let shape = JointPolicyShape::new(2, 3, vec![2, 3], vec![2, 1]).unwrap();
        let json = serde_json::to_string(&shape).unwrap();
        let back: JointPolicyShape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    fn test_deserialized_shape_is_validated() {
        let short = r#"{"num_agents":2,"horizon":2,"num_actions":[2],"num_observations":[1]}"#;
        let err = serde_json::from_str::<JointPolicyShape>(short).unwrap_err();
        assert!(err.to_string().contains("action counts"));

        let no_horizon = r#"{"num_agents":1,"horizon":0,"num_actions":[2],"num_observations":[1]}"#;
        assert!(serde_json::from_str::<JointPolicyShape>(no_horizon).is_err());
    }
}
